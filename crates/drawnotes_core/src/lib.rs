//! Persistence and model-synchronization core for the drawing-notes app.
//!
//! The drawing editor hands opaque drawing blobs to a `DataModelController`,
//! which keeps them in order, persists them in the background and tells
//! observers when a freshly loaded model is in place.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::drawing::{
    DrawingRecord, DrawingStore, StoreError, StoreResult, STORE_FORMAT_VERSION,
};
pub use repo::backend::{
    BackendError, BackendResult, FileStore, MemoryStore, PersistenceBackend, SAVE_FILE_NAME,
};
pub use repo::default_content::{
    load_default_drawings, AssetDirectory, AssetError, DefaultContentSource, StaticAssets,
    DRAWING_ASSET_EXTENSION,
};
pub use repo::sqlite_store::SqliteStore;
pub use service::data_model_controller::{
    ControllerError, ControllerResult, DataModelController, LoadState,
};
pub use service::observer::{DataModelObserver, ObserverId, ObserverList};
