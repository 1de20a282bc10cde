//! Byte-level persistence contract and file/in-memory implementations.
//!
//! # Responsibility
//! - Expose `exists/read/write` over one fixed storage location.
//! - Keep file-system details out of the controller.
//!
//! # Invariants
//! - `FileStore::write` replaces the file atomically (temp file + rename).
//! - `read` on an absent location returns `BackendError::NotFound`.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// File name of the persisted drawing store inside the app storage area.
pub const SAVE_FILE_NAME: &str = "PencilKitDraw.data";

pub type BackendResult<T> = Result<T, BackendError>;

/// Storage-layer failure.
#[derive(Debug)]
pub enum BackendError {
    /// Nothing has been persisted at the location yet.
    NotFound(String),
    Io(io::Error),
    Db(DbError),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(location) => write!(f, "no persisted data at `{location}`"),
            Self::Io(err) => write!(f, "storage i/o error: {err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<io::Error> for BackendError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<DbError> for BackendError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage for the serialized drawing store.
///
/// Implementations are moved onto the persistence worker thread and are only
/// ever called from there, one operation at a time.
pub trait PersistenceBackend: Send {
    /// Human-readable description of the bound location, for logs.
    fn location(&self) -> String;
    fn exists(&self) -> bool;
    fn read(&self) -> BackendResult<Vec<u8>>;
    fn write(&mut self, bytes: &[u8]) -> BackendResult<()>;
}

/// File-backed store at `<app storage dir>/PencilKitDraw.data`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Binds to the save file inside `storage_dir`.
    ///
    /// The directory is created lazily on first write.
    pub fn in_dir(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            path: storage_dir.as_ref().join(SAVE_FILE_NAME),
        }
    }

    /// Binds to the save file inside the platform documents directory.
    ///
    /// Returns `None` when the platform reports no documents directory.
    pub fn in_documents_dir() -> Option<Self> {
        dirs::document_dir().map(Self::in_dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl PersistenceBackend for FileStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read(&self) -> BackendResult<Vec<u8>> {
        fs::read(&self.path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => BackendError::NotFound(self.location()),
            _ => BackendError::Io(err),
        })
    }

    fn write(&mut self, bytes: &[u8]) -> BackendResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// In-memory store shared between the persistence worker and its creator.
///
/// Every successful write is also appended to a write log, so hosts and tests
/// can observe the exact sequence of persisted payloads.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    current: Option<Vec<u8>>,
    writes: Vec<Vec<u8>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `bytes`, as if persisted earlier.
    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.state().current = Some(bytes.into());
        store
    }

    /// Currently persisted payload.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.state().current.clone()
    }

    /// Every payload written so far, oldest first.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state().writes.clone()
    }

    /// Makes subsequent writes fail with an i/o error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock cannot leave the plain data invalid.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PersistenceBackend for MemoryStore {
    fn location(&self) -> String {
        format!("memory://{SAVE_FILE_NAME}")
    }

    fn exists(&self) -> bool {
        self.state().current.is_some()
    }

    fn read(&self) -> BackendResult<Vec<u8>> {
        self.state()
            .current
            .clone()
            .ok_or_else(|| BackendError::NotFound(self.location()))
    }

    fn write(&mut self, bytes: &[u8]) -> BackendResult<()> {
        let mut state = self.state();
        if state.fail_writes {
            return Err(BackendError::Io(io::Error::new(
                io::ErrorKind::Other,
                "memory store configured to fail writes",
            )));
        }
        state.current = Some(bytes.to_vec());
        state.writes.push(bytes.to_vec());
        Ok(())
    }
}
