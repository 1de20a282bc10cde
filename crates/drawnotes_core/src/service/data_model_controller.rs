//! Data model controller.
//!
//! # Responsibility
//! - Own the authoritative drawing store for the app.
//! - Load it in the background on construction and save it on every mutation.
//! - Notify observers after a loaded store is swapped in.
//!
//! # Invariants
//! - The store is only touched on the thread that owns the controller.
//! - Loads and saves run on one FIFO queue, so they complete in issue order.
//! - Only applying a load notifies observers; mutations and saves never do.
//! - Out-of-range indices are rejected before any mutation or save.
//!
//! # Consistency
//! Reads issued while `LoadState::Loading` observe the pre-load store (empty
//! right after construction). Hosts drive the swap by calling
//! `apply_pending_updates` from their event loop, or block on
//! `wait_until_ready`.

use crate::model::drawing::{DrawingRecord, DrawingStore};
use crate::repo::backend::PersistenceBackend;
use crate::repo::default_content::DefaultContentSource;
use crate::service::observer::{DataModelObserver, ObserverId, ObserverList};
use crate::service::persistence_queue::{Job, PersistenceQueue};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Controller-level error surfaced to callers.
#[derive(Debug)]
pub enum ControllerError {
    /// Caller passed an index outside `0..len`.
    IndexOutOfRange { index: usize, len: usize },
    /// The background persistence worker could not be started.
    QueueUnavailable(io::Error),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "drawing index {index} out of range for {len} drawings")
            }
            Self::QueueUnavailable(err) => {
                write!(f, "failed to start persistence queue: {err}")
            }
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IndexOutOfRange { .. } => None,
            Self::QueueUnavailable(err) => Some(err),
        }
    }
}

/// Lifecycle of the authoritative store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No load has been scheduled yet.
    Uninitialized,
    /// At least one scheduled load has not been applied.
    Loading,
    /// Every scheduled load has been applied.
    Ready,
}

/// Owner of the app's drawings.
///
/// Construct one per app and pass it by reference to the components that need
/// it.
pub struct DataModelController {
    store: DrawingStore,
    state: LoadState,
    pending_loads: usize,
    observers: ObserverList,
    queue: PersistenceQueue,
}

impl DataModelController {
    /// Creates a controller with an empty store and schedules the initial load.
    ///
    /// # Errors
    /// - `ControllerError::QueueUnavailable` when the worker thread cannot be
    ///   spawned.
    pub fn new(
        backend: impl PersistenceBackend + 'static,
        defaults: impl DefaultContentSource + 'static,
    ) -> ControllerResult<Self> {
        let location = backend.location();
        let queue = PersistenceQueue::spawn(Box::new(backend), Box::new(defaults))
            .map_err(ControllerError::QueueUnavailable)?;

        let mut controller = Self {
            store: DrawingStore::new(),
            state: LoadState::Uninitialized,
            pending_loads: 0,
            observers: ObserverList::new(),
            queue,
        };
        info!(
            "event=controller_init module=service status=ok location={}",
            location
        );
        controller.reload();
        Ok(controller)
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Live, ordered view of every drawing.
    pub fn drawings(&self) -> &[DrawingRecord] {
        &self.store.drawings
    }

    pub fn drawing(&self, index: usize) -> Option<&DrawingRecord> {
        self.store.drawings.get(index)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Replaces every drawing at once.
    ///
    /// Does not save; call `save_data_model` afterwards to persist.
    pub fn set_drawings(&mut self, drawings: Vec<DrawingRecord>) {
        self.store.drawings = drawings;
    }

    /// Replaces the drawing at `index` and saves.
    ///
    /// # Errors
    /// - `ControllerError::IndexOutOfRange` when `index >= len`; the store is
    ///   unchanged and nothing is saved.
    pub fn update_drawing(&mut self, drawing: DrawingRecord, index: usize) -> ControllerResult<()> {
        let len = self.store.len();
        let Some(slot) = self.store.drawings.get_mut(index) else {
            error!(
                "event=drawing_update module=service status=error error_code=index_out_of_range index={} len={}",
                index, len
            );
            return Err(ControllerError::IndexOutOfRange { index, len });
        };

        *slot = drawing;
        self.save_data_model();
        Ok(())
    }

    /// Appends a blank drawing, saves, and returns its index.
    pub fn new_drawing(&mut self) -> usize {
        self.store.drawings.push(DrawingRecord::empty());
        self.save_data_model();
        self.store.len() - 1
    }

    /// Queues a save of the current store.
    ///
    /// The snapshot is taken now; later mutations do not affect it.
    pub fn save_data_model(&self) {
        let snapshot = self.store.drawings.clone();
        debug!(
            "event=data_model_save module=service status=queued drawings={}",
            snapshot.len()
        );
        self.queue.enqueue(Job::Save(snapshot));
    }

    /// Queues another load from storage.
    ///
    /// Saves queued earlier complete before it runs.
    pub fn reload(&mut self) {
        if self.queue.enqueue(Job::Load) {
            self.pending_loads += 1;
            self.state = LoadState::Loading;
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn DataModelObserver>) -> ObserverId {
        self.observers.add(observer)
    }

    /// Returns `false` when `id` was not registered.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    /// Applies loads that finished since the last call, without blocking.
    ///
    /// Returns the number of loads applied.
    pub fn apply_pending_updates(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.queue.loaded().try_recv() {
                Ok(store) => {
                    self.apply_loaded(store);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return applied,
            }
        }
    }

    /// Blocks until every scheduled load has been applied or `timeout` passes.
    ///
    /// Returns whether the controller is `Ready`.
    pub fn wait_until_ready(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.apply_pending_updates();

        while self.state != LoadState::Ready {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.queue.loaded().recv_timeout(remaining) {
                Ok(store) => self.apply_loaded(store),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false
                }
            }
        }
        true
    }

    /// Blocks until every job queued before this call has finished.
    ///
    /// Returns `false` on timeout or if the worker is gone.
    pub fn flush(&self, timeout: Duration) -> bool {
        let (reply_tx, reply_rx) = mpsc::channel();
        if !self.queue.enqueue(Job::Flush(reply_tx)) {
            return false;
        }
        reply_rx.recv_timeout(timeout).is_ok()
    }

    fn apply_loaded(&mut self, store: DrawingStore) {
        self.store = store;
        self.pending_loads = self.pending_loads.saturating_sub(1);
        if self.pending_loads == 0 {
            self.state = LoadState::Ready;
        }

        let failed = self.observers.notify_all();
        info!(
            "event=data_model_apply module=service status=ok drawings={} observers={} observer_failures={}",
            self.store.len(),
            self.observers.len(),
            failed
        );
    }
}
