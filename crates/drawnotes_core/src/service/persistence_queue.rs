//! Single-worker serialization queue for data model I/O.
//!
//! # Responsibility
//! - Run every load and save on one background thread, in issue order.
//! - Hand loaded stores back to the owning context over a channel.
//!
//! # Invariants
//! - Jobs execute strictly FIFO; a save queued before a load finishes first.
//! - Load always yields a store: persisted, or defaults on any failure.
//! - Save failures are logged and dropped, never retried.
//! - Dropping the queue drains pending jobs before joining the worker.

use crate::model::drawing::{DrawingRecord, DrawingStore};
use crate::repo::backend::{BackendError, PersistenceBackend};
use crate::repo::default_content::{load_default_drawings, DefaultContentSource};
use log::{debug, error, info};
use std::error::Error;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

const WORKER_THREAD_NAME: &str = "serialization-queue";

pub(crate) enum Job {
    Load,
    Save(Vec<DrawingRecord>),
    Flush(Sender<()>),
}

pub(crate) struct PersistenceQueue {
    jobs: Option<Sender<Job>>,
    loaded: Receiver<DrawingStore>,
    worker: Option<JoinHandle<()>>,
}

impl PersistenceQueue {
    pub(crate) fn spawn(
        backend: Box<dyn PersistenceBackend>,
        defaults: Box<dyn DefaultContentSource>,
    ) -> io::Result<Self> {
        let (jobs_tx, jobs_rx) = mpsc::channel();
        let (loaded_tx, loaded_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(backend, defaults, jobs_rx, loaded_tx))?;

        Ok(Self {
            jobs: Some(jobs_tx),
            loaded: loaded_rx,
            worker: Some(worker),
        })
    }

    /// Queues `job`. Returns `false` when the worker is gone.
    pub(crate) fn enqueue(&self, job: Job) -> bool {
        let sent = self
            .jobs
            .as_ref()
            .is_some_and(|jobs| jobs.send(job).is_ok());
        if !sent {
            error!(
                "event=queue_enqueue module=service status=error error_code=worker_unavailable"
            );
        }
        sent
    }

    pub(crate) fn loaded(&self) -> &Receiver<DrawingStore> {
        &self.loaded
    }
}

impl Drop for PersistenceQueue {
    fn drop(&mut self) {
        // Closing the sender ends the worker loop once queued jobs are done.
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!(
                    "event=queue_shutdown module=service status=error error_code=worker_panicked"
                );
            }
        }
    }
}

fn run_worker(
    mut backend: Box<dyn PersistenceBackend>,
    defaults: Box<dyn DefaultContentSource>,
    jobs: Receiver<Job>,
    loaded: Sender<DrawingStore>,
) {
    for job in jobs {
        match job {
            Job::Load => {
                let store = load_data_model(backend.as_ref(), defaults.as_ref());
                // The owner may already be gone; nothing left to hand the store to.
                let _ = loaded.send(store);
            }
            Job::Save(snapshot) => save_data_model(backend.as_mut(), &snapshot),
            Job::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }
    debug!("event=queue_shutdown module=service status=ok");
}

/// Reads the persisted store, falling back to bundled defaults.
pub(crate) fn load_data_model(
    backend: &dyn PersistenceBackend,
    defaults: &dyn DefaultContentSource,
) -> DrawingStore {
    let started_at = Instant::now();
    let location = backend.location();

    if backend.exists() {
        match read_store(backend) {
            Ok(store) => {
                info!(
                    "event=data_model_load module=service status=ok source=persisted location={} drawings={} duration_ms={}",
                    location,
                    store.len(),
                    started_at.elapsed().as_millis()
                );
                return store;
            }
            Err(err) => error!(
                "event=data_model_load module=service status=error location={} error_code=load_failed error={}",
                location, err
            ),
        }
    } else {
        info!(
            "event=data_model_load module=service status=not_found location={}",
            location
        );
    }

    let store = load_default_drawings(defaults, DrawingStore::DEFAULT_DRAWING_NAMES);
    info!(
        "event=data_model_load module=service status=ok source=defaults drawings={} duration_ms={}",
        store.len(),
        started_at.elapsed().as_millis()
    );
    store
}

fn read_store(backend: &dyn PersistenceBackend) -> Result<DrawingStore, Box<dyn Error>> {
    let bytes = backend.read()?;
    Ok(DrawingStore::deserialize(&bytes)?)
}

/// Serializes `snapshot` and writes it, logging any failure.
pub(crate) fn save_data_model(backend: &mut dyn PersistenceBackend, snapshot: &[DrawingRecord]) {
    let started_at = Instant::now();
    let bytes = match DrawingStore::serialize_records(snapshot) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(
                "event=data_model_save module=service status=error error_code=encode_failed error={}",
                err
            );
            return;
        }
    };

    match backend.write(&bytes) {
        Ok(()) => debug!(
            "event=data_model_save module=service status=ok drawings={} bytes={} duration_ms={}",
            snapshot.len(),
            bytes.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => {
            let error_code = match err {
                BackendError::Db(_) => "db_write_failed",
                BackendError::Io(_) | BackendError::NotFound(_) => "write_failed",
            };
            error!(
                "event=data_model_save module=service status=error location={} error_code={} error={}",
                backend.location(),
                error_code,
                err
            );
        }
    }
}
