//! Worker Lifecycle
//!
//! Each session runs on its own thread. A thread that finishes, cleanly or by
//! panicking, posts its id on an exit channel; whoever drains the channel
//! joins the thread and drops it from the pending set.
//!
//! ## Reaping
//! - Opportunistically, by the accept loop after each new connection
//! - Asynchronously, by the reaper thread blocked on the exit channel, so an
//!   idle listener still reclaims finished workers

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::Result;

/// Identity of a worker (and of the session it runs)
pub type WorkerId = u64;

/// Outstanding worker threads
///
/// ## Concurrency:
/// - `pending`: Mutex, held across spawn + insert so an exit notice can never
///   arrive for a handle that is not yet recorded
/// - `next_id`: Atomic counter (lock-free)
pub struct WorkerSet {
    pending: Mutex<HashMap<WorkerId, JoinHandle<()>>>,
    exits_tx: Sender<WorkerId>,
    exits_rx: Receiver<WorkerId>,
    next_id: AtomicU64,
}

/// Posts the worker's id when dropped, including during a panic unwind
struct ExitNotice {
    id: WorkerId,
    tx: Sender<WorkerId>,
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        let _ = self.tx.send(self.id);
    }
}

impl WorkerSet {
    pub fn new() -> Self {
        let (exits_tx, exits_rx) = channel::unbounded();
        Self {
            pending: Mutex::new(HashMap::new()),
            exits_tx,
            exits_rx,
            next_id: AtomicU64::new(1),
        }
    }

    /// Run `work` on a new worker thread
    pub fn spawn<F>(&self, work: F) -> Result<WorkerId>
    where
        F: FnOnce(WorkerId) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notice = ExitNotice {
            id,
            tx: self.exits_tx.clone(),
        };

        let mut pending = self.pending.lock();
        let handle = thread::Builder::new()
            .name(format!("cix-worker-{}", id))
            .spawn(move || {
                let _notice = notice;
                work(id);
            })?;
        pending.insert(id, handle);
        drop(pending);

        tracing::debug!("spawned worker {}", id);
        Ok(id)
    }

    /// Reap every worker that has already reported its exit, without blocking
    ///
    /// Returns the number of workers reaped.
    pub fn reap_finished(&self) -> usize {
        let mut reaped = 0;
        while let Ok(id) = self.exits_rx.try_recv() {
            self.reap(id);
            reaped += 1;
        }
        reaped
    }

    /// Number of workers not yet reaped
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Start the background reaper thread
    pub fn start_reaper(self: &Arc<Self>) -> Result<Reaper> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let workers = Arc::clone(self);

        let handle = thread::Builder::new()
            .name("cix-reaper".to_string())
            .spawn(move || loop {
                channel::select! {
                    recv(workers.exits_rx) -> msg => match msg {
                        Ok(id) => workers.reap(id),
                        Err(_) => break,
                    },
                    recv(stop_rx) -> _ => break,
                }
            })?;

        Ok(Reaper {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Join one exited worker and forget it
    fn reap(&self, id: WorkerId) {
        let handle = self.pending.lock().remove(&id);
        match handle {
            Some(handle) => match handle.join() {
                Ok(()) => tracing::debug!("reaped worker {}", id),
                Err(_) => tracing::warn!("reaped worker {} after it panicked", id),
            },
            // Spawn failed after the id was taken
            None => tracing::trace!("exit notice for unknown worker {}", id),
        }
    }
}

impl Default for WorkerSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the background reaper thread
pub struct Reaper {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Stop the reaper and wait for it
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("reaper thread panicked");
            }
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.shutdown();
    }
}
