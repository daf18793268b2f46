//! Owned, cancellable delayed actions.
//!
//! "Wait, then act" work (for example releasing a session's state some time
//! after it disconnects) runs on worker threads owned by a `DeferredTasks`
//! instance. Every pending action can be cancelled individually, and all of
//! them are cancelled and joined when the owner shuts down or is dropped.

use log::{debug, warn};
use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("task scheduler is shut down")]
    ShutDown,

    #[error("failed to spawn task thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Default)]
struct State {
    shutdown: bool,
    next_id: u64,
    live: HashSet<u64>,
    cancelled: HashSet<u64>,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<State>,
    wake: Condvar,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        // Actions run outside the lock; the bookkeeping stays valid when poisoned.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Cancels one scheduled action
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u64,
    name: String,
    shared: Arc<Shared>,
}

impl TaskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True while the action is still waiting for its delay
    pub fn is_pending(&self) -> bool {
        self.shared.state().live.contains(&self.id)
    }

    /// Prevent the action from running if it has not started yet.
    ///
    /// Returns false when the action already ran or was dropped.
    pub fn cancel(&self) -> bool {
        let mut state = self.shared.state();
        if !state.live.contains(&self.id) {
            return false;
        }
        state.cancelled.insert(self.id);
        drop(state);

        self.shared.wake.notify_all();
        debug!("Cancelled deferred task '{}'", self.name);
        true
    }
}

/// Owner of delayed actions
#[derive(Debug, Default)]
pub struct DeferredTasks {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl DeferredTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay` unless cancelled or shut down first
    ///
    /// # Errors
    /// * `TaskError::ShutDown` - The owner has already shut down
    /// * `TaskError::Spawn` - The worker thread could not be created
    pub fn schedule<F>(
        &self,
        name: impl Into<String>,
        delay: Duration,
        action: F,
    ) -> Result<TaskHandle, TaskError>
    where
        F: FnOnce() + Send + 'static,
    {
        let name = name.into();
        let id = {
            let mut state = self.shared.state();
            if state.shutdown {
                return Err(TaskError::ShutDown);
            }
            state.next_id += 1;
            let id = state.next_id;
            state.live.insert(id);
            id
        };

        let shared = Arc::clone(&self.shared);
        let task_name = name.clone();
        let worker = thread::Builder::new()
            .name(format!("deferred-{}", id))
            .spawn(move || {
                let state = shared.state();
                let (mut state, _) = shared
                    .wake
                    .wait_timeout_while(state, delay, |s| {
                        !s.shutdown && !s.cancelled.contains(&id)
                    })
                    .unwrap_or_else(|e| e.into_inner());

                state.live.remove(&id);
                let skip = state.cancelled.remove(&id) || state.shutdown;
                drop(state);

                if skip {
                    debug!("Deferred task '{}' dropped before running", task_name);
                } else {
                    debug!("Running deferred task '{}'", task_name);
                    action();
                }
            });
        let worker = match worker {
            Ok(worker) => worker,
            Err(e) => {
                self.shared.state().live.remove(&id);
                return Err(TaskError::Spawn(e));
            }
        };

        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        workers.retain(|w| !w.is_finished());
        workers.push(worker);

        Ok(TaskHandle {
            id,
            name,
            shared: Arc::clone(&self.shared),
        })
    }

    /// Number of workers that have not finished yet
    pub fn pending(&self) -> usize {
        let workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        workers.iter().filter(|w| !w.is_finished()).count()
    }

    /// Cancel every pending action and wait for the workers to exit.
    ///
    /// Idempotent; later `schedule` calls fail with `TaskError::ShutDown`.
    pub fn shutdown(&self) {
        self.shared.state().shutdown = true;
        self.shared.wake.notify_all();

        let workers: Vec<JoinHandle<()>> = {
            let mut guard = self.workers.lock().unwrap_or_else(|e| e.into_inner());
            guard.drain(..).collect()
        };
        for worker in workers {
            if worker.join().is_err() {
                warn!("A deferred task panicked");
            }
        }
    }
}

impl Drop for DeferredTasks {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_task_runs_after_delay() {
        let tasks = DeferredTasks::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tasks
            .schedule("count", Duration::from_millis(10), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        thread::sleep(Duration::from_millis(300));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancelled_task_never_runs() {
        let tasks = DeferredTasks::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let handle = tasks
            .schedule("count", Duration::from_secs(30), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert!(handle.is_pending());
        assert!(handle.cancel());
        tasks.shutdown();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!handle.is_pending());
        assert_eq!(tasks.pending(), 0);
    }

    #[test]
    fn test_cancel_after_run_is_a_no_op() {
        let tasks = DeferredTasks::new();
        let handle = tasks
            .schedule("noop", Duration::from_millis(5), || {})
            .unwrap();

        for _ in 0..200 {
            if !handle.is_pending() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        assert!(!handle.is_pending());
        assert!(!handle.cancel());
        assert!(tasks.shared.state().cancelled.is_empty());
        assert!(tasks.shared.state().live.is_empty());
    }

    #[test]
    fn test_shutdown_cancels_pending_and_rejects_new() {
        let tasks = DeferredTasks::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = Arc::clone(&hits);
            tasks
                .schedule("count", Duration::from_secs(30), move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        tasks.shutdown();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(matches!(
            tasks.schedule("late", Duration::ZERO, || {}),
            Err(TaskError::ShutDown)
        ));
    }
}
