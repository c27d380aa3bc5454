//! Cancellable trailing-edge debounce timer

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Pending {
    generation: u64,
    token: Option<CancellationToken>,
}

/// Runs a task once the caller has stopped rescheduling it for `delay`
///
/// Scheduling again restarts the quiet period and replaces the pending
/// task. Once the delay has elapsed the task runs to completion even if it
/// is rescheduled or cancelled meanwhile.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<Pending>>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    /// Quiet period
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task`, replacing any pending one
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let generation = {
            let mut pending = self.pending.lock();
            if let Some(previous) = pending.token.replace(token.clone()) {
                previous.cancel();
            }
            pending.generation += 1;
            pending.generation
        };

        let delay = self.delay;
        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    {
                        let mut pending = pending.lock();
                        if pending.generation == generation {
                            pending.token = None;
                        }
                    }
                    task.await;
                }
            }
        });
    }

    /// Drop the pending task, if any; returns whether one was pending
    pub fn cancel(&self) -> bool {
        self.pending.lock().token.take().is_some_and(|token| {
            token.cancel();
            true
        })
    }

    /// Whether a task is waiting for its quiet period to end
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.lock().token.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
