//! Cancellable delayed tasks

use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs closures after a delay on the current tokio runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    /// Run `task` once `delay` has elapsed, unless the returned handle is
    /// cancelled or dropped first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        TaskHandle { handle }
    }
}

/// Handle to a scheduled task
#[derive(Debug)]
pub struct TaskHandle {
    handle: JoinHandle<()>,
}

impl TaskHandle {
    /// Stop the task if it has not run yet
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Check if the task ran or was cancelled
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
