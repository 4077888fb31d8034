//! Single-slot delayed task used for debounced session saves.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Holds at most one pending delayed task.
///
/// Scheduling a new task aborts the one in the slot. Dropping the slot
/// aborts whatever is pending.
#[derive(Debug, Default)]
pub struct PendingSave {
    slot: Option<JoinHandle<()>>,
}

impl PendingSave {
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// Run `task` after `delay` unless superseded or cancelled first
    pub fn schedule<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.slot.take() {
            previous.abort();
        }
        self.slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Abort the pending task.
    ///
    /// Returns its handle so the caller can wait until it has actually
    /// stopped, which matters when the delay already elapsed and the task
    /// is mid-write.
    pub fn cancel(&mut self) -> Option<JoinHandle<()>> {
        let handle = self.slot.take()?;
        handle.abort();
        Some(handle)
    }

    /// Whether a task is scheduled and has not completed yet
    pub fn is_pending(&self) -> bool {
        self.slot.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for PendingSave {
    fn drop(&mut self) {
        if let Some(handle) = self.slot.take() {
            handle.abort();
        }
    }
}
