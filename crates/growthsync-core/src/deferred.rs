//! Cancellable delayed tasks
//!
//! Follow-up work (the flag creation after Create) runs on a [`DeferredTasks`]
//! set owned by the controller instead of a detached timer:
//! - `shutdown` waits for everything still pending
//! - `cancel_all` aborts everything still pending
//! - dropping the set aborts everything still pending

use futures::future::join_all;
use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Set of tasks that start after a delay
#[derive(Debug, Default)]
pub struct DeferredTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl DeferredTasks {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_after<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Tasks not yet finished
    #[must_use]
    pub fn pending(&self) -> usize {
        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.len()
    }

    /// Abort every pending task
    pub fn cancel_all(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        if !handles.is_empty() {
            tracing::info!(count = handles.len(), "cancelling deferred tasks");
        }
        for handle in handles {
            handle.abort();
        }
    }

    /// Wait for every pending task to finish
    pub async fn shutdown(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        for result in join_all(handles).await {
            if let Err(e) = result {
                if e.is_panic() {
                    tracing::error!("deferred task panicked: {e}");
                }
            }
        }
    }
}

impl Drop for DeferredTasks {
    fn drop(&mut self) {
        for handle in self.handles.get_mut().drain(..) {
            handle.abort();
        }
    }
}
