//! One-shot timer that resets the surfaced error after a delay.
//!
//! At most one clear task is pending: arming again aborts the previous task,
//! so a newer error always gets its full display window.

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{runtime::Handle, task::JoinHandle, time::sleep};
use tracing::warn;

#[derive(Default)]
pub(crate) struct ClearScheduler {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ClearScheduler {
    /// Runs `expire` after `delay` on the ambient tokio runtime. Returns
    /// `false` (and leaves the error in place) when there is no runtime.
    pub(crate) fn arm<F>(&self, delay: Duration, expire: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            warn!("no tokio runtime available; error will stay until cleared explicitly");
            return false;
        };

        let task = runtime.spawn(async move {
            sleep(delay).await;
            expire();
        });
        if let Some(previous) = self.pending().replace(task) {
            previous.abort();
        }
        true
    }

    pub(crate) fn cancel(&self) {
        if let Some(previous) = self.pending().take() {
            previous.abort();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.pending()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ClearScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
