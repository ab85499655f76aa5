//! Bridge from a tokio `watch` activity signal to a [`ChannelNotifier`].

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::ActivityEvent;
use crate::infra::ChannelNotifier;

/// Forwards activity changes observed on a tokio runtime.
#[derive(Clone)]
pub struct TokioActivityBridge {
    handle: Arc<tokio::runtime::Handle>,
}

impl TokioActivityBridge {
    /// Bridge running on the given runtime.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Bridge running on the runtime of the calling task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }

    /// Forward every change of `signal` to `notifier` until the sender side
    /// of the watch channel is dropped. The value present at call time is
    /// treated as already seen.
    pub fn forward(
        &self,
        mut signal: watch::Receiver<ActivityEvent>,
        notifier: Arc<ChannelNotifier>,
    ) -> JoinHandle<()> {
        // Mark the current value seen here, not in the task: a change sent
        // before the task is first polled must still be delivered.
        signal.mark_unchanged();
        self.handle.spawn(async move {
            while signal.changed().await.is_ok() {
                let event = *signal.borrow_and_update();
                notifier.notify(event);
            }
            debug!("activity signal closed, bridge exiting");
        })
    }
}
