//! In-process activity notifier.
//!
//! Whatever observes system activity (a display-state watcher, a tokio task,
//! a test) calls [`ChannelNotifier::notify`]; the controller receives the
//! events once it has registered.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use tracing::trace;

use crate::core::coordinator::{ActivityEvent, ActivityNotifier};
use crate::core::ControllerError;

/// Notifier backed by the registered channel sender.
#[derive(Debug, Default)]
pub struct ChannelNotifier {
    sender: Mutex<Option<Sender<ActivityEvent>>>,
    refuse_register: AtomicBool,
}

impl ChannelNotifier {
    /// Notifier with no subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to the subscriber. Returns false when nobody is
    /// registered or the subscriber is gone.
    pub fn notify(&self, event: ActivityEvent) -> bool {
        let sender = self.sender.lock();
        let delivered = sender.as_ref().is_some_and(|tx| tx.send(event).is_ok());
        trace!(?event, delivered, "activity notification");
        delivered
    }

    /// Whether a subscriber is registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Make subsequent registrations fail, to exercise startup rollback.
    pub fn refuse_registration(&self, refuse: bool) {
        self.refuse_register.store(refuse, Ordering::Relaxed);
    }
}

impl ActivityNotifier for ChannelNotifier {
    fn register(&self, sender: Sender<ActivityEvent>) -> Result<(), ControllerError> {
        if self.refuse_register.load(Ordering::Relaxed) {
            return Err(ControllerError::Startup("activity notifier refused registration".into()));
        }
        let mut slot = self.sender.lock();
        if slot.is_some() {
            return Err(ControllerError::Startup("activity notifier already has a subscriber".into()));
        }
        *slot = Some(sender);
        Ok(())
    }

    fn unregister(&self) {
        self.sender.lock().take();
    }
}
