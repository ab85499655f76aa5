//! Cancellable repeating task on a dedicated OS thread.
//!
//! # Design
//!
//! - **One thread, no overlap**: the tick runs to completion before the next
//!   delay starts, so two ticks never overlap.
//! - **No polling**: the thread sleeps on a `Condvar` with a deadline and is
//!   woken early only by cancellation.
//! - **Synchronous cancel**: [`PeriodicTask::cancel`] signals the thread and
//!   joins it. When it returns, no tick is running and none will start.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::core::ControllerError;

/// Cancellation flag paired with the condvar the task sleeps on.
struct CancelSignal {
    cancelled: Mutex<bool>,
    condvar: Condvar,
}

impl CancelSignal {
    /// Sleep until `deadline` or cancellation. Returns true when cancelled.
    fn sleep_until(&self, deadline: Instant) -> bool {
        let mut cancelled = self.cancelled.lock();
        while !*cancelled {
            if self.condvar.wait_until(&mut cancelled, deadline).timed_out() {
                break;
            }
        }
        *cancelled
    }

    fn cancel(&self) {
        *self.cancelled.lock() = true;
        self.condvar.notify_all();
    }
}

/// Handle to a running periodic task. Dropping the handle cancels the task.
pub struct PeriodicTask {
    name: String,
    signal: Arc<CancelSignal>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn a task that first waits `initial_delay`, then calls `tick` and
    /// waits `period()` between consecutive ticks. `period` is evaluated after
    /// every tick so period changes apply from the next delay on.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Startup`] when the thread cannot be spawned.
    pub fn spawn<T, D>(
        name: &str,
        initial_delay: Duration,
        period: D,
        mut tick: T,
    ) -> Result<Self, ControllerError>
    where
        T: FnMut() + Send + 'static,
        D: Fn() -> Duration + Send + 'static,
    {
        let signal = Arc::new(CancelSignal {
            cancelled: Mutex::new(false),
            condvar: Condvar::new(),
        });
        let thread_signal = Arc::clone(&signal);
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                debug!(task = %thread_name, "periodic task started");
                let mut delay = initial_delay;
                loop {
                    if thread_signal.sleep_until(Instant::now() + delay) {
                        break;
                    }
                    tick();
                    delay = period();
                }
                debug!(task = %thread_name, "periodic task exiting");
            })
            .map_err(|e| ControllerError::Startup(format!("cannot spawn `{name}` thread: {e}")))?;

        Ok(Self {
            name: name.to_string(),
            signal,
            handle: Some(handle),
        })
    }

    /// Name the task thread was spawned with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cancel the task and wait for an in-flight tick to finish.
    pub fn cancel(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.signal.cancel();
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            // Cancelled from inside a tick: the loop exits once the tick returns.
            return;
        }
        if handle.join().is_err() {
            warn!(task = %self.name, "periodic task panicked");
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}
