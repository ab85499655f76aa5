//! Controller: owns the decision cycle, the activity coordinator and the
//! enable/disable lifecycle.
//!
//! # Concurrency
//!
//! - The decision cycle runs on a [`PeriodicTask`] thread and only takes the
//!   sampler mutex.
//! - Activity transitions and enable/disable take the lifecycle mutex and
//!   cancel-and-join the periodic task before touching the pool, so a
//!   transition never overlaps an in-flight cycle.
//! - Activity events arrive on a crossbeam channel consumed by a single
//!   event thread, strictly in delivery order.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::params::{find_param, parse_value, ENABLED_PARAM, PARAMS};
use crate::config::Tunables;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::coordinator::{
    collapse_pool, restore_pool, ActivityCoordinator, ActivityEvent, ActivityNotifier,
    CoordinatorState, Transition,
};
use crate::core::pool::{activate_all, CpuPool, FrequencyProbe, UnitId};
use crate::core::sampler::{CycleAction, CycleReport, Sampler};
use crate::core::ControllerError;
use crate::runtime::periodic::PeriodicTask;

/// Grace delay before the first decision cycle after enabling.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(30);

const SAMPLER_THREAD: &str = "corescale-sampler";
const EVENT_THREAD: &str = "corescale-events";

/// Controller statistics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStats {
    /// Decision cycles run.
    pub cycles: u64,
    /// Units activated by the decision cycle.
    pub scale_ups: u64,
    /// Units deactivated by the decision cycle.
    pub scale_downs: u64,
    /// Pool requests that failed, from any component.
    pub failed_pool_ops: u64,
    /// Suspend transitions carried out.
    pub suspends: u64,
    /// Resume transitions carried out.
    pub resumes: u64,
}

/// Internal counters (lock-free atomics).
#[derive(Debug, Default)]
struct ControllerCounters {
    cycles: AtomicU64,
    scale_ups: AtomicU64,
    scale_downs: AtomicU64,
    failed_pool_ops: AtomicU64,
    suspends: AtomicU64,
    resumes: AtomicU64,
}

impl ControllerCounters {
    fn snapshot(&self) -> ControllerStats {
        ControllerStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            scale_ups: self.scale_ups.load(Ordering::Relaxed),
            scale_downs: self.scale_downs.load(Ordering::Relaxed),
            failed_pool_ops: self.failed_pool_ops.load(Ordering::Relaxed),
            suspends: self.suspends.load(Ordering::Relaxed),
            resumes: self.resumes.load(Ordering::Relaxed),
        }
    }

    fn add_failures(&self, failures: usize) {
        if failures > 0 {
            self.failed_pool_ops.fetch_add(failures as u64, Ordering::Relaxed);
        }
    }
}

/// State guarded by the lifecycle mutex.
struct Lifecycle {
    coordinator: ActivityCoordinator,
    task: Option<PeriodicTask>,
}

/// State shared with the sampler and event threads.
struct Shared<P, F> {
    pool: P,
    probe: F,
    tunables: Arc<Tunables>,
    initial_delay: Duration,
    enabled: AtomicBool,
    sampler: Mutex<Sampler>,
    lifecycle: Mutex<Lifecycle>,
    counters: ControllerCounters,
    audit: Mutex<Option<Box<dyn AuditSink>>>,
}

impl<P, F> Shared<P, F>
where
    P: CpuPool + 'static,
    F: FrequencyProbe + 'static,
{
    fn period(&self) -> Duration {
        Duration::from_millis(u64::from(self.tunables.sampling_period_ms()))
    }

    fn record(&self, action: AuditAction, unit: Option<UnitId>) {
        let mut audit = self.audit.lock();
        if let Some(sink) = audit.as_mut() {
            let active = u32::try_from(self.pool.active_units().len()).unwrap_or(u32::MAX);
            sink.record(build_audit_event(action, unit, active));
        }
    }

    fn run_cycle(&self) -> CycleReport {
        let report = self
            .sampler
            .lock()
            .run_cycle(&self.pool, &self.probe, &self.tunables);
        self.counters.cycles.fetch_add(1, Ordering::Relaxed);
        match report.action {
            CycleAction::Activated(unit) => {
                self.counters.scale_ups.fetch_add(1, Ordering::Relaxed);
                self.record(AuditAction::ScaleUp, Some(unit));
            }
            CycleAction::Deactivated(unit) => {
                self.counters.scale_downs.fetch_add(1, Ordering::Relaxed);
                self.record(AuditAction::ScaleDown, Some(unit));
            }
            CycleAction::Failed(_) => self.counters.add_failures(1),
            CycleAction::None => {}
        }
        report
    }

    fn spawn_sampler(self: &Arc<Self>, delay: Duration) -> Result<PeriodicTask, ControllerError> {
        let cycle = Arc::clone(self);
        let tunables = Arc::clone(&self.tunables);
        PeriodicTask::spawn(
            SAMPLER_THREAD,
            delay,
            move || Duration::from_millis(u64::from(tunables.sampling_period_ms())),
            move || {
                cycle.run_cycle();
            },
        )
    }

    fn handle_event(self: &Arc<Self>, event: ActivityEvent) {
        let mut lifecycle = self.lifecycle.lock();
        if !self.enabled.load(Ordering::Acquire) {
            debug!(?event, "controller disabled, activity event ignored");
            return;
        }

        match lifecycle.coordinator.on_event(event) {
            Some(Transition::Suspend) => {
                if let Some(task) = lifecycle.task.take() {
                    task.cancel();
                }
                if self.tunables.collapse_on_idle() {
                    self.counters.add_failures(collapse_pool(&self.pool));
                }
                self.counters.suspends.fetch_add(1, Ordering::Relaxed);
                self.record(AuditAction::Suspended, None);
                info!("corescale suspended");
            }
            Some(Transition::Resume) => {
                if self.tunables.collapse_on_idle() {
                    let max_active = self.tunables.max_active_units();
                    self.counters.add_failures(restore_pool(&self.pool, max_active));
                }
                match self.spawn_sampler(self.period()) {
                    Ok(task) => lifecycle.task = Some(task),
                    Err(e) => error!(error = %e, "cannot resume decision cycle"),
                }
                self.counters.resumes.fetch_add(1, Ordering::Relaxed);
                self.record(AuditAction::Resumed, None);
                info!("corescale resumed");
            }
            None => debug!(?event, state = %lifecycle.coordinator.state(), "activity event ignored"),
        }
    }
}

/// Handle to the event-consumer thread.
struct EventWorker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl EventWorker {
    fn spawn<P, F>(
        shared: Arc<Shared<P, F>>,
        events: Receiver<ActivityEvent>,
    ) -> Result<Self, ControllerError>
    where
        P: CpuPool + 'static,
        F: FrequencyProbe + 'static,
    {
        let (stop, stop_rx) = unbounded::<()>();
        let handle = thread::Builder::new()
            .name(EVENT_THREAD.into())
            .spawn(move || loop {
                select! {
                    recv(events) -> msg => match msg {
                        Ok(event) => shared.handle_event(event),
                        Err(_) => break,
                    },
                    recv(stop_rx) -> _ => break,
                }
            })
            .map_err(|e| ControllerError::Startup(format!("cannot spawn event thread: {e}")))?;
        Ok(Self { stop, handle })
    }

    fn join(self) {
        drop(self.stop);
        if self.handle.join().is_err() {
            warn!("event thread panicked");
        }
    }
}

/// Dynamic core-scaling controller.
pub struct Controller<P, F, N>
where
    P: CpuPool + 'static,
    F: FrequencyProbe + 'static,
    N: ActivityNotifier,
{
    shared: Arc<Shared<P, F>>,
    notifier: N,
    /// Serializes enable/disable and owns the event thread while enabled.
    toggle: Mutex<Option<EventWorker>>,
}

impl<P, F, N> Controller<P, F, N>
where
    P: CpuPool + 'static,
    F: FrequencyProbe + 'static,
    N: ActivityNotifier,
{
    /// Create a disabled controller.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidConfig`] when `tunables` were validated
    /// against a different capacity than the pool reports.
    pub fn new(
        pool: P,
        probe: F,
        notifier: N,
        tunables: Arc<Tunables>,
        initial_delay: Duration,
    ) -> Result<Self, ControllerError> {
        if tunables.capacity() != pool.capacity() {
            return Err(ControllerError::InvalidConfig(format!(
                "tunables sized for {} units, pool has {}",
                tunables.capacity(),
                pool.capacity()
            )));
        }
        Ok(Self {
            shared: Arc::new(Shared {
                pool,
                probe,
                tunables,
                initial_delay,
                enabled: AtomicBool::new(false),
                sampler: Mutex::new(Sampler::new()),
                lifecycle: Mutex::new(Lifecycle {
                    coordinator: ActivityCoordinator::new(),
                    task: None,
                }),
                counters: ControllerCounters::default(),
                audit: Mutex::new(None),
            }),
            notifier,
            toggle: Mutex::new(None),
        })
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(self, audit: Box<dyn AuditSink>) -> Self {
        *self.shared.audit.lock() = Some(audit);
        self
    }

    /// Shared tunables.
    #[must_use]
    pub fn tunables(&self) -> &Arc<Tunables> {
        &self.shared.tunables
    }

    /// The managed pool.
    #[must_use]
    pub fn pool(&self) -> &P {
        &self.shared.pool
    }

    /// Whether the control loop is running.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::Acquire)
    }

    /// Current coordinator state.
    #[must_use]
    pub fn state(&self) -> CoordinatorState {
        self.shared.lifecycle.lock().coordinator.state()
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> ControllerStats {
        self.shared.counters.snapshot()
    }

    /// Current hysteresis counter.
    #[must_use]
    pub fn cycle_counter(&self) -> u32 {
        self.shared.sampler.lock().cycle()
    }

    /// Enable or disable the controller.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::InvalidArgument`] when `enabled` matches the current state
    /// - [`ControllerError::Startup`] when enabling cannot acquire its resources
    pub fn set_enabled(&self, enabled: bool) -> Result<(), ControllerError> {
        if enabled {
            self.enable()
        } else {
            self.disable()
        }
    }

    /// Start the controller: schedule the first cycle after the grace delay,
    /// start the event thread and subscribe to activity events.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::InvalidArgument`] if already enabled
    /// - [`ControllerError::Startup`] if the sampler thread, the event thread or
    ///   the notifier registration fails; nothing stays running in that case
    pub fn enable(&self) -> Result<(), ControllerError> {
        let mut worker = self.toggle.lock();
        if self.is_enabled() {
            return Err(ControllerError::InvalidArgument("controller already enabled".into()));
        }

        let task = self.shared.spawn_sampler(self.shared.initial_delay)?;
        let (events_tx, events_rx) = unbounded();
        let event_worker = match EventWorker::spawn(Arc::clone(&self.shared), events_rx) {
            Ok(w) => w,
            Err(e) => {
                task.cancel();
                error!(error = %e, "unable to start event thread");
                return Err(e);
            }
        };

        {
            let mut lifecycle = self.shared.lifecycle.lock();
            lifecycle.coordinator.reset();
            lifecycle.task = Some(task);
            self.shared.enabled.store(true, Ordering::Release);
        }

        if let Err(e) = self.notifier.register(events_tx) {
            error!(error = %e, "unable to register activity notifier");
            {
                let mut lifecycle = self.shared.lifecycle.lock();
                self.shared.enabled.store(false, Ordering::Release);
                if let Some(task) = lifecycle.task.take() {
                    task.cancel();
                }
            }
            self.notifier.unregister();
            event_worker.join();
            return Err(if matches!(e, ControllerError::Startup(_)) {
                e
            } else {
                ControllerError::Startup(e.to_string())
            });
        }

        *worker = Some(event_worker);
        self.shared.record(AuditAction::Started, None);
        info!(
            initial_delay_ms = self.shared.initial_delay.as_millis(),
            capacity = self.shared.pool.capacity(),
            "corescale started"
        );
        Ok(())
    }

    /// Stop the controller: cancel the pending cycle, unsubscribe from
    /// activity events, then bring every unit of the pool online.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidArgument`] if already disabled.
    pub fn disable(&self) -> Result<(), ControllerError> {
        let mut worker = self.toggle.lock();
        if !self.is_enabled() {
            return Err(ControllerError::InvalidArgument("controller already disabled".into()));
        }

        {
            let mut lifecycle = self.shared.lifecycle.lock();
            self.shared.enabled.store(false, Ordering::Release);
            if let Some(task) = lifecycle.task.take() {
                task.cancel();
            }
        }
        self.notifier.unregister();
        if let Some(event_worker) = worker.take() {
            event_worker.join();
        }

        self.shared.counters.add_failures(activate_all(&self.shared.pool));
        self.shared.record(AuditAction::Stopped, None);
        info!("corescale stopped");
        Ok(())
    }

    /// Process an activity event synchronously on the caller's thread.
    ///
    /// Events from the registered notifier go through the same path on the
    /// event thread; this entry point serves embedders that drive the
    /// controller directly.
    pub fn handle_activity(&self, event: ActivityEvent) {
        self.shared.handle_event(event);
    }

    /// Run one decision cycle immediately, serialized with activity
    /// transitions. Returns `None` unless the controller is enabled and running.
    pub fn run_cycle_now(&self) -> Option<CycleReport> {
        let lifecycle = self.shared.lifecycle.lock();
        if !self.is_enabled() || lifecycle.coordinator.state() != CoordinatorState::Running {
            return None;
        }
        Some(self.shared.run_cycle())
    }

    /// Read a parameter by name.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::UnknownParameter`] for unknown names.
    pub fn param(&self, name: &str) -> Result<u32, ControllerError> {
        if name == ENABLED_PARAM {
            return Ok(u32::from(self.is_enabled()));
        }
        find_param(name)
            .map(|spec| spec.read(&self.shared.tunables))
            .ok_or_else(|| ControllerError::UnknownParameter(name.to_string()))
    }

    /// Write a parameter by name from its raw textual form.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::UnknownParameter`] for unknown names
    /// - [`ControllerError::InvalidArgument`] for unparsable, out-of-bounds or
    ///   redundant values; the configuration is left unchanged
    /// - [`ControllerError::Startup`] when enabling fails
    pub fn set_param(&self, name: &str, raw: &str) -> Result<(), ControllerError> {
        if name == ENABLED_PARAM {
            return match parse_value(name, raw)? {
                0 => self.set_enabled(false),
                1 => self.set_enabled(true),
                other => Err(ControllerError::InvalidArgument(format!(
                    "{name}: must be 0 or 1, got {other}"
                ))),
            };
        }
        let spec = find_param(name).ok_or_else(|| ControllerError::UnknownParameter(name.to_string()))?;
        let value = parse_value(name, raw)?;
        spec.write(&self.shared.tunables, value)?;
        debug!(param = name, value, "parameter updated");
        Ok(())
    }

    /// Every parameter with its current value, `enabled` first.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, u32)> {
        std::iter::once((ENABLED_PARAM, u32::from(self.is_enabled())))
            .chain(PARAMS.iter().map(|spec| (spec.name, spec.read(&self.shared.tunables))))
            .collect()
    }
}

impl<P, F, N> Drop for Controller<P, F, N>
where
    P: CpuPool + 'static,
    F: FrequencyProbe + 'static,
    N: ActivityNotifier,
{
    fn drop(&mut self) {
        if self.is_enabled() {
            debug!("controller dropped while enabled, stopping");
            let _ = self.disable();
        }
    }
}
