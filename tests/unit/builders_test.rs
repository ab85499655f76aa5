//! Tests for builder modules

use std::sync::Arc;

use corescale::builders::build_controller;
use corescale::config::ControllerConfig;
use corescale::core::{ControllerError, CpuPool};
use corescale::infra::{ChannelNotifier, SimulatedPool};

fn config(json: &str) -> ControllerConfig {
    ControllerConfig::from_json_str(json).unwrap()
}

#[test]
fn test_build_controller_defaults() {
    let pool = Arc::new(SimulatedPool::new(4, 1_000));
    let controller = build_controller(
        &ControllerConfig::default(),
        Arc::clone(&pool),
        Arc::clone(&pool),
        ChannelNotifier::new(),
    )
    .unwrap();
    assert!(!controller.is_enabled());
    assert_eq!(controller.tunables().max_active_units(), 4);
    assert_eq!(controller.tunables().min_active_units(), 2);
}

#[test]
fn test_build_controller_enables_when_configured() {
    let pool = Arc::new(SimulatedPool::new(4, 1_000));
    pool.set_active(&[0]);
    let notifier = Arc::new(ChannelNotifier::new());
    let controller = build_controller(
        &config(r#"{ "enabled": true, "initial_delay_ms": 3600000 }"#),
        Arc::clone(&pool),
        Arc::clone(&pool),
        Arc::clone(&notifier),
    )
    .unwrap();
    assert!(controller.is_enabled());
    assert!(notifier.is_registered());

    drop(controller);
    assert_eq!(pool.active_units(), vec![0, 1, 2, 3]);
}

#[test]
fn test_build_controller_rejects_tunables_for_pool() {
    let pool = Arc::new(SimulatedPool::new(2, 1_000));
    let result = build_controller(
        &config(r#"{ "params": { "max_active_units": "4" } }"#),
        Arc::clone(&pool),
        Arc::clone(&pool),
        ChannelNotifier::new(),
    );
    assert!(matches!(result, Err(ControllerError::InvalidConfig(_))));
}

#[test]
fn test_build_controller_reports_startup_failure() {
    let pool = Arc::new(SimulatedPool::new(2, 1_000));
    let notifier = ChannelNotifier::new();
    notifier.refuse_registration(true);
    let result = build_controller(
        &config(r#"{ "enabled": true }"#),
        Arc::clone(&pool),
        Arc::clone(&pool),
        notifier,
    );
    assert!(matches!(result, Err(ControllerError::Startup(_))));
}
