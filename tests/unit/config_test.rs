//! Tests for configuration validation

use std::sync::Arc;
use std::thread;

use corescale::config::{ControllerConfig, Tunables, TunablesSnapshot};

#[test]
fn test_defaults_for_small_pools() {
    let single = TunablesSnapshot::defaults_for(1);
    assert_eq!(single.max_active_units, 1);
    assert_eq!(single.min_active_units, 1);
    assert!(single.validate(1).is_ok());

    let eight = TunablesSnapshot::defaults_for(8);
    assert_eq!(eight.sampling_period_ms, 50);
    assert_eq!((eight.min_active_units, eight.max_active_units), (2, 8));
    assert_eq!((eight.scale_up_percent, eight.scale_down_percent), (60, 40));
    assert_eq!((eight.cycles_up_required, eight.cycles_down_required), (2, 2));
}

#[test]
fn test_snapshot_validation() {
    let valid = TunablesSnapshot::defaults_for(4);
    assert!(valid.validate(4).is_ok());

    let crossed = TunablesSnapshot {
        min_active_units: 4,
        max_active_units: 3,
        ..valid
    };
    assert!(crossed.validate(4).is_err());

    let too_many = TunablesSnapshot {
        max_active_units: 5,
        ..valid
    };
    assert!(too_many.validate(4).is_err());

    let zero_percent = TunablesSnapshot {
        scale_up_percent: 0,
        ..valid
    };
    assert!(zero_percent.validate(4).is_err());
}

#[test]
fn test_update_rejects_and_keeps_state() {
    let tunables = Tunables::with_defaults(4);
    let before = tunables.snapshot();
    let result = tunables.update(|s| {
        s.max_active_units = 1;
        Ok(())
    });
    assert!(result.is_err());
    assert_eq!(tunables.snapshot(), before);
}

#[test]
fn test_concurrent_updates_keep_min_below_max() {
    let tunables = Arc::new(Tunables::with_defaults(8));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let tunables = Arc::clone(&tunables);
            thread::spawn(move || {
                for n in 1..=8 {
                    let _ = tunables.update(|s| {
                        if i % 2 == 0 {
                            s.min_active_units = n;
                        } else {
                            s.max_active_units = 9 - n;
                        }
                        Ok(())
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let snap = tunables.snapshot();
    assert!(snap.min_active_units <= snap.max_active_units);
}

#[test]
fn test_controller_config_from_json() {
    let cfg = ControllerConfig::from_json_str(
        r#"{
            "tunables": {
                "sampling_period_ms": 100,
                "collapse_on_idle": false,
                "max_active_units": 4,
                "min_active_units": 1,
                "scale_up_percent": 70,
                "scale_down_percent": 30,
                "cycles_up_required": 3,
                "cycles_down_required": 1
            },
            "initial_delay_ms": 0,
            "enabled": true
        }"#,
    )
    .unwrap();
    assert!(cfg.enabled);
    assert_eq!(cfg.initial_delay_ms, 0);
    let tunables = cfg.tunables_for(4).unwrap();
    assert!(!tunables.collapse_on_idle());
    assert_eq!(tunables.sampling_period_ms(), 100);
    assert!(cfg.tunables_for(2).is_err());
}

#[test]
fn test_controller_config_rejects_bad_documents() {
    assert!(ControllerConfig::from_json_str("not json").is_err());
    assert!(ControllerConfig::from_json_str(r#"{ "params": { "turbo": "1" } }"#).is_err());
    assert!(ControllerConfig::from_json_str(r#"{ "params": { "enabled": "1" } }"#).is_err());
    assert!(ControllerConfig::from_json_str(r#"{ "params": { "max_active_units": "x" } }"#).is_err());
    assert!(ControllerConfig::from_json_str(r#"{ "sysfs_root": "" }"#).is_err());
}

#[test]
fn test_controller_config_from_vars() {
    let cfg = ControllerConfig::from_vars(vec![
        ("CORESCALE_INITIAL_DELAY_MS".to_string(), "250".to_string()),
        ("CORESCALE_SYSFS_ROOT".to_string(), "/tmp/cpu".to_string()),
        ("CORESCALE_SCALE_DOWN_PERCENT".to_string(), "25".to_string()),
    ])
    .unwrap();
    assert_eq!(cfg.initial_delay_ms, 250);
    assert_eq!(cfg.sysfs_root.to_str(), Some("/tmp/cpu"));
    assert_eq!(cfg.tunables_for(4).unwrap().scale_down_percent(), 25);

    let bad = ControllerConfig::from_vars(vec![("CORESCALE_ENABLED".to_string(), "maybe".to_string())]);
    assert!(bad.is_err());
}

#[test]
fn test_config_errors_name_the_offending_input() {
    let cfg = ControllerConfig::from_json_str(r#"{ "params": { "scale_up_percent": "150" } }"#).unwrap();
    let err = cfg.tunables_for(4).unwrap_err();
    assert!(err.contains("scale_up_percent"), "{err}");

    let err = ControllerConfig::from_json_str(r#"{ "params": { "turbo": "1" } }"#).unwrap_err();
    assert!(err.contains("turbo"), "{err}");

    let err = ControllerConfig::from_vars(vec![(
        "CORESCALE_INITIAL_DELAY_MS".to_string(),
        "soon".to_string(),
    )])
    .unwrap_err();
    assert!(format!("{err:#}").contains("CORESCALE_INITIAL_DELAY_MS"), "{err:#}");

    let err = ControllerConfig::from_vars(vec![(
        "CORESCALE_CYCLES_UP_REQUIRED".to_string(),
        "many".to_string(),
    )])
    .unwrap_err();
    assert!(format!("{err:#}").contains("cycles_up_required"), "{err:#}");
}
