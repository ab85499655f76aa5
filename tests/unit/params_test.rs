//! Tests for the parameter table

use corescale::config::{find_param, parse_value, Tunables, ENABLED_PARAM, PARAMS};
use corescale::core::ControllerError;

#[test]
fn test_table_names() {
    let names: Vec<&str> = PARAMS.iter().map(|p| p.name).collect();
    assert_eq!(
        names,
        vec![
            "sampling_period_ms",
            "collapse_on_idle",
            "min_active_units",
            "max_active_units",
            "scale_up_percent",
            "scale_down_percent",
            "cycles_up_required",
            "cycles_down_required",
        ]
    );
    assert!(find_param(ENABLED_PARAM).is_none());
}

#[test]
fn test_parse_value_trims_whitespace() {
    assert_eq!(parse_value("scale_up_percent", " 75\n").unwrap(), 75);
    assert!(matches!(
        parse_value("scale_up_percent", "-1"),
        Err(ControllerError::InvalidArgument(_))
    ));
    assert!(parse_value("scale_up_percent", "").is_err());
}

#[test]
fn test_min_and_max_bound_each_other() {
    let tunables = Tunables::with_defaults(6);
    let min = find_param("min_active_units").unwrap();
    let max = find_param("max_active_units").unwrap();

    assert_eq!(max.bounds(&tunables.snapshot(), 6), (2, 6));
    max.write(&tunables, 3).unwrap();
    assert_eq!(min.bounds(&tunables.snapshot(), 6), (1, 3));
    assert!(min.write(&tunables, 4).is_err());
    min.write(&tunables, 3).unwrap();
    assert_eq!(min.read(&tunables), 3);
    assert!(max.write(&tunables, 2).is_err());
    assert_eq!(max.read(&tunables), 3);
}

#[test]
fn test_collapse_flag_accepts_zero_and_one() {
    let tunables = Tunables::with_defaults(4);
    let flag = find_param("collapse_on_idle").unwrap();
    flag.write(&tunables, 0).unwrap();
    assert!(!tunables.collapse_on_idle());
    flag.write(&tunables, 1).unwrap();
    assert_eq!(flag.read(&tunables), 1);
    assert!(flag.write(&tunables, 2).is_err());
}

#[test]
fn test_out_of_bounds_message_names_parameter() {
    let tunables = Tunables::with_defaults(4);
    let err = find_param("cycles_up_required")
        .unwrap()
        .write(&tunables, 0)
        .unwrap_err();
    assert!(err.to_string().contains("cycles_up_required"));
    assert_eq!(tunables.cycles_up_required(), 2);
}
