//! Tests for utility functions

use corescale::util::{init_tracing, log_filter_from, now_ms, parse_cpu_list, DEFAULT_LOG_FILTER, MAX_CPU_ID};

#[test]
fn test_cpu_list_with_overlaps() {
    assert_eq!(parse_cpu_list("2-4,3,0").unwrap(), vec![0, 2, 3, 4]);
}

#[test]
fn test_cpu_list_single_cpu() {
    assert_eq!(parse_cpu_list("0\n").unwrap(), vec![0]);
}

#[test]
fn test_cpu_list_error_names_chunk() {
    let err = parse_cpu_list("0-3,x").unwrap_err();
    assert!(err.contains("`x`"));
}

#[test]
fn test_now_ms_is_monotonic_enough() {
    let a = now_ms();
    let b = now_ms();
    assert!(b >= a);
    assert!(a > 1_600_000_000_000);
}

#[test]
fn test_cpu_list_rejects_ranges_past_max_id() {
    let err = parse_cpu_list(&format!("0-{}", u64::from(MAX_CPU_ID) + 1)).unwrap_err();
    assert!(err.contains("exceeds"));
}

#[test]
fn test_log_filter_falls_back_to_default() {
    assert_eq!(log_filter_from(None).to_string(), DEFAULT_LOG_FILTER);
    assert_eq!(log_filter_from(Some("corescale=debug")).to_string(), "corescale=debug");
}

#[test]
fn test_init_tracing_installs_once() {
    let _ = init_tracing();
    assert!(!init_tracing());
}
