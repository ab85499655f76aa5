//! Tests for audit sink

use std::sync::Arc;

use corescale::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};
use parking_lot::Mutex;

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);
    sink.record(build_audit_event(AuditAction::ScaleUp, Some(2), 3));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::ScaleUp);
    assert_eq!(events[0].unit, Some(2));
    assert_eq!(events[0].active_units, 3);
    assert!(events[0].created_at_ms > 0);
}

#[test]
fn test_zero_capacity_sink_records_nothing() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event(AuditAction::Started, None, 4));
    assert!(sink.events().is_empty());
}

#[test]
fn test_shared_sink_is_readable_by_owner() {
    let shared = Arc::new(Mutex::new(InMemoryAuditSink::new(4)));
    let mut writer: Box<dyn AuditSink> = Box::new(Arc::clone(&shared));
    writer.record(build_audit_event(AuditAction::Suspended, None, 1));
    assert_eq!(shared.lock().events()[0].action, AuditAction::Suspended);
}

#[test]
fn test_audit_event_serializes_snake_case() {
    let event = build_audit_event(AuditAction::ScaleDown, Some(5), 2);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "scale_down");
    assert_eq!(json["unit"], 5);
}

#[test]
fn test_events_of_filters_by_action_and_counts_evictions() {
    let mut sink = InMemoryAuditSink::new(3);
    sink.record(build_audit_event(AuditAction::Started, None, 4));
    sink.record(build_audit_event(AuditAction::ScaleDown, Some(3), 3));
    sink.record(build_audit_event(AuditAction::ScaleDown, Some(2), 2));
    sink.record(build_audit_event(AuditAction::ScaleUp, Some(2), 3));

    let downs: Vec<_> = sink.events_of(AuditAction::ScaleDown).iter().map(|e| e.unit).collect();
    assert_eq!(downs, vec![Some(3), Some(2)]);
    assert!(sink.events_of(AuditAction::Started).is_empty());
    assert_eq!(sink.evicted(), 1);
}
