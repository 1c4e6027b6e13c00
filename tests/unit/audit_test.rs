//! Tests for audit sink

use cell_rep::core::{
    AuditAction, AuditSink, AuditTrail, InMemoryAuditSink, SharedAuditSink, build_audit_event,
};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event("T1", "cell-a", AuditAction::Admitted, None);
    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].task_guid, "T1");
    assert_eq!(events[0].cell_id, "cell-a");
    assert_eq!(events[0].action, AuditAction::Admitted);
    assert!(events[0].created_at_ms > 0);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    for guid in ["T1", "T2", "T3"] {
        sink.record(build_audit_event(guid, "cell-a", AuditAction::Started, None));
    }

    let guids: Vec<_> = sink.events().into_iter().map(|e| e.task_guid).collect();
    assert_eq!(guids, vec!["T2", "T3"]);
}

#[test]
fn test_zero_capacity_sink_drops_everything() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event("T1", "cell-a", AuditAction::Failed, None));
    assert!(sink.events().is_empty());
}

#[test]
fn test_event_ids_are_unique() {
    let a = build_audit_event("T1", "cell-a", AuditAction::Ignored, None);
    let b = build_audit_event("T1", "cell-a", AuditAction::Ignored, None);
    assert_ne!(a.event_id, b.event_id);
}

#[test]
fn test_trail_shares_one_sink() {
    let shared = SharedAuditSink::new(8);
    let trail = AuditTrail::new(Box::new(shared.clone()));
    let copy = trail.clone();

    trail.record("T1", "cell-a", AuditAction::Admitted, None);
    copy.record(
        "T1",
        "cell-a",
        AuditAction::Failed,
        Some("failed to run container".into()),
    );

    assert_eq!(
        shared.actions_for("T1"),
        vec![AuditAction::Admitted, AuditAction::Failed]
    );
    assert_eq!(
        shared.events()[1].detail.as_deref(),
        Some("failed to run container")
    );
}

#[test]
fn test_disabled_trail_is_silent() {
    AuditTrail::disabled().record("T1", "cell-a", AuditAction::Completed, None);
    assert_eq!(AuditAction::Completed.to_string(), "completed");
}
