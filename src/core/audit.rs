//! Audit trail of lifecycle decisions taken by a cell.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::util::clock::now_ms;

/// Lifecycle decision recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Desired task skipped because its stack differs from the cell's.
    Ignored,
    /// Task allocated, claimed and initialized on this cell.
    Admitted,
    /// Container deleted to undo a partial admission or a rejected start.
    Compensated,
    /// Task started in the store by this cell.
    Started,
    /// Task completed in the store by this cell.
    Completed,
    /// Task marked failed by this cell.
    Failed,
}

impl AuditAction {
    /// Stable name of the action.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Admitted => "admitted",
            Self::Compensated => "compensated",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Task the decision concerns.
    pub task_guid: String,
    /// Cell that took the decision.
    pub cell_id: String,
    /// Decision taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Helper to build an audit event with a fresh id and timestamp.
pub fn build_audit_event(
    task_guid: impl Into<String>,
    cell_id: impl Into<String>,
    action: AuditAction,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        task_guid: task_guid.into(),
        cell_id: cell_id.into(),
        action,
        created_at_ms: now_ms(),
        detail,
    }
}

/// Shared, optional audit sink handle used by the scheduler and processor.
#[derive(Clone, Default)]
pub struct AuditTrail {
    sink: Option<Arc<Mutex<Box<dyn AuditSink>>>>,
}

impl AuditTrail {
    /// Trail that records into `sink`.
    pub fn new(sink: Box<dyn AuditSink>) -> Self {
        Self {
            sink: Some(Arc::new(Mutex::new(sink))),
        }
    }

    /// Trail that drops every event.
    pub const fn disabled() -> Self {
        Self { sink: None }
    }

    /// Record a decision if a sink is attached.
    pub fn record(&self, task_guid: &str, cell_id: &str, action: AuditAction, detail: Option<String>) {
        if let Some(sink) = &self.sink {
            sink.lock()
                .record(build_audit_event(task_guid, cell_id, action, detail));
        }
    }
}

/// Audit sink that shares its buffer, so tests can inspect what a cell recorded.
#[derive(Clone)]
pub struct SharedAuditSink {
    inner: Arc<Mutex<InMemoryAuditSink>>,
}

impl SharedAuditSink {
    /// Create a shared sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InMemoryAuditSink::new(max_events))),
        }
    }

    /// Snapshot of recorded events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.inner.lock().events()
    }

    /// Actions recorded for one task, in order.
    pub fn actions_for(&self, task_guid: &str) -> Vec<AuditAction> {
        self.inner
            .lock()
            .events()
            .into_iter()
            .filter(|e| e.task_guid == task_guid)
            .map(|e| e.action)
            .collect()
    }
}

impl AuditSink for SharedAuditSink {
    fn record(&mut self, event: AuditEvent) {
        self.inner.lock().record(event);
    }
}
