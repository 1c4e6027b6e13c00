//! In-memory task store with compare-and-set semantics and ownership.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::core::{DesiredTaskFeed, FailureReason, StoreError, Task, TaskState, TaskStore};

/// Stored state of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    /// Desired task.
    pub task: Task,
    /// Lifecycle state.
    pub state: TaskState,
    /// Owning cell, once claimed or started.
    pub cell_id: Option<String>,
    /// Run failed flag, set on completion or failure.
    pub failed: bool,
    /// Failure reason, set on completion or failure.
    pub failure_reason: String,
    /// Result payload, set on completion.
    pub result: String,
}

impl TaskRecord {
    /// A pending record for `task`.
    pub const fn pending(task: Task) -> Self {
        Self {
            task,
            state: TaskState::Pending,
            cell_id: None,
            failed: false,
            failure_reason: String::new(),
            result: String::new(),
        }
    }

    /// Record already in `state` and owned by `cell_id`.
    pub fn owned(task: Task, state: TaskState, cell_id: impl Into<String>) -> Self {
        Self {
            state,
            cell_id: Some(cell_id.into()),
            ..Self::pending(task)
        }
    }

    fn owned_by(&self, cell_id: &str) -> bool {
        self.cell_id.as_deref() == Some(cell_id)
    }
}

/// Store operation that can have an error injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// `claim_task`.
    Claim,
    /// `start_task`.
    Start,
    /// `complete_task`.
    Complete,
    /// `fail_task`.
    Fail,
}

/// A call made against the store, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    /// `claim_task(guid, cell_id)`.
    Claim {
        /// Task guid.
        guid: String,
        /// Claiming cell.
        cell_id: String,
    },
    /// `start_task(guid, cell_id)`.
    Start {
        /// Task guid.
        guid: String,
        /// Starting cell.
        cell_id: String,
    },
    /// `complete_task(guid, cell_id, failed, failure_reason, result)`.
    Complete {
        /// Task guid.
        guid: String,
        /// Completing cell.
        cell_id: String,
        /// Run failed flag.
        failed: bool,
        /// Failure reason.
        failure_reason: String,
        /// Result payload.
        result: String,
    },
    /// `fail_task(guid, reason)`.
    Fail {
        /// Task guid.
        guid: String,
        /// Failure reason.
        reason: FailureReason,
    },
}

impl StoreCall {
    /// Guid the call targeted.
    pub fn guid(&self) -> &str {
        match self {
            Self::Claim { guid, .. }
            | Self::Start { guid, .. }
            | Self::Complete { guid, .. }
            | Self::Fail { guid, .. } => guid,
        }
    }

    const fn operation(&self) -> StoreOperation {
        match self {
            Self::Claim { .. } => StoreOperation::Claim,
            Self::Start { .. } => StoreOperation::Start,
            Self::Complete { .. } => StoreOperation::Complete,
            Self::Fail { .. } => StoreOperation::Fail,
        }
    }
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, TaskRecord>,
    subscribers: Vec<mpsc::UnboundedSender<Task>>,
    injected: HashMap<StoreOperation, StoreError>,
    calls: Vec<StoreCall>,
}

impl Inner {
    /// Log the call and return the injected error for its operation, if any.
    fn admit_call(&mut self, call: StoreCall) -> Result<(), StoreError> {
        let op = call.operation();
        self.calls.push(call);
        match self.injected.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn record_mut(&mut self, guid: &str) -> Result<&mut TaskRecord, StoreError> {
        self.records
            .get_mut(guid)
            .ok_or(StoreError::ResourceNotFound)
    }
}

/// In-memory [`TaskStore`] for development and testing.
///
/// Every mutation is checked against the record's state and owner under a
/// single lock, so concurrent callers see the same serialization a real
/// store provides.
#[derive(Default)]
pub struct InMemoryTaskStore {
    inner: Mutex<Inner>,
}

impl InMemoryTaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `task` as pending and deliver it to every current subscriber.
    ///
    /// A task that already has a record keeps it; it is still re-delivered.
    pub fn emit_desired_task(&self, task: Task) {
        let mut inner = self.inner.lock();
        inner
            .records
            .entry(task.guid.clone())
            .or_insert_with(|| TaskRecord::pending(task.clone()));
        inner.subscribers.retain(|tx| tx.send(task.clone()).is_ok());
    }

    /// Insert or replace a record directly.
    pub fn insert_record(&self, record: TaskRecord) {
        self.inner
            .lock()
            .records
            .insert(record.task.guid.clone(), record);
    }

    /// Make every subsequent call to `op` fail with `err`.
    pub fn set_error(&self, op: StoreOperation, err: StoreError) {
        self.inner.lock().injected.insert(op, err);
    }

    /// Stop injecting errors into `op`.
    pub fn clear_error(&self, op: StoreOperation) {
        self.inner.lock().injected.remove(&op);
    }

    /// Current record for `guid`.
    pub fn record(&self, guid: &str) -> Option<TaskRecord> {
        self.inner.lock().records.get(guid).cloned()
    }

    /// Records currently in `state`.
    pub fn tasks_in_state(&self, state: TaskState) -> Vec<TaskRecord> {
        self.inner
            .lock()
            .records
            .values()
            .filter(|r| r.state == state)
            .cloned()
            .collect()
    }

    /// Records currently claimed.
    pub fn claimed_tasks(&self) -> Vec<TaskRecord> {
        self.tasks_in_state(TaskState::Claimed)
    }

    /// Records currently started.
    pub fn started_tasks(&self) -> Vec<TaskRecord> {
        self.tasks_in_state(TaskState::Started)
    }

    /// Records completed.
    pub fn completed_tasks(&self) -> Vec<TaskRecord> {
        self.tasks_in_state(TaskState::Completed)
    }

    /// Records marked failed.
    pub fn failed_tasks(&self) -> Vec<TaskRecord> {
        self.tasks_in_state(TaskState::Failed)
    }

    /// Every call received, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().calls.clone()
    }

    /// Calls of kind `op` made for `guid`.
    pub fn calls_for(&self, op: StoreOperation, guid: &str) -> Vec<StoreCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.operation() == op && c.guid() == guid)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn watch_desired_tasks(&self) -> DesiredTaskFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().subscribers.push(tx);
        rx
    }

    async fn claim_task(&self, guid: &str, cell_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.admit_call(StoreCall::Claim {
            guid: guid.to_string(),
            cell_id: cell_id.to_string(),
        })?;

        let record = inner.record_mut(guid)?;
        if record.state != TaskState::Pending {
            return Err(StoreError::StateTransition {
                from: record.state,
                to: TaskState::Claimed,
            });
        }
        record.state = TaskState::Claimed;
        record.cell_id = Some(cell_id.to_string());
        Ok(())
    }

    async fn start_task(&self, guid: &str, cell_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        inner.admit_call(StoreCall::Start {
            guid: guid.to_string(),
            cell_id: cell_id.to_string(),
        })?;

        let record = inner.record_mut(guid)?;
        match record.state {
            TaskState::Pending => {}
            TaskState::Claimed | TaskState::Started if !record.owned_by(cell_id) => {
                return Err(StoreError::RunningOnDifferentCell);
            }
            TaskState::Claimed => {}
            TaskState::Started => return Ok(false),
            TaskState::Completed | TaskState::Failed => {
                return Err(StoreError::StateTransition {
                    from: record.state,
                    to: TaskState::Started,
                });
            }
        }
        record.state = TaskState::Started;
        record.cell_id = Some(cell_id.to_string());
        Ok(true)
    }

    async fn complete_task(
        &self,
        guid: &str,
        cell_id: &str,
        failed: bool,
        failure_reason: &str,
        result: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.admit_call(StoreCall::Complete {
            guid: guid.to_string(),
            cell_id: cell_id.to_string(),
            failed,
            failure_reason: failure_reason.to_string(),
            result: result.to_string(),
        })?;

        let record = inner.record_mut(guid)?;
        if record.state != TaskState::Started {
            return Err(StoreError::StateTransition {
                from: record.state,
                to: TaskState::Completed,
            });
        }
        if !record.owned_by(cell_id) {
            return Err(StoreError::RunningOnDifferentCell);
        }
        record.state = TaskState::Completed;
        record.failed = failed;
        record.failure_reason = failure_reason.to_string();
        record.result = result.to_string();
        Ok(())
    }

    async fn fail_task(&self, guid: &str, reason: FailureReason) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.admit_call(StoreCall::Fail {
            guid: guid.to_string(),
            reason,
        })?;

        let record = inner.record_mut(guid)?;
        if matches!(record.state, TaskState::Completed | TaskState::Failed) {
            return Err(StoreError::StateTransition {
                from: record.state,
                to: TaskState::Failed,
            });
        }
        record.state = TaskState::Failed;
        record.failed = true;
        record.failure_reason = reason.as_str().to_string();
        Ok(())
    }
}
