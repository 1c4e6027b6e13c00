//! Admission of desired tasks onto this cell.
//!
//! Each desired task goes through allocate → claim → initialize. A failed
//! step is undone by deleting the container; the store-side claim is never
//! rolled back. Once initialization succeeds the task is left to the
//! [`TaskProcessor`](crate::core::TaskProcessor), which reacts to the
//! container's state changes.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::Instrument;

use crate::core::audit::{AuditAction, AuditSink, AuditTrail};
use crate::core::{ContainerDelegate, DesiredTaskFeed, Spawn, Task, TaskStore};

/// How an admission attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// The task's stack does not match this cell.
    Ignored,
    /// The runtime could not reserve a container; nothing to undo.
    AllocationFailed,
    /// Another cell won the claim or the store failed; container deleted.
    ClaimFailed,
    /// The container could not be initialized; container deleted, claim kept.
    InitializeFailed,
    /// The task is claimed by this cell and its container is initialized.
    Admitted,
}

/// Admission controller for desired tasks.
pub struct TaskScheduler<S, D> {
    cell_id: String,
    stack: String,
    store: Arc<S>,
    delegate: Arc<D>,
    audit: AuditTrail,
}

impl<S, D> TaskScheduler<S, D>
where
    S: TaskStore,
    D: ContainerDelegate,
{
    /// Create a scheduler for the cell `cell_id` serving `stack`.
    pub fn new(
        cell_id: impl Into<String>,
        stack: impl Into<String>,
        store: Arc<S>,
        delegate: Arc<D>,
    ) -> Self {
        Self {
            cell_id: cell_id.into(),
            stack: stack.into(),
            store,
            delegate,
            audit: AuditTrail::disabled(),
        }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = AuditTrail::new(audit);
        self
    }

    #[must_use]
    pub(crate) fn with_audit_trail(mut self, audit: AuditTrail) -> Self {
        self.audit = audit;
        self
    }

    /// Identifier this cell claims tasks under.
    pub fn cell_id(&self) -> &str {
        &self.cell_id
    }

    /// Placement tag this cell admits.
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Run one admission attempt for `task`.
    pub async fn handle_desired_task(&self, task: Task) -> AdmissionOutcome {
        let span = tracing::info_span!(
            "task-scheduler",
            task_guid = %task.guid,
            cell_id = %self.cell_id,
        );
        self.admit(task).instrument(span).await
    }

    async fn admit(&self, task: Task) -> AdmissionOutcome {
        if task.stack != self.stack {
            tracing::debug!(task_stack = %task.stack, "ignoring-task-for-other-stack");
            self.audit
                .record(&task.guid, &self.cell_id, AuditAction::Ignored, Some(task.stack));
            return AdmissionOutcome::Ignored;
        }

        let guid = task.guid.as_str();

        if let Err(e) = self
            .delegate
            .allocate_container(guid, task.allocation_request())
            .await
        {
            tracing::info!(error = %e, "abandoning-task-allocation-failed");
            return AdmissionOutcome::AllocationFailed;
        }

        tracing::info!("claiming-task");
        if let Err(e) = self.store.claim_task(guid, &self.cell_id).await {
            tracing::error!(error = %e, "failed-claiming-task");
            self.compensate(guid, "claim failed").await;
            return AdmissionOutcome::ClaimFailed;
        }
        tracing::info!("succeeded-claiming-task");

        if let Err(e) = self.delegate.initialize_container(guid).await {
            tracing::warn!(error = %e, "leaving-claimed-task-after-initialize-failure");
            self.compensate(guid, "initialize failed").await;
            return AdmissionOutcome::InitializeFailed;
        }

        self.audit
            .record(guid, &self.cell_id, AuditAction::Admitted, None);
        tracing::info!("task-admitted");
        AdmissionOutcome::Admitted
    }

    async fn compensate(&self, guid: &str, why: &str) {
        tracing::warn!(reason = why, "deleting-container-to-compensate");
        self.delegate.delete_container(guid).await;
        self.audit.record(
            guid,
            &self.cell_id,
            AuditAction::Compensated,
            Some(why.to_string()),
        );
    }

    /// Consume the desired-task feed, spawning one admission attempt per task,
    /// until the feed closes or `shutdown` fires.
    pub async fn run<Sp>(
        self: Arc<Self>,
        mut feed: DesiredTaskFeed,
        spawner: Sp,
        mut shutdown: watch::Receiver<bool>,
    ) where
        Sp: Spawn,
    {
        tracing::info!(cell_id = %self.cell_id, stack = %self.stack, "task-scheduler-started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    tracing::info!(cell_id = %self.cell_id, "task-scheduler-stopping");
                    break;
                }
                next = feed.recv() => {
                    let Some(task) = next else {
                        tracing::info!(cell_id = %self.cell_id, "desired-task-feed-closed");
                        break;
                    };
                    let this = Arc::clone(&self);
                    spawner.spawn(async move {
                        this.handle_desired_task(task).await;
                    });
                }
            }
        }
    }
}
