//! Reconciliation of container state changes into the task store.
//!
//! Active containers (reserved, initializing, created, running) get their
//! task started and their run requested; both calls are safe to repeat.
//! Completed containers get their task finalized and are then deleted,
//! whatever happened to the bookkeeping.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::Instrument;

use crate::core::audit::{AuditAction, AuditSink, AuditTrail};
use crate::core::{
    Container, ContainerDelegate, ContainerEventFeed, FailureReason, Spawn, TaskStore,
};

/// How processing a container observation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Task moved to started and the container run was requested.
    Started,
    /// Task was already started by this cell; the run was requested again.
    AlreadyStarted,
    /// Start failed transiently; the container is left for the next event.
    StartAbandoned,
    /// Start can never succeed on this cell; the container was deleted.
    StartRejected,
    /// The runtime refused the run; the task was marked failed.
    RunFailed,
    /// Task completed in the store; container deleted.
    Completed,
    /// The completion call failed; container deleted.
    CompletionFailed,
    /// The result file could not be read; task failed, container deleted.
    FetchFailed,
}

/// Container-state reconciler for one cell.
pub struct TaskProcessor<S, D> {
    cell_id: String,
    store: Arc<S>,
    delegate: Arc<D>,
    audit: AuditTrail,
}

impl<S, D> TaskProcessor<S, D>
where
    S: TaskStore,
    D: ContainerDelegate,
{
    /// Create a processor acting on behalf of `cell_id`.
    pub fn new(cell_id: impl Into<String>, store: Arc<S>, delegate: Arc<D>) -> Self {
        Self {
            cell_id: cell_id.into(),
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

    /// Identifier this cell owns tasks under.
    pub fn cell_id(&self) -> &str {
        &self.cell_id
    }

    /// Reconcile one observed container state.
    pub async fn process(&self, container: &Container) -> ProcessOutcome {
        let span = tracing::info_span!(
            "task-processor",
            container_guid = %container.guid,
            container_state = %container.state,
        );
        async {
            tracing::debug!("starting");
            let outcome = if container.state.is_active() {
                self.process_active_container(&container.guid).await
            } else {
                self.process_completed_container(container).await
            };
            tracing::debug!(?outcome, "finished");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn process_active_container(&self, guid: &str) -> ProcessOutcome {
        let changed = match self.start_task(guid).await {
            Ok(changed) => changed,
            Err(outcome) => return outcome,
        };

        if !self.delegate.run_container(guid).await {
            self.fail_task(guid, FailureReason::FailedToRunContainer).await;
            return ProcessOutcome::RunFailed;
        }

        if changed {
            ProcessOutcome::Started
        } else {
            ProcessOutcome::AlreadyStarted
        }
    }

    async fn start_task(&self, guid: &str) -> Result<bool, ProcessOutcome> {
        tracing::info!("starting-task");
        match self.store.start_task(guid, &self.cell_id).await {
            Ok(true) => {
                tracing::info!("succeeded-starting-task");
                self.audit
                    .record(guid, &self.cell_id, AuditAction::Started, None);
                Ok(true)
            }
            Ok(false) => {
                tracing::info!("task-already-started");
                Ok(false)
            }
            Err(e) if e.is_terminal_for_start() => {
                tracing::error!(error = %e, "failed-starting-task");
                self.delegate.delete_container(guid).await;
                self.audit.record(
                    guid,
                    &self.cell_id,
                    AuditAction::Compensated,
                    Some(e.to_string()),
                );
                Err(ProcessOutcome::StartRejected)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed-starting-task");
                Err(ProcessOutcome::StartAbandoned)
            }
        }
    }

    async fn process_completed_container(&self, container: &Container) -> ProcessOutcome {
        let outcome = self.complete_task(container).await;
        self.delegate.delete_container(&container.guid).await;
        outcome
    }

    async fn complete_task(&self, container: &Container) -> ProcessOutcome {
        let guid = container.guid.as_str();
        let run_result = &container.run_result;

        let mut result = String::new();
        if !run_result.failed {
            let path = container.result_file().unwrap_or_default();
            match self.delegate.fetch_container_result_file(guid, path).await {
                Ok(content) => result = content,
                Err(e) => {
                    tracing::error!(error = %e, "failed-fetching-result");
                    self.fail_task(guid, FailureReason::FailedToFetchResult).await;
                    return ProcessOutcome::FetchFailed;
                }
            }
        }

        tracing::info!(failed = run_result.failed, "completing-task");
        match self
            .store
            .complete_task(
                guid,
                &self.cell_id,
                run_result.failed,
                &run_result.failure_reason,
                &result,
            )
            .await
        {
            Ok(()) => {
                tracing::info!("succeeded-completing-task");
                self.audit
                    .record(guid, &self.cell_id, AuditAction::Completed, None);
                ProcessOutcome::Completed
            }
            Err(e) => {
                tracing::error!(error = %e, "failed-completing-task");
                if e.is_state_transition() {
                    self.fail_task(guid, FailureReason::InvalidTransition).await;
                }
                ProcessOutcome::CompletionFailed
            }
        }
    }

    async fn fail_task(&self, guid: &str, reason: FailureReason) {
        tracing::info!(%reason, "failing-task");
        match self.store.fail_task(guid, reason).await {
            Ok(()) => {
                tracing::info!("succeeded-failing-task");
                self.audit.record(
                    guid,
                    &self.cell_id,
                    AuditAction::Failed,
                    Some(reason.to_string()),
                );
            }
            Err(e) => tracing::error!(error = %e, "failed-failing-task"),
        }
    }

    /// Consume the container-state feed, spawning one reconciliation per
    /// observation, until the feed closes or `shutdown` fires.
    pub async fn run<Sp>(
        self: Arc<Self>,
        mut feed: ContainerEventFeed,
        spawner: Sp,
        mut shutdown: watch::Receiver<bool>,
    ) where
        Sp: Spawn,
    {
        tracing::info!(cell_id = %self.cell_id, "task-processor-started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    tracing::info!(cell_id = %self.cell_id, "task-processor-stopping");
                    break;
                }
                next = feed.recv() => {
                    let Some(container) = next else {
                        tracing::info!(cell_id = %self.cell_id, "container-event-feed-closed");
                        break;
                    };
                    let this = Arc::clone(&self);
                    spawner.spawn(async move {
                        this.process(&container).await;
                    });
                }
            }
        }
    }
}
