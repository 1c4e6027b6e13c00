//! Task store contract: the shared, compare-and-set source of truth.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::{FailureReason, StoreError, Task};

/// Stream of newly desired tasks. Infinite; a new subscription starts from "now".
pub type DesiredTaskFeed = mpsc::UnboundedReceiver<Task>;

/// Distributed task store consumed by a cell.
///
/// Every mutation is a compare-and-set against the record keyed by `guid`.
/// Implementations must serialize conflicting calls across cells.
#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    /// Subscribe to newly desired tasks.
    fn watch_desired_tasks(&self) -> DesiredTaskFeed;

    /// Pending → Claimed, owned by `cell_id`.
    async fn claim_task(&self, guid: &str, cell_id: &str) -> Result<(), StoreError>;

    /// Any pre-start state → Started, owned by `cell_id`.
    ///
    /// Returns `Ok(false)` when the task is already started by `cell_id`.
    async fn start_task(&self, guid: &str, cell_id: &str) -> Result<bool, StoreError>;

    /// Started → Completed with the run outcome.
    async fn complete_task(
        &self,
        guid: &str,
        cell_id: &str,
        failed: bool,
        failure_reason: &str,
        result: &str,
    ) -> Result<(), StoreError>;

    /// Mark the task failed.
    async fn fail_task(&self, guid: &str, reason: FailureReason) -> Result<(), StoreError>;
}
