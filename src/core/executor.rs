//! Raw contract of the local container runtime.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::{Container, ContainerAllocationRequest, ContainerError};

/// Stream of container snapshots, one per observed state change.
pub type ContainerEventFeed = mpsc::UnboundedReceiver<Container>;

/// Client for the cell's local container runtime.
///
/// The runtime serializes conflicting operations on the same guid and
/// allows at most one container per guid.
#[async_trait]
pub trait ExecutorClient: Send + Sync + 'static {
    /// Reserve a container for `guid`.
    async fn allocate_container(
        &self,
        guid: &str,
        request: ContainerAllocationRequest,
    ) -> Result<Container, ContainerError>;

    /// Set up the reserved container's sandbox.
    async fn initialize_container(&self, guid: &str) -> Result<(), ContainerError>;

    /// Ensure the container's action graph is running.
    async fn run_container(&self, guid: &str) -> Result<(), ContainerError>;

    /// Remove the container and release its resources.
    async fn delete_container(&self, guid: &str) -> Result<(), ContainerError>;

    /// Read a file out of the container.
    async fn get_file(&self, guid: &str, path: &str) -> Result<String, ContainerError>;

    /// Subscribe to container state changes.
    fn subscribe_container_events(&self) -> ContainerEventFeed;
}
