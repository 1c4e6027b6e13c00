//! Container delegate: the runtime operations the scheduler and processor use.
//!
//! [`ExecutorContainerDelegate`] adapts any [`ExecutorClient`] to this
//! contract. It logs every call, reduces `run` to a success flag, makes
//! `delete` best-effort, and bounds the size of fetched result files.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{Container, ContainerAllocationRequest, ContainerError, ExecutorClient};

/// Default upper bound on a fetched result file, in bytes.
pub const DEFAULT_MAX_RESULT_BYTES: usize = 10 * 1024;

/// Runtime operations keyed by task guid.
#[async_trait]
pub trait ContainerDelegate: Send + Sync + 'static {
    /// Reserve a container.
    async fn allocate_container(
        &self,
        guid: &str,
        request: ContainerAllocationRequest,
    ) -> Result<Container, ContainerError>;

    /// Initialize a reserved container.
    async fn initialize_container(&self, guid: &str) -> Result<(), ContainerError>;

    /// Ask the runtime to run the container. Safe to repeat.
    async fn run_container(&self, guid: &str) -> bool;

    /// Delete the container. Best-effort; a missing container is a no-op.
    async fn delete_container(&self, guid: &str);

    /// Read the container's result file.
    async fn fetch_container_result_file(
        &self,
        guid: &str,
        path: &str,
    ) -> Result<String, ContainerError>;
}

/// [`ContainerDelegate`] backed by an [`ExecutorClient`].
pub struct ExecutorContainerDelegate<E> {
    client: Arc<E>,
    max_result_bytes: usize,
}

impl<E> Clone for ExecutorContainerDelegate<E> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            max_result_bytes: self.max_result_bytes,
        }
    }
}

impl<E: ExecutorClient> ExecutorContainerDelegate<E> {
    /// Wrap a client with the default result-size limit.
    pub const fn new(client: Arc<E>) -> Self {
        Self {
            client,
            max_result_bytes: DEFAULT_MAX_RESULT_BYTES,
        }
    }

    /// Override the result-size limit.
    #[must_use]
    pub const fn with_max_result_bytes(mut self, max_result_bytes: usize) -> Self {
        self.max_result_bytes = max_result_bytes;
        self
    }

    /// Underlying client.
    pub fn client(&self) -> &Arc<E> {
        &self.client
    }
}

#[async_trait]
impl<E: ExecutorClient> ContainerDelegate for ExecutorContainerDelegate<E> {
    async fn allocate_container(
        &self,
        guid: &str,
        request: ContainerAllocationRequest,
    ) -> Result<Container, ContainerError> {
        tracing::info!(container_guid = guid, "allocating-container");
        match self.client.allocate_container(guid, request).await {
            Ok(container) => {
                tracing::info!(container_guid = guid, "succeeded-allocating-container");
                Ok(container)
            }
            Err(e) => {
                tracing::error!(container_guid = guid, error = %e, "failed-allocating-container");
                Err(e)
            }
        }
    }

    async fn initialize_container(&self, guid: &str) -> Result<(), ContainerError> {
        tracing::info!(container_guid = guid, "initializing-container");
        self.client.initialize_container(guid).await.map_err(|e| {
            tracing::error!(container_guid = guid, error = %e, "failed-initializing-container");
            e
        })?;
        tracing::info!(container_guid = guid, "succeeded-initializing-container");
        Ok(())
    }

    async fn run_container(&self, guid: &str) -> bool {
        tracing::info!(container_guid = guid, "running-container");
        match self.client.run_container(guid).await {
            Ok(()) => {
                tracing::info!(container_guid = guid, "succeeded-running-container");
                true
            }
            Err(e) => {
                tracing::error!(container_guid = guid, error = %e, "failed-running-container");
                false
            }
        }
    }

    async fn delete_container(&self, guid: &str) {
        tracing::info!(container_guid = guid, "deleting-container");
        match self.client.delete_container(guid).await {
            Ok(()) => tracing::info!(container_guid = guid, "succeeded-deleting-container"),
            Err(ContainerError::NotFound(_)) => {
                tracing::debug!(container_guid = guid, "container-already-deleted");
            }
            Err(e) => {
                tracing::error!(container_guid = guid, error = %e, "failed-deleting-container");
            }
        }
    }

    async fn fetch_container_result_file(
        &self,
        guid: &str,
        path: &str,
    ) -> Result<String, ContainerError> {
        tracing::info!(container_guid = guid, path, "fetching-container-result");
        let content = self.client.get_file(guid, path).await.map_err(|e| {
            tracing::error!(container_guid = guid, error = %e, "failed-fetching-container-result");
            e
        })?;

        if content.len() > self.max_result_bytes {
            let err = ContainerError::ResultTooLarge {
                size: content.len(),
                limit: self.max_result_bytes,
            };
            tracing::error!(container_guid = guid, error = %err, "failed-fetching-container-result");
            return Err(err);
        }

        tracing::info!(container_guid = guid, "succeeded-fetching-container-result");
        Ok(content)
    }
}
