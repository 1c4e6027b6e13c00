//! In-memory container runtime.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::core::{
    Container, ContainerAllocationRequest, ContainerError, ContainerEventFeed, ContainerState,
    ExecutorClient, RunResult,
};

/// Runtime operation that can have an error injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutorOperation {
    /// `allocate_container`.
    Allocate,
    /// `initialize_container`.
    Initialize,
    /// `run_container`.
    Run,
    /// `delete_container`.
    Delete,
    /// `get_file`.
    GetFile,
}

#[derive(Default)]
struct Inner {
    containers: HashMap<String, Container>,
    files: HashMap<(String, String), String>,
    subscribers: Vec<mpsc::UnboundedSender<Container>>,
    injected: HashMap<ExecutorOperation, ContainerError>,
    calls: HashMap<(ExecutorOperation, String), usize>,
}

impl Inner {
    fn admit_call(&mut self, op: ExecutorOperation, guid: &str) -> Result<(), ContainerError> {
        *self.calls.entry((op, guid.to_string())).or_default() += 1;
        match self.injected.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn publish(&mut self, container: &Container) {
        self.subscribers
            .retain(|tx| tx.send(container.clone()).is_ok());
    }

    fn transition(&mut self, guid: &str, state: ContainerState) -> Option<Container> {
        let container = self.containers.get_mut(guid)?;
        container.state = state;
        let snapshot = container.clone();
        self.publish(&snapshot);
        Some(snapshot)
    }
}

/// In-memory [`ExecutorClient`] for development and testing.
///
/// Holds at most one container per guid. State changes reached once a
/// container is initialized (created, running, completed) are published to
/// every subscriber; reservation and initialization are not.
#[derive(Default)]
pub struct InMemoryExecutor {
    inner: Mutex<Inner>,
}

impl InMemoryExecutor {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call to `op` fail with `err`.
    pub fn set_error(&self, op: ExecutorOperation, err: ContainerError) {
        self.inner.lock().injected.insert(op, err);
    }

    /// Stop injecting errors into `op`.
    pub fn clear_error(&self, op: ExecutorOperation) {
        self.inner.lock().injected.remove(&op);
    }

    /// Snapshot of the container for `guid`.
    pub fn container(&self, guid: &str) -> Option<Container> {
        self.inner.lock().containers.get(guid).cloned()
    }

    /// Number of live containers.
    pub fn container_count(&self) -> usize {
        self.inner.lock().containers.len()
    }

    /// Make `content` readable at `path` inside the container for `guid`.
    pub fn put_file(&self, guid: &str, path: &str, content: impl Into<String>) {
        self.inner
            .lock()
            .files
            .insert((guid.to_string(), path.to_string()), content.into());
    }

    /// Finish the container's run with `result` and publish the completion.
    ///
    /// Returns `false` if no container exists for `guid`.
    pub fn complete_container(&self, guid: &str, result: RunResult) -> bool {
        let mut inner = self.inner.lock();
        let Some(container) = inner.containers.get_mut(guid) else {
            return false;
        };
        container.run_result = result;
        inner.transition(guid, ContainerState::Completed).is_some()
    }

    /// Number of times `op` was called for `guid`.
    pub fn calls(&self, op: ExecutorOperation, guid: &str) -> usize {
        self.inner
            .lock()
            .calls
            .get(&(op, guid.to_string()))
            .copied()
            .unwrap_or_default()
    }

    /// Number of delete calls made for `guid`.
    pub fn delete_calls(&self, guid: &str) -> usize {
        self.calls(ExecutorOperation::Delete, guid)
    }
}

#[async_trait]
impl ExecutorClient for InMemoryExecutor {
    async fn allocate_container(
        &self,
        guid: &str,
        request: ContainerAllocationRequest,
    ) -> Result<Container, ContainerError> {
        let mut inner = self.inner.lock();
        inner.admit_call(ExecutorOperation::Allocate, guid)?;

        if inner.containers.contains_key(guid) {
            return Err(ContainerError::AlreadyExists(guid.to_string()));
        }
        let container = Container {
            guid: guid.to_string(),
            state: ContainerState::Reserved,
            resources: request.resources,
            actions: request.actions,
            log: request.log,
            tags: request.tags,
            run_result: RunResult::default(),
        };
        inner
            .containers
            .insert(guid.to_string(), container.clone());
        Ok(container)
    }

    async fn initialize_container(&self, guid: &str) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();
        inner.admit_call(ExecutorOperation::Initialize, guid)?;

        let container = inner
            .containers
            .get_mut(guid)
            .ok_or_else(|| ContainerError::NotFound(guid.to_string()))?;
        if container.state != ContainerState::Reserved {
            return Err(ContainerError::InvalidState {
                guid: guid.to_string(),
                operation: "initialize",
                state: container.state.to_string(),
            });
        }
        container.state = ContainerState::Initializing;
        inner.transition(guid, ContainerState::Created);
        Ok(())
    }

    async fn run_container(&self, guid: &str) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();
        inner.admit_call(ExecutorOperation::Run, guid)?;

        let state = inner
            .containers
            .get(guid)
            .map(|c| c.state)
            .ok_or_else(|| ContainerError::NotFound(guid.to_string()))?;
        match state {
            ContainerState::Running => Ok(()),
            ContainerState::Created => {
                inner.transition(guid, ContainerState::Running);
                Ok(())
            }
            other => Err(ContainerError::InvalidState {
                guid: guid.to_string(),
                operation: "run",
                state: other.to_string(),
            }),
        }
    }

    async fn delete_container(&self, guid: &str) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();
        inner.admit_call(ExecutorOperation::Delete, guid)?;

        inner.containers.remove(guid);
        inner.files.retain(|(owner, _), _| owner != guid);
        Ok(())
    }

    async fn get_file(&self, guid: &str, path: &str) -> Result<String, ContainerError> {
        let mut inner = self.inner.lock();
        inner.admit_call(ExecutorOperation::GetFile, guid)?;

        if !inner.containers.contains_key(guid) {
            return Err(ContainerError::NotFound(guid.to_string()));
        }
        inner
            .files
            .get(&(guid.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| ContainerError::Executor(format!("no file at {path}")))
    }

    fn subscribe_container_events(&self) -> ContainerEventFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().subscribers.push(tx);
        rx
    }
}
