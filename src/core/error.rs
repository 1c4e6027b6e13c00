//! Error types for store, runtime, and wiring operations.

use thiserror::Error;

use crate::core::model::TaskState;

/// Errors surfaced by the task store's compare-and-set operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The record is not in a state the requested transition starts from.
    #[error("invalid task state transition from {from} to {to}")]
    StateTransition {
        /// State the record was found in.
        from: TaskState,
        /// State the caller attempted to move it to.
        to: TaskState,
    },
    /// The record is owned by another cell.
    #[error("task is running on a different cell")]
    RunningOnDifferentCell,
    /// No record exists for the guid.
    #[error("store resource not found")]
    ResourceNotFound,
    /// Transport or availability failure; the outcome of the call is unknown.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the error is a definitive state-transition conflict.
    pub const fn is_state_transition(&self) -> bool {
        matches!(self, Self::StateTransition { .. })
    }

    /// Whether a failed start means the task can never run on this cell.
    ///
    /// Transition conflicts, foreign ownership and purged records are
    /// terminal. Everything else is assumed transient.
    pub const fn is_terminal_for_start(&self) -> bool {
        matches!(
            self,
            Self::StateTransition { .. } | Self::RunningOnDifferentCell | Self::ResourceNotFound
        )
    }
}

/// Errors surfaced by the local container runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// No container exists for the guid.
    #[error("container not found: {0}")]
    NotFound(String),
    /// A container already exists for the guid.
    #[error("container already exists: {0}")]
    AlreadyExists(String),
    /// The container is not in a state that allows the operation.
    #[error("container {guid} cannot {operation} while {state}")]
    InvalidState {
        /// Container guid.
        guid: String,
        /// Operation that was attempted.
        operation: &'static str,
        /// Observed container state.
        state: String,
    },
    /// A fetched result file exceeded the configured limit.
    #[error("result file too large: {size} bytes (limit {limit})")]
    ResultTooLarge {
        /// Size of the file in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
    /// Backend-specific failure with context.
    #[error("executor error: {0}")]
    Executor(String),
}

/// Errors produced while assembling a cell.
#[derive(Debug, Error)]
pub enum CellError {
    /// Configuration failed validation.
    #[error("config invalid: {0}")]
    Config(String),
    /// A required collaborator was not supplied.
    #[error("missing component: {0}")]
    MissingComponent(&'static str),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
