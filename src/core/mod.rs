//! Core contracts and the two per-cell state machines.

pub mod audit;
pub mod delegate;
pub mod error;
pub mod executor;
pub mod model;
pub mod reason;
pub mod spawn;
pub mod store;
pub mod task_processor;
pub mod task_scheduler;

pub use audit::{
    AuditAction, AuditEvent, AuditSink, AuditTrail, InMemoryAuditSink, SharedAuditSink,
    build_audit_event,
};
pub use delegate::{ContainerDelegate, DEFAULT_MAX_RESULT_BYTES, ExecutorContainerDelegate};
pub use error::{AppResult, CellError, ContainerError, StoreError};
pub use executor::{ContainerEventFeed, ExecutorClient};
pub use model::{
    Container, ContainerAllocationRequest, ContainerState, ExecutorAction, LogConfig,
    RESULT_FILE_TAG, ResourceRequest, RunResult, Tags, Task, TaskState,
};
pub use reason::FailureReason;
pub use spawn::Spawn;
pub use store::{DesiredTaskFeed, TaskStore};
pub use task_processor::{ProcessOutcome, TaskProcessor};
pub use task_scheduler::{AdmissionOutcome, TaskScheduler};
