//! Task and container models shared by the scheduler and the processor.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag key under which a container carries the path of its result file.
pub const RESULT_FILE_TAG: &str = "result-file";

/// Arbitrary key/value metadata attached to a container at allocation time.
pub type Tags = BTreeMap<String, String>;

/// Log routing metadata for a task's output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Guid the log lines are attributed to.
    pub guid: String,
    /// Source name shown alongside each line.
    pub source_name: String,
    /// Optional instance index.
    pub index: Option<u32>,
}

/// One step of a task's action graph. Opaque to this crate beyond being
/// handed to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ExecutorAction {
    /// Run a process inside the container.
    Run {
        /// Executable path.
        path: String,
        /// Arguments.
        #[serde(default)]
        args: Vec<String>,
        /// Environment variables as key/value pairs.
        #[serde(default)]
        env: Vec<(String, String)>,
        /// Timeout in seconds; `None` runs unbounded.
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    /// Download an artifact into the container.
    Download {
        /// Source URL.
        from: String,
        /// Destination path inside the container.
        to: String,
    },
    /// Upload a file out of the container.
    Upload {
        /// Path inside the container.
        from: String,
        /// Destination URL.
        to: String,
    },
}

/// Resources a task asks the runtime to reserve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// Memory limit in megabytes.
    pub memory_mb: u64,
    /// Disk limit in megabytes.
    pub disk_mb: u64,
    /// CPU share, as a fraction of one core.
    pub cpu_percent: f64,
}

/// A unit of desired work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, shared with the task's container.
    pub guid: String,
    /// Placement tag; must equal the cell's stack for admission.
    pub stack: String,
    /// Memory limit in megabytes.
    pub memory_mb: u64,
    /// Disk limit in megabytes.
    pub disk_mb: u64,
    /// CPU share.
    pub cpu_percent: f64,
    /// Steps to execute.
    #[serde(default)]
    pub actions: Vec<ExecutorAction>,
    /// Log routing.
    #[serde(default)]
    pub log: LogConfig,
    /// Path of the artifact the runtime exposes once the run completes.
    #[serde(default)]
    pub result_file: String,
}

impl Task {
    /// Resource request derived from the task's limits.
    pub const fn resource_request(&self) -> ResourceRequest {
        ResourceRequest {
            memory_mb: self.memory_mb,
            disk_mb: self.disk_mb,
            cpu_percent: self.cpu_percent,
        }
    }

    /// Allocation request for this task's container, tagged with the result file.
    pub fn allocation_request(&self) -> ContainerAllocationRequest {
        let mut tags = Tags::new();
        tags.insert(RESULT_FILE_TAG.to_string(), self.result_file.clone());
        ContainerAllocationRequest {
            resources: self.resource_request(),
            actions: self.actions.clone(),
            log: self.log.clone(),
            tags,
        }
    }
}

/// Store-side lifecycle state of a task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Desired, not yet owned by any cell.
    Pending,
    /// Owned by a cell, container not yet running.
    Claimed,
    /// Running on its owning cell.
    Started,
    /// Finished; the record carries the run outcome.
    Completed,
    /// Marked failed with a reason.
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Observable state of a local container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerState {
    /// Resources reserved.
    Reserved,
    /// Sandbox being set up.
    Initializing,
    /// Sandbox ready to run.
    Created,
    /// Action graph executing.
    Running,
    /// Run finished; a `RunResult` is available.
    Completed,
}

impl ContainerState {
    /// Every state before `Completed` gets the same reconciliation.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reserved => "reserved",
            Self::Initializing => "initializing",
            Self::Created => "created",
            Self::Running => "running",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Outcome of a container's run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Whether the run failed.
    pub failed: bool,
    /// Human-readable failure reason; empty on success.
    pub failure_reason: String,
}

impl RunResult {
    /// A successful run.
    pub const fn succeeded() -> Self {
        Self {
            failed: false,
            failure_reason: String::new(),
        }
    }

    /// A failed run with a reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            failed: true,
            failure_reason: reason.into(),
        }
    }
}

/// What the scheduler asks the runtime to reserve for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerAllocationRequest {
    /// Resource limits.
    pub resources: ResourceRequest,
    /// Action graph run once the container is started.
    pub actions: Vec<ExecutorAction>,
    /// Log routing.
    pub log: LogConfig,
    /// Metadata copied onto the container.
    pub tags: Tags,
}

/// Snapshot of a local container as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Same guid as the container's task.
    pub guid: String,
    /// Current state.
    pub state: ContainerState,
    /// Reserved resources.
    pub resources: ResourceRequest,
    /// Action graph.
    pub actions: Vec<ExecutorAction>,
    /// Log routing.
    pub log: LogConfig,
    /// Allocation-time metadata.
    pub tags: Tags,
    /// Meaningful only once `state` is `Completed`.
    pub run_result: RunResult,
}

impl Container {
    /// Result-file path carried in the container's tags, if any.
    pub fn result_file(&self) -> Option<&str> {
        self.tags.get(RESULT_FILE_TAG).map(String::as_str)
    }
}
