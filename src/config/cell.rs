//! Cell configuration: identity, placement tag, and runtime limits.

use std::env;

use serde::{Deserialize, Serialize};

use crate::core::DEFAULT_MAX_RESULT_BYTES;

/// Configuration for one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellConfig {
    /// Identifier the cell claims tasks under.
    pub cell_id: String,
    /// Placement tag the cell admits.
    pub stack: String,
    /// Upper bound on a fetched result file, in bytes.
    #[serde(default = "default_max_result_bytes")]
    pub max_result_bytes: usize,
    /// Worker threads of the runtime [`Cell::start_on_workers`](crate::runtime::Cell::start_on_workers) builds.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

const fn default_max_result_bytes() -> usize {
    DEFAULT_MAX_RESULT_BYTES
}

fn default_worker_threads() -> usize {
    num_cpus::get()
}

impl CellConfig {
    /// Configuration with default limits.
    pub fn new(cell_id: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            cell_id: cell_id.into(),
            stack: stack.into(),
            max_result_bytes: default_max_result_bytes(),
            worker_threads: default_worker_threads(),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.cell_id.trim().is_empty() {
            return Err("cell_id must not be empty".into());
        }
        if self.stack.trim().is_empty() {
            return Err("stack must not be empty".into());
        }
        if self.max_result_bytes == 0 {
            return Err("max_result_bytes must be greater than 0".into());
        }
        if self.worker_threads == 0 {
            return Err("worker_threads must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse cell configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from `CELL_*` environment variables, reading a
    /// `.env` file first if one exists.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from a variable lookup.
    ///
    /// `CELL_ID` and `CELL_STACK` are required; `CELL_MAX_RESULT_BYTES` and
    /// `CELL_WORKER_THREADS` fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cell_id = lookup("CELL_ID").ok_or("CELL_ID is not set")?;
        let stack = lookup("CELL_STACK").ok_or("CELL_STACK is not set")?;
        let mut cfg = Self::new(cell_id, stack);

        if let Some(raw) = lookup("CELL_MAX_RESULT_BYTES") {
            cfg.max_result_bytes = raw
                .parse()
                .map_err(|e| format!("CELL_MAX_RESULT_BYTES invalid: {e}"))?;
        }
        if let Some(raw) = lookup("CELL_WORKER_THREADS") {
            cfg.worker_threads = raw
                .parse()
                .map_err(|e| format!("CELL_WORKER_THREADS invalid: {e}"))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
