//! # Cell Rep
//!
//! Per-node control logic for a distributed task scheduler.
//!
//! A *cell* owns a local container runtime and competes with other cells to
//! run desired tasks. This crate provides the two cooperating state machines
//! that do the cell's share of the work:
//!
//! - **[`TaskScheduler`](core::TaskScheduler)** admits desired tasks whose
//!   placement tag matches the cell: it allocates a container, claims the
//!   task in the shared store, and initializes the container. Any failed
//!   step is compensated by deleting the container.
//! - **[`TaskProcessor`](core::TaskProcessor)** reconciles container state
//!   changes back into the store: active containers get their task started
//!   and their run requested, completed containers get their task finalized
//!   (with the result file extracted) and are always deleted.
//!
//! The two share no in-process state. All coordination goes through the
//! store's compare-and-set transitions and the runtime's idempotent
//! operations, both consumed through traits
//! ([`TaskStore`](core::TaskStore), [`ExecutorClient`](core::ExecutorClient)).
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use cell_rep::builders::CellBuilder;
//! use cell_rep::config::CellConfig;
//! use cell_rep::infra::{InMemoryExecutor, InMemoryTaskStore};
//!
//! let store = Arc::new(InMemoryTaskStore::new());
//! let executor = Arc::new(InMemoryExecutor::new());
//! let cell = CellBuilder::new(CellConfig::new("cell-1", "my-stack"))
//!     .with_store(store)
//!     .with_executor(executor)
//!     .build()?;
//!
//! // Handlers run on `worker_threads` dedicated workers.
//! let handle = cell.start_on_workers()?;
//! // ... desired tasks and container events now flow through the cell ...
//! handle.stop().await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core contracts, models, and the scheduler/processor state machines.
pub mod core;
/// Configuration models for a cell.
pub mod config;
/// Builders to assemble a cell from configuration.
pub mod builders;
/// In-memory store and runtime implementations.
pub mod infra;
/// Runtime adapters: spawning and the running cell.
pub mod runtime;
/// Shared utilities.
pub mod util;
