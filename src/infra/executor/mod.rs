//! Container runtime backends.

pub mod memory;

pub use memory::{ExecutorOperation, InMemoryExecutor};
