//! In-memory collaborators for development and testing.

pub mod executor;
pub mod store;
pub use executor::InMemoryExecutor;
pub use store::InMemoryTaskStore;
