//! Runtime wiring: spawning and the running cell.

pub mod cell;
pub mod tokio_spawner;

pub use cell::{Cell, CellHandle};
pub use tokio_spawner::{TokioSpawner, WorkerRuntime};
