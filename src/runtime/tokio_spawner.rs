//! Tokio spawning for the cell's event handlers.

use std::future::Future;

use crate::core::Spawn;

/// Spawner the cell's feed loops use to run one handler per event.
///
/// Holds only a runtime handle, so clones are cheap and dropping one never
/// tears a runtime down.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioSpawner {
    /// Spawner whose handlers run on the runtime behind `handle`.
    pub const fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Spawner on the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}

/// Dedicated multi-thread runtime for a cell's handlers.
///
/// Not `Clone`: exactly one owner decides when the runtime goes away. It is
/// shut down with `shutdown_background`, which is safe from async context;
/// callers drain in-flight handlers first (see
/// [`CellHandle::stop`](crate::runtime::CellHandle::stop)).
pub struct WorkerRuntime {
    handle: tokio::runtime::Handle,
    runtime: Option<tokio::runtime::Runtime>,
}

impl WorkerRuntime {
    /// Build a runtime with `worker_threads` workers.
    pub fn new(worker_threads: usize) -> Result<Self, std::io::Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .thread_name("cell-worker")
            .enable_all()
            .build()?;
        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    /// Spawner onto this runtime, for use while the owner is alive.
    pub fn spawner(&self) -> TokioSpawner {
        TokioSpawner::new(self.handle.clone())
    }

    /// Shut the runtime down without blocking; unfinished handlers are dropped.
    pub fn shutdown(mut self) {
        self.shutdown_now();
    }

    fn shutdown_now(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            tracing::debug!("shutting-down-worker-runtime");
            runtime.shutdown_background();
        }
    }
}

impl Drop for WorkerRuntime {
    fn drop(&mut self) {
        self.shutdown_now();
    }
}
