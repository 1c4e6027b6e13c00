//! A running cell: the scheduler and processor loops over their feeds.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::CellConfig;
use crate::core::{
    AppResult, ExecutorClient, ExecutorContainerDelegate, Spawn, TaskProcessor, TaskScheduler,
    TaskStore,
};
use crate::runtime::WorkerRuntime;

/// Scheduler type a cell runs.
pub type CellScheduler<S, E> = TaskScheduler<S, ExecutorContainerDelegate<E>>;
/// Processor type a cell runs.
pub type CellProcessor<S, E> = TaskProcessor<S, ExecutorContainerDelegate<E>>;

/// Per-node control logic wired to a store and a local runtime.
pub struct Cell<S, E> {
    config: CellConfig,
    store: Arc<S>,
    executor: Arc<E>,
    scheduler: Arc<CellScheduler<S, E>>,
    processor: Arc<CellProcessor<S, E>>,
}

impl<S, E> Cell<S, E>
where
    S: TaskStore,
    E: ExecutorClient,
{
    pub(crate) fn from_parts(
        config: CellConfig,
        store: Arc<S>,
        executor: Arc<E>,
        scheduler: CellScheduler<S, E>,
        processor: CellProcessor<S, E>,
    ) -> Self {
        Self {
            config,
            store,
            executor,
            scheduler: Arc::new(scheduler),
            processor: Arc::new(processor),
        }
    }

    /// Configuration the cell was built from.
    pub const fn config(&self) -> &CellConfig {
        &self.config
    }

    /// Admission controller.
    pub fn scheduler(&self) -> &Arc<CellScheduler<S, E>> {
        &self.scheduler
    }

    /// Container-state reconciler.
    pub fn processor(&self) -> &Arc<CellProcessor<S, E>> {
        &self.processor
    }

    /// Subscribe to both feeds and start both loops on the current tokio runtime.
    ///
    /// Handlers for individual events run on `spawner`. Subscriptions are in
    /// place when this returns, so anything emitted afterwards is seen by
    /// the cell.
    pub fn start<Sp>(&self, spawner: Sp) -> CellHandle
    where
        Sp: Spawn + Clone + Send + 'static,
    {
        let desired = self.store.watch_desired_tasks();
        let events = self.executor.subscribe_container_events();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (in_flight, drained) = mpsc::channel(1);
        let spawner = TrackedSpawner {
            inner: spawner,
            in_flight,
        };

        let scheduler = tokio::spawn(Arc::clone(&self.scheduler).run(
            desired,
            spawner.clone(),
            shutdown_rx.clone(),
        ));
        let processor = tokio::spawn(Arc::clone(&self.processor).run(events, spawner, shutdown_rx));

        tracing::info!(cell_id = %self.config.cell_id, stack = %self.config.stack, "cell-started");
        CellHandle {
            shutdown: shutdown_tx,
            scheduler,
            processor,
            drained,
            workers: None,
        }
    }

    /// Start the cell with its handlers on a dedicated runtime of
    /// `config.worker_threads` workers.
    ///
    /// The loops themselves run on the current tokio runtime. The worker
    /// runtime is owned by the returned handle and shut down once every
    /// in-flight handler has finished.
    pub fn start_on_workers(&self) -> AppResult<CellHandle> {
        let workers = WorkerRuntime::new(self.config.worker_threads).with_context(|| {
            format!(
                "building {} worker threads for cell {}",
                self.config.worker_threads, self.config.cell_id
            )
        })?;
        let mut handle = self.start(workers.spawner());
        handle.workers = Some(workers);
        Ok(handle)
    }
}

/// Spawner that keeps a drain token alive for as long as a handler runs.
#[derive(Clone)]
struct TrackedSpawner<Sp> {
    inner: Sp,
    in_flight: mpsc::Sender<()>,
}

impl<Sp: Spawn> Spawn for TrackedSpawner<Sp> {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.in_flight.clone();
        self.inner.spawn(async move {
            let _token = token;
            fut.await;
        });
    }
}

/// Handle to a started cell.
pub struct CellHandle {
    shutdown: watch::Sender<bool>,
    scheduler: JoinHandle<()>,
    processor: JoinHandle<()>,
    drained: mpsc::Receiver<()>,
    workers: Option<WorkerRuntime>,
}

impl CellHandle {
    /// Stop both loops, then wait for them and for every handler they
    /// spawned to finish.
    pub async fn stop(self) -> AppResult<()> {
        let _ = self.shutdown.send(true);
        self.join().await
    }

    /// Wait for both loops to exit on their own, then for every handler
    /// they spawned.
    ///
    /// A completed container's handler always gets to delete it before
    /// this returns. A panicked loop is reported as an error.
    pub async fn join(self) -> AppResult<()> {
        let Self {
            shutdown: _shutdown,
            scheduler,
            processor,
            mut drained,
            workers,
        } = self;

        let scheduler = scheduler.await;
        let processor = processor.await;

        // Every token is dropped once the loops and their handlers are gone.
        while drained.recv().await.is_some() {}
        if let Some(workers) = workers {
            workers.shutdown();
        }

        scheduler.context("task-scheduler loop panicked")?;
        processor.context("task-processor loop panicked")?;
        Ok(())
    }
}
