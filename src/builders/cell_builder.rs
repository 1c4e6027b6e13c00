//! Builder that assembles a [`Cell`] from configuration and collaborators.

use std::sync::Arc;

use anyhow::Context;

use crate::config::CellConfig;
use crate::core::{
    AppResult, AuditSink, AuditTrail, CellError, ExecutorClient, ExecutorContainerDelegate,
    TaskProcessor, TaskScheduler, TaskStore,
};
use crate::runtime::Cell;

/// Assembles a [`Cell`].
pub struct CellBuilder<S, E> {
    config: CellConfig,
    store: Option<Arc<S>>,
    executor: Option<Arc<E>>,
    audit: AuditTrail,
}

impl<S, E> CellBuilder<S, E>
where
    S: TaskStore,
    E: ExecutorClient,
{
    /// Start from an explicit configuration.
    pub fn new(config: CellConfig) -> Self {
        Self {
            config,
            store: None,
            executor: None,
            audit: AuditTrail::disabled(),
        }
    }

    /// Start from `CELL_*` environment variables.
    pub fn from_env() -> AppResult<Self> {
        let config = CellConfig::from_env()
            .map_err(CellError::Config)
            .context("loading cell config from environment")?;
        Ok(Self::new(config))
    }

    /// Configuration the cell will be built from.
    pub const fn config(&self) -> &CellConfig {
        &self.config
    }

    /// Task store the cell coordinates through.
    #[must_use]
    pub fn with_store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    /// Local container runtime.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<E>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Audit sink shared by the scheduler and the processor.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = AuditTrail::new(audit);
        self
    }

    /// Validate the configuration and wire the cell.
    pub fn build(self) -> AppResult<Cell<S, E>> {
        self.config
            .validate()
            .map_err(CellError::Config)
            .with_context(|| format!("building cell {}", self.config.cell_id))?;
        let store = self.store.ok_or(CellError::MissingComponent("task store"))?;
        let executor = self
            .executor
            .ok_or(CellError::MissingComponent("executor client"))?;

        let delegate = Arc::new(
            ExecutorContainerDelegate::new(Arc::clone(&executor))
                .with_max_result_bytes(self.config.max_result_bytes),
        );
        let scheduler = TaskScheduler::new(
            self.config.cell_id.clone(),
            self.config.stack.clone(),
            Arc::clone(&store),
            Arc::clone(&delegate),
        )
        .with_audit_trail(self.audit.clone());
        let processor = TaskProcessor::new(
            self.config.cell_id.clone(),
            Arc::clone(&store),
            delegate,
        )
        .with_audit_trail(self.audit);

        Ok(Cell::from_parts(
            self.config,
            store,
            executor,
            scheduler,
            processor,
        ))
    }
}
