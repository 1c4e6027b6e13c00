//! Tests for builder modules

use std::sync::Arc;

use cell_rep::builders::CellBuilder;
use cell_rep::config::CellConfig;
use cell_rep::core::CellError;
use cell_rep::infra::{InMemoryExecutor, InMemoryTaskStore};

type Builder = CellBuilder<InMemoryTaskStore, InMemoryExecutor>;

#[test]
fn test_cell_builder_wires_config() {
    let mut config = CellConfig::new("cell-a", "my-stack");
    config.max_result_bytes = 256;

    let cell = Builder::new(config)
        .with_store(Arc::new(InMemoryTaskStore::new()))
        .with_executor(Arc::new(InMemoryExecutor::new()))
        .build()
        .expect("cell builds");

    assert_eq!(cell.config().max_result_bytes, 256);
    assert_eq!(cell.scheduler().cell_id(), "cell-a");
    assert_eq!(cell.scheduler().stack(), "my-stack");
    assert_eq!(cell.processor().cell_id(), "cell-a");
}

#[test]
fn test_cell_builder_requires_store() {
    let err = Builder::new(CellConfig::new("cell-a", "my-stack"))
        .with_executor(Arc::new(InMemoryExecutor::new()))
        .build()
        .err()
        .expect("store missing");
    assert!(matches!(
        err.downcast_ref::<CellError>(),
        Some(CellError::MissingComponent("task store"))
    ));
}

#[test]
fn test_cell_builder_requires_executor() {
    let err = Builder::new(CellConfig::new("cell-a", "my-stack"))
        .with_store(Arc::new(InMemoryTaskStore::new()))
        .build()
        .err()
        .expect("executor missing");
    assert_eq!(err.to_string(), "missing component: executor client");
}

#[test]
fn test_cell_builder_rejects_invalid_config() {
    let err = Builder::new(CellConfig::new("cell-a", ""))
        .with_store(Arc::new(InMemoryTaskStore::new()))
        .with_executor(Arc::new(InMemoryExecutor::new()))
        .build()
        .err()
        .expect("invalid config");
    assert_eq!(err.to_string(), "building cell cell-a");
    assert!(format!("{err:#}").contains("stack must not be empty"));
}
