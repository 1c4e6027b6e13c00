//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cell_rep::core::{
    Container, ExecutorAction, ExecutorContainerDelegate, LogConfig, Task,
};
use cell_rep::infra::{InMemoryExecutor, InMemoryTaskStore};

pub const CELL_ID: &str = "cell-a";
pub const STACK: &str = "my-stack";
pub const RESULT_PATH: &str = "/tmp/result";

pub type Delegate = ExecutorContainerDelegate<InMemoryExecutor>;

pub fn make_task(guid: &str, stack: &str) -> Task {
    Task {
        guid: guid.to_string(),
        stack: stack.to_string(),
        memory_mb: 64,
        disk_mb: 1024,
        cpu_percent: 0.5,
        actions: vec![ExecutorAction::Run {
            path: "the-script".into(),
            args: vec![],
            env: vec![("PATH".into(), "the-path".into())],
            timeout_secs: Some(500),
        }],
        log: LogConfig {
            guid: "some-guid".into(),
            source_name: "XYZ".into(),
            index: Some(0),
        },
        result_file: RESULT_PATH.to_string(),
    }
}

/// Fresh store, runtime, and a delegate over the runtime.
pub fn collaborators() -> (Arc<InMemoryTaskStore>, Arc<InMemoryExecutor>, Arc<Delegate>) {
    let store = Arc::new(InMemoryTaskStore::new());
    let executor = Arc::new(InMemoryExecutor::new());
    let delegate = Arc::new(ExecutorContainerDelegate::new(Arc::clone(&executor)));
    (store, executor, delegate)
}

pub fn snapshot(executor: &InMemoryExecutor, guid: &str) -> Container {
    executor
        .container(guid)
        .unwrap_or_else(|| panic!("container {guid} should exist"))
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// Assert `check` keeps holding for a short window.
pub async fn consistently<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..20 {
        if !check() {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    true
}
