//! Tests for tokio spawner utilities

use cell_rep::core::Spawn;
use cell_rep::runtime::{TokioSpawner, WorkerRuntime};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_worker_runtime_runs_and_drops_inside_async_context() {
    let workers = WorkerRuntime::new(1).expect("runtime builds");
    let spawner = workers.spawner();

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(std::thread::current().name().map(str::to_owned)).unwrap();
    });
    let thread = rx.await.expect("handler ran");
    assert_eq!(thread.as_deref(), Some("cell-worker"));

    drop(spawner);
    drop(workers);
}

