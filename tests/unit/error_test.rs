//! Tests for error types

use cell_rep::core::{CellError, ContainerError, FailureReason, StoreError, TaskState};

#[test]
fn test_state_transition_error() {
    let err = StoreError::StateTransition {
        from: TaskState::Completed,
        to: TaskState::Started,
    };
    assert_eq!(
        format!("{}", err),
        "invalid task state transition from completed to started"
    );
}

#[test]
fn test_store_errors() {
    assert_eq!(
        StoreError::RunningOnDifferentCell.to_string(),
        "task is running on a different cell"
    );
    assert_eq!(
        StoreError::ResourceNotFound.to_string(),
        "store resource not found"
    );
    assert_eq!(
        StoreError::Unavailable("connection reset".into()).to_string(),
        "store unavailable: connection reset"
    );
}

#[test]
fn test_container_errors() {
    let err = ContainerError::InvalidState {
        guid: "T1".into(),
        operation: "run",
        state: "reserved".into(),
    };
    assert_eq!(err.to_string(), "container T1 cannot run while reserved");

    let err = ContainerError::ResultTooLarge {
        size: 20_000,
        limit: 10_240,
    };
    assert_eq!(
        err.to_string(),
        "result file too large: 20000 bytes (limit 10240)"
    );
}

#[test]
fn test_cell_errors() {
    assert_eq!(
        CellError::MissingComponent("task store").to_string(),
        "missing component: task store"
    );
    assert_eq!(
        CellError::Config("stack must not be empty".into()).to_string(),
        "config invalid: stack must not be empty"
    );
}

#[test]
fn test_failure_reasons_are_stable() {
    let reasons: Vec<_> = FailureReason::ALL.iter().map(|r| r.as_str()).collect();
    assert_eq!(
        reasons,
        vec![
            "task container does not exist",
            "failed to run container",
            "invalid state transition",
            "failed to fetch result",
        ]
    );
}
