//! Tests for configuration validation

use std::collections::HashMap;

use cell_rep::config::CellConfig;
use cell_rep::core::DEFAULT_MAX_RESULT_BYTES;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_cell_config_defaults() {
    let config = CellConfig::new("cell-a", "my-stack");
    assert!(config.validate().is_ok());
    assert_eq!(config.max_result_bytes, DEFAULT_MAX_RESULT_BYTES);
    assert!(config.worker_threads > 0);
}

#[test]
fn test_cell_config_invalid_identity() {
    assert!(CellConfig::new("", "my-stack").validate().is_err());
    assert!(CellConfig::new("cell-a", "  ").validate().is_err());
}

#[test]
fn test_cell_config_invalid_limits() {
    let mut config = CellConfig::new("cell-a", "my-stack");
    config.max_result_bytes = 0;
    assert!(config.validate().is_err());

    let mut config = CellConfig::new("cell-a", "my-stack");
    config.worker_threads = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_cell_config_from_json() {
    let config =
        CellConfig::from_json_str(r#"{"cell_id":"cell-a","stack":"my-stack","max_result_bytes":512}"#)
            .expect("valid config");
    assert_eq!(config.cell_id, "cell-a");
    assert_eq!(config.max_result_bytes, 512);
    assert!(config.worker_threads > 0);

    let err = CellConfig::from_json_str(r#"{"cell_id":"cell-a"}"#).unwrap_err();
    assert!(err.starts_with("parse error"));
    assert!(CellConfig::from_json_str(r#"{"cell_id":"","stack":"s"}"#).is_err());
}

#[test]
fn test_cell_config_from_lookup() {
    let config = CellConfig::from_lookup(lookup(&[
        ("CELL_ID", "cell-a"),
        ("CELL_STACK", "my-stack"),
        ("CELL_WORKER_THREADS", "3"),
    ]))
    .expect("valid config");
    assert_eq!(config.stack, "my-stack");
    assert_eq!(config.worker_threads, 3);
    assert_eq!(config.max_result_bytes, DEFAULT_MAX_RESULT_BYTES);
}

#[test]
fn test_cell_config_from_lookup_errors() {
    assert_eq!(
        CellConfig::from_lookup(lookup(&[("CELL_STACK", "my-stack")])).unwrap_err(),
        "CELL_ID is not set"
    );

    let err = CellConfig::from_lookup(lookup(&[
        ("CELL_ID", "cell-a"),
        ("CELL_STACK", "my-stack"),
        ("CELL_MAX_RESULT_BYTES", "lots"),
    ]))
    .unwrap_err();
    assert!(err.starts_with("CELL_MAX_RESULT_BYTES invalid"));
}
