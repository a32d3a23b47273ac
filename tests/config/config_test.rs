/*!
 * Configuration Tests
 * JSON files and KERNEL_* environment overrides
 */

use lifecycle_kernel::core::limits::{DEFAULT_MAX_PROCESSES, DEFAULT_PROCESS_PAGES};
use lifecycle_kernel::{KernelConfig, KernelError};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(r#"{"max_processes": 32, "memory_pages": 512, "trace_json": true}"#);
    let config = KernelConfig::from_file(file.path()).unwrap();

    assert_eq!(config.max_processes, 32);
    assert_eq!(config.memory_pages, 512);
    assert_eq!(config.process_pages, DEFAULT_PROCESS_PAGES);
    assert!(config.trace_json);
}

#[test]
fn test_invalid_file_contents() {
    let file = write_config(r#"{"max_processes": 0}"#);
    assert!(matches!(
        KernelConfig::from_file(file.path()),
        Err(KernelError::Config(_))
    ));

    let file = write_config("not json");
    assert!(matches!(
        KernelConfig::from_file(file.path()),
        Err(KernelError::Json(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        KernelConfig::from_file(dir.path().join("absent.json")),
        Err(KernelError::Io(_))
    ));
}

// The only test in this binary that touches the environment
#[test]
fn test_environment_overrides() {
    std::env::set_var("KERNEL_MAX_PROCESSES", "48");
    std::env::set_var("KERNEL_TRACE_JSON", "1");
    let config = KernelConfig::from_env().unwrap();
    assert_eq!(config.max_processes, 48);
    assert!(config.trace_json);

    std::env::set_var("KERNEL_MAX_PROCESSES", "many");
    assert!(matches!(
        KernelConfig::from_env(),
        Err(KernelError::Config(_))
    ));

    std::env::remove_var("KERNEL_MAX_PROCESSES");
    std::env::remove_var("KERNEL_TRACE_JSON");
    assert_eq!(
        KernelConfig::from_env().unwrap().max_processes,
        DEFAULT_MAX_PROCESSES
    );
}
