//! Runs the real syscall path against descriptors that are not eBPF objects.
//!
//! The outcome depends on privileges and kernel configuration, so these
//! tests only check that each path fails with a well-formed error.

#![cfg(target_os = "linux")]

use std::fs::File;

use nu_ebpf_info::{InfoError, InfoReader, describe_map, describe_program};

#[test]
fn test_describe_map_on_regular_file() {
    let file = tempfile::tempfile().unwrap();
    match describe_map(&file) {
        Err(InfoError::Query(e)) => assert!(!e.is_unsupported_interface()),
        // EINVAL sends us to fdinfo, which has none of the map keys
        Err(InfoError::MissingFields { missing, .. }) => {
            assert!(missing.contains(&"map_type".to_string()))
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_describe_program_on_regular_file() {
    let file = tempfile::tempfile().unwrap();
    match describe_program(&file) {
        Err(InfoError::Query(e)) => assert!(!e.is_unsupported_interface()),
        Err(e @ InfoError::Unsupported(_)) => assert!(e.is_unsupported()),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_missing_fdinfo_directory_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let fdinfo = dir.path().join("missing");
    let reader = InfoReader::new().with_fdinfo_dir(&fdinfo);
    let file = File::open("/dev/null").unwrap();

    match reader.describe_map(&file) {
        Err(InfoError::Query(_)) => {}
        Err(InfoError::Io { path, .. }) => assert!(path.starts_with(&fdinfo)),
        other => panic!("unexpected result: {other:?}"),
    }
}
