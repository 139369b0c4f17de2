use std::fs;

use relay_engine::{ensure_output_dir, read_if_exists, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("ip");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_whole_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("IPTV_bad.txt", "a,http://x/1\nb,http://x/2\n").unwrap();
    assert_eq!(first.file_name().unwrap(), "IPTV_bad.txt");

    let second = writer.write("IPTV_bad.txt", "").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("IPTV.txt", "data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("IPTV.txt").exists());
}

#[test]
fn missing_file_reads_as_none() {
    let temp = TempDir::new().unwrap();
    assert_eq!(read_if_exists(&temp.path().join("计数.txt")).unwrap(), None);

    fs::write(temp.path().join("计数.txt"), "5").unwrap();
    assert_eq!(
        read_if_exists(&temp.path().join("计数.txt")).unwrap(),
        Some("5".to_string())
    );
}
