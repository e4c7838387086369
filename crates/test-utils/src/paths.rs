//! Path utilities for the workspace root and temporary snapshot directories.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Creates a temporary directory for test output.
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Creates a temporary snapshot directory containing one small HTML file per
/// name. Each file's body is `<html>{name}</html>`.
pub fn temp_snapshot_dir(names: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::Builder::new()
        .prefix("mapas_html")
        .tempdir()
        .expect("Failed to create temporary snapshot directory");
    for name in names {
        write_snapshot(dir.path(), name);
    }
    dir
}

/// Writes `<html>{name}</html>` to `dir/name`.
pub fn write_snapshot(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), format!("<html>{}</html>", name))
        .expect("Failed to write snapshot file");
}
