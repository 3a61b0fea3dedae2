//! Shared fixtures for engine integration tests.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use weft_codemods::{Codemods, RecordingReporter};

/// Temporary application root seeded with `files`.
pub fn app(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    for (relative, contents) in files {
        write(dir.path(), relative, contents);
    }
    dir
}

/// Writes `contents` to `relative`, creating parent directories.
pub fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directories");
    }
    fs::write(path, contents).expect("write fixture file");
}

/// Reads `relative` back from the application root.
pub fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).expect("read file")
}

/// Engine for `root` paired with the reporter it reports to.
pub fn engine(root: &Path) -> (Codemods, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::default());
    let codemods = Codemods::new(root, reporter.clone());
    (codemods, reporter)
}
