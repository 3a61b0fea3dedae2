//! Atomic file replacement.
//!
//! Content is written to a temporary file in the target's directory and then
//! renamed over the target, so readers observe either the old or the new file
//! and never a partial write. The blocking filesystem work runs on tokio's
//! blocking pool.

use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CodemodError;

/// Tracing target for persistence.
const PERSIST_TARGET: &str = "weft_codemods::persist";

/// Replaces `path` with `contents`.
pub(crate) async fn write_atomic(path: PathBuf, contents: String) -> Result<(), CodemodError> {
    let target = path.clone();
    tokio::task::spawn_blocking(move || write_blocking(&path, &contents))
        .await
        .map_err(|error| CodemodError::io(&target, io::Error::other(error)))?
}

fn write_blocking(path: &Path, contents: &str) -> Result<(), CodemodError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file =
        tempfile::NamedTempFile::new_in(parent).map_err(|error| CodemodError::io(path, error))?;
    temp_file
        .write_all(contents.as_bytes())
        .map_err(|error| CodemodError::io(path, error))?;
    match std::fs::metadata(path) {
        Ok(metadata) => temp_file
            .as_file()
            .set_permissions(metadata.permissions())
            .map_err(|error| CodemodError::io(path, error))?,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(CodemodError::io(path, error)),
    }
    temp_file
        .persist(path)
        .map_err(|error| CodemodError::io(path, error.error))?;

    debug!(
        target: PERSIST_TARGET,
        path = %path.display(),
        bytes = contents.len(),
        "file written"
    );
    Ok(())
}
