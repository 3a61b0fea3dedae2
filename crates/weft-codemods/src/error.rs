//! Typed failures surfaced by engine operations.
//!
//! Every operation classifies its failure before returning it, so callers can
//! match on [`CodemodError`] or bucket it with [`CodemodError::kind`]. I/O
//! errors are wrapped in `Arc` to keep the enum small.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use weft_syntax::{SyntaxError, ValidationFailure};

/// Errors raised by engine operations.
#[derive(Debug, Error)]
pub enum CodemodError {
    /// No compiler configuration could be located or synthesised.
    #[error("cannot load project configuration under {}: {message}", base.display())]
    ConfigurationMissing {
        /// Application root that was inspected.
        base: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The file an operation edits does not exist.
    #[error("expected file {} does not exist", path.display())]
    FileMissing {
        /// Absolute path of the missing file.
        path: PathBuf,
    },

    /// The insertion anchor was not found in the target file.
    #[error("cannot find {anchor} in {}", path.display())]
    AnchorNotFound {
        /// Target file.
        path: PathBuf,
        /// Description of the anchor.
        anchor: String,
    },

    /// The insertion anchor matched more than one location.
    #[error("{anchor} matches {matches} locations in {}", path.display())]
    AmbiguousAnchor {
        /// Target file.
        path: PathBuf,
        /// Description of the anchor.
        anchor: String,
        /// Number of candidate locations.
        matches: usize,
    },

    /// An entry supplied by the caller cannot be rendered.
    #[error("invalid entry: {message}")]
    InvalidEntry {
        /// Why the entry was rejected.
        message: String,
    },

    /// The edits would introduce syntax errors into the file.
    #[error("edits to {} would introduce syntax errors: {}", path.display(), describe_failures(failures))]
    InvalidEdit {
        /// Target file.
        path: PathBuf,
        /// Errors present after editing.
        failures: Vec<ValidationFailure>,
    },

    /// The file could not be parsed or edited.
    #[error("failed to process {}: {source}", path.display())]
    Syntax {
        /// Target file.
        path: PathBuf,
        /// Underlying parser error.
        #[source]
        source: SyntaxError,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The package manager could not be started.
    #[error("failed to start `{command}`: {source}")]
    InstallSpawn {
        /// Rendered command line.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The package manager exited unsuccessfully.
    #[error("`{command}` {}", describe_exit(*exit_code))]
    InstallFailure {
        /// Rendered command line.
        command: String,
        /// Exit code, absent when the process was killed by a signal.
        exit_code: Option<i32>,
        /// Captured stdout followed by stderr.
        output: String,
    },
}

/// Coarse classification of a [`CodemodError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Project configuration could not be loaded.
    Configuration,
    /// A required file is absent.
    FileMissing,
    /// An anchor was missing or ambiguous.
    Anchor,
    /// Caller input was rejected.
    Input,
    /// Parsing, editing or validation failed.
    Syntax,
    /// Filesystem access failed.
    Io,
    /// Dependency installation failed.
    Install,
}

impl CodemodError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationMissing { .. } => ErrorKind::Configuration,
            Self::FileMissing { .. } => ErrorKind::FileMissing,
            Self::AnchorNotFound { .. } | Self::AmbiguousAnchor { .. } => ErrorKind::Anchor,
            Self::InvalidEntry { .. } => ErrorKind::Input,
            Self::InvalidEdit { .. } | Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Io { .. } => ErrorKind::Io,
            Self::InstallSpawn { .. } | Self::InstallFailure { .. } => ErrorKind::Install,
        }
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn syntax(path: &Path, source: SyntaxError) -> Self {
        Self::Syntax {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn configuration(base: &Path, message: impl Into<String>) -> Self {
        Self::ConfigurationMissing {
            base: base.to_path_buf(),
            message: message.into(),
        }
    }
}

fn describe_failures(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_exit(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exited with status {code}"),
        None => String::from("was terminated by a signal"),
    }
}
