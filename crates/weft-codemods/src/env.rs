//! Line-oriented editing of `.env` files.
//!
//! [`EnvFile`] keeps every line it does not own byte-for-byte: comments,
//! blank lines and unrelated entries survive an edit untouched. Defining a
//! key that already exists rewrites that line in place; new keys are appended.

use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CodemodError;
use crate::persist::write_atomic;

/// Tracing target for env edits.
const ENV_TARGET: &str = "weft_codemods::env";

#[derive(Debug, Clone, PartialEq, Eq)]
enum EnvLine {
    Entry { key: String, raw: String },
    Other(String),
}

impl EnvLine {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        let declaration = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        match declaration.split_once('=') {
            Some((key, _)) if !key.trim().is_empty() && !trimmed.starts_with('#') => Self::Entry {
                key: key.trim().to_owned(),
                raw: raw.to_owned(),
            },
            _ => Self::Other(raw.to_owned()),
        }
    }

    fn raw(&self) -> &str {
        match self {
            Self::Entry { raw, .. } | Self::Other(raw) => raw,
        }
    }
}

/// An env file held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    lines: Vec<EnvLine>,
    trailing_newline: bool,
    appended: bool,
}

impl EnvFile {
    /// Parses env file text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(EnvLine::parse).collect()
        };
        Self {
            lines,
            trailing_newline,
            appended: false,
        }
    }

    /// Keys defined in the file, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            EnvLine::Entry { key, .. } => Some(key.as_str()),
            EnvLine::Other(_) => None,
        })
    }

    /// Returns whether `key` is defined.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys().any(|existing| existing == key)
    }

    /// Sets `key` to `value`, updating the first existing definition or
    /// appending a new one. Values are written unquoted.
    pub fn define(&mut self, key: &str, value: &str) {
        let existing = self.lines.iter_mut().find(|line| {
            matches!(line, EnvLine::Entry { key: existing, .. } if existing == key)
        });
        match existing {
            Some(line) => {
                let prefix = if line.raw().trim_start().starts_with("export ") {
                    "export "
                } else {
                    ""
                };
                *line = EnvLine::Entry {
                    key: key.to_owned(),
                    raw: format!("{prefix}{key}={value}"),
                };
            }
            None => {
                let raw = format!("{key}={value}");
                self.lines.push(EnvLine::Entry {
                    key: key.to_owned(),
                    raw,
                });
                self.appended = true;
            }
        }
    }

    /// Renders the file.
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = self
            .lines
            .iter()
            .map(EnvLine::raw)
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline || self.appended {
            text.push('\n');
        }
        text
    }
}

/// Options for [`EnvEditor::define`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVariablesOptions {
    /// Keys that must not be mirrored into the example file.
    pub omit_from_example: Vec<String>,
}

impl EnvVariablesOptions {
    /// Omits `keys` from the example file.
    #[must_use]
    pub fn omit_from_example<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            omit_from_example: keys.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of [`EnvEditor::define`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvWrite {
    /// The primary file (and the example file, when present) was written.
    Written {
        /// Whether the example file was updated too.
        example: bool,
    },
    /// The primary file does not exist, so nothing was written.
    PrimaryMissing,
}

/// Edits a primary env file and its example counterpart.
#[derive(Debug, Clone)]
pub struct EnvEditor {
    primary: PathBuf,
    example: PathBuf,
}

impl EnvEditor {
    /// Editor for `primary` mirrored into `example`.
    #[must_use]
    pub fn new(primary: impl Into<PathBuf>, example: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            example: example.into(),
        }
    }

    /// Primary file path.
    #[must_use]
    pub fn primary(&self) -> &Path {
        &self.primary
    }

    /// Defines `entries` in the primary file.
    ///
    /// Each key not listed in `options.omit_from_example` is mirrored into the
    /// example file with an empty value unless the example already defines
    /// it. Neither file is created: a missing primary file makes the whole
    /// call a no-op, and a missing example file is left missing.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::InvalidEntry`] before touching either file when
    /// a key is not a plain name or a value spans several lines, and
    /// [`CodemodError::Io`] when either file cannot be read or written.
    pub async fn define<V: Display>(
        &self,
        entries: &[(String, V)],
        options: &EnvVariablesOptions,
    ) -> Result<EnvWrite, CodemodError> {
        let entries: Vec<(&str, String)> = entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.to_string()))
            .collect();
        for (key, value) in &entries {
            validate_entry(key, value)?;
        }

        let Some(text) = read_if_exists(&self.primary).await? else {
            debug!(
                target: ENV_TARGET,
                path = %self.primary.display(),
                "env file missing, nothing written"
            );
            return Ok(EnvWrite::PrimaryMissing);
        };

        let mut primary = EnvFile::parse(&text);
        for (key, value) in &entries {
            primary.define(key, value);
        }

        let example = match read_if_exists(&self.example).await? {
            Some(example_text) => {
                let mut example = EnvFile::parse(&example_text);
                for (key, _) in &entries {
                    if !options.omit_from_example.iter().any(|omitted| omitted == key)
                        && !example.contains(key)
                    {
                        example.define(key, "");
                    }
                }
                Some(example)
            }
            None => None,
        };

        write_atomic(self.primary.clone(), primary.render()).await?;
        let mirrored = example.is_some();
        if let Some(example) = example {
            write_atomic(self.example.clone(), example.render()).await?;
        }
        debug!(
            target: ENV_TARGET,
            path = %self.primary.display(),
            entries = entries.len(),
            example = mirrored,
            "env variables defined"
        );
        Ok(EnvWrite::Written { example: mirrored })
    }
}

/// Rejects entries that would not stay on one `KEY=VALUE` line.
fn validate_entry(key: &str, value: &str) -> Result<(), CodemodError> {
    if key.is_empty() || key.contains('=') || key.chars().any(char::is_whitespace) {
        return Err(CodemodError::InvalidEntry {
            message: format!("`{}` is not a valid env variable name", key.escape_debug()),
        });
    }
    if value.contains(['\n', '\r']) {
        return Err(CodemodError::InvalidEntry {
            message: format!("value of `{key}` spans more than one line"),
        });
    }
    Ok(())
}

async fn read_if_exists(path: &Path) -> Result<Option<String>, CodemodError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(CodemodError::io(path, error)),
    }
}
