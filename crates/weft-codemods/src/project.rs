//! Parsed view of the host project.
//!
//! A [`Project`] is created once per engine. It records the project's
//! compiler configuration and caches every source document an operation has
//! loaded, keyed by absolute path. A cached document is reused only while the
//! file on disk still holds the text it was parsed from.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tracing::debug;
use weft_syntax::SourceDocument;

use crate::error::CodemodError;
use crate::layout::COMPILER_CONFIG_FILES;

/// Tracing target for project loading.
const PROJECT_TARGET: &str = "weft_codemods::project";

/// Compiler configuration governing the project's sources.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerConfig {
    path: Option<PathBuf>,
    contents: Value,
}

impl CompilerConfig {
    /// Default used when the project has no configuration file.
    fn synthesized() -> Self {
        Self {
            path: None,
            contents: serde_json::json!({
                "compilerOptions": {
                    "module": "NodeNext",
                    "allowJs": true
                }
            }),
        }
    }

    /// File the configuration was read from, or `None` when synthesised.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns whether the configuration was synthesised.
    #[must_use]
    pub const fn is_synthesized(&self) -> bool {
        self.path.is_none()
    }

    /// Value of `compilerOptions.<name>`, if set.
    #[must_use]
    pub fn compiler_option(&self, name: &str) -> Option<&Value> {
        self.contents.get("compilerOptions")?.get(name)
    }
}

/// Source documents of the host project.
#[derive(Debug)]
pub struct Project {
    base: PathBuf,
    compiler_config: CompilerConfig,
    documents: Mutex<HashMap<PathBuf, SourceDocument>>,
}

impl Project {
    /// Loads the project rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::ConfigurationMissing`] when `base` is not a
    /// directory or its compiler configuration is not valid JSON.
    pub async fn load(base: &Path) -> Result<Self, CodemodError> {
        let is_dir = tokio::fs::metadata(base)
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(CodemodError::configuration(
                base,
                "application root is not a directory",
            ));
        }

        let compiler_config = read_compiler_config(base).await?;
        debug!(
            target: PROJECT_TARGET,
            base = %base.display(),
            config = ?compiler_config.path(),
            synthesized = compiler_config.is_synthesized(),
            "project loaded"
        );
        Ok(Self {
            base: base.to_path_buf(),
            compiler_config,
            documents: Mutex::new(HashMap::new()),
        })
    }

    /// Application root.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Compiler configuration in effect.
    #[must_use]
    pub const fn compiler_config(&self) -> &CompilerConfig {
        &self.compiler_config
    }

    /// Absolute path of `relative`.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.base.join(relative)
    }

    /// Number of documents currently cached.
    #[must_use]
    pub fn cached_documents(&self) -> usize {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns an editable copy of the document at `relative`.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::FileMissing`] when the file does not exist and
    /// [`CodemodError::Syntax`] when it cannot be parsed.
    pub async fn document(&self, relative: &str) -> Result<SourceDocument, CodemodError> {
        let path = self.resolve(relative);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(CodemodError::FileMissing { path });
            }
            Err(error) => return Err(CodemodError::io(&path, error)),
        };

        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = documents.get(&path).filter(|cached| cached.text() == text) {
            return Ok(cached.clone());
        }
        let document = SourceDocument::parse(path.clone(), text)
            .map_err(|error| CodemodError::syntax(&path, error))?;
        documents.insert(path, document.clone());
        Ok(document)
    }

    /// Records the persisted state of an edited document.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::Syntax`] when the document cannot be re-parsed.
    pub fn store(&self, document: &SourceDocument) -> Result<(), CodemodError> {
        let path = document.path().to_path_buf();
        let persisted = SourceDocument::parse_as(path.clone(), document.language(), document.text())
            .map_err(|error| CodemodError::syntax(&path, error))?;
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, persisted);
        Ok(())
    }
}

async fn read_compiler_config(base: &Path) -> Result<CompilerConfig, CodemodError> {
    for name in COMPILER_CONFIG_FILES {
        let path = base.join(name);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => continue,
            Err(error) => return Err(CodemodError::io(&path, error)),
        };
        let contents: Value = serde_json::from_str(&text).map_err(|error| {
            CodemodError::configuration(base, format!("{name} is not valid JSON: {error}"))
        })?;
        return Ok(CompilerConfig {
            path: Some(path),
            contents,
        });
    }
    Ok(CompilerConfig::synthesized())
}
