//! Codemods for AdonisJS-style applications.
//!
//! The engine edits a host project's configuration and entry-point files:
//!
//! - **Environment files**: `.env` and `.env.example` via [`EnvEditor`]
//! - **Structural insertions**: env validations, middleware, policies, build
//!   and test plugins, and `adonisrc.ts` registrations, located through
//!   [`InsertionAnchor`] and applied without duplicating existing entries
//! - **Package installation** through the project's package manager via
//!   [`DependencyInstaller`]
//!
//! Every [`Codemods`] operation reports exactly one [`OperationOutcome`] to
//! its [`OutcomeReporter`] and returns it, or the [`CodemodError`] that made
//! it fail.

mod anchor;
mod codemods;
mod entries;
mod env;
mod error;
mod insertion;
mod install;
pub mod layout;
mod outcome;
mod persist;
mod project;
mod rc_file;
pub mod telemetry;

pub use anchor::InsertionAnchor;
pub use codemods::Codemods;
pub use entries::{
    EnvValidations, MiddlewareNode, MiddlewarePosition, MiddlewareStack, PolicyNode,
};
pub use env::{EnvEditor, EnvFile, EnvVariablesOptions, EnvWrite};
pub use error::{CodemodError, ErrorKind};
pub use install::{DependencyInstaller, InstallCommand, PackageSpec};
pub use outcome::{
    OperationOutcome, OutcomeReporter, OutcomeStatus, RecordingReporter, TracingReporter,
};
pub use project::{CompilerConfig, Project};
pub use rc_file::{AssemblerHook, RcEnvironment, RcFileBuilder};
pub use weft_config::PackageManager;
pub use weft_syntax::ImportRequirement;
