//! Dependency installation through the project's package manager.
//!
//! The installer detects which package manager governs the project, splits
//! the requested packages into production and development groups, and runs
//! one add/install invocation per non-empty group. Output is buffered and
//! only surfaced on failure unless verbose mode streams it line by line to
//! the reporter.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};
use weft_config::PackageManager;

use crate::error::CodemodError;
use crate::layout::PACKAGE_JSON;
use crate::outcome::OutcomeReporter;

/// Tracing target for installer activity.
const INSTALL_TARGET: &str = "weft_codemods::install";

/// A package to install.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageSpec {
    /// Package name, e.g. `@japa/runner`.
    pub name: String,
    /// Version constraint, e.g. `^3.1.0`.
    pub version: Option<String>,
    /// Install as a development dependency.
    pub is_dev_dependency: bool,
}

impl PackageSpec {
    /// Production dependency.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            is_dev_dependency: false,
        }
    }

    /// Development dependency.
    #[must_use]
    pub fn dev(name: impl Into<String>) -> Self {
        Self {
            is_dev_dependency: true,
            ..Self::new(name)
        }
    }

    /// Pins the version constraint.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Argument passed to the package manager: `name` or `name@version`.
    #[must_use]
    pub fn argument(&self) -> String {
        match &self.version {
            Some(version) => format!("{}@{version}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A rendered package manager invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl InstallCommand {
    /// Executable to run.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to the executable.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for InstallCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    package_manager: Option<String>,
}

/// Runs the package manager for the host project.
#[derive(Debug, Clone)]
pub struct DependencyInstaller {
    app_root: PathBuf,
    package_manager: Option<PackageManager>,
    binary: Option<PathBuf>,
    verbose: bool,
}

impl DependencyInstaller {
    /// Installer for the project at `app_root` with auto-detection.
    #[must_use]
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        Self {
            app_root: app_root.into(),
            package_manager: None,
            binary: None,
            verbose: false,
        }
    }

    /// Forces `manager` instead of detecting one.
    #[must_use]
    pub const fn with_package_manager(mut self, manager: Option<PackageManager>) -> Self {
        self.package_manager = manager;
        self
    }

    /// Runs `binary` instead of the manager's default program.
    #[must_use]
    pub fn with_binary(mut self, binary: Option<PathBuf>) -> Self {
        self.binary = binary;
        self
    }

    /// Streams output live when `verbose` is set.
    pub const fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Returns whether output is streamed live.
    #[must_use]
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Package manager governing the project.
    ///
    /// Detection order: explicit configuration, the `packageManager` field of
    /// `package.json`, lock files, then npm.
    pub async fn detect(&self) -> PackageManager {
        if let Some(manager) = self.package_manager {
            return manager;
        }
        if let Some(manager) = self.manifest_manager().await {
            return manager;
        }
        for manager in PackageManager::detection_order() {
            for lock_file in manager.lock_files() {
                let exists = tokio::fs::try_exists(self.app_root.join(lock_file))
                    .await
                    .unwrap_or(false);
                if exists {
                    return *manager;
                }
            }
        }
        PackageManager::default()
    }

    async fn manifest_manager(&self) -> Option<PackageManager> {
        let text = tokio::fs::read_to_string(self.app_root.join(PACKAGE_JSON))
            .await
            .ok()?;
        let manifest: PackageManifest = match serde_json::from_str(&text) {
            Ok(manifest) => manifest,
            Err(error) => {
                warn!(
                    target: INSTALL_TARGET,
                    error = %error,
                    "ignoring unreadable package.json"
                );
                return None;
            }
        };
        let declared = manifest.package_manager?;
        let name = declared.split('@').next().unwrap_or_default();
        name.parse().ok()
    }

    /// Invocations that install `specs`: production packages first, then
    /// development packages. Empty groups produce no invocation.
    pub async fn commands(&self, specs: &[PackageSpec]) -> Vec<InstallCommand> {
        let manager = self.detect().await;
        let program = self
            .binary
            .clone()
            .unwrap_or_else(|| PathBuf::from(manager.program()));

        [false, true]
            .into_iter()
            .filter_map(|dev| {
                let packages: Vec<String> = specs
                    .iter()
                    .filter(|spec| spec.is_dev_dependency == dev)
                    .map(PackageSpec::argument)
                    .collect();
                if packages.is_empty() {
                    return None;
                }
                let mut args = vec![manager.add_subcommand().to_owned()];
                if dev {
                    args.push(manager.dev_flag().to_owned());
                }
                args.extend(packages);
                Some(InstallCommand {
                    program: program.clone(),
                    args,
                })
            })
            .collect()
    }

    /// Installs `specs`.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::InstallSpawn`] when the package manager cannot
    /// be started and [`CodemodError::InstallFailure`] when it exits
    /// unsuccessfully. Later groups are not attempted after a failure.
    pub async fn install(
        &self,
        specs: &[PackageSpec],
        reporter: &dyn OutcomeReporter,
    ) -> Result<(), CodemodError> {
        for command in self.commands(specs).await {
            self.run(&command, reporter).await?;
        }
        Ok(())
    }

    async fn run(
        &self,
        command: &InstallCommand,
        reporter: &dyn OutcomeReporter,
    ) -> Result<(), CodemodError> {
        let rendered = command.to_string();
        debug!(
            target: INSTALL_TARGET,
            command = rendered.as_str(),
            cwd = %self.app_root.display(),
            verbose = self.verbose,
            "spawning package manager"
        );

        let spawn_error = |source: io::Error| CodemodError::InstallSpawn {
            command: rendered.clone(),
            source: Arc::new(source),
        };
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&self.app_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let sink = self.verbose.then_some(reporter);
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout_lines, stderr_lines, status) = tokio::try_join!(
            collect_lines(stdout, sink),
            collect_lines(stderr, sink),
            child.wait(),
        )
        .map_err(spawn_error)?;

        debug!(
            target: INSTALL_TARGET,
            command = rendered.as_str(),
            status = ?status.code(),
            "package manager exited"
        );
        if status.success() {
            return Ok(());
        }

        let output = stdout_lines
            .into_iter()
            .chain(stderr_lines)
            .collect::<Vec<_>>()
            .join("\n");
        Err(CodemodError::InstallFailure {
            command: rendered,
            exit_code: status.code(),
            output,
        })
    }
}

/// Reads `stream` to the end, forwarding each line to `sink` when present.
async fn collect_lines<R>(
    stream: Option<R>,
    sink: Option<&dyn OutcomeReporter>,
) -> io::Result<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return Ok(Vec::new());
    };
    let mut lines = BufReader::new(stream).lines();
    let mut collected = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if let Some(sink) = sink {
            sink.install_output(&line);
        }
        collected.push(line);
    }
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn argument_includes_version() {
        assert_eq!(PackageSpec::new("edge.js").argument(), "edge.js");
        assert_eq!(
            PackageSpec::dev("@japa/runner").with_version("^3.1.0").argument(),
            "@japa/runner@^3.1.0"
        );
    }

    #[tokio::test]
    async fn commands_split_production_and_dev() {
        let dir = tempfile::tempdir().expect("temp dir");
        let installer = DependencyInstaller::new(dir.path())
            .with_package_manager(Some(PackageManager::Yarn))
            .with_binary(Some(PathBuf::from("yarn")));
        let commands = installer
            .commands(&[
                PackageSpec::dev("@japa/runner"),
                PackageSpec::new("edge.js").with_version("^6.0.0"),
                PackageSpec::dev("@japa/assert"),
            ])
            .await;
        let rendered: Vec<String> = commands.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "yarn add edge.js@^6.0.0",
                "yarn add --dev @japa/runner @japa/assert",
            ]
        );
    }

    #[tokio::test]
    async fn empty_group_produces_no_command() {
        let dir = tempfile::tempdir().expect("temp dir");
        let installer = DependencyInstaller::new(dir.path());
        assert!(installer.commands(&[]).await.is_empty());
    }

    #[rstest]
    #[case("pnpm-lock.yaml", PackageManager::Pnpm)]
    #[case("yarn.lock", PackageManager::Yarn)]
    #[case("bun.lockb", PackageManager::Bun)]
    #[case("package-lock.json", PackageManager::Npm)]
    #[tokio::test]
    async fn detects_manager_from_lock_file(
        #[case] lock_file: &str,
        #[case] expected: PackageManager,
    ) {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join(lock_file), "").expect("write lock file");
        let installer = DependencyInstaller::new(dir.path());
        assert_eq!(installer.detect().await, expected);
    }

    #[tokio::test]
    async fn manifest_field_beats_lock_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("yarn.lock"), "").expect("write lock file");
        std::fs::write(
            dir.path().join("package.json"),
            r#"{ "packageManager": "pnpm@9.1.0" }"#,
        )
        .expect("write manifest");
        let installer = DependencyInstaller::new(dir.path());
        assert_eq!(installer.detect().await, PackageManager::Pnpm);
    }

    #[tokio::test]
    async fn configuration_beats_detection() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("yarn.lock"), "").expect("write lock file");
        let installer =
            DependencyInstaller::new(dir.path()).with_package_manager(Some(PackageManager::Bun));
        assert_eq!(installer.detect().await, PackageManager::Bun);
    }

    #[tokio::test]
    async fn falls_back_to_npm() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("package.json"), "{}").expect("write manifest");
        let installer = DependencyInstaller::new(dir.path());
        assert_eq!(installer.detect().await, PackageManager::Npm);
    }
}
