//! The codemod engine.
//!
//! [`Codemods`] is the entry point callers hold on to. Each public operation
//! edits one file (or runs the package manager) and reports exactly one
//! [`OperationOutcome`] before returning. Structural operations share a
//! single [`Project`], created on first use.

use std::fmt::{self, Display};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;
use weft_config::Config;
use weft_syntax::ImportRequirement;

use crate::anchor::InsertionAnchor;
use crate::entries::{EnvValidations, MiddlewareNode, MiddlewareStack, PolicyNode, middleware_steps};
use crate::env::{EnvEditor, EnvVariablesOptions};
use crate::error::CodemodError;
use crate::insertion::{Element, InsertionPlan, InsertionStep};
use crate::install::{DependencyInstaller, InstallCommand, PackageSpec};
use crate::layout::{
    ENV_EXAMPLE_FILE, ENV_FILE, ENV_VALIDATIONS_CALLEE, ENV_VALIDATIONS_FILE, KERNEL_FILE,
    PLUGINS_PROPERTY, POLICIES_EXPORT, POLICIES_FILE, RC_FILE, TEST_BOOTSTRAP_FILE,
    VITE_CONFIG_FILE,
};
use crate::outcome::{
    OperationOutcome, OutcomeReporter, OutcomeStatus, install_action, update_action,
};
use crate::persist::write_atomic;
use crate::project::Project;
use crate::rc_file::RcFileBuilder;

/// Tracing target for engine operations.
const ENGINE_TARGET: &str = "weft_codemods::engine";

/// Edits a host project's configuration and entry-point files.
pub struct Codemods {
    app_root: PathBuf,
    reporter: Arc<dyn OutcomeReporter>,
    project: OnceCell<Arc<Project>>,
    installer: DependencyInstaller,
}

impl fmt::Debug for Codemods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codemods")
            .field("app_root", &self.app_root)
            .field("project_loaded", &self.project.initialized())
            .field("installer", &self.installer)
            .finish_non_exhaustive()
    }
}

impl Codemods {
    /// Engine for the project at `app_root`.
    #[must_use]
    pub fn new(app_root: impl Into<PathBuf>, reporter: Arc<dyn OutcomeReporter>) -> Self {
        let app_root = app_root.into();
        Self {
            installer: DependencyInstaller::new(app_root.clone()),
            app_root,
            reporter,
            project: OnceCell::new(),
        }
    }

    /// Engine configured from `config`.
    #[must_use]
    pub fn from_config(config: &Config, reporter: Arc<dyn OutcomeReporter>) -> Self {
        let app_root = config.app_root().into_std_path_buf();
        let mut installer = DependencyInstaller::new(app_root.clone())
            .with_package_manager(config.package_manager())
            .with_binary(
                config
                    .package_manager_binary()
                    .map(|binary| binary.as_std_path().to_path_buf()),
            );
        installer.set_verbose(config.verbose_install_output());
        Self {
            app_root,
            reporter,
            project: OnceCell::new(),
            installer,
        }
    }

    /// Replaces the installer, e.g. to pin a package manager binary.
    #[must_use]
    pub fn with_installer(mut self, installer: DependencyInstaller) -> Self {
        self.installer = installer;
        self
    }

    /// Application root.
    #[must_use]
    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    /// Streams package manager output to the reporter when set.
    pub const fn set_verbose_install_output(&mut self, verbose: bool) {
        self.installer.set_verbose(verbose);
    }

    /// Returns whether package manager output is streamed.
    #[must_use]
    pub const fn verbose_install_output(&self) -> bool {
        self.installer.is_verbose()
    }

    /// The project shared by every structural operation.
    ///
    /// The first call loads it; concurrent first calls wait for that single
    /// load, and later calls return the same instance.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::ConfigurationMissing`] when the project cannot
    /// be loaded. A failed load is retried by the next call.
    pub async fn project(&self) -> Result<Arc<Project>, CodemodError> {
        self.project
            .get_or_try_init(|| async { Project::load(&self.app_root).await.map(Arc::new) })
            .await
            .cloned()
    }

    /// Defines environment variables in `.env`, mirroring their keys into
    /// `.env.example`.
    ///
    /// A project without a `.env` file is left untouched and the operation
    /// still reports success.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::InvalidEntry`] when a key or value would not
    /// fit on a single `KEY=VALUE` line, and [`CodemodError::Io`] when a file
    /// cannot be read or written.
    pub async fn define_env_variables<I, K, V>(
        &self,
        entries: I,
        options: &EnvVariablesOptions,
    ) -> Result<OperationOutcome, CodemodError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Display,
    {
        let action = update_action(ENV_FILE);
        let entries: Vec<(String, V)> = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();
        if entries.is_empty() {
            return self.conclude(action, Ok(skipped("no variables given")));
        }

        let editor = EnvEditor::new(
            self.app_root.join(ENV_FILE),
            self.app_root.join(ENV_EXAMPLE_FILE),
        );
        let result = editor
            .define(&entries, options)
            .await
            .map(|_| OutcomeStatus::Applied);
        self.conclude(action, result)
    }

    /// Merges validation rules into the object passed to `Env.create(...)`
    /// in `start/env.ts`. Existing rules for the same variable are replaced.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::AnchorNotFound`] when the file or the
    /// `Env.create` call is missing.
    pub async fn define_env_validations(
        &self,
        validations: &EnvValidations,
    ) -> Result<OperationOutcome, CodemodError> {
        let action = update_action(ENV_VALIDATIONS_FILE);
        if validations.variables.is_empty() {
            return self.conclude(action, Ok(skipped("no validations given")));
        }

        let anchor = InsertionAnchor::call_argument(ENV_VALIDATIONS_CALLEE);
        let description = anchor.describe(weft_syntax::Delimiter::Object);
        let plan = InsertionPlan::new().step(
            InsertionStep::properties(anchor, validations.properties())
                .with_leading_comment(validations.leading_comment.clone()),
        );
        let result = match self.transform(ENV_VALIDATIONS_FILE, &plan).await {
            Err(CodemodError::FileMissing { path }) => Err(CodemodError::AnchorNotFound {
                path,
                anchor: description,
            }),
            other => other,
        };
        self.conclude(action, result)
    }

    /// Registers middleware on one of the stacks in `start/kernel.ts`.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::FileMissing`] or an anchor error when the
    /// stack cannot be located, and [`CodemodError::InvalidEntry`] for a
    /// named middleware without a name.
    pub async fn register_middleware(
        &self,
        stack: MiddlewareStack,
        nodes: &[MiddlewareNode],
    ) -> Result<OperationOutcome, CodemodError> {
        let action = update_action(KERNEL_FILE);
        if nodes.is_empty() {
            return self.conclude(action, Ok(skipped("no middleware given")));
        }

        let result = match middleware_steps(stack, nodes) {
            Ok(steps) => {
                let mut plan = InsertionPlan::new();
                for step in steps {
                    plan.push(step);
                }
                self.transform(KERNEL_FILE, &plan).await
            }
            Err(error) => Err(error),
        };
        self.conclude(action, result)
    }

    /// Registers policies in the map exported from `app/policies/main.ts`.
    /// A policy already present keeps its existing path.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::FileMissing`] or an anchor error when the
    /// policy map cannot be located.
    pub async fn register_policies(
        &self,
        policies: &[PolicyNode],
    ) -> Result<OperationOutcome, CodemodError> {
        let action = update_action(POLICIES_FILE);
        if policies.is_empty() {
            return self.conclude(action, Ok(skipped("no policies given")));
        }

        let plan = InsertionPlan::new().step(InsertionStep::properties(
            InsertionAnchor::named_export(POLICIES_EXPORT),
            policies.iter().map(PolicyNode::property).collect(),
        ));
        let result = self.transform(POLICIES_FILE, &plan).await;
        self.conclude(action, result)
    }

    /// Adds `plugin_call` to the `plugins` array of `vite.config.ts`,
    /// importing what it needs.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::FileMissing`] or an anchor error when the
    /// default export cannot be located, and [`CodemodError::InvalidEdit`]
    /// when `plugin_call` is not a valid expression.
    pub async fn register_build_plugin(
        &self,
        plugin_call: &str,
        imports: &[ImportRequirement],
    ) -> Result<OperationOutcome, CodemodError> {
        let step = InsertionStep::elements(
            InsertionAnchor::default_export_property([PLUGINS_PROPERTY]),
            vec![Element::expression(plugin_call)],
        );
        self.register_plugin(VITE_CONFIG_FILE, plugin_call, step, imports)
            .await
    }

    /// Adds `plugin_call` to the test runner plugins in `tests/bootstrap.ts`:
    /// `export const plugins = [...]`, or the `plugins` property of the
    /// default export.
    ///
    /// # Errors
    ///
    /// As [`Codemods::register_build_plugin`].
    pub async fn register_test_plugin(
        &self,
        plugin_call: &str,
        imports: &[ImportRequirement],
    ) -> Result<OperationOutcome, CodemodError> {
        let step = InsertionStep::elements(
            InsertionAnchor::named_export(PLUGINS_PROPERTY),
            vec![Element::expression(plugin_call)],
        )
        .or_anchor(InsertionAnchor::default_export_property([PLUGINS_PROPERTY]));
        self.register_plugin(TEST_BOOTSTRAP_FILE, plugin_call, step, imports)
            .await
    }

    async fn register_plugin(
        &self,
        relative: &str,
        plugin_call: &str,
        step: InsertionStep,
        imports: &[ImportRequirement],
    ) -> Result<OperationOutcome, CodemodError> {
        let action = update_action(relative);
        if plugin_call.trim().is_empty() {
            return self.conclude(action, Ok(skipped("no plugin given")));
        }
        let plan = InsertionPlan::new().step(step).imports(imports);
        let result = self.transform(relative, &plan).await;
        self.conclude(action, result)
    }

    /// Applies the registrations `mutate` records to `adonisrc.ts` in one
    /// pass. Either every registration lands or the file is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::FileMissing`] or an anchor error when the
    /// configuration object cannot be located.
    pub async fn update_rc_file<F>(&self, mutate: F) -> Result<OperationOutcome, CodemodError>
    where
        F: FnOnce(&mut RcFileBuilder),
    {
        let action = update_action(RC_FILE);
        let mut builder = RcFileBuilder::new();
        mutate(&mut builder);
        if builder.is_empty() {
            return self.conclude(action, Ok(skipped("no changes requested")));
        }

        let plan = builder.into_plan();
        let result = self.transform(RC_FILE, &plan).await;
        self.conclude(action, result)
    }

    /// Installs `packages` with the project's package manager.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::InstallSpawn`] when the package manager cannot
    /// be started and [`CodemodError::InstallFailure`] when it exits
    /// unsuccessfully.
    pub async fn install_packages(
        &self,
        packages: &[PackageSpec],
    ) -> Result<OperationOutcome, CodemodError> {
        let action = install_action(packages.iter().map(|spec| spec.name.as_str()));
        if packages.is_empty() {
            return self.conclude(action, Ok(skipped("no packages given")));
        }

        let result = self
            .installer
            .install(packages, self.reporter.as_ref())
            .await
            .map(|()| OutcomeStatus::Applied);
        self.conclude(action, result)
    }

    /// Commands that would install `packages`, for callers that let the user
    /// run them instead. Nothing is spawned and nothing is reported.
    pub async fn install_command(&self, packages: &[PackageSpec]) -> Vec<InstallCommand> {
        self.installer.commands(packages).await
    }

    async fn transform(
        &self,
        relative: &str,
        plan: &InsertionPlan,
    ) -> Result<OutcomeStatus, CodemodError> {
        if plan.is_empty() {
            return Ok(skipped("nothing to insert"));
        }
        let project = self.project().await?;
        let mut document = project.document(relative).await?;
        plan.apply(&mut document)?;

        if document.is_modified() {
            write_atomic(document.path().to_path_buf(), document.text().to_owned()).await?;
            project.store(&document)?;
        } else {
            debug!(
                target: ENGINE_TARGET,
                path = relative,
                "entries already present, file left unchanged"
            );
        }
        Ok(OutcomeStatus::Applied)
    }

    fn conclude(
        &self,
        action: String,
        result: Result<OutcomeStatus, CodemodError>,
    ) -> Result<OperationOutcome, CodemodError> {
        match result {
            Ok(status) => {
                let outcome = OperationOutcome::new(action, status);
                self.reporter.report(&outcome);
                Ok(outcome)
            }
            Err(error) => {
                debug!(
                    target: ENGINE_TARGET,
                    kind = %error.kind(),
                    error = %error,
                    "operation failed"
                );
                self.reporter
                    .report(&OperationOutcome::failed(action, error.to_string()));
                Err(error)
            }
        }
    }
}

fn skipped(reason: &str) -> OutcomeStatus {
    OutcomeStatus::Skipped(reason.to_owned())
}
