//! Builder over the resource configuration file (`adonisrc.ts`).
//!
//! [`RcFileBuilder`] performs no I/O. Each method records an intended
//! registration; [`RcFileBuilder::into_plan`] folds them into one
//! [`InsertionPlan`] against the object passed to `defineConfig(...)`, which
//! the engine applies in a single all-or-nothing pass.

use strum::{Display, EnumString};
use weft_syntax::query;

use crate::anchor::InsertionAnchor;
use crate::insertion::{Conflict, Element, InsertionPlan, InsertionStep, Property, lazy_import};

/// Runtime environments a provider or preload file can be limited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum RcEnvironment {
    /// HTTP server.
    Web,
    /// Command line.
    Console,
    /// Test runner.
    Test,
    /// Interactive shell.
    Repl,
}

impl RcEnvironment {
    /// Every environment.
    pub const ALL: [Self; 4] = [Self::Web, Self::Console, Self::Test, Self::Repl];
}

/// Assembler lifecycle hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum AssemblerHook {
    /// Before a production build starts.
    OnBuildStarting,
    /// After a production build completes.
    OnBuildCompleted,
    /// When the development server has started.
    OnDevServerStarted,
    /// When a source file changes in watch mode.
    OnSourceFileChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Registration {
    Command(String),
    Provider {
        path: String,
        environments: Vec<RcEnvironment>,
    },
    Preload {
        path: String,
        environments: Vec<RcEnvironment>,
    },
    MetaFile {
        pattern: String,
        reload_server: bool,
    },
    Directory {
        key: String,
        value: String,
    },
    CommandAlias {
        alias: String,
        command: String,
    },
    Suite {
        name: String,
        files: Vec<String>,
        timeout: Option<u64>,
    },
    Hook {
        kind: AssemblerHook,
        path: String,
    },
}

/// Records registrations against the resource configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RcFileBuilder {
    registrations: Vec<Registration>,
}

impl RcFileBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command provider module.
    pub fn add_command(&mut self, path: impl Into<String>) -> &mut Self {
        self.record(Registration::Command(path.into()))
    }

    /// Registers a service provider.
    ///
    /// An empty `environments` slice, or one naming every environment, loads
    /// the provider everywhere.
    pub fn add_provider(&mut self, path: impl Into<String>, environments: &[RcEnvironment]) -> &mut Self {
        self.record(Registration::Provider {
            path: path.into(),
            environments: environments.to_vec(),
        })
    }

    /// Registers a preload file, optionally limited to `environments`.
    pub fn add_preload_file(&mut self, path: impl Into<String>, environments: &[RcEnvironment]) -> &mut Self {
        self.record(Registration::Preload {
            path: path.into(),
            environments: environments.to_vec(),
        })
    }

    /// Registers a meta file glob copied into builds.
    pub fn add_meta_file(&mut self, pattern: impl Into<String>, reload_server: bool) -> &mut Self {
        self.record(Registration::MetaFile {
            pattern: pattern.into(),
            reload_server,
        })
    }

    /// Points a well-known directory at `value`.
    pub fn set_directory(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.record(Registration::Directory {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Defines `alias` as shorthand for `command`.
    pub fn set_command_alias(
        &mut self,
        alias: impl Into<String>,
        command: impl Into<String>,
    ) -> &mut Self {
        self.record(Registration::CommandAlias {
            alias: alias.into(),
            command: command.into(),
        })
    }

    /// Registers a test suite.
    pub fn add_suite<I, S>(&mut self, name: impl Into<String>, files: I, timeout: Option<u64>) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record(Registration::Suite {
            name: name.into(),
            files: files.into_iter().map(Into::into).collect(),
            timeout,
        })
    }

    /// Registers an assembler hook module.
    pub fn add_assembler_hook(&mut self, kind: AssemblerHook, path: impl Into<String>) -> &mut Self {
        self.record(Registration::Hook {
            kind,
            path: path.into(),
        })
    }

    /// Returns whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    fn record(&mut self, registration: Registration) -> &mut Self {
        self.registrations.push(registration);
        self
    }

    /// Folds the recorded registrations into one plan.
    pub(crate) fn into_plan(self) -> InsertionPlan {
        let mut plan = InsertionPlan::new();
        for registration in self.registrations {
            plan.merge(step_for(registration));
        }
        plan
    }
}

fn step_for(registration: Registration) -> InsertionStep {
    match registration {
        Registration::Command(path) => elements(&["commands"], Element::lazy_import(&path)),
        Registration::Provider { path, environments } => {
            elements(&["providers"], scoped_import(&path, &environments))
        }
        Registration::Preload { path, environments } => {
            elements(&["preloads"], scoped_import(&path, &environments))
        }
        Registration::MetaFile {
            pattern,
            reload_server,
        } => {
            let text = format!(
                "{{\n  pattern: {},\n  reloadServer: {reload_server},\n}}",
                query::quote(&pattern)
            );
            elements(&["metaFiles"], Element::keyed(text, "pattern", &pattern))
        }
        Registration::Directory { key, value } => properties(
            &["directories"],
            Property::new(key, query::quote(&value), Conflict::Replace),
        ),
        Registration::CommandAlias { alias, command } => properties(
            &["commandsAliases"],
            Property::new(alias, query::quote(&command), Conflict::Replace),
        ),
        Registration::Suite {
            name,
            files,
            timeout,
        } => {
            let files = files
                .iter()
                .map(|file| query::quote(file))
                .collect::<Vec<_>>()
                .join(", ");
            let mut text = format!("{{\n  name: {},\n  files: [{files}],\n", query::quote(&name));
            if let Some(timeout) = timeout {
                text.push_str(&format!("  timeout: {timeout},\n"));
            }
            text.push('}');
            elements(&["tests", "suites"], Element::keyed(text, "name", &name))
        }
        Registration::Hook { kind, path } => {
            let kind = kind.to_string();
            elements(&["hooks", kind.as_str()], Element::lazy_import(&path))
        }
    }
}

fn elements(path: &[&str], element: Element) -> InsertionStep {
    InsertionStep::elements(
        InsertionAnchor::default_export_property(path.iter().copied()),
        vec![element],
    )
}

fn properties(path: &[&str], property: Property) -> InsertionStep {
    InsertionStep::properties(
        InsertionAnchor::default_export_property(path.iter().copied()),
        vec![property],
    )
}

/// `() => import(path)`, or the `{ file, environment }` form when the module
/// is limited to some environments.
fn scoped_import(path: &str, environments: &[RcEnvironment]) -> Element {
    let limited = !environments.is_empty()
        && !RcEnvironment::ALL
            .iter()
            .all(|environment| environments.contains(environment));
    if !limited {
        return Element::lazy_import(path);
    }
    let names = environments
        .iter()
        .map(|environment| query::quote(&environment.to_string()))
        .collect::<Vec<_>>()
        .join(", ");
    Element::with_specifier(
        format!(
            "{{\n  file: {},\n  environment: [{names}],\n}}",
            lazy_import(path)
        ),
        path,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_syntax::SourceDocument;

    fn apply(source: &str, configure: impl FnOnce(&mut RcFileBuilder)) -> String {
        let mut builder = RcFileBuilder::new();
        configure(&mut builder);
        let mut doc = SourceDocument::parse("adonisrc.ts", source).expect("parse");
        builder.into_plan().apply(&mut doc).expect("apply");
        doc.text().to_owned()
    }

    #[test]
    fn providers_and_commands_fill_empty_config() {
        let output = apply("export default defineConfig({})", |rc| {
            rc.add_provider("@adonisjs/core/providers/app_provider", &[])
                .add_command("@adonisjs/core/commands");
        });
        assert_eq!(
            output,
            concat!(
                "export default defineConfig({\n",
                "  providers: [\n",
                "    () => import('@adonisjs/core/providers/app_provider'),\n",
                "  ],\n",
                "  commands: [\n",
                "    () => import('@adonisjs/core/commands'),\n",
                "  ],\n",
                "})"
            )
        );
    }

    #[test]
    fn limited_provider_lists_environments() {
        let output = apply("export default defineConfig({\n  providers: [],\n})", |rc| {
            rc.add_provider("@adonisjs/core/providers/repl_provider", &[RcEnvironment::Repl]);
        });
        assert_eq!(
            output,
            concat!(
                "export default defineConfig({\n",
                "  providers: [\n",
                "    {\n",
                "      file: () => import('@adonisjs/core/providers/repl_provider'),\n",
                "      environment: ['repl'],\n",
                "    },\n",
                "  ],\n",
                "})"
            )
        );
    }

    #[test]
    fn existing_registrations_are_not_duplicated() {
        let source = concat!(
            "export default defineConfig({\n",
            "  providers: [\n",
            "    () => import('@adonisjs/core/providers/app_provider'),\n",
            "    {\n",
            "      file: () => import('@adonisjs/core/providers/repl_provider'),\n",
            "      environment: ['repl'],\n",
            "    },\n",
            "  ],\n",
            "  metaFiles: [{ pattern: 'public/**', reloadServer: false }],\n",
            "})"
        );
        let output = apply(source, |rc| {
            rc.add_provider("@adonisjs/core/providers/app_provider", &[])
                .add_provider("@adonisjs/core/providers/repl_provider", &[RcEnvironment::Repl])
                .add_meta_file("public/**", false);
        });
        assert_eq!(output, source);
    }

    #[test]
    fn directories_and_aliases_are_replaced() {
        let output = apply(
            "export default defineConfig({\n  directories: {\n    views: 'resources/views',\n  },\n})",
            |rc| {
                rc.set_directory("views", "templates")
                    .set_command_alias("migrate", "migration:run");
            },
        );
        assert_eq!(
            output,
            concat!(
                "export default defineConfig({\n",
                "  directories: {\n",
                "    views: 'templates',\n",
                "  },\n",
                "  commandsAliases: {\n",
                "    migrate: 'migration:run',\n",
                "  },\n",
                "})"
            )
        );
    }

    #[test]
    fn suites_are_nested_under_tests() {
        let output = apply("export default defineConfig({})", |rc| {
            rc.add_suite("unit", ["tests/unit/**/*.spec(.ts|.js)"], Some(2000));
        });
        assert_eq!(
            output,
            concat!(
                "export default defineConfig({\n",
                "  tests: {\n",
                "    suites: [\n",
                "      {\n",
                "        name: 'unit',\n",
                "        files: ['tests/unit/**/*.spec(.ts|.js)'],\n",
                "        timeout: 2000,\n",
                "      },\n",
                "    ],\n",
                "  },\n",
                "})"
            )
        );
    }

    #[test]
    fn hooks_use_camel_case_keys() {
        let output = apply("export default defineConfig({ hooks: {} })", |rc| {
            rc.add_assembler_hook(AssemblerHook::OnBuildStarting, "@adonisjs/vite/build_hook");
        });
        assert_eq!(
            output,
            concat!(
                "export default defineConfig({ hooks: {\n",
                "  onBuildStarting: [\n",
                "    () => import('@adonisjs/vite/build_hook'),\n",
                "  ],\n",
                "} })"
            )
        );
    }

    #[test]
    fn every_environment_means_unrestricted() {
        let element = scoped_import("p", &RcEnvironment::ALL);
        assert_eq!(element, Element::lazy_import("p"));
    }
}
