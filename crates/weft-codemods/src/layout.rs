//! Conventional locations of the files the engine edits, relative to the
//! application root.

/// Primary environment file.
pub const ENV_FILE: &str = ".env";

/// Example counterpart of [`ENV_FILE`] committed to version control.
pub const ENV_EXAMPLE_FILE: &str = ".env.example";

/// Module declaring the environment validation schema.
pub const ENV_VALIDATIONS_FILE: &str = "start/env.ts";

/// Callee whose object argument holds the validation schema.
pub const ENV_VALIDATIONS_CALLEE: &str = "Env.create";

/// Module registering HTTP middleware stacks.
pub const KERNEL_FILE: &str = "start/kernel.ts";

/// Policy registry module.
pub const POLICIES_FILE: &str = "app/policies/main.ts";

/// Exported binding holding the policy map.
pub const POLICIES_EXPORT: &str = "policies";

/// Build tool configuration.
pub const VITE_CONFIG_FILE: &str = "vite.config.ts";

/// Test runner bootstrap module.
pub const TEST_BOOTSTRAP_FILE: &str = "tests/bootstrap.ts";

/// Property (or exported binding) listing plugins.
pub const PLUGINS_PROPERTY: &str = "plugins";

/// Resource configuration file.
pub const RC_FILE: &str = "adonisrc.ts";

/// Package manifest inspected for the `packageManager` field.
pub const PACKAGE_JSON: &str = "package.json";

/// Compiler configuration files, in lookup order.
pub const COMPILER_CONFIG_FILES: [&str; 2] = ["tsconfig.json", "jsconfig.json"];
