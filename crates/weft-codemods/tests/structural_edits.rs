//! Anchored insertions into the host project's TypeScript modules.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clarity and assertions"
)]

mod support;

use weft_codemods::{
    CodemodError, EnvValidations, ImportRequirement, MiddlewareNode, MiddlewarePosition,
    MiddlewareStack, OutcomeStatus, PolicyNode,
};

use support::{app, engine, read};

const ENV_MODULE: &str = "\
import { Env } from '@adonisjs/core/env'

export default await Env.create(new URL('../', import.meta.url), {
  PORT: Env.schema.number(),
})
";

#[tokio::test]
async fn env_validations_are_added_below_banner() {
    let dir = app(&[("start/env.ts", ENV_MODULE)]);
    let (codemods, reporter) = engine(dir.path());

    codemods
        .define_env_validations(
            &EnvValidations::new([("SESSION_DRIVER", "Env.schema.string()")])
                .with_leading_comment("Variables for configuring session package"),
        )
        .await
        .expect("define validations");

    let text = read(dir.path(), "start/env.ts");
    assert!(text.contains("| Variables for configuring session package\n"));
    assert!(text.contains("  SESSION_DRIVER: Env.schema.string(),\n"));
    assert!(text.contains("PORT: Env.schema.number(),"));
    assert_eq!(reporter.messages(), vec!["DONE:    update start/env.ts file"]);
}

#[tokio::test]
async fn env_validation_for_existing_variable_is_replaced() {
    let dir = app(&[("start/env.ts", ENV_MODULE)]);
    let (codemods, _) = engine(dir.path());

    codemods
        .define_env_validations(&EnvValidations::new([(
            "PORT",
            "Env.schema.number.optional()",
        )]))
        .await
        .expect("define validations");

    let text = read(dir.path(), "start/env.ts");
    assert!(text.contains("PORT: Env.schema.number.optional(),"));
    assert_eq!(text.matches("PORT:").count(), 1);
}

#[tokio::test]
async fn env_validations_without_module_fail_with_anchor_error() {
    let dir = app(&[]);
    let (codemods, reporter) = engine(dir.path());

    let error = codemods
        .define_env_validations(&EnvValidations::new([("PORT", "Env.schema.number()")]))
        .await
        .expect_err("missing module");

    assert!(matches!(error, CodemodError::AnchorNotFound { .. }));
    let outcomes = reporter.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(
        outcomes.first().map(|outcome| outcome.status()),
        Some(OutcomeStatus::Failed(_))
    ));
}

#[tokio::test]
async fn router_middleware_is_registered_once() {
    let dir = app(&[("start/kernel.ts", "router.use([])\n")]);
    let (codemods, _) = engine(dir.path());
    let nodes = [MiddlewareNode::new("@adonisjs/core/bodyparser_middleware")];

    for _ in 0..2 {
        codemods
            .register_middleware(MiddlewareStack::Router, &nodes)
            .await
            .expect("register middleware");
    }

    assert_eq!(
        read(dir.path(), "start/kernel.ts"),
        "router.use([\n  () => import('@adonisjs/core/bodyparser_middleware'),\n])\n"
    );
}

#[tokio::test]
async fn server_middleware_can_be_prepended() {
    let dir = app(&[(
        "start/kernel.ts",
        "server.use([\n  () => import('#middleware/container_bindings_middleware'),\n])\n",
    )]);
    let (codemods, _) = engine(dir.path());

    codemods
        .register_middleware(
            MiddlewareStack::Server,
            &[MiddlewareNode::new("#middleware/force_json").at(MiddlewarePosition::Before)],
        )
        .await
        .expect("register middleware");

    assert_eq!(
        read(dir.path(), "start/kernel.ts"),
        "server.use([\n  () => import('#middleware/force_json'),\n  () => import('#middleware/container_bindings_middleware'),\n])\n"
    );
}

#[tokio::test]
async fn named_middleware_keeps_existing_definition() {
    let source = "export const middleware = router.named({\n  auth: () => import('#middleware/auth_middleware'),\n})\n";
    let dir = app(&[("start/kernel.ts", source)]);
    let (codemods, _) = engine(dir.path());

    codemods
        .register_middleware(
            MiddlewareStack::Named,
            &[
                MiddlewareNode::named("auth", "#middleware/other_auth"),
                MiddlewareNode::named("guest", "#middleware/guest_middleware"),
            ],
        )
        .await
        .expect("register middleware");

    let text = read(dir.path(), "start/kernel.ts");
    assert!(text.contains("auth: () => import('#middleware/auth_middleware'),"));
    assert!(!text.contains("#middleware/other_auth"));
    assert!(text.contains("guest: () => import('#middleware/guest_middleware'),"));
}

#[tokio::test]
async fn missing_anchor_fails_and_leaves_file_untouched() {
    let source = "server.use([])\n";
    let dir = app(&[("start/kernel.ts", source)]);
    let (codemods, reporter) = engine(dir.path());

    let error = codemods
        .register_middleware(
            MiddlewareStack::Router,
            &[MiddlewareNode::new("#middleware/auth")],
        )
        .await
        .expect_err("router.use is absent");

    assert!(matches!(error, CodemodError::AnchorNotFound { .. }));
    assert_eq!(read(dir.path(), "start/kernel.ts"), source);
    let messages = reporter.messages();
    assert_eq!(messages.len(), 1);
    assert!(
        messages
            .first()
            .is_some_and(|message| message.starts_with("FAILED:  update start/kernel.ts file"))
    );
}

#[tokio::test]
async fn policies_are_not_duplicated() {
    let dir = app(&[("app/policies/main.ts", "export const policies = {}\n")]);
    let (codemods, reporter) = engine(dir.path());
    let policies = [PolicyNode::new("PostPolicy", "#policies/post_policy")];

    for _ in 0..2 {
        codemods
            .register_policies(&policies)
            .await
            .expect("register policies");
    }

    assert_eq!(
        read(dir.path(), "app/policies/main.ts"),
        "export const policies = {\n  PostPolicy: () => import('#policies/post_policy'),\n}\n"
    );
    assert_eq!(reporter.outcomes().len(), 2);
}

#[tokio::test]
async fn build_plugin_is_added_with_its_import() {
    let dir = app(&[("vite.config.ts", "export default { plugins: [] }\n")]);
    let (codemods, _) = engine(dir.path());
    let imports = [ImportRequirement::default_export("vue", "@vitejs/plugin-vue")];

    codemods
        .register_build_plugin("vue({ jsx: true })", &imports)
        .await
        .expect("register plugin");
    let first = read(dir.path(), "vite.config.ts");
    codemods
        .register_build_plugin("vue({ jsx: true })", &imports)
        .await
        .expect("register plugin again");

    assert!(first.starts_with("import vue from '@vitejs/plugin-vue'\n"));
    assert!(first.contains("vue({ jsx: true }),"));
    assert_eq!(read(dir.path(), "vite.config.ts"), first);
}

#[tokio::test]
async fn test_plugin_targets_exported_plugins_array() {
    let dir = app(&[(
        "tests/bootstrap.ts",
        "import { assert } from '@japa/assert'\n\nexport const plugins = [assert()]\n",
    )]);
    let (codemods, _) = engine(dir.path());

    codemods
        .register_test_plugin(
            "apiClient()",
            &[ImportRequirement::named("apiClient", "@japa/api-client")],
        )
        .await
        .expect("register plugin");

    assert_eq!(
        read(dir.path(), "tests/bootstrap.ts"),
        "import { assert } from '@japa/assert'\nimport { apiClient } from '@japa/api-client'\n\nexport const plugins = [assert(), apiClient()]\n"
    );
}

#[tokio::test]
async fn test_plugin_falls_back_to_default_export() {
    let dir = app(&[("tests/bootstrap.ts", "export default { plugins: [] }\n")]);
    let (codemods, _) = engine(dir.path());

    codemods
        .register_test_plugin("assert()", &[])
        .await
        .expect("register plugin");

    assert!(read(dir.path(), "tests/bootstrap.ts").contains("assert(),"));
}

#[tokio::test]
async fn rc_file_registrations_land_in_one_pass() {
    let dir = app(&[(
        "adonisrc.ts",
        "import { defineConfig } from '@adonisjs/core/app'\n\nexport default defineConfig({})\n",
    )]);
    let (codemods, reporter) = engine(dir.path());

    let register = || {
        codemods.update_rc_file(|rc| {
            rc.add_command("@adonisjs/lucid/commands")
                .add_provider("@adonisjs/lucid/database_provider", &[]);
        })
    };
    register().await.expect("update rc file");
    let first = read(dir.path(), "adonisrc.ts");
    register().await.expect("update rc file again");

    assert!(first.contains("commands: [\n    () => import('@adonisjs/lucid/commands'),\n  ],"));
    assert!(first.contains("providers: [\n    () => import('@adonisjs/lucid/database_provider'),\n  ],"));
    assert_eq!(read(dir.path(), "adonisrc.ts"), first);
    assert_eq!(
        reporter.messages(),
        vec!["DONE:    update adonisrc.ts file", "DONE:    update adonisrc.ts file"]
    );
}

#[tokio::test]
async fn failing_rc_registration_discards_earlier_ones() {
    let source = "\
import { defineConfig } from '@adonisjs/core/app'

export default defineConfig({
  providers: 'x',
})
";
    let dir = app(&[("adonisrc.ts", source)]);
    let (codemods, reporter) = engine(dir.path());

    let error = codemods
        .update_rc_file(|rc| {
            rc.add_command("@adonisjs/lucid/commands")
                .add_provider("@adonisjs/lucid/database_provider", &[]);
        })
        .await
        .expect_err("providers is not an array");

    assert!(matches!(error, CodemodError::AnchorNotFound { .. }));
    assert_eq!(read(dir.path(), "adonisrc.ts"), source);
    let messages = reporter.messages();
    assert_eq!(messages.len(), 1);
    assert!(
        messages
            .first()
            .is_some_and(|message| message.starts_with("FAILED:  update adonisrc.ts file"))
    );
}

#[tokio::test]
async fn build_plugin_import_skips_type_only_declaration() {
    let dir = app(&[(
        "vite.config.ts",
        "import type { UserConfig } from 'vite'\n\nexport default { plugins: [] }\n",
    )]);
    let (codemods, _) = engine(dir.path());

    codemods
        .register_build_plugin("defineX()", &[ImportRequirement::named("defineX", "vite")])
        .await
        .expect("register plugin");

    let text = read(dir.path(), "vite.config.ts");
    assert!(text.contains("import type { UserConfig } from 'vite'\n"));
    assert!(text.contains("import { defineX } from 'vite'"));
    assert!(text.contains("defineX(),"));
}

#[tokio::test]
async fn empty_rc_update_is_skipped() {
    let dir = app(&[]);
    let (codemods, _) = engine(dir.path());

    let outcome = codemods
        .update_rc_file(|_| {})
        .await
        .expect("update rc file");

    assert!(matches!(outcome.status(), OutcomeStatus::Skipped(_)));
}
