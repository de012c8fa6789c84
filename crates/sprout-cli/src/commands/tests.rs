use super::*;
use camino::Utf8Path;
use tempfile::TempDir;

use sprout_resolver::{detect_conflicts, resolve_conflicts, ResolutionPolicy};

const CATALOG: &str = r#"{
    "tools": [
        { "id": "node", "name": "Node.js", "versions": ["16.20.0", "18.19.0"] },
        { "id": "legacy-app", "dependencies": [{ "tool": "node", "version": "16.x" }] },
        { "id": "modern-app", "dependencies": [{ "tool": "node", "version": ">=18" }] },
        { "id": "jq" }
    ]
}"#;

fn workspace() -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
    std::fs::write(root.join("tools.json"), CATALOG).unwrap();
    (dir, root)
}

fn context(cwd: &Utf8Path) -> CommandContext {
    CommandContext {
        cwd: cwd.to_path_buf(),
        output: OutputHandler::plain(),
        loader: ConfigLoader::new(cwd.to_path_buf()).with_global_path(None),
        json: false,
    }
}

fn args(targets: &[&str]) -> PipelineArgs {
    PipelineArgs {
        catalog: Some(Utf8PathBuf::from("tools.json")),
        targets: targets.iter().map(|t| t.to_string()).collect(),
        ..PipelineArgs::default()
    }
}

#[test]
fn test_prepare_defaults_targets_to_catalog() {
    let (_dir, root) = workspace();
    let prepared = prepare(&args(&[]), &context(&root)).unwrap();

    assert_eq!(prepared.graph.node_count(), 4);
    assert_eq!(prepared.targets, vec!["jq", "legacy-app", "modern-app", "node"]);
}

#[test]
fn test_prepare_applies_platform_flags() {
    let (_dir, root) = workspace();
    let pipeline = PipelineArgs {
        os: Some("windows".to_string()),
        arch: Some("arm64".to_string()),
        ..args(&["jq"])
    };

    let prepared = prepare(&pipeline, &context(&root)).unwrap();
    assert_eq!(prepared.platform.to_string(), "windows-arm64");
}

#[test]
fn test_prepare_reads_catalog_from_project_file() {
    let (_dir, root) = workspace();
    std::fs::write(root.join("sprout.toml"), "catalog = \"tools.json\"\n").unwrap();
    let pipeline = PipelineArgs {
        catalog: None,
        ..args(&["jq"])
    };

    let prepared = prepare(&pipeline, &context(&root)).unwrap();
    assert!(prepared.graph.contains("node"));
}

#[test]
fn test_missing_catalog_is_a_config_error() {
    let (_dir, root) = workspace();
    let pipeline = PipelineArgs {
        catalog: None,
        ..args(&[])
    };

    let err = prepare(&pipeline, &context(&root)).err().unwrap();
    let sprout = err.downcast_ref::<SproutError>().unwrap();
    assert!(matches!(sprout, SproutError::ConfigValidation { field, .. } if field == "catalog"));
}

#[test]
fn test_unknown_target_is_reported() {
    let (_dir, root) = workspace();
    let err = check::execute(&args(&["nodejs"]), &context(&root)).unwrap_err();

    let sprout = err.downcast_ref::<SproutError>().unwrap();
    assert!(matches!(sprout, SproutError::UnknownNode { .. }));
}

#[test]
fn test_check_reports_blocking_conflict() {
    let (_dir, root) = workspace();
    let ctx = context(&root);

    assert!(!check::execute(&args(&["legacy-app", "modern-app"]), &ctx).unwrap());
    assert!(check::execute(&args(&["modern-app"]), &ctx).unwrap());
}

#[test]
fn test_order_refuses_while_blocked() {
    let (_dir, root) = workspace();
    let ctx = context(&root);

    let err = order::execute(&args(&["legacy-app", "modern-app"]), &ctx).unwrap_err();
    let sprout = err.downcast_ref::<SproutError>().unwrap();
    assert!(matches!(sprout, SproutError::InstallationBlocked { .. }));

    assert!(order::execute(&args(&["modern-app", "jq"]), &ctx).unwrap());
}

#[test]
fn test_resolve_applies_and_dry_run_plans() {
    let (_dir, root) = workspace();
    let ctx = context(&root);
    let pipeline = args(&["legacy-app", "modern-app"]);

    assert!(resolve::execute(&pipeline, false, &ctx).unwrap());
    assert!(resolve::execute(&pipeline, true, &ctx).unwrap());

    // A dry run leaves the graph untouched
    let prepared = prepare(&pipeline, &ctx).unwrap();
    let detection = detect_conflicts(&prepared.graph, &prepared.targets, &prepared.config.detection).unwrap();
    let policy = ResolutionPolicy {
        require_user_confirmation: true,
        ..ResolutionPolicy::default()
    };
    let plan = resolve_conflicts(&detection, &prepared.graph, &policy).unwrap();
    assert!(!plan.applied);
    assert_eq!(plan.graph, prepared.graph);
}

#[test]
fn test_resolve_honors_project_policy() {
    let (_dir, root) = workspace();
    std::fs::write(
        root.join("sprout.toml"),
        "[resolution]\nautomatic-resolution = true\nallow-edge-relaxation = false\n",
    )
    .unwrap();
    let ctx = context(&root);

    // Pinning still succeeds without relaxation
    assert!(resolve::execute(&args(&["legacy-app", "modern-app"]), false, &ctx).unwrap());
}

#[test]
fn test_stats_succeeds() {
    let (_dir, root) = workspace();
    assert!(stats::execute(&args(&[]), &context(&root)).unwrap());
}
