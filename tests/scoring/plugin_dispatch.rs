use std::sync::Arc;

use tempfile::TempDir;

use contribscore::error::PluginError;
use contribscore::evaluation::Dimension;
use contribscore::plugins::{DispatchRequest, Dispatcher, ExecutableLoader, PluginRegistry};

use super::score_harness::{commit, fixed_score_script, install_plugin, plugin_calls};

fn dispatcher(tmp: &TempDir) -> Dispatcher {
    Dispatcher::new(
        Arc::new(ExecutableLoader),
        tmp.path().join("data"),
        Some("sk-test".into()),
        Some("qwen/qwen3-coder-flash".into()),
    )
}

#[tokio::test]
async fn script_plugin_result_is_validated_and_stamped() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("plugins");
    let dir = install_plugin(&root, "zgc_simple", true, &fixed_score_script(130));

    let descriptor = PluginRegistry::new(&root).resolve(None).unwrap();
    assert_eq!(descriptor.id, "zgc_simple");
    assert_eq!(descriptor.version, "1.2.0");

    let commits = vec![commit("c2", "Ann", 2), commit("c1", "Ann", 1)];
    let result = dispatcher(&tmp)
        .evaluate(
            &descriptor,
            DispatchRequest {
                commits: &commits,
                author: "ann",
                model: None,
                mode: "moderate",
            },
        )
        .await
        .unwrap();

    assert_eq!(plugin_calls(&dir), 1);
    assert_eq!(result.scores.get(Dimension::CloudNative), 100.0);
    assert_eq!(result.reasoning, "fixed 130");
    assert_eq!(result.total_commits_analyzed, 2);
    assert_eq!(result.commits_summary.total_additions, 20);
    assert_eq!(result.commits_summary.languages, ["rs"]);
    assert_eq!(result.commits_summary.last_commit_sha.as_deref(), Some("c2"));
    assert_eq!(result.plugin_id, "zgc_simple");
    assert_eq!(result.plugin_version, "1.2.0");
    assert!(result.plugin_scan_path.ends_with("scan/__init__"));
}

#[tokio::test]
async fn malformed_output_is_a_contract_violation() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("plugins");
    install_plugin(
        &root,
        "broken",
        true,
        "#!/bin/sh\ncat > /dev/null\necho '{\"scores\":{\"ai_fullstack\":50}}'\n",
    );

    let descriptor = PluginRegistry::new(&root).resolve(Some("broken")).unwrap();
    let commits = vec![commit("c1", "Ann", 1)];
    let err = dispatcher(&tmp)
        .evaluate(
            &descriptor,
            DispatchRequest {
                commits: &commits,
                author: "ann",
                model: Some("other-model"),
                mode: "moderate",
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::ContractViolation { .. }));
    assert!(err.to_string().contains("ai_architecture"));
}

#[tokio::test]
async fn failing_script_reports_stderr() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("plugins");
    install_plugin(
        &root,
        "crashy",
        true,
        "#!/bin/sh\ncat > /dev/null\necho 'model quota exhausted' >&2\nexit 3\n",
    );

    let descriptor = PluginRegistry::new(&root).resolve(None).unwrap();
    let commits = vec![commit("c1", "Ann", 1)];
    let err = dispatcher(&tmp)
        .evaluate(
            &descriptor,
            DispatchRequest {
                commits: &commits,
                author: "ann",
                model: None,
                mode: "moderate",
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::Invocation { .. }));
    assert!(err.reason().contains("model quota exhausted"));
}

#[test]
fn removed_plugin_is_not_found_without_fallback() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("plugins");
    install_plugin(&root, "zgc_ai", false, &fixed_score_script(70));
    let simple = install_plugin(&root, "zgc_simple", true, &fixed_score_script(50));

    let registry = PluginRegistry::new(&root);
    assert_eq!(registry.resolve(Some("zgc_simple")).unwrap().id, "zgc_simple");

    std::fs::remove_dir_all(simple).unwrap();

    let err = registry.resolve(Some("zgc_simple")).unwrap_err();
    match err {
        PluginError::NotFound {
            requested,
            available,
        } => {
            assert_eq!(requested, "zgc_simple");
            assert_eq!(available, ["zgc_ai"]);
        }
        other => panic!("expected NotFound, got {other}"),
    }
    assert_eq!(registry.resolve(None).unwrap().id, "zgc_ai");
}
