use std::time::Duration;

use contribscore::alias::{AliasGroup, MERGED_MODE};
use contribscore::cache::StalenessPolicy;
use contribscore::error::ScoreError;
use contribscore::evaluation::Dimension;
use contribscore::orchestrator::{CompareRequest, OrchestratorSettings};

use super::score_harness::{
    Bench, FakeCollector, PER_IDENTITY_SCRIPT, commit, fixed_score_script, install_plugin,
    plugin_calls, repo,
};

fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        repo_timeout: Duration::from_millis(500),
        ..OrchestratorSettings::default()
    }
}

fn request(repos: &[&str]) -> CompareRequest {
    CompareRequest {
        contributor: "Ann".into(),
        repos: repos.iter().map(|name| repo(name)).collect(),
        use_cache: true,
        ..CompareRequest::default()
    }
}

#[tokio::test]
async fn failures_are_isolated_per_repository() {
    let bench = Bench::new(
        FakeCollector::new()
            .with_commits("api", vec![commit("a2", "Ann", 2), commit("a1", "ann", 1)])
            .with_commits("docs", vec![commit("d1", "Bob", 3)])
            .failing("gone")
            .slow("huge"),
    );
    install_plugin(&bench.plugins_dir(), "zgc_simple", true, &fixed_score_script(64));
    let orchestrator = bench.orchestrator(settings());

    let result = orchestrator
        .compare(&request(&["api", "gone", "huge", "docs"]))
        .await
        .unwrap();

    assert_eq!(result.comparisons.len() + result.failed_repos.len(), 4);
    assert_eq!(result.comparisons.len(), 1);
    assert_eq!(result.comparisons[0].repo, "github:acme/api");
    assert_eq!(result.comparisons[0].commits, 2);
    assert_eq!(result.plugin_used.as_deref(), Some("zgc_simple"));
    assert_eq!(result.plugin_version.as_deref(), Some("1.2.0"));

    let reason = |name: &str| {
        result
            .failed_repos
            .iter()
            .find(|f| f.repo == format!("github:acme/{name}"))
            .unwrap()
            .clone()
    };
    assert!(reason("gone").reason.contains("404"));
    assert!(reason("gone").retryable);
    assert!(reason("huge").reason.contains("timed out"));
    assert!(reason("docs").reason.contains("no commits by Ann"));
    assert!(!reason("docs").retryable);

    let aggregate = result.aggregate.unwrap();
    assert_eq!(aggregate.total_repos_evaluated, 1);
    assert_eq!(aggregate.total_commits, 2);
    assert_eq!(aggregate.mean_scores.get(Dimension::Leadership), 64.0);
}

#[tokio::test]
async fn unknown_plugin_fails_every_repository_without_fallback() {
    let bench = Bench::new(
        FakeCollector::new().with_commits("api", vec![commit("a1", "Ann", 1)]),
    );
    let dir = install_plugin(&bench.plugins_dir(), "zgc_simple", true, &fixed_score_script(50));
    let orchestrator = bench.orchestrator(settings());

    let result = orchestrator
        .compare(&CompareRequest {
            plugin: Some("zgc_ai".into()),
            ..request(&["api"])
        })
        .await
        .unwrap();

    assert!(result.comparisons.is_empty());
    assert!(result.aggregate.is_none());
    assert!(result.plugin_used.is_none());
    assert!(result.failed_repos[0].reason.contains("zgc_ai"));
    assert!(result.failed_repos[0].reason.contains("zgc_simple"));
    assert_eq!(plugin_calls(&dir), 0);
}

#[tokio::test]
async fn empty_registry_is_fatal() {
    let bench = Bench::new(FakeCollector::new());
    let orchestrator = bench.orchestrator(settings());

    let err = orchestrator.compare(&request(&["api"])).await.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(bench.collector.calls(), 0);
}

#[tokio::test]
async fn oversized_requests_are_rejected() {
    let bench = Bench::new(FakeCollector::new());
    install_plugin(&bench.plugins_dir(), "zgc_simple", true, &fixed_score_script(50));
    let orchestrator = bench.orchestrator(OrchestratorSettings {
        max_repos: 2,
        ..settings()
    });

    let err = orchestrator
        .compare(&request(&["a", "b", "c"]))
        .await
        .unwrap_err();
    assert!(matches!(err, ScoreError::InvalidRequest(_)));

    let err = orchestrator
        .compare(&CompareRequest {
            contributor: "  ".into(),
            ..request(&["a"])
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ScoreError::InvalidRequest(_)));
}

#[tokio::test]
async fn repeated_compare_is_served_from_cache() {
    let bench = Bench::new(
        FakeCollector::new().with_commits("api", vec![commit("a1", "Ann", 1)]),
    );
    let dir = install_plugin(&bench.plugins_dir(), "zgc_simple", true, &fixed_score_script(42));
    let orchestrator = bench.orchestrator(settings());

    let first = orchestrator.compare(&request(&["api"])).await.unwrap();
    assert!(!first.comparisons[0].cached);

    let second = orchestrator.compare(&request(&["api"])).await.unwrap();
    assert!(second.comparisons[0].cached);
    assert_eq!(plugin_calls(&dir), 1);

    let uncached = orchestrator
        .compare(&CompareRequest {
            use_cache: false,
            ..request(&["api"])
        })
        .await
        .unwrap();
    assert!(!uncached.comparisons[0].cached);
    assert_eq!(plugin_calls(&dir), 2);
}

#[tokio::test]
async fn newer_commits_extend_the_cached_evaluation() {
    let bench = Bench::new(
        FakeCollector::new().with_commits("api", vec![commit("a2", "Ann", 2), commit("a1", "Ann", 1)]),
    );
    let dir = install_plugin(&bench.plugins_dir(), "zgc_simple", true, &fixed_score_script(40));
    let orchestrator = bench.orchestrator(OrchestratorSettings {
        staleness: StalenessPolicy {
            extend: true,
            ..StalenessPolicy::default()
        },
        ..settings()
    });

    let first = orchestrator.compare(&request(&["api"])).await.unwrap();
    assert!(!first.comparisons[0].evaluation.incremental);

    // Nothing new: the cached result is returned unchanged.
    let unchanged = orchestrator.compare(&request(&["api"])).await.unwrap();
    assert!(unchanged.comparisons[0].cached);
    assert_eq!(plugin_calls(&dir), 1);

    bench.collector.push("api", commit("a3", "Ann", 6));
    let extended = orchestrator.compare(&request(&["api"])).await.unwrap();
    let evaluation = &extended.comparisons[0].evaluation;
    assert_eq!(plugin_calls(&dir), 2);
    assert!(evaluation.incremental);
    assert_eq!(evaluation.total_commits_analyzed, 3);
    assert_eq!(evaluation.commits_summary.last_commit_sha.as_deref(), Some("a3"));
    assert!(evaluation.reasoning.starts_with("**Recent activity (1 new commits):**"));
}

#[tokio::test]
async fn alias_group_is_merged_by_commit_weight() {
    let bench = Bench::new(FakeCollector::new().with_commits(
        "api",
        vec![
            commit("w3", "ann-work", 8),
            commit("w2", "Ann-Work", 7),
            commit("w1", "ann-work", 6),
            commit("p1", "Ann", 5),
        ],
    ));
    install_plugin(&bench.plugins_dir(), "zgc_simple", true, PER_IDENTITY_SCRIPT);
    let orchestrator = bench.orchestrator(settings());

    let result = orchestrator
        .compare(&CompareRequest {
            aliases: Some(AliasGroup::from_list("Ann", "ann, ann-work, ann-old")),
            ..request(&["api"])
        })
        .await
        .unwrap();

    assert_eq!(result.aliases, ["ann", "ann-work", "ann-old"]);
    let comparison = &result.comparisons[0];
    assert_eq!(comparison.commits, 4);
    let evaluation = &comparison.evaluation;
    assert_eq!(evaluation.mode, MERGED_MODE);
    assert_eq!(evaluation.username, "Ann");
    assert_eq!(evaluation.scores.get(Dimension::AiFullstack), 75.0);
    assert_eq!(evaluation.identities.len(), 2);
    assert!(evaluation.reasoning.contains("ann-work: 3 commits (75%)"));
}

#[tokio::test]
async fn failing_alias_is_reported_while_the_rest_merge() {
    let bench = Bench::new(FakeCollector::new().with_commits(
        "api",
        vec![
            commit("w3", "ann-work", 8),
            commit("w2", "ann-work", 7),
            commit("w1", "ann-work", 6),
            commit("p1", "Ann", 5),
            commit("o1", "ann-old", 2),
        ],
    ));
    install_plugin(&bench.plugins_dir(), "zgc_simple", true, PER_IDENTITY_SCRIPT);
    let orchestrator = bench.orchestrator(settings());

    let result = orchestrator
        .compare(&CompareRequest {
            aliases: Some(AliasGroup::from_list("Ann", "ann, ann-work, ann-old")),
            ..request(&["api"])
        })
        .await
        .unwrap();

    assert!(result.failed_repos.is_empty());
    let comparison = &result.comparisons[0];
    assert_eq!(comparison.commits, 4);
    assert_eq!(comparison.alias_failures.len(), 1);
    assert_eq!(comparison.alias_failures[0].identity, "ann-old");
    assert!(comparison.alias_failures[0].reason.contains("identity rejected"));
    assert_eq!(comparison.evaluation.mode, MERGED_MODE);
    assert_eq!(comparison.evaluation.scores.get(Dimension::Leadership), 75.0);
}

#[tokio::test]
async fn repositories_run_within_the_concurrency_bound() {
    let names = ["r1", "r2", "r3", "r4", "r5"];
    let mut collector = FakeCollector::new().with_latency(Duration::from_millis(50));
    for (n, name) in names.iter().enumerate() {
        collector = collector.with_commits(name, vec![commit(&format!("{name}c"), "Ann", n as u32 + 1)]);
    }
    let bench = Bench::new(collector);
    install_plugin(&bench.plugins_dir(), "zgc_simple", true, &fixed_score_script(50));
    let orchestrator = bench.orchestrator(OrchestratorSettings {
        concurrency: 2,
        repo_timeout: Duration::from_secs(20),
        ..settings()
    });

    let result = orchestrator.compare(&request(&names)).await.unwrap();

    assert_eq!(result.comparisons.len(), 5);
    assert_eq!(bench.collector.calls(), 5);
    assert_eq!(bench.collector.peak_in_flight(), 2);
}
