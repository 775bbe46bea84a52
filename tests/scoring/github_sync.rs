use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use contribscore::collectors::{CollectorSet, GitHubCollector};
use contribscore::error::{ExtractionError, ScoreError};
use contribscore::store::StoreLayout;
use contribscore::sync::{SyncEngine, SyncOptions, SyncStatus};

use super::score_harness::repo;

fn list_item(sha: &str, author: &str, date: &str) -> Value {
    json!({
        "sha": sha,
        "commit": {
            "author": {"name": author, "email": format!("{author}@example.com"), "date": date},
            "committer": {"name": "GitHub", "date": date},
            "message": format!("commit {sha}\n\nbody"),
        }
    })
}

fn detail(sha: &str, author: &str, date: &str, file: &str) -> Value {
    let mut item = list_item(sha, author, date);
    item["files"] = json!([{"filename": file, "status": "added", "additions": 7, "deletions": 1}]);
    item["stats"] = json!({"additions": 7, "deletions": 1, "total": 8});
    item
}

async fn mount_detail(server: &MockServer, sha: &str, author: &str, date: &str, file: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/acme/api/commits/{sha}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail(sha, author, date, file)))
        .mount(server)
        .await;
}

fn engine(server: &MockServer, tmp: &TempDir) -> SyncEngine {
    let collector = GitHubCollector::new(&server.uri(), Some("ghp_test"), 5);
    SyncEngine::new(
        StoreLayout::under(tmp.path()),
        CollectorSet::new().with(Arc::new(collector)),
        500,
    )
}

#[tokio::test]
async fn full_then_incremental_sync_over_http() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let engine = engine(&server, &tmp);

    Mock::given(method("GET"))
        .and(path("/repos/acme/api/commits"))
        .and(query_param_is_missing("since"))
        .and(header("authorization", "Bearer ghp_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            list_item("bbb", "Ann", "2024-03-02T10:00:00Z"),
            list_item("aaa", "Bob", "2024-03-01T10:00:00Z"),
        ])))
        .mount(&server)
        .await;
    mount_detail(&server, "bbb", "Ann", "2024-03-02T10:00:00Z", "src/lib.rs").await;
    mount_detail(&server, "aaa", "Bob", "2024-03-01T10:00:00Z", "web/app.tsx").await;

    let first = engine.sync(&repo("api"), SyncOptions::default()).await.unwrap();
    assert_eq!(first.report.status, SyncStatus::Synced);
    assert_eq!(first.report.commits_added, 2);
    assert_eq!(first.index.newest().unwrap().sha, "bbb");
    assert_eq!(first.index.newest().unwrap().files[0].filename, "src/lib.rs");

    // The boundary commit comes back with `since`; only the new one is added.
    Mock::given(method("GET"))
        .and(path("/repos/acme/api/commits"))
        .and(query_param("since", "2024-03-02T10:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            list_item("ccc", "Ann", "2024-03-05T10:00:00Z"),
            list_item("bbb", "Ann", "2024-03-02T10:00:00Z"),
        ])))
        .mount(&server)
        .await;
    mount_detail(&server, "ccc", "Ann", "2024-03-05T10:00:00Z", "deploy/k8s.yaml").await;

    let second = engine.sync(&repo("api"), SyncOptions::default()).await.unwrap();
    assert_eq!(second.report.commits_added, 1);
    assert_eq!(second.report.total_commits, 3);
    assert_eq!(second.index.count_by("ann"), 2);

    let state = engine.load_state(&repo("api")).unwrap().unwrap();
    assert_eq!(state.last_commit_sha.as_deref(), Some("ccc"));
    assert_eq!(state.sync_history.len(), 2);
}

#[tokio::test]
async fn rate_limit_leaves_previous_state_untouched() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let engine = engine(&server, &tmp);

    Mock::given(method("GET"))
        .and(path("/repos/acme/api/commits"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "60"),
        )
        .mount(&server)
        .await;

    let err = engine
        .sync(&repo("api"), SyncOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScoreError::Extraction(ExtractionError::RateLimited {
            retry_after_secs: Some(60),
            ..
        })
    ));
    assert!(err.is_retryable());
    assert!(engine.load_index(&repo("api")).unwrap().is_none());
    assert!(engine.load_state(&repo("api")).unwrap().is_none());
}

#[tokio::test]
async fn failed_detail_keeps_list_entry() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let engine = engine(&server, &tmp);

    Mock::given(method("GET"))
        .and(path("/repos/acme/api/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([list_item(
            "ddd",
            "Ann",
            "2024-03-09T10:00:00Z"
        )])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/api/commits/ddd"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let outcome = engine.sync(&repo("api"), SyncOptions::default()).await.unwrap();
    let kept = outcome.index.newest().unwrap();
    assert_eq!(kept.sha, "ddd");
    assert_eq!(kept.author, "Ann");
    assert!(kept.files.is_empty());
}
