#![allow(dead_code, clippy::needless_lifetimes)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use contribscore::alias::AliasMerger;
use contribscore::cache::EvaluationCache;
use contribscore::collectors::traits::CollectFuture;
use contribscore::collectors::{
    Collector, CollectorSet, CommitRecord, CommitStats, FileChange, Platform, RepoIdentity,
};
use contribscore::error::ExtractionError;
use contribscore::evaluation::{CommitsSummary, DimensionScores, EvaluationResult};
use contribscore::orchestrator::{Orchestrator, OrchestratorSettings};
use contribscore::plugins::{Dispatcher, ExecutableLoader, PluginRegistry};
use contribscore::store::StoreLayout;
use contribscore::sync::SyncEngine;

pub fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, n, 12, 0, 0).unwrap()
}

pub fn commit(sha: &str, author: &str, day_of_month: u32) -> CommitRecord {
    CommitRecord {
        sha: sha.to_string(),
        author: author.to_string(),
        author_email: None,
        timestamp: day(day_of_month),
        message: format!("change {sha}"),
        files: vec![FileChange {
            filename: format!("src/{sha}.rs"),
            status: "modified".into(),
            additions: 10,
            deletions: 2,
            patch: None,
        }],
        stats: CommitStats {
            additions: 10,
            deletions: 2,
            total: 12,
        },
    }
}

pub fn repo(name: &str) -> RepoIdentity {
    RepoIdentity::new(Platform::GitHub, "acme", name)
}

pub fn evaluation(username: &str, plugin: &str, score: f64) -> EvaluationResult {
    EvaluationResult {
        username: username.to_string(),
        scores: DimensionScores::default().map(|_| score),
        reasoning: format!("{username} under {plugin}"),
        total_commits_analyzed: 1,
        commits_summary: CommitsSummary::default(),
        mode: "moderate".into(),
        evaluated_at: Utc::now(),
        plugin_id: plugin.to_string(),
        plugin_version: "1.0.0".into(),
        plugin_scan_path: format!("/plugins/{plugin}/scan/__init__"),
        incremental: false,
        identities: Vec::new(),
    }
}

// ── Collector fake ───────────────────────────────────────────────────────────

/// In-memory GitHub stand-in keyed by repository name.
#[derive(Default)]
pub struct FakeCollector {
    commits: std::sync::Mutex<Vec<(String, CommitRecord)>>,
    failing: HashSet<String>,
    slow: HashSet<String>,
    latency: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commits(self, repo: &str, commits: Vec<CommitRecord>) -> Self {
        if let Ok(mut stored) = self.commits.lock() {
            stored.extend(commits.into_iter().map(|c| (repo.to_string(), c)));
        }
        self
    }

    pub fn push(&self, repo: &str, commit: CommitRecord) {
        if let Ok(mut stored) = self.commits.lock() {
            stored.push((repo.to_string(), commit));
        }
    }

    pub fn failing(mut self, repo: &str) -> Self {
        self.failing.insert(repo.to_string());
        self
    }

    pub fn slow(mut self, repo: &str) -> Self {
        self.slow.insert(repo.to_string());
        self
    }

    /// Every fetch takes at least `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most fetches ever running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Collector for FakeCollector {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    fn fetch_commits<'a>(
        &'a self,
        _owner: &'a str,
        repo: &'a str,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> CollectFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            let _in_flight = InFlight(&self.in_flight);
            self.peak.fetch_max(running, Ordering::SeqCst);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            if self.slow.contains(repo) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.failing.contains(repo) {
                return Err(ExtractionError::Status {
                    platform: "github".into(),
                    status: 404,
                    path: format!("/repos/acme/{repo}/commits"),
                });
            }
            let mut commits: Vec<CommitRecord> = self
                .commits
                .lock()
                .map(|stored| {
                    stored
                        .iter()
                        .filter(|(name, c)| name == repo && since.is_none_or(|s| c.timestamp >= s))
                        .map(|(_, c)| c.clone())
                        .collect()
                })
                .unwrap_or_default();
            commits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            commits.truncate(limit);
            Ok(commits)
        })
    }
}

// ── Plugins on disk ──────────────────────────────────────────────────────────

/// Scan entry that scores every dimension with `score` and logs each run.
pub fn fixed_score_script(score: u32) -> String {
    format!(
        r#"#!/bin/sh
cat > /dev/null
echo run >> calls.log
printf '{{"scores":{{"ai_fullstack":{score},"ai_architecture":{score},"cloud_native":{score},"open_source":{score},"intelligent_dev":{score},"leadership":{score},"reasoning":"fixed {score}"}}}}'
"#
    )
}

/// Fails for `ann-old`, scores 80 for `ann-work` and 60 for anyone else.
pub const PER_IDENTITY_SCRIPT: &str = r#"#!/bin/sh
input=$(cat)
echo run >> calls.log
case "$input" in
  *'"username":"ann-old"'*) echo 'identity rejected' >&2; exit 2 ;;
  *'"username":"ann-work"'*) s=80 ;;
  *) s=60 ;;
esac
printf '{"scores":{"ai_fullstack":%s,"ai_architecture":%s,"cloud_native":%s,"open_source":%s,"intelligent_dev":%s,"leadership":%s,"reasoning":"scored %s"}}' $s $s $s $s $s $s $s
"#;

#[cfg(unix)]
pub fn install_plugin(root: &Path, id: &str, default: bool, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let dir = root.join(id);
    std::fs::create_dir_all(dir.join("scan")).unwrap();
    std::fs::write(
        dir.join("index.yaml"),
        format!("id: {id}\nname: \"{id} scanner\"\nversion: 1.2.0\ndefault: {default}\n"),
    )
    .unwrap();
    let entry = dir.join("scan/__init__");
    std::fs::write(&entry, script).unwrap();
    std::fs::set_permissions(&entry, std::fs::Permissions::from_mode(0o755)).unwrap();
    dir
}

pub fn plugin_calls(plugin_dir: &Path) -> usize {
    std::fs::read_to_string(plugin_dir.join("calls.log"))
        .map(|log| log.lines().count())
        .unwrap_or(0)
}

// ── Full stack ───────────────────────────────────────────────────────────────

pub struct Bench {
    pub tmp: TempDir,
    pub collector: Arc<FakeCollector>,
}

impl Bench {
    pub fn new(collector: FakeCollector) -> Self {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("plugins")).unwrap();
        Self {
            tmp,
            collector: Arc::new(collector),
        }
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.tmp.path().join("plugins")
    }

    pub fn layout(&self) -> StoreLayout {
        StoreLayout::under(self.tmp.path())
    }

    pub fn orchestrator(&self, settings: OrchestratorSettings) -> Orchestrator {
        let collectors = CollectorSet::new().with(self.collector.clone());
        Orchestrator::new(
            SyncEngine::new(self.layout(), collectors, 500),
            PluginRegistry::new(self.plugins_dir()),
            Dispatcher::new(
                Arc::new(ExecutableLoader),
                self.layout().data_dir(),
                None,
                None,
            ),
            EvaluationCache::new(self.layout()),
            AliasMerger::template(),
            settings,
        )
    }
}
