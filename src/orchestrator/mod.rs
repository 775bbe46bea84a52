//! Multi-repository evaluation with per-repository failure isolation.
//!
//! Each repository runs sync, commit selection, cached dispatch and optional
//! alias merge independently. A failure or timeout in one repository becomes a
//! `failed_repos` entry; the others continue.

pub mod batch;
pub mod contributors;
pub mod types;

pub use batch::{BatchSyncEntry, BatchSyncReport, BatchSyncStatus, BatchSyncSummary};
pub use contributors::{CommonContributor, CommonContributors, ContributorRepo};
pub use types::{Aggregate, ComparisonResult, FailedRepo, RepoComparison};

use crate::alias::{AliasGroup, AliasMerger, MemberEvaluation, MemberFailure};
use crate::cache::{
    CacheKey, CacheOutcome, Computed, EvaluationCache, StalenessPolicy, commits_after_boundary,
};
use crate::collectors::{CommitRecord, RepoIdentity};
use crate::error::{PluginError, ScoreError};
use crate::evaluation::{DEFAULT_MODE, extend};
use crate::plugins::{DispatchRequest, Dispatcher, PluginDescriptor, PluginRegistry};
use crate::sync::{CommitIndex, SyncEngine, SyncOptions};
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub max_repos: usize,
    pub concurrency: usize,
    pub repo_timeout: Duration,
    pub max_commits_per_evaluation: usize,
    pub mode: String,
    pub staleness: StalenessPolicy,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_repos: 10,
            concurrency: 4,
            repo_timeout: Duration::from_secs(600),
            max_commits_per_evaluation: 150,
            mode: DEFAULT_MODE.to_string(),
            staleness: StalenessPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompareRequest {
    pub contributor: String,
    pub repos: Vec<RepoIdentity>,
    pub plugin: Option<String>,
    pub use_cache: bool,
    pub model: Option<String>,
    pub aliases: Option<AliasGroup>,
}

pub struct Orchestrator {
    sync: SyncEngine,
    registry: PluginRegistry,
    dispatcher: Dispatcher,
    cache: EvaluationCache,
    merger: AliasMerger,
    settings: OrchestratorSettings,
}

type RepoOutcome = (RepoIdentity, Result<RepoComparison, ScoreError>);

impl Orchestrator {
    pub fn new(
        sync: SyncEngine,
        registry: PluginRegistry,
        dispatcher: Dispatcher,
        cache: EvaluationCache,
        merger: AliasMerger,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            sync,
            registry,
            dispatcher,
            cache,
            merger,
            settings,
        }
    }

    pub fn sync_engine(&self) -> &SyncEngine {
        &self.sync
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    /// Evaluate one contributor across several repositories.
    ///
    /// Only invalid requests and an unusable plugin registry fail the call;
    /// everything else is reported per repository.
    pub async fn compare(&self, request: &CompareRequest) -> Result<ComparisonResult, ScoreError> {
        let contributor = request.contributor.trim();
        if contributor.is_empty() {
            return Err(ScoreError::InvalidRequest("contributor is required".into()));
        }
        if request.repos.is_empty() {
            return Err(ScoreError::InvalidRequest(
                "at least one repository is required".into(),
            ));
        }
        if request.repos.len() > self.settings.max_repos {
            return Err(ScoreError::InvalidRequest(format!(
                "at most {} repositories per request, got {}",
                self.settings.max_repos,
                request.repos.len()
            )));
        }

        let plugins = self.registry.discover();
        plugins.ensure_usable()?;
        let descriptor = plugins.resolve(request.plugin.as_deref()).cloned();

        let group = request
            .aliases
            .clone()
            .unwrap_or_else(|| AliasGroup::single(contributor));
        let outcomes = self
            .run(&request.repos, descriptor.as_ref(), &group, request)
            .await;

        let mut comparisons = Vec::new();
        let mut failed_repos = Vec::new();
        for (repo, outcome) in outcomes {
            match outcome {
                Ok(comparison) => comparisons.push(comparison),
                Err(e) => {
                    tracing::warn!(repo = %repo, error = %e, "Repository evaluation failed");
                    failed_repos.push(FailedRepo {
                        repo: repo.to_string(),
                        reason: e.reason(),
                        retryable: e.is_retryable(),
                    });
                }
            }
        }
        comparisons.sort_by(|a, b| a.repo.cmp(&b.repo));
        failed_repos.sort_by(|a, b| a.repo.cmp(&b.repo));

        let plugin = descriptor.as_ref().ok();
        tracing::info!(
            contributor,
            succeeded = comparisons.len(),
            failed = failed_repos.len(),
            "Comparison complete"
        );

        Ok(ComparisonResult {
            contributor: contributor.to_string(),
            aliases: group.members.clone(),
            plugin_requested: request.plugin.clone(),
            plugin_used: plugin.map(|p| p.id.clone()),
            plugin_version: plugin.map(|p| p.version.clone()),
            plugin_scan_path: plugin.map(|p| p.scan_path().display().to_string()),
            aggregate: Aggregate::over(&comparisons),
            comparisons,
            failed_repos,
        })
    }

    /// Single-repository evaluation: `compare` with one repository, returning
    /// that repository's outcome directly.
    pub async fn evaluate(
        &self,
        repo: RepoIdentity,
        request: &CompareRequest,
    ) -> Result<RepoComparison, ScoreError> {
        let request = CompareRequest {
            repos: vec![repo],
            ..request.clone()
        };
        let contributor = request.contributor.trim();
        if contributor.is_empty() {
            return Err(ScoreError::InvalidRequest("contributor is required".into()));
        }

        let plugins = self.registry.discover();
        plugins.ensure_usable()?;
        let descriptor = plugins.resolve(request.plugin.as_deref()).cloned();
        let group = request
            .aliases
            .clone()
            .unwrap_or_else(|| AliasGroup::single(contributor));

        self.run(&request.repos, descriptor.as_ref(), &group, &request)
            .await
            .into_iter()
            .next()
            .map(|(_, outcome)| outcome)
            .unwrap_or_else(|| Err(ScoreError::InvalidRequest("no repository evaluated".into())))
    }

    /// Sync several repositories at once. Each repository succeeds or fails
    /// on its own; only an empty request is an error.
    pub async fn sync_many(
        &self,
        repos: &[RepoIdentity],
        options: SyncOptions,
    ) -> Result<BatchSyncReport, ScoreError> {
        if repos.is_empty() {
            return Err(ScoreError::InvalidRequest(
                "at least one repository is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        let distinct: Vec<&RepoIdentity> = repos.iter().filter(|r| seen.insert(*r)).collect();
        let timeout = self.settings.repo_timeout;

        let results: Vec<BatchSyncEntry> = stream::iter(distinct)
            .map(|repo| async move {
                let outcome = match tokio::time::timeout(timeout, self.sync.sync(repo, options)).await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ScoreError::Timeout { after: timeout }),
                };
                match outcome {
                    Ok(synced) => BatchSyncEntry::succeeded(synced.report),
                    Err(e) => {
                        tracing::warn!(repo = %repo, error = %e, "Repository sync failed");
                        BatchSyncEntry::failed(repo.to_string(), e.reason(), e.is_retryable())
                    }
                }
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let report = BatchSyncReport::new(results);
        tracing::info!(
            synced = report.summary.synced,
            up_to_date = report.summary.up_to_date,
            failed = report.summary.failed,
            "Batch sync complete"
        );
        Ok(report)
    }

    /// Authors who committed to at least two of `repos`, from the local
    /// indexes only. Repositories never synced are listed as missing.
    pub fn common_contributors(
        &self,
        repos: &[RepoIdentity],
        aliases: Option<&AliasGroup>,
    ) -> Result<CommonContributors, ScoreError> {
        let mut seen = HashSet::new();
        let distinct: Vec<&RepoIdentity> = repos.iter().filter(|r| seen.insert(*r)).collect();
        if distinct.len() < 2 {
            return Err(ScoreError::InvalidRequest(
                "at least two distinct repositories are required".into(),
            ));
        }

        let mut indexes = Vec::new();
        let mut missing_repos = Vec::new();
        for repo in distinct {
            match self.sync.load_index(repo) {
                Ok(Some(index)) if !index.is_empty() => indexes.push((repo.clone(), index)),
                Ok(_) => missing_repos.push(repo.to_string()),
                Err(e) => {
                    tracing::warn!(repo = %repo, error = %e, "Commit index unreadable, skipping");
                    missing_repos.push(repo.to_string());
                }
            }
        }

        let found = if indexes.len() >= 2 {
            contributors::common_contributors(&indexes, aliases)
        } else {
            Vec::new()
        };
        tracing::info!(
            repos = indexes.len(),
            missing = missing_repos.len(),
            common = found.len(),
            "Common contributors resolved"
        );
        Ok(CommonContributors {
            contributors: found,
            repos_with_data: indexes.len(),
            missing_repos,
        })
    }

    async fn run(
        &self,
        repos: &[RepoIdentity],
        descriptor: Result<&PluginDescriptor, &PluginError>,
        group: &AliasGroup,
        request: &CompareRequest,
    ) -> Vec<RepoOutcome> {
        let mut seen = HashSet::new();
        let distinct: Vec<&RepoIdentity> = repos.iter().filter(|r| seen.insert(*r)).collect();
        let timeout = self.settings.repo_timeout;

        stream::iter(distinct)
            .map(|repo| async move {
                let outcome = match descriptor {
                    Err(e) => Err(ScoreError::Plugin(e.clone())),
                    Ok(descriptor) => {
                        match tokio::time::timeout(
                            timeout,
                            self.evaluate_repo(repo, descriptor, group, request),
                        )
                        .await
                        {
                            Ok(outcome) => outcome,
                            Err(_) => Err(ScoreError::Timeout { after: timeout }),
                        }
                    }
                };
                (repo.clone(), outcome)
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await
    }

    async fn evaluate_repo(
        &self,
        repo: &RepoIdentity,
        descriptor: &PluginDescriptor,
        group: &AliasGroup,
        request: &CompareRequest,
    ) -> Result<RepoComparison, ScoreError> {
        let synced = self.sync.sync(repo, SyncOptions::default()).await?;
        let index = &synced.index;

        let mut members = Vec::new();
        let mut failures = Vec::new();
        let mut all_cached = true;
        let mut commits = 0;

        for identity in &group.members {
            match self
                .evaluate_identity(repo, index, identity, descriptor, request)
                .await
            {
                Ok(None) => {}
                Ok(Some((count, outcome))) => {
                    commits += count;
                    all_cached &= outcome.from_cache();
                    members.push(MemberEvaluation {
                        identity: identity.clone(),
                        commits: count,
                        result: outcome.result,
                    });
                }
                Err(e) if group.is_single() => return Err(e),
                Err(e) => failures.push(MemberFailure {
                    identity: identity.clone(),
                    reason: e.reason(),
                }),
            }
        }

        if members.is_empty() && failures.is_empty() {
            return Err(ScoreError::NoCommits {
                author: group.canonical.clone(),
                repo: repo.to_string(),
            });
        }
        let evaluation = self.merger.merge(group, members, &failures).await?;

        Ok(RepoComparison {
            repo: repo.to_string(),
            identity: repo.clone(),
            plugin: descriptor.id.clone(),
            plugin_version: descriptor.version.clone(),
            plugin_scan_path: descriptor.scan_path().display().to_string(),
            commits,
            cached: all_cached,
            evaluation,
            alias_failures: failures,
            sync: synced.report,
        })
    }

    /// Evaluate one identity through the cache. `None` when it has no commits.
    async fn evaluate_identity(
        &self,
        repo: &RepoIdentity,
        index: &CommitIndex,
        identity: &str,
        descriptor: &PluginDescriptor,
        request: &CompareRequest,
    ) -> Result<Option<(usize, CacheOutcome)>, ScoreError> {
        let selected: Vec<CommitRecord> = index
            .by_author(identity)
            .take(self.settings.max_commits_per_evaluation.max(1))
            .cloned()
            .collect();
        if selected.is_empty() {
            return Ok(None);
        }
        let count = index.count_by(identity);

        let key = CacheKey::new(repo.clone(), identity, &descriptor.id);
        let key_label = &key;
        let selected = &selected;
        let staleness = self.settings.staleness;

        let outcome = self
            .cache
            .get_or_refresh(&key, request.use_cache, |prior| async move {
                let Some(entry) = prior else {
                    let fresh = self
                        .dispatcher
                        .evaluate(descriptor, self.dispatch_request(selected, identity, request))
                        .await?;
                    return Ok(Computed::Fresh(fresh));
                };

                let newer: Vec<CommitRecord> = commits_after_boundary(&entry.result, selected)
                    .into_iter()
                    .cloned()
                    .collect();
                if !staleness.is_stale(entry.written_at, newer.len(), Utc::now()) {
                    return Ok(Computed::Reuse(entry));
                }

                tracing::info!(
                    key = %key_label,
                    new_commits = newer.len(),
                    "Extending cached evaluation with newer commits"
                );
                let fresh = self
                    .dispatcher
                    .evaluate(descriptor, self.dispatch_request(&newer, identity, request))
                    .await?;
                Ok(Computed::Fresh(extend(&entry.result, &fresh)))
            })
            .await?;

        Ok(Some((count, outcome)))
    }

    fn dispatch_request<'a>(
        &'a self,
        commits: &'a [CommitRecord],
        identity: &'a str,
        request: &'a CompareRequest,
    ) -> DispatchRequest<'a> {
        DispatchRequest {
            commits,
            author: identity,
            model: request.model.as_deref(),
            mode: &self.settings.mode,
        }
    }
}
