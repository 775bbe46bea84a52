use super::index::CommitIndex;
use super::state::SyncState;
use crate::collectors::{CollectorSet, RepoIdentity};
use crate::error::ScoreError;
use crate::store::{KeyedLocks, StoreLayout, discard_stale_temps, read_json, write_json_atomic};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

pub const INDEX_FILE: &str = "commits_index.json";
pub const STATE_FILE: &str = "sync_state.json";

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Ignore the stored bookmark and fetch the full history window.
    pub force_full: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    UpToDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub repo: String,
    pub status: SyncStatus,
    pub commits_added: usize,
    pub total_commits: usize,
    pub last_commit_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub index: CommitIndex,
    pub report: SyncReport,
}

/// Incremental commit ingestion into the on-disk index.
///
/// Syncs of the same repository are serialized; different repositories
/// proceed independently.
pub struct SyncEngine {
    layout: StoreLayout,
    collectors: CollectorSet,
    locks: KeyedLocks<RepoIdentity>,
    max_commits: usize,
}

impl SyncEngine {
    pub fn new(layout: StoreLayout, collectors: CollectorSet, max_commits: usize) -> Self {
        Self {
            layout,
            collectors,
            locks: KeyedLocks::new(),
            max_commits: max_commits.max(1),
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    fn index_path(&self, repo: &RepoIdentity) -> PathBuf {
        self.layout.repo_data_dir(repo).join(INDEX_FILE)
    }

    fn state_path(&self, repo: &RepoIdentity) -> PathBuf {
        self.layout.repo_data_dir(repo).join(STATE_FILE)
    }

    /// Bring the local index of `repo` up to date.
    ///
    /// A collector failure returns before anything is written, so the stored
    /// index and bookmark stay exactly as they were. The bookmark is written
    /// only after the index write succeeded.
    pub async fn sync(
        &self,
        repo: &RepoIdentity,
        options: SyncOptions,
    ) -> Result<SyncOutcome, ScoreError> {
        let _guard = self.locks.lock(repo).await;

        let discarded = discard_stale_temps(&self.layout.repo_data_dir(repo));
        if discarded > 0 {
            tracing::info!(repo = %repo, discarded, "Removed incomplete writes from an earlier sync");
        }

        let state_path = self.state_path(repo);
        let index_path = self.index_path(repo);

        let state = match read_json::<SyncState>(&state_path) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(repo = %repo, error = %e, "Sync state unreadable, starting over");
                None
            }
        };
        let (mut index, index_intact) = match read_json::<CommitIndex>(&index_path) {
            Ok(Some(index)) => (index, true),
            Ok(None) => (CommitIndex::new(), false),
            Err(e) => {
                tracing::warn!(repo = %repo, error = %e, "Commit index unreadable, rebuilding");
                (CommitIndex::new(), false)
            }
        };

        let since = match &state {
            Some(state) if index_intact && !options.force_full => state.last_commit_date,
            _ => None,
        };

        let collector = self.collectors.get(repo.platform)?;
        tracing::debug!(repo = %repo, since = ?since, "Fetching commits");
        let batch = collector
            .fetch_commits(&repo.owner, &repo.repo, since, self.max_commits)
            .await?;
        let fetched = batch.len();
        let commits_added = index.merge(batch);

        if commits_added == 0
            && index_intact
            && let Some(state) = state.as_ref()
            && state.covers(&index)
        {
            tracing::info!(repo = %repo, fetched, "Repository already up to date");
            return Ok(SyncOutcome {
                report: SyncReport {
                    repo: repo.to_string(),
                    status: SyncStatus::UpToDate,
                    commits_added: 0,
                    total_commits: index.len(),
                    last_commit_date: state.last_commit_date,
                },
                index,
            });
        }

        write_json_atomic(&index_path, &index)?;

        let mut next = state.unwrap_or_else(|| SyncState::new(repo.clone()));
        next.advance(&index, commits_added, Utc::now());
        write_json_atomic(&state_path, &next)?;

        tracing::info!(
            repo = %repo,
            fetched,
            commits_added,
            total = index.len(),
            "Sync complete"
        );

        Ok(SyncOutcome {
            report: SyncReport {
                repo: repo.to_string(),
                status: SyncStatus::Synced,
                commits_added,
                total_commits: index.len(),
                last_commit_date: next.last_commit_date,
            },
            index,
        })
    }

    /// Local index without touching the network. `None` if never synced.
    pub fn load_index(&self, repo: &RepoIdentity) -> anyhow::Result<Option<CommitIndex>> {
        read_json(&self.index_path(repo))
    }

    pub fn load_state(&self, repo: &RepoIdentity) -> anyhow::Result<Option<SyncState>> {
        read_json(&self.state_path(repo))
    }
}
