use super::index::CommitIndex;
use crate::collectors::RepoIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SYNC_HISTORY_LIMIT: usize = 50;

/// Durable bookmark of the newest ingested commit for one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub repo: RepoIdentity,
    pub last_commit_sha: Option<String>,
    pub last_commit_date: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_commits: usize,
    #[serde(default)]
    pub sync_history: Vec<SyncHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncHistoryEntry {
    pub synced_at: DateTime<Utc>,
    pub commits_added: usize,
    pub last_sha: Option<String>,
}

impl SyncState {
    pub fn new(repo: RepoIdentity) -> Self {
        Self {
            repo,
            last_commit_sha: None,
            last_commit_date: None,
            last_synced_at: None,
            total_commits: 0,
            sync_history: Vec::new(),
        }
    }

    /// Whether this bookmark already reflects `index`.
    ///
    /// False after an index write whose state write was lost, so the next
    /// sync rewrites the state even when it fetches nothing new.
    pub fn covers(&self, index: &CommitIndex) -> bool {
        if self.total_commits != index.len() {
            return false;
        }
        match index.newest() {
            None => true,
            Some(newest) => {
                self.last_commit_sha.as_deref() == Some(newest.sha.as_str())
                    || self
                        .last_commit_date
                        .is_some_and(|date| newest.timestamp < date)
            }
        }
    }

    /// Move the bookmark forward to the newest commit of `index`.
    ///
    /// `last_commit_date` never decreases: a backdated newest commit leaves the
    /// date where it was.
    pub fn advance(&mut self, index: &CommitIndex, commits_added: usize, now: DateTime<Utc>) {
        if let Some(newest) = index.newest() {
            let moves_forward = self
                .last_commit_date
                .is_none_or(|current| newest.timestamp >= current);
            if moves_forward {
                self.last_commit_sha = Some(newest.sha.clone());
                self.last_commit_date = Some(newest.timestamp);
            }
        }
        self.last_synced_at = Some(now);
        self.total_commits = index.len();

        self.sync_history.push(SyncHistoryEntry {
            synced_at: now,
            commits_added,
            last_sha: self.last_commit_sha.clone(),
        });
        if self.sync_history.len() > SYNC_HISTORY_LIMIT {
            let excess = self.sync_history.len() - SYNC_HISTORY_LIMIT;
            self.sync_history.drain(..excess);
        }
    }
}
