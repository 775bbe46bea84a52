use crate::sync::{SyncReport, SyncStatus};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchSyncStatus {
    Synced,
    UpToDate,
    Failed,
}

impl From<SyncStatus> for BatchSyncStatus {
    fn from(status: SyncStatus) -> Self {
        match status {
            SyncStatus::Synced => Self::Synced,
            SyncStatus::UpToDate => Self::UpToDate,
        }
    }
}

/// Outcome of syncing one repository within a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSyncEntry {
    pub repo: String,
    pub status: BatchSyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SyncReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub retryable: bool,
}

impl BatchSyncEntry {
    pub fn succeeded(report: SyncReport) -> Self {
        Self {
            repo: report.repo.clone(),
            status: report.status.into(),
            report: Some(report),
            reason: None,
            retryable: false,
        }
    }

    pub fn failed(repo: String, reason: String, retryable: bool) -> Self {
        Self {
            repo,
            status: BatchSyncStatus::Failed,
            report: None,
            reason: Some(reason),
            retryable,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSyncSummary {
    pub total: usize,
    pub synced: usize,
    pub up_to_date: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSyncReport {
    pub results: Vec<BatchSyncEntry>,
    pub summary: BatchSyncSummary,
}

impl BatchSyncReport {
    pub fn new(mut results: Vec<BatchSyncEntry>) -> Self {
        results.sort_by(|a, b| a.repo.cmp(&b.repo));
        let mut summary = BatchSyncSummary {
            total: results.len(),
            ..BatchSyncSummary::default()
        };
        for entry in &results {
            match entry.status {
                BatchSyncStatus::Synced => summary.synced += 1,
                BatchSyncStatus::UpToDate => summary.up_to_date += 1,
                BatchSyncStatus::Failed => summary.failed += 1,
            }
        }
        Self { results, summary }
    }

    pub fn all_failed(&self) -> bool {
        self.summary.total > 0 && self.summary.failed == self.summary.total
    }
}
