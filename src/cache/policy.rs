use crate::collectors::CommitRecord;
use crate::evaluation::EvaluationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// When a cached evaluation is extended with newer commits.
///
/// Nothing happens without new commits. With new commits, the entry is
/// refreshed once at least `min_new_commits` arrived, or once it is older than
/// `max_age_hours` when that is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StalenessPolicy {
    pub extend: bool,
    pub min_new_commits: usize,
    pub max_age_hours: Option<u64>,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self {
            extend: false,
            min_new_commits: 1,
            max_age_hours: None,
        }
    }
}

impl StalenessPolicy {
    pub fn is_stale(&self, written_at: DateTime<Utc>, new_commits: usize, now: DateTime<Utc>) -> bool {
        if !self.extend || new_commits == 0 {
            return false;
        }
        if new_commits >= self.min_new_commits.max(1) {
            return true;
        }
        self.max_age_hours.is_some_and(|hours| {
            let age = now.signed_duration_since(written_at);
            age.num_hours() >= i64::try_from(hours).unwrap_or(i64::MAX)
        })
    }
}

/// Commits newer than the boundary recorded in `cached.commits_summary`.
///
/// Without a recorded boundary nothing counts as new.
pub fn commits_after_boundary<'a>(
    cached: &EvaluationResult,
    commits: &'a [CommitRecord],
) -> Vec<&'a CommitRecord> {
    let Some(boundary) = cached.commits_summary.last_commit_date else {
        return Vec::new();
    };
    let boundary_sha = cached.commits_summary.last_commit_sha.as_deref();
    commits
        .iter()
        .filter(|c| c.timestamp > boundary && Some(c.sha.as_str()) != boundary_sha)
        .collect()
}
