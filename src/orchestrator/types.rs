use crate::alias::MemberFailure;
use crate::collectors::RepoIdentity;
use crate::evaluation::{DimensionScores, EvaluationResult};
use crate::evaluation::types::round_one_decimal;
use crate::sync::SyncReport;
use serde::Serialize;

/// Successful evaluation of one repository.
#[derive(Debug, Clone, Serialize)]
pub struct RepoComparison {
    pub repo: String,
    #[serde(skip)]
    pub identity: RepoIdentity,
    pub plugin: String,
    pub plugin_version: String,
    pub plugin_scan_path: String,
    /// Commits by the contributor (all identities) in the local index.
    pub commits: usize,
    pub cached: bool,
    pub evaluation: EvaluationResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alias_failures: Vec<MemberFailure>,
    pub sync: SyncReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRepo {
    pub repo: String,
    pub reason: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub mean_scores: DimensionScores,
    pub total_commits: usize,
    pub total_repos_evaluated: usize,
}

impl Aggregate {
    /// Mean scores over the succeeded repositories. `None` when nothing succeeded.
    pub fn over(comparisons: &[RepoComparison]) -> Option<Self> {
        if comparisons.is_empty() {
            return None;
        }
        let count = comparisons.len() as f64;
        let mut sums = DimensionScores::default();
        for comparison in comparisons {
            for (dimension, value) in comparison.evaluation.scores.iter() {
                sums.set(dimension, sums.get(dimension) + value);
            }
        }
        Some(Self {
            mean_scores: sums.map(|sum| round_one_decimal(sum / count)),
            total_commits: comparisons
                .iter()
                .map(|c| c.evaluation.total_commits_analyzed)
                .sum(),
            total_repos_evaluated: comparisons.len(),
        })
    }
}

/// Outcome of one multi-repository request. Built per request, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub contributor: String,
    pub aliases: Vec<String>,
    pub plugin_requested: Option<String>,
    pub plugin_used: Option<String>,
    pub plugin_version: Option<String>,
    pub plugin_scan_path: Option<String>,
    pub comparisons: Vec<RepoComparison>,
    pub failed_repos: Vec<FailedRepo>,
    pub aggregate: Option<Aggregate>,
}
