use super::types::{DimensionScores, EvaluationResult};
use chrono::Utc;

/// Commit-count-weighted average of dimension scores.
///
/// Parts with zero commits carry no weight. `None` when no part has weight.
pub fn weighted_scores(parts: &[(DimensionScores, usize)]) -> Option<DimensionScores> {
    let total: usize = parts.iter().map(|(_, commits)| commits).sum();
    if total == 0 {
        return None;
    }

    let mut merged = DimensionScores::default();
    for (scores, commits) in parts.iter().filter(|(_, commits)| *commits > 0) {
        let weight = *commits as f64 / total as f64;
        for (dimension, value) in scores.iter() {
            merged.set(dimension, merged.get(dimension) + value * weight);
        }
    }
    Some(merged)
}

/// Fold an evaluation of only the newer commits into a cached one.
///
/// Scores are weighted by commits analyzed on each side, the new reasoning is
/// placed ahead of the previous assessment and summaries are combined.
pub fn extend(previous: &EvaluationResult, fresh: &EvaluationResult) -> EvaluationResult {
    let prev_count = previous.total_commits_analyzed;
    let new_count = fresh.total_commits_analyzed;

    let scores = weighted_scores(&[(previous.scores, prev_count), (fresh.scores, new_count)])
        .map(|s| s.rounded())
        .unwrap_or(fresh.scores);

    let reasoning = match (previous.reasoning.trim(), fresh.reasoning.trim()) {
        ("", new) => new.to_string(),
        (old, "") => old.to_string(),
        (old, new) => format!(
            "**Recent activity ({new_count} new commits):**\n{new}\n\n---\n\n\
             **Previous assessment ({prev_count} commits):**\n{old}"
        ),
    };

    EvaluationResult {
        username: fresh.username.clone(),
        scores,
        reasoning,
        total_commits_analyzed: prev_count + new_count,
        commits_summary: previous.commits_summary.combine(&fresh.commits_summary),
        mode: fresh.mode.clone(),
        evaluated_at: Utc::now(),
        plugin_id: fresh.plugin_id.clone(),
        plugin_version: fresh.plugin_version.clone(),
        plugin_scan_path: fresh.plugin_scan_path.clone(),
        incremental: true,
        identities: Vec::new(),
    }
}
