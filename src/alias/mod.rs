//! Alias merge: one contributor, several commit identities.

pub mod group;
pub mod synth;

pub use group::AliasGroup;
pub use synth::{LlmSynthesizer, NarrativeSynthesizer, SynthesisInput, TemplateSynthesizer};

use crate::error::ScoreError;
use crate::evaluation::types::round_one_decimal;
use crate::evaluation::{EvaluationResult, IdentityWeight, weighted_scores};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

pub const MERGED_MODE: &str = "merged";

/// One identity's evaluation and its commit weight.
#[derive(Debug, Clone)]
pub struct MemberEvaluation {
    pub identity: String,
    pub commits: usize,
    pub result: EvaluationResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberFailure {
    pub identity: String,
    pub reason: String,
}

pub struct AliasMerger {
    synthesizer: Arc<dyn NarrativeSynthesizer>,
}

impl AliasMerger {
    pub fn new(synthesizer: Arc<dyn NarrativeSynthesizer>) -> Self {
        Self { synthesizer }
    }

    pub fn template() -> Self {
        Self::new(Arc::new(TemplateSynthesizer))
    }

    /// Combine per-identity evaluations into one result for `group`.
    ///
    /// Scores are commit-weighted; identities with zero commits carry no
    /// weight. A lone successful member is returned unchanged. Failed members
    /// are only reported.
    pub async fn merge(
        &self,
        group: &AliasGroup,
        members: Vec<MemberEvaluation>,
        failures: &[MemberFailure],
    ) -> Result<EvaluationResult, ScoreError> {
        for failure in failures {
            tracing::warn!(
                contributor = %group.canonical,
                identity = %failure.identity,
                reason = %failure.reason,
                "Alias evaluation failed; excluded from merge"
            );
        }

        let mut members: Vec<MemberEvaluation> =
            members.into_iter().filter(|m| m.commits > 0).collect();
        if members.is_empty() {
            let reasons: Vec<String> = failures
                .iter()
                .map(|f| format!("{}: {}", f.identity, f.reason))
                .collect();
            return Err(ScoreError::AliasesFailed(if reasons.is_empty() {
                "no identity has commits".to_string()
            } else {
                reasons.join("; ")
            }));
        }
        if members.len() == 1
            && let Some(only) = members.pop()
        {
            return Ok(only.result);
        }

        let parts: Vec<_> = members.iter().map(|m| (m.result.scores, m.commits)).collect();
        let scores = weighted_scores(&parts)
            .ok_or_else(|| ScoreError::AliasesFailed("no identity has commits".to_string()))?
            .rounded();
        let total_commits: usize = members.iter().map(|m| m.commits).sum();

        let input = SynthesisInput {
            canonical: &group.canonical,
            members: &members,
            scores: &scores,
            total_commits,
        };
        let reasoning = match self.synthesizer.synthesize(&input).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Narrative synthesis failed, using template");
                TemplateSynthesizer::compose(&input)
            }
        };

        let identities = members
            .iter()
            .map(|m| IdentityWeight {
                identity: m.identity.clone(),
                commits: m.commits,
                weight_percent: round_one_decimal(m.commits as f64 * 100.0 / total_commits as f64),
            })
            .collect();
        let commits_summary = members
            .iter()
            .skip(1)
            .fold(members[0].result.commits_summary.clone(), |acc, m| {
                acc.combine(&m.result.commits_summary)
            });
        let first = &members[0].result;

        Ok(EvaluationResult {
            username: group.canonical.clone(),
            scores,
            reasoning,
            total_commits_analyzed: members.iter().map(|m| m.result.total_commits_analyzed).sum(),
            commits_summary,
            mode: MERGED_MODE.to_string(),
            evaluated_at: Utc::now(),
            plugin_id: first.plugin_id.clone(),
            plugin_version: first.plugin_version.clone(),
            plugin_scan_path: first.plugin_scan_path.clone(),
            incremental: false,
            identities,
        })
    }
}
