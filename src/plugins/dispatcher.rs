use super::contract::EvaluatorConfig;
use super::loader::PluginLoader;
use super::registry::PluginDescriptor;
use crate::collectors::CommitRecord;
use crate::error::PluginError;
use crate::evaluation::summary::MAX_LANGUAGES;
use crate::evaluation::types::clamp_score;
use crate::evaluation::{Dimension, DimensionScores, EvaluationResult, summarize};
use chrono::Utc;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Invokes a plugin's scan entry and validates what comes back.
pub struct Dispatcher {
    loader: Arc<dyn PluginLoader>,
    data_dir: PathBuf,
    api_key: Option<String>,
    default_model: Option<String>,
}

/// Commits and identity for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRequest<'a> {
    pub commits: &'a [CommitRecord],
    pub author: &'a str,
    pub model: Option<&'a str>,
    pub mode: &'a str,
}

impl Dispatcher {
    pub fn new(
        loader: Arc<dyn PluginLoader>,
        data_dir: impl Into<PathBuf>,
        api_key: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        Self {
            loader,
            data_dir: data_dir.into(),
            api_key,
            default_model,
        }
    }

    pub async fn evaluate(
        &self,
        descriptor: &PluginDescriptor,
        request: DispatchRequest<'_>,
    ) -> Result<EvaluationResult, PluginError> {
        let plugin = self.loader.load(descriptor)?;
        let config = EvaluatorConfig {
            data_dir: self.data_dir.clone(),
            api_key: self.api_key.clone(),
            model: request
                .model
                .map(str::to_string)
                .or_else(|| self.default_model.clone()),
            mode: request.mode.to_string(),
        };
        let evaluator = plugin.create_commit_evaluator(config)?;

        tracing::info!(
            plugin = %descriptor.id,
            author = request.author,
            commits = request.commits.len(),
            "Dispatching evaluation"
        );
        let raw = evaluator
            .evaluate_engineer(request.commits, request.author)
            .await?;

        validate(descriptor, &raw, request)
    }
}

/// Check a plugin document against the scan contract and stamp provenance.
pub fn validate(
    descriptor: &PluginDescriptor,
    raw: &Value,
    request: DispatchRequest<'_>,
) -> Result<EvaluationResult, PluginError> {
    let id = descriptor.id.as_str();
    let scores_doc = raw
        .get("scores")
        .and_then(Value::as_object)
        .ok_or_else(|| PluginError::contract(id, "result has no 'scores' object"))?;

    let mut scores = DimensionScores::default();
    for dimension in Dimension::ALL {
        let value = scores_doc
            .get(dimension.key())
            .filter(|v| !v.is_null())
            .ok_or_else(|| {
                PluginError::contract(id, format!("missing dimension '{}'", dimension.key()))
            })?;
        let score = numeric(value).ok_or_else(|| {
            PluginError::contract(
                id,
                format!("dimension '{}' is not numeric: {value}", dimension.key()),
            )
        })?;
        let clamped = clamp_score(score);
        if clamped != score {
            tracing::debug!(plugin = id, dimension = %dimension, score, "Clamped out-of-range score");
        }
        scores.set(dimension, clamped);
    }

    let reasoning = scores_doc
        .get("reasoning")
        .or_else(|| raw.get("reasoning"))
        .and_then(Value::as_str)
        .ok_or_else(|| PluginError::contract(id, "missing 'reasoning' text"))?
        .to_string();

    let total_commits_analyzed = raw
        .get("total_commits_analyzed")
        .and_then(Value::as_u64)
        .map_or(request.commits.len(), |n| n as usize);

    let mut commits_summary = summarize(request.commits);
    if let Some(languages) = raw
        .pointer("/commits_summary/languages")
        .and_then(Value::as_array)
    {
        let reported: Vec<String> = languages
            .iter()
            .filter_map(Value::as_str)
            .take(MAX_LANGUAGES)
            .map(str::to_string)
            .collect();
        if !reported.is_empty() {
            commits_summary.languages = reported;
        }
    }

    Ok(EvaluationResult {
        username: request.author.to_string(),
        scores,
        reasoning,
        total_commits_analyzed,
        commits_summary,
        mode: request.mode.to_string(),
        evaluated_at: Utc::now(),
        plugin_id: descriptor.id.clone(),
        plugin_version: descriptor.version.clone(),
        plugin_scan_path: descriptor.scan_path().display().to_string(),
        incremental: false,
        identities: Vec::new(),
    })
}

fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}
