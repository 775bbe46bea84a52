use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scored capability dimensions, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    AiFullstack,
    AiArchitecture,
    CloudNative,
    OpenSource,
    IntelligentDev,
    Leadership,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Self::AiFullstack,
        Self::AiArchitecture,
        Self::CloudNative,
        Self::OpenSource,
        Self::IntelligentDev,
        Self::Leadership,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::AiFullstack => "ai_fullstack",
            Self::AiArchitecture => "ai_architecture",
            Self::CloudNative => "cloud_native",
            Self::OpenSource => "open_source",
            Self::IntelligentDev => "intelligent_dev",
            Self::Leadership => "leadership",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AiFullstack => "AI full-stack",
            Self::AiArchitecture => "AI architecture",
            Self::CloudNative => "Cloud native",
            Self::OpenSource => "Open source",
            Self::IntelligentDev => "Intelligent development",
            Self::Leadership => "Engineering leadership",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub ai_fullstack: f64,
    pub ai_architecture: f64,
    pub cloud_native: f64,
    pub open_source: f64,
    pub intelligent_dev: f64,
    pub leadership: f64,
}

impl DimensionScores {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::AiFullstack => self.ai_fullstack,
            Dimension::AiArchitecture => self.ai_architecture,
            Dimension::CloudNative => self.cloud_native,
            Dimension::OpenSource => self.open_source,
            Dimension::IntelligentDev => self.intelligent_dev,
            Dimension::Leadership => self.leadership,
        }
    }

    pub fn set(&mut self, dimension: Dimension, value: f64) {
        let slot = match dimension {
            Dimension::AiFullstack => &mut self.ai_fullstack,
            Dimension::AiArchitecture => &mut self.ai_architecture,
            Dimension::CloudNative => &mut self.cloud_native,
            Dimension::OpenSource => &mut self.open_source,
            Dimension::IntelligentDev => &mut self.intelligent_dev,
            Dimension::Leadership => &mut self.leadership,
        };
        *slot = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.into_iter().map(|d| (d, self.get(d)))
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        let mut out = Self::default();
        for (dimension, value) in self.iter() {
            out.set(dimension, f(value));
        }
        out
    }

    pub fn rounded(&self) -> Self {
        self.map(round_one_decimal)
    }

    /// Highest and lowest scoring dimensions (first in canonical order on ties).
    pub fn extremes(&self) -> (Dimension, Dimension) {
        let mut best = Dimension::ALL[0];
        let mut worst = Dimension::ALL[0];
        for (dimension, value) in self.iter() {
            if value > self.get(best) {
                best = dimension;
            }
            if value < self.get(worst) {
                worst = dimension;
            }
        }
        (best, worst)
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn clamp_score(value: f64) -> f64 {
    value.clamp(SCORE_MIN, SCORE_MAX)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitsSummary {
    #[serde(default)]
    pub total_additions: u64,
    #[serde(default)]
    pub total_deletions: u64,
    #[serde(default)]
    pub files_changed: usize,
    #[serde(default)]
    pub languages: Vec<String>,
    /// Newest evaluated commit; the boundary for extend refreshes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit_date: Option<DateTime<Utc>>,
}

/// Weight one identity carried in a merged result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityWeight {
    pub identity: String,
    pub commits: usize,
    pub weight_percent: f64,
}

/// Scores for one contributor in one repository under one plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub username: String,
    pub scores: DimensionScores,
    pub reasoning: String,
    pub total_commits_analyzed: usize,
    #[serde(default)]
    pub commits_summary: CommitsSummary,
    #[serde(default = "default_mode")]
    pub mode: String,
    pub evaluated_at: DateTime<Utc>,
    pub plugin_id: String,
    pub plugin_version: String,
    pub plugin_scan_path: String,
    /// Set when the result was extended with newer commits instead of recomputed.
    #[serde(default)]
    pub incremental: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<IdentityWeight>,
}

pub const DEFAULT_MODE: &str = "moderate";

fn default_mode() -> String {
    DEFAULT_MODE.to_string()
}
