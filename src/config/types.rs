use crate::alias::synth::DEFAULT_LLM_BASE_URL;
use crate::cache::StalenessPolicy;
use crate::collectors::github::GITHUB_API_BASE;
use crate::collectors::gitee::GITEE_API_BASE;
use crate::evaluation::DEFAULT_MODE;
use crate::orchestrator::OrchestratorSettings;
use crate::store::StoreLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LLM_MODEL: &str = "qwen/qwen3-coder-flash";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Home directory (`~/.contribscore`) - resolved at load, not serialized
    #[serde(skip)]
    pub home_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub platforms: PlatformsConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl Config {
    /// Defaults rooted at `home`, nothing read from or written to disk.
    pub fn with_home(home: &Path) -> Self {
        Self {
            home_dir: home.to_path_buf(),
            config_path: home.join("config.toml"),
            ..Self::default()
        }
    }

    fn resolve(&self, configured: Option<&PathBuf>, fallback: &str) -> PathBuf {
        match configured {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.home_dir.join(path),
            None => self.home_dir.join(fallback),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.resolve(self.paths.data_dir.as_ref(), "data")
    }

    pub fn evaluations_dir(&self) -> PathBuf {
        self.resolve(self.paths.evaluations_dir.as_ref(), "evaluations")
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.resolve(self.paths.plugins_dir.as_ref(), "plugins")
    }

    pub fn store_layout(&self) -> StoreLayout {
        StoreLayout::new(self.data_dir(), self.evaluations_dir())
    }
}

// ── Paths ────────────────────────────────────────────────────────────────────

/// Relative paths resolve against the home directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub evaluations_dir: Option<PathBuf>,
    #[serde(default)]
    pub plugins_dir: Option<PathBuf>,
}

// ── Platforms ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformsConfig {
    #[serde(default = "default_github_api_base")]
    pub github_api_base: String,
    #[serde(default = "default_gitee_api_base")]
    pub gitee_api_base: String,
    #[serde(default)]
    pub github_token: Option<String>,
    #[serde(default)]
    pub gitee_token: Option<String>,
    /// Upper bound on commits fetched per sync.
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_github_api_base() -> String {
    GITHUB_API_BASE.into()
}

fn default_gitee_api_base() -> String {
    GITEE_API_BASE.into()
}

fn default_max_commits() -> usize {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for PlatformsConfig {
    fn default() -> Self {
        Self {
            github_api_base: default_github_api_base(),
            gitee_api_base: default_gitee_api_base(),
            github_token: None,
            gitee_token: None,
            max_commits: default_max_commits(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ── LLM ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub default_model: String,
    #[serde(default = "default_synthesis_temperature")]
    pub synthesis_temperature: f64,
    #[serde(default = "default_synthesis_max_tokens")]
    pub synthesis_max_tokens: u32,
}

fn default_llm_base_url() -> String {
    DEFAULT_LLM_BASE_URL.into()
}

fn default_llm_model() -> String {
    DEFAULT_LLM_MODEL.into()
}

fn default_synthesis_temperature() -> f64 {
    0.3
}

fn default_synthesis_max_tokens() -> u32 {
    1500
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            default_model: default_llm_model(),
            synthesis_temperature: default_synthesis_temperature(),
            synthesis_max_tokens: default_synthesis_max_tokens(),
        }
    }
}

// ── Evaluation ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_true")]
    pub use_cache: bool,
    #[serde(default = "default_max_repos")]
    pub max_repos: usize,
    /// Repositories evaluated at once within one comparison.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_repo_timeout_secs")]
    pub repo_timeout_secs: u64,
    #[serde(default = "default_max_commits_per_evaluation")]
    pub max_commits_per_evaluation: usize,
    #[serde(default)]
    pub staleness: StalenessPolicy,
}

fn default_mode() -> String {
    DEFAULT_MODE.into()
}

fn default_true() -> bool {
    true
}

fn default_max_repos() -> usize {
    10
}

fn default_concurrency() -> usize {
    4
}

fn default_repo_timeout_secs() -> u64 {
    600
}

fn default_max_commits_per_evaluation() -> usize {
    150
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            use_cache: true,
            max_repos: default_max_repos(),
            concurrency: default_concurrency(),
            repo_timeout_secs: default_repo_timeout_secs(),
            max_commits_per_evaluation: default_max_commits_per_evaluation(),
            staleness: StalenessPolicy::default(),
        }
    }
}

impl EvaluationConfig {
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            max_repos: self.max_repos,
            concurrency: self.concurrency,
            repo_timeout: Duration::from_secs(self.repo_timeout_secs),
            max_commits_per_evaluation: self.max_commits_per_evaluation,
            mode: self.mode.clone(),
            staleness: self.staleness,
        }
    }
}
