use std::time::Duration;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `contribscore`.
///
/// Each subsystem defines its own error variant. Callers match on these to
/// decide whether a failure is local to one repository or alias (captured and
/// reported) or fatal for the request. Application-edge code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum ScoreError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Platform extraction ─────────────────────────────────────────────
    #[error("extraction: {0}")]
    Extraction(#[from] ExtractionError),

    // ── Durable writes ──────────────────────────────────────────────────
    #[error("sync write: {0}")]
    SyncWrite(#[from] SyncWriteError),

    // ── Plugins ─────────────────────────────────────────────────────────
    #[error("plugin: {0}")]
    Plugin(#[from] PluginError),

    // ── Evaluation cache ────────────────────────────────────────────────
    #[error("cache: {0}")]
    Cache(#[from] CacheError),

    // ── Alias narrative synthesis ───────────────────────────────────────
    #[error("synthesis: {0}")]
    Synthesis(#[from] SynthesisError),

    // ── Request validation / orchestration ──────────────────────────────
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no commits by {author} in {repo}")]
    NoCommits { author: String, repo: String },

    #[error("timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("all alias evaluations failed: {0}")]
    AliasesFailed(String),

    /// Failure of a concurrent request for the same cache key, shared with
    /// the requests that waited on it.
    #[error("{reason}")]
    Joined { reason: String, retryable: bool },

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScoreError {
    /// Stable, display-ready reason. Never a debug dump.
    pub fn reason(&self) -> String {
        match self {
            Self::Plugin(err) => err.reason(),
            Self::Extraction(err) => format!("extraction failed: {err}"),
            Self::SyncWrite(err) => format!("failed to persist repository data: {err}"),
            Self::Other(err) => format!("{err:#}"),
            other => other.to_string(),
        }
    }

    /// Whether retrying the same request later can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Joined { retryable, .. } => *retryable,
            other => matches!(
                other,
                Self::Extraction(_) | Self::SyncWrite(_) | Self::Timeout { .. }
            ),
        }
    }

    /// Registry-level misconfiguration is the only fatal, caller-surfaced class.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Plugin(PluginError::NoPlugins { .. } | PluginError::NoDefault)
                | Self::Config(_)
                | Self::InvalidRequest(_)
        )
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Extraction errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{platform} request failed: {message}")]
    Request { platform: String, message: String },

    #[error("{platform} rate-limited{}", retry_hint(.retry_after_secs))]
    RateLimited {
        platform: String,
        retry_after_secs: Option<u64>,
    },

    #[error("{platform} returned HTTP {status} for {path}")]
    Status {
        platform: String,
        status: u16,
        path: String,
    },

    #[error("{platform} response could not be decoded: {message}")]
    Decode { platform: String, message: String },

    #[error("no collector configured for platform {0}")]
    UnsupportedPlatform(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(" (retry after {secs}s)"),
        None => String::new(),
    }
}

// ─── Durable write errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SyncWriteError {
    #[error("failed writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed encoding {path}: {message}")]
    Encode { path: String, message: String },
}

// ─── Plugin errors ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
pub enum PluginError {
    #[error("unknown plugin '{requested}' (available: {})", .available.join(", "))]
    NotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("no plugins discovered under {root}")]
    NoPlugins { root: String },

    #[error("no default plugin could be resolved")]
    NoDefault,

    #[error("plugin '{plugin}' failed to load: {message}")]
    Load { plugin: String, message: String },

    #[error("plugin '{plugin}' violated the scan contract: {message}")]
    ContractViolation { plugin: String, message: String },

    #[error("plugin '{plugin}' evaluation failed: {message}")]
    Invocation { plugin: String, message: String },
}

impl PluginError {
    pub fn reason(&self) -> String {
        self.to_string()
    }

    pub fn contract(plugin: &str, message: impl Into<String>) -> Self {
        Self::ContractViolation {
            plugin: plugin.to_string(),
            message: message.into(),
        }
    }

    pub fn invocation(plugin: &str, message: impl Into<String>) -> Self {
        Self::Invocation {
            plugin: plugin.to_string(),
            message: message.into(),
        }
    }

    pub fn load(plugin: &str, message: impl Into<String>) -> Self {
        Self::Load {
            plugin: plugin.to_string(),
            message: message.into(),
        }
    }
}

// ─── Cache errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CacheError {
    /// Corrupted or unreadable entry. Callers treat this as a miss.
    #[error("unreadable cache entry {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed writing cache entry: {0}")]
    Write(#[from] SyncWriteError),
}

// ─── Synthesis errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("no API key configured")]
    MissingKey,

    #[error("request failed: {0}")]
    Request(String),

    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("response contained no text")]
    EmptyResponse,
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, ScoreError>;
