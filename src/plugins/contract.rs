use crate::collectors::CommitRecord;
use crate::error::PluginError;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

/// Construction parameters handed to a scan plugin.
#[derive(Clone, Serialize)]
pub struct EvaluatorConfig {
    pub data_dir: PathBuf,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub mode: String,
}

impl fmt::Debug for EvaluatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluatorConfig")
            .field("data_dir", &self.data_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("mode", &self.mode)
            .finish()
    }
}

pub type EvaluateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<serde_json::Value, PluginError>> + Send + 'a>>;

/// Evaluator produced by a scan plugin.
///
/// Returns the raw plugin document; shape validation happens in the dispatcher.
pub trait CommitEvaluator: Send + Sync {
    fn evaluate_engineer<'a>(
        &'a self,
        commits: &'a [CommitRecord],
        username: &'a str,
    ) -> EvaluateFuture<'a>;
}

/// Entry point every scan plugin exposes.
pub trait ScanPlugin: Send + Sync {
    fn create_commit_evaluator(
        &self,
        config: EvaluatorConfig,
    ) -> Result<Box<dyn CommitEvaluator>, PluginError>;
}
