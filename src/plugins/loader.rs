//! Path-based loading of scan entries from each plugin's own directory.
//!
//! The default loader treats the scan entry as an executable. It receives one
//! JSON request on stdin (`config`, `commits`, `username`) and must print one
//! JSON document on stdout.

use super::contract::{CommitEvaluator, EvaluateFuture, EvaluatorConfig, ScanPlugin};
use super::registry::PluginDescriptor;
use crate::collectors::CommitRecord;
use crate::error::PluginError;
use crate::utils::text::truncate_with_ellipsis;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const MAX_STDERR_CHARS: usize = 2000;

pub trait PluginLoader: Send + Sync {
    fn load(&self, descriptor: &PluginDescriptor) -> Result<Arc<dyn ScanPlugin>, PluginError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutableLoader;

impl PluginLoader for ExecutableLoader {
    fn load(&self, descriptor: &PluginDescriptor) -> Result<Arc<dyn ScanPlugin>, PluginError> {
        let entry = resolve_scan_entry(descriptor)?;
        tracing::debug!(plugin = %descriptor.id, entry = %entry.display(), "Loaded scan entry");
        Ok(Arc::new(ProcessPlugin {
            plugin_id: descriptor.id.clone(),
            entry,
            workdir: descriptor.plugin_dir.clone(),
        }))
    }
}

/// Canonical scan entry path, guaranteed to live under the plugin directory.
pub fn resolve_scan_entry(descriptor: &PluginDescriptor) -> Result<PathBuf, PluginError> {
    let id = descriptor.id.as_str();
    let plugin_dir = descriptor
        .plugin_dir
        .canonicalize()
        .map_err(|e| PluginError::load(id, format!("plugin directory unavailable: {e}")))?;
    let raw = descriptor.scan_path();
    let entry = raw.canonicalize().map_err(|_| {
        PluginError::load(id, format!("scan_entry not found: {}", raw.display()))
    })?;

    if !entry.starts_with(&plugin_dir) {
        return Err(PluginError::load(
            id,
            format!("scan_entry escapes plugin directory: {}", descriptor.scan_entry),
        ));
    }
    if !entry.is_file() {
        return Err(PluginError::load(
            id,
            format!("scan_entry is not a file: {}", entry.display()),
        ));
    }
    if !is_executable(&entry) {
        return Err(PluginError::load(
            id,
            format!("scan_entry is not executable: {}", entry.display()),
        ));
    }
    Ok(entry)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|meta| meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

struct ProcessPlugin {
    plugin_id: String,
    entry: PathBuf,
    workdir: PathBuf,
}

impl ScanPlugin for ProcessPlugin {
    fn create_commit_evaluator(
        &self,
        config: EvaluatorConfig,
    ) -> Result<Box<dyn CommitEvaluator>, PluginError> {
        Ok(Box::new(ProcessEvaluator {
            plugin_id: self.plugin_id.clone(),
            entry: self.entry.clone(),
            workdir: self.workdir.clone(),
            config,
        }))
    }
}

struct ProcessEvaluator {
    plugin_id: String,
    entry: PathBuf,
    workdir: PathBuf,
    config: EvaluatorConfig,
}

#[derive(Serialize)]
struct ScanRequest<'a> {
    config: &'a EvaluatorConfig,
    commits: &'a [CommitRecord],
    username: &'a str,
}

impl CommitEvaluator for ProcessEvaluator {
    fn evaluate_engineer<'a>(
        &'a self,
        commits: &'a [CommitRecord],
        username: &'a str,
    ) -> EvaluateFuture<'a> {
        Box::pin(async move {
            let id = self.plugin_id.as_str();
            let request = serde_json::to_vec(&ScanRequest {
                config: &self.config,
                commits,
                username,
            })
            .map_err(|e| PluginError::invocation(id, format!("failed to encode request: {e}")))?;

            let mut child = Command::new(&self.entry)
                .current_dir(&self.workdir)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| PluginError::invocation(id, format!("failed to start: {e}")))?;

            // Feed stdin concurrently with draining stdout so large payloads cannot deadlock.
            let writer = child.stdin.take().map(|mut stdin| {
                tokio::spawn(async move {
                    let result = stdin.write_all(&request).await;
                    drop(stdin);
                    result
                })
            });

            let output = child
                .wait_with_output()
                .await
                .map_err(|e| PluginError::invocation(id, format!("failed to run: {e}")))?;

            if let Some(writer) = writer
                && let Ok(Err(e)) = writer.await
                && e.kind() != std::io::ErrorKind::BrokenPipe
            {
                tracing::debug!(plugin = id, error = %e, "Plugin did not consume its request");
            }

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stderr = truncate_with_ellipsis(stderr.trim(), MAX_STDERR_CHARS);
                return Err(PluginError::invocation(
                    id,
                    format!("exited with {}: {stderr}", output.status),
                ));
            }

            serde_json::from_slice(&output.stdout)
                .map_err(|e| PluginError::contract(id, format!("output is not valid JSON: {e}")))
        })
    }
}
