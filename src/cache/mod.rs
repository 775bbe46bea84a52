//! Plugin-isolated evaluation cache with per-key single-flight.

pub mod key;
pub mod policy;

pub use key::{CacheKey, normalize_author};
pub use policy::{StalenessPolicy, commits_after_boundary};

use crate::error::{CacheError, ScoreError};
use crate::evaluation::EvaluationResult;
use crate::store::{KeyFailure, KeyedLocks, StoreLayout, write_json_atomic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub written_at: DateTime<Utc>,
    pub result: EvaluationResult,
}

/// What a refresh callback decided for a key.
pub enum Computed {
    /// Keep the entry that was handed in.
    Reuse(CacheEntry),
    /// Store this result as the new entry.
    Fresh(EvaluationResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSource {
    /// Served from an existing entry.
    Hit,
    /// Produced by a concurrent request for the same key while this one waited.
    Joined,
    /// Computed (or extended) by this request and written back.
    Computed,
}

#[derive(Debug, Clone)]
pub struct CacheOutcome {
    pub result: EvaluationResult,
    pub source: CacheSource,
}

impl CacheOutcome {
    pub fn from_cache(&self) -> bool {
        self.source != CacheSource::Computed
    }
}

pub struct EvaluationCache {
    layout: StoreLayout,
    locks: KeyedLocks<CacheKey>,
}

impl EvaluationCache {
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            layout,
            locks: KeyedLocks::new(),
        }
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.layout
            .repo_evaluation_dir(&key.repo)
            .join(key.file_name())
    }

    /// Strict read: corrupted files and key mismatches surface as `CacheError::Read`.
    pub fn read(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.path_for(key);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::Read {
                    path: path.display().to_string(),
                    message: e.to_string(),
                });
            }
        };
        let entry: CacheEntry = serde_json::from_slice(&raw).map_err(|e| CacheError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if entry.key != *key {
            return Err(CacheError::Read {
                path: path.display().to_string(),
                message: format!("entry belongs to {}", entry.key),
            });
        }
        Ok(Some(entry))
    }

    /// Lenient read: anything unreadable is a miss.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.read(key) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    pub fn put(&self, key: &CacheKey, result: EvaluationResult) -> Result<CacheEntry, CacheError> {
        let entry = CacheEntry {
            key: key.clone(),
            written_at: Utc::now(),
            result,
        };
        write_json_atomic(&self.path_for(key), &entry)?;
        tracing::debug!(key = %key, "Cached evaluation");
        Ok(entry)
    }

    /// Delete one plugin's entry. Returns whether a file was removed.
    pub fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Write(crate::error::SyncWriteError::Io {
                path: path.display().to_string(),
                source: e,
            })),
        }
    }

    /// Serve a hit, otherwise compute under the key lock and write back.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &CacheKey,
        use_cache: bool,
        compute: F,
    ) -> Result<CacheOutcome, ScoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<EvaluationResult, ScoreError>>,
    {
        self.get_or_refresh(key, use_cache, |prior| async move {
            match prior {
                Some(entry) => Ok(Computed::Reuse(entry)),
                None => compute().await.map(Computed::Fresh),
            }
        })
        .await
    }

    /// Single-flight lookup with a caller-controlled refresh step.
    ///
    /// `refresh` receives the current entry (`None` on a miss or when
    /// `use_cache` is off) and either keeps it or supplies a replacement,
    /// which is written back. At most one `refresh` runs per key at a time.
    /// A request that waited while another one completed the same key reuses
    /// that result instead of computing again, even when `use_cache` is off.
    /// When that computation failed, the waiter returns the same failure.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        key: &CacheKey,
        use_cache: bool,
        refresh: F,
    ) -> Result<CacheOutcome, ScoreError>
    where
        F: FnOnce(Option<CacheEntry>) -> Fut,
        Fut: Future<Output = Result<Computed, ScoreError>>,
    {
        let guard = self.locks.lock(key).await;

        if let Some(failure) = guard.failed_while_waiting() {
            tracing::debug!(key = %key, reason = %failure.reason, "Concurrent request for this key failed");
            return Err(ScoreError::Joined {
                reason: failure.reason,
                retryable: failure.retryable,
            });
        }
        if guard.completed_while_waiting()
            && let Some(entry) = self.get(key)
        {
            tracing::debug!(key = %key, "Reusing result completed by a concurrent request");
            return Ok(CacheOutcome {
                result: entry.result,
                source: CacheSource::Joined,
            });
        }

        let prior = if use_cache { self.get(key) } else { None };
        let computed = match refresh(prior).await {
            Ok(computed) => computed,
            Err(e) => {
                guard.mark_failed(KeyFailure {
                    reason: e.reason(),
                    retryable: e.is_retryable(),
                });
                return Err(e);
            }
        };
        match computed {
            Computed::Reuse(entry) => Ok(CacheOutcome {
                result: entry.result,
                source: CacheSource::Hit,
            }),
            Computed::Fresh(result) => {
                let entry = self.put(key, result)?;
                guard.mark_completed();
                Ok(CacheOutcome {
                    result: entry.result,
                    source: CacheSource::Computed,
                })
            }
        }
    }
}
