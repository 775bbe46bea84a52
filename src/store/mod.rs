//! On-disk state shared across requests: layout, atomic writes, per-key locks.

pub mod atomic;
pub mod locks;

pub use atomic::{discard_stale_temps, read_json, write_json_atomic};
pub use locks::{KeyFailure, KeyGuard, KeyedLocks};

use crate::collectors::RepoIdentity;
use std::path::{Path, PathBuf};

/// Persisted layout:
/// `data/{platform}/{owner}/{repo}/` holds the commit index and sync state,
/// `evaluations/{platform}/{owner}/{repo}/` holds cached evaluations.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    data_dir: PathBuf,
    evaluations_dir: PathBuf,
}

impl StoreLayout {
    pub fn new(data_dir: impl Into<PathBuf>, evaluations_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            evaluations_dir: evaluations_dir.into(),
        }
    }

    /// Layout rooted at one home directory (`home/data`, `home/evaluations`).
    pub fn under(home: &Path) -> Self {
        Self::new(home.join("data"), home.join("evaluations"))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn evaluations_dir(&self) -> &Path {
        &self.evaluations_dir
    }

    pub fn repo_data_dir(&self, repo: &RepoIdentity) -> PathBuf {
        self.data_dir
            .join(repo.platform.as_str())
            .join(&repo.owner)
            .join(&repo.repo)
    }

    pub fn repo_evaluation_dir(&self, repo: &RepoIdentity) -> PathBuf {
        self.evaluations_dir
            .join(repo.platform.as_str())
            .join(&repo.owner)
            .join(&repo.repo)
    }
}
