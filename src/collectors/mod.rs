//! Platform collectors: normalized commit retrieval from GitHub and Gitee.

pub mod gitee;
pub mod github;
pub mod http_client;
mod parse;
pub mod traits;
pub mod types;

pub use gitee::GiteeCollector;
pub use github::GitHubCollector;
pub use traits::{Collector, CollectorSet};
pub use types::{CommitRecord, CommitStats, FileChange};

use serde::{Deserialize, Serialize};
use std::fmt;

// -- Platform --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    GitHub,
    Gitee,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::Gitee => "gitee",
        }
    }

    fn host(self) -> &'static str {
        match self {
            Self::GitHub => "github.com",
            Self::Gitee => "gitee.com",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" | "github.com" => Ok(Self::GitHub),
            "gitee" | "gitee.com" => Ok(Self::Gitee),
            other => Err(format!("unsupported platform: {other}")),
        }
    }
}

// -- RepoIdentity --

/// Immutable key identifying one repository on one platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoIdentity {
    pub platform: Platform,
    pub owner: String,
    pub repo: String,
}

impl RepoIdentity {
    pub fn new(platform: Platform, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            platform,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// `owner/repo`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Parse a repository URL.
    ///
    /// Accepts `https://github.com/o/r`, `github.com/o/r`, `git@github.com:o/r.git`
    /// and the same forms for gitee. A trailing slash and `.git` suffix are
    /// stripped.
    pub fn parse_url(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Some(rest) = input.strip_prefix("git@") {
            let (host, path) = rest.split_once(':')?;
            let platform = host.parse::<Platform>().ok()?;
            return Self::from_path(platform, path);
        }

        let with_scheme = if input.contains("://") {
            input.to_string()
        } else {
            format!("https://{input}")
        };
        let parsed = url::Url::parse(&with_scheme).ok()?;
        let host = parsed.host_str()?.trim_start_matches("www.");
        let platform = [Platform::GitHub, Platform::Gitee]
            .into_iter()
            .find(|p| p.host() == host)?;
        Self::from_path(platform, parsed.path())
    }

    fn from_path(platform: Platform, path: &str) -> Option<Self> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let owner = segments.next()?;
        let repo = segments.next()?;
        if segments.next().is_some() {
            return None;
        }
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some(Self::new(platform, owner, repo))
    }
}

impl fmt::Display for RepoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.platform, self.owner, self.repo)
    }
}
