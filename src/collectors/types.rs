use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One commit, normalized across platforms. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    /// Author identity as recorded in the commit (name, falling back to committer).
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(default)]
    pub files: Vec<FileChange>,
    #[serde(default)]
    pub stats: CommitStats,
}

impl CommitRecord {
    /// Case-insensitive identity match on the author name.
    pub fn is_by(&self, identity: &str) -> bool {
        let identity = identity.trim();
        !identity.is_empty() && self.author.trim().eq_ignore_ascii_case(identity)
    }

    /// First line of the message, as shown in listings.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub filename: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

fn default_status() -> String {
    "modified".into()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub total: u64,
}
