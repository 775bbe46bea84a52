use crate::collectors::RepoIdentity;
use serde::{Deserialize, Serialize};
use std::fmt;

const UNKNOWN_AUTHOR: &str = "unknown";

/// Identity of one cached evaluation. Always includes the plugin id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub repo: RepoIdentity,
    pub author: String,
    pub plugin_id: String,
}

impl CacheKey {
    pub fn new(repo: RepoIdentity, author: &str, plugin_id: &str) -> Self {
        Self {
            repo,
            author: normalize_author(author),
            plugin_id: plugin_id.trim().to_string(),
        }
    }

    pub(crate) fn file_name(&self) -> String {
        format!(
            "{}__{}.json",
            path_safe(&self.author),
            path_safe(&self.plugin_id)
        )
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.repo, self.author, self.plugin_id)
    }
}

pub fn normalize_author(author: &str) -> String {
    let author = author.trim().to_lowercase();
    if author.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        author
    }
}

fn path_safe(component: &str) -> String {
    component
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect()
}
