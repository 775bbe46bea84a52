use crate::collectors::CommitRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Commits of one repository, newest first, unique by sha.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitIndex {
    commits: Vec<CommitRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub author: String,
    pub commits: usize,
    pub last_commit_at: DateTime<Utc>,
}

impl CommitIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_commits(commits: Vec<CommitRecord>) -> Self {
        let mut index = Self::new();
        index.merge(commits);
        index
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    pub fn newest(&self) -> Option<&CommitRecord> {
        self.commits.first()
    }

    pub fn contains(&self, sha: &str) -> bool {
        self.commits.iter().any(|c| c.sha == sha)
    }

    /// Merge a fetched batch by sha. Already-known shas are dropped.
    /// Returns the number of commits added.
    pub fn merge(&mut self, batch: impl IntoIterator<Item = CommitRecord>) -> usize {
        let mut known: HashSet<String> = self.commits.iter().map(|c| c.sha.clone()).collect();
        let mut added: Vec<CommitRecord> = Vec::new();
        for commit in batch {
            if known.insert(commit.sha.clone()) {
                added.push(commit);
            }
        }

        let count = added.len();
        if count > 0 {
            added.append(&mut self.commits);
            self.commits = added;
            // Stable: equal timestamps keep fetch order ahead of older entries.
            self.commits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }
        count
    }

    /// Commits by one identity, newest first.
    pub fn by_author<'a>(&'a self, identity: &'a str) -> impl Iterator<Item = &'a CommitRecord> {
        self.commits.iter().filter(move |c| c.is_by(identity))
    }

    pub fn count_by(&self, identity: &str) -> usize {
        self.by_author(identity).count()
    }

    /// Distinct authors with commit counts, most active first.
    pub fn authors(&self) -> Vec<AuthorSummary> {
        let mut by_key: HashMap<String, AuthorSummary> = HashMap::new();
        for commit in &self.commits {
            let name = commit.author.trim();
            if name.is_empty() {
                continue;
            }
            by_key
                .entry(name.to_lowercase())
                .and_modify(|summary| {
                    summary.commits += 1;
                    if commit.timestamp > summary.last_commit_at {
                        summary.last_commit_at = commit.timestamp;
                    }
                })
                .or_insert_with(|| AuthorSummary {
                    author: name.to_string(),
                    commits: 1,
                    last_commit_at: commit.timestamp,
                });
        }

        let mut authors: Vec<AuthorSummary> = by_key.into_values().collect();
        authors.sort_by(|a, b| {
            b.commits
                .cmp(&a.commits)
                .then_with(|| a.author.to_lowercase().cmp(&b.author.to_lowercase()))
        });
        authors
    }
}
