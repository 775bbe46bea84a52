use super::types::CommitsSummary;
use crate::collectors::CommitRecord;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

pub const MAX_LANGUAGES: usize = 10;

/// Aggregate line/file statistics over the evaluated commits.
pub fn summarize(commits: &[CommitRecord]) -> CommitsSummary {
    let mut files: HashSet<&str> = HashSet::new();
    let mut languages: BTreeSet<String> = BTreeSet::new();
    let mut total_additions = 0;
    let mut total_deletions = 0;

    for commit in commits {
        total_additions += commit.stats.additions;
        total_deletions += commit.stats.deletions;
        for file in &commit.files {
            files.insert(file.filename.as_str());
            if let Some(ext) = Path::new(&file.filename)
                .extension()
                .and_then(|ext| ext.to_str())
            {
                languages.insert(ext.to_ascii_lowercase());
            }
        }
    }

    let newest = commits.iter().max_by_key(|c| c.timestamp);
    CommitsSummary {
        total_additions,
        total_deletions,
        files_changed: files.len(),
        languages: languages.into_iter().take(MAX_LANGUAGES).collect(),
        last_commit_sha: newest.map(|c| c.sha.clone()),
        last_commit_date: newest.map(|c| c.timestamp),
    }
}

impl CommitsSummary {
    /// Sum counts, union languages, keep the newer boundary.
    pub fn combine(&self, other: &CommitsSummary) -> CommitsSummary {
        let mut languages: Vec<String> = Vec::new();
        for language in self.languages.iter().chain(&other.languages) {
            if languages.len() == MAX_LANGUAGES {
                break;
            }
            if !languages.contains(language) {
                languages.push(language.clone());
            }
        }

        let newer = match (self.last_commit_date, other.last_commit_date) {
            (Some(a), Some(b)) if b > a => other,
            (None, Some(_)) => other,
            _ => self,
        };

        CommitsSummary {
            total_additions: self.total_additions + other.total_additions,
            total_deletions: self.total_deletions + other.total_deletions,
            files_changed: self.files_changed + other.files_changed,
            languages,
            last_commit_sha: newer.last_commit_sha.clone(),
            last_commit_date: newer.last_commit_date,
        }
    }
}
