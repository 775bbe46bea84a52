//! Contributors shared across several locally synced repositories.

use crate::alias::AliasGroup;
use crate::collectors::RepoIdentity;
use crate::sync::CommitIndex;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorRepo {
    pub repo: String,
    pub commits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonContributor {
    /// Alias canonical name, or the most active spelling of the author name.
    pub author: String,
    /// Author names folded into this contributor, as they appear in commits.
    pub identities: Vec<String>,
    pub repos: Vec<ContributorRepo>,
    pub total_commits: usize,
    pub repo_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommonContributors {
    pub contributors: Vec<CommonContributor>,
    pub repos_with_data: usize,
    /// Requested repositories without a readable local index.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_repos: Vec<String>,
}

#[derive(Default)]
struct Folded {
    spellings: HashMap<String, usize>,
    per_repo: Vec<(String, usize)>,
}

impl Folded {
    fn add(&mut self, repo: &str, author: &str, commits: usize) {
        *self.spellings.entry(author.to_string()).or_default() += commits;
        match self.per_repo.iter_mut().find(|(name, _)| name == repo) {
            Some((_, count)) => *count += commits,
            None => self.per_repo.push((repo.to_string(), commits)),
        }
    }

    fn display_name(&self) -> String {
        self.spellings
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, _)| name.clone())
            .unwrap_or_default()
    }
}

/// Authors present in at least two of `indexes`.
///
/// Names match case-insensitively. Members of `aliases` fold into one
/// contributor named after the group's canonical name. Most widespread
/// contributors come first, then the most active.
pub fn common_contributors(
    indexes: &[(RepoIdentity, CommitIndex)],
    aliases: Option<&AliasGroup>,
) -> Vec<CommonContributor> {
    const ALIAS_KEY: &str = "\u{0}aliases";

    let mut groups: HashMap<String, Folded> = HashMap::new();
    for (repo, index) in indexes {
        let repo = repo.to_string();
        for summary in index.authors() {
            let lowered = summary.author.to_lowercase();
            let key = match aliases {
                Some(group) if group.members.contains(&lowered) => ALIAS_KEY.to_string(),
                _ => lowered,
            };
            groups
                .entry(key)
                .or_default()
                .add(&repo, &summary.author, summary.commits);
        }
    }

    let mut contributors: Vec<CommonContributor> = groups
        .into_iter()
        .filter(|(_, folded)| folded.per_repo.len() >= 2)
        .map(|(key, folded)| {
            let author = match aliases {
                Some(group) if key == ALIAS_KEY => group.canonical.clone(),
                _ => folded.display_name(),
            };
            let mut identities: Vec<String> = folded.spellings.keys().cloned().collect();
            identities.sort();
            let mut repos: Vec<ContributorRepo> = folded
                .per_repo
                .into_iter()
                .map(|(repo, commits)| ContributorRepo { repo, commits })
                .collect();
            repos.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.repo.cmp(&b.repo)));
            CommonContributor {
                author,
                identities,
                total_commits: repos.iter().map(|r| r.commits).sum(),
                repo_count: repos.len(),
                repos,
            }
        })
        .collect();

    contributors.sort_by(|a, b| {
        b.repo_count
            .cmp(&a.repo_count)
            .then_with(|| b.total_commits.cmp(&a.total_commits))
            .then_with(|| a.author.to_lowercase().cmp(&b.author.to_lowercase()))
    });
    contributors
}
