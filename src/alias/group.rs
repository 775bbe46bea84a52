use serde::{Deserialize, Serialize};

/// Identities believed to belong to one contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasGroup {
    pub canonical: String,
    pub members: Vec<String>,
}

impl AliasGroup {
    pub fn single(contributor: &str) -> Self {
        let canonical = contributor.trim().to_string();
        Self {
            members: vec![canonical.clone()],
            canonical,
        }
    }

    /// Group from a comma-separated alias list.
    ///
    /// Names are trimmed and lower-cased. The list only applies when it
    /// names the contributor; otherwise the group is the contributor alone.
    pub fn from_list(contributor: &str, aliases: &str) -> Self {
        let contributor = contributor.trim();
        let wanted = contributor.to_lowercase();

        let mut members: Vec<String> = Vec::new();
        for alias in aliases.split(',') {
            let alias = alias.trim().to_lowercase();
            if !alias.is_empty() && !members.contains(&alias) {
                members.push(alias);
            }
        }

        if members.len() > 1 && members.contains(&wanted) {
            Self {
                canonical: contributor.to_string(),
                members,
            }
        } else {
            Self::single(contributor)
        }
    }

    /// Group from a bare alias list, named after its first entry.
    /// `None` when the list names nobody.
    pub fn from_names(aliases: &str) -> Option<Self> {
        let first = aliases.split(',').map(str::trim).find(|name| !name.is_empty())?;
        let mut group = Self::from_list(first, aliases);
        group.canonical = first.to_string();
        for member in &mut group.members {
            *member = member.to_lowercase();
        }
        Some(group)
    }

    pub fn is_single(&self) -> bool {
        self.members.len() <= 1
    }
}
