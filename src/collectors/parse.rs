//! Shared decoding of the GitHub-shaped commit payloads (Gitee mirrors it).

use super::types::{CommitRecord, CommitStats, FileChange};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Decode one commit from a list item or a detail payload.
///
/// Returns `None` only when the payload carries no sha.
pub(crate) fn parse_commit(value: &Value) -> Option<CommitRecord> {
    let sha = value
        .get("sha")
        .or_else(|| value.get("hash"))
        .and_then(Value::as_str)?
        .to_string();
    if sha.is_empty() {
        return None;
    }

    let commit = value.get("commit");
    let author = commit.and_then(|c| c.get("author"));
    let committer = commit.and_then(|c| c.get("committer"));

    let author_name = person_field(author, "name")
        .or_else(|| person_field(committer, "name"))
        .or_else(|| person_field(value.get("author"), "login"))
        .unwrap_or_default();
    let author_email = person_field(author, "email");

    let timestamp = person_field(author, "date")
        .or_else(|| person_field(committer, "date"))
        .and_then(|raw| parse_timestamp(&raw))
        .unwrap_or_else(|| {
            tracing::warn!(sha = sha.as_str(), "commit has no parseable date, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        });

    let message = commit
        .and_then(|c| c.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let files = value
        .get("files")
        .and_then(Value::as_array)
        .map(|files| files.iter().filter_map(parse_file).collect())
        .unwrap_or_default();

    let stats = value
        .get("stats")
        .map(|stats| CommitStats {
            additions: u64_field(stats, "additions"),
            deletions: u64_field(stats, "deletions"),
            total: u64_field(stats, "total"),
        })
        .unwrap_or_default();

    Some(CommitRecord {
        sha,
        author: author_name,
        author_email,
        timestamp,
        message,
        files,
        stats,
    })
}

fn parse_file(value: &Value) -> Option<FileChange> {
    let filename = value.get("filename").and_then(Value::as_str)?;
    if filename.is_empty() {
        return None;
    }
    Some(FileChange {
        filename: filename.to_string(),
        status: value
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("modified")
            .to_string(),
        additions: u64_field(value, "additions"),
        deletions: u64_field(value, "deletions"),
        patch: value
            .get("patch")
            .and_then(Value::as_str)
            .map(String::from),
    })
}

fn person_field(person: Option<&Value>, field: &str) -> Option<String> {
    person
        .and_then(|p| p.get(field))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn u64_field(value: &Value, field: &str) -> u64 {
    value.get(field).and_then(Value::as_u64).unwrap_or(0)
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
