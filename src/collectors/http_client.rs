//! HTTP plumbing shared by the REST collectors.

use super::parse::parse_commit;
use super::{CommitRecord, Platform};
use crate::error::ExtractionError;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub(crate) const PAGE_SIZE: usize = 100;

pub fn build_collector_client(headers: HeaderMap, timeout_secs: u64) -> Client {
    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// A GitHub-shaped commits API (`/repos/{owner}/{repo}/commits[/{sha}]`).
pub(crate) struct CommitApi {
    pub platform: Platform,
    pub client: Client,
    pub base_url: String,
    /// Extra query pairs sent on every request (Gitee's `access_token`).
    pub auth_query: Vec<(String, String)>,
}

impl CommitApi {
    /// List newest-first, paginating until `limit` or a short page, then
    /// enrich each commit with its detail payload.
    pub async fn fetch(
        &self,
        owner: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<CommitRecord>, ExtractionError> {
        let list_path = format!("/repos/{owner}/{repo}/commits");
        let mut listed: Vec<Value> = Vec::new();
        let mut page = 1usize;

        while listed.len() < limit {
            let mut query = vec![
                ("per_page".to_string(), PAGE_SIZE.min(limit).to_string()),
                ("page".to_string(), page.to_string()),
            ];
            if let Some(since) = since {
                query.push((
                    "since".to_string(),
                    since.to_rfc3339_opts(SecondsFormat::Secs, true),
                ));
            }

            let body = self.get_json(&list_path, &query).await?;
            let Some(batch) = body.as_array() else {
                return Err(ExtractionError::Decode {
                    platform: self.platform.to_string(),
                    message: format!("expected a commit array from {list_path}"),
                });
            };
            let short_page = batch.len() < PAGE_SIZE.min(limit);
            listed.extend(batch.iter().cloned());
            debug!(
                platform = %self.platform,
                page,
                count = batch.len(),
                "Listed commits page"
            );
            if batch.is_empty() || short_page {
                break;
            }
            page += 1;
        }
        listed.truncate(limit);

        let mut commits = Vec::with_capacity(listed.len());
        for item in &listed {
            let Some(summary) = parse_commit(item) else {
                continue;
            };
            let detail_path = format!("/repos/{owner}/{repo}/commits/{}", summary.sha);
            match self.get_json(&detail_path, &[]).await {
                Ok(detail) => commits.push(parse_commit(&detail).unwrap_or(summary)),
                Err(err @ ExtractionError::RateLimited { .. }) => return Err(err),
                Err(err) => {
                    warn!(
                        platform = %self.platform,
                        sha = summary.sha.as_str(),
                        error = %err,
                        "Commit detail unavailable, keeping list entry"
                    );
                    commits.push(summary);
                }
            }
        }

        Ok(commits)
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, ExtractionError> {
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&self.auth_query)
            .send()
            .await
            .map_err(|e| ExtractionError::Request {
                platform: self.platform.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if is_rate_limited(status, response.headers()) {
            return Err(ExtractionError::RateLimited {
                platform: self.platform.to_string(),
                retry_after_secs: retry_after(response.headers()),
            });
        }
        if !status.is_success() {
            return Err(ExtractionError::Status {
                platform: self.platform.to_string(),
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        response.json().await.map_err(|e| ExtractionError::Decode {
            platform: self.platform.to_string(),
            message: e.to_string(),
        })
    }
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    status == StatusCode::FORBIDDEN
        && headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0")
}

fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
