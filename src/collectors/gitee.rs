//! Gitee commit collector.
//!
//! Gitee's v5 API mirrors GitHub's commit payloads but authenticates with an
//! `access_token` query parameter rather than a header.

use super::http_client::{CommitApi, build_collector_client};
use super::traits::{CollectFuture, Collector};
use super::Platform;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

pub const GITEE_API_BASE: &str = "https://gitee.com/api/v5";

pub struct GiteeCollector {
    api: CommitApi,
}

impl GiteeCollector {
    pub fn new(base_url: &str, token: Option<&str>, timeout_secs: u64) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("contribscore/0.1"));

        let auth_query = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| vec![("access_token".to_string(), t.to_string())])
            .unwrap_or_default();

        Self {
            api: CommitApi {
                platform: Platform::Gitee,
                client: build_collector_client(headers, timeout_secs),
                base_url: base_url.to_string(),
                auth_query,
            },
        }
    }
}

impl Collector for GiteeCollector {
    fn platform(&self) -> Platform {
        Platform::Gitee
    }

    fn fetch_commits<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> CollectFuture<'a> {
        Box::pin(self.api.fetch(owner, repo, since, limit))
    }
}
