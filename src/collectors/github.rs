//! GitHub commit collector.

use super::http_client::{CommitApi, build_collector_client};
use super::traits::{CollectFuture, Collector};
use super::Platform;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

pub struct GitHubCollector {
    api: CommitApi,
}

impl GitHubCollector {
    pub fn new(base_url: &str, token: Option<&str>, timeout_secs: u64) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("contribscore/0.1"));
        if let Some(t) = token.filter(|t| !t.trim().is_empty())
            && let Ok(val) = format!("Bearer {}", t.trim()).parse()
        {
            headers.insert(AUTHORIZATION, val);
        }

        Self {
            api: CommitApi {
                platform: Platform::GitHub,
                client: build_collector_client(headers, timeout_secs),
                base_url: base_url.to_string(),
                auth_query: Vec::new(),
            },
        }
    }
}

impl Collector for GitHubCollector {
    fn platform(&self) -> Platform {
        Platform::GitHub
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
