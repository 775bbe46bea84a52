//! Narrative synthesis for merged alias evaluations.

use super::MemberEvaluation;
use crate::error::SynthesisError;
use crate::evaluation::DimensionScores;
use crate::evaluation::types::round_one_decimal;
use crate::utils::text::truncate_with_ellipsis;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub type SynthesisFuture<'a> = Pin<Box<dyn Future<Output = Result<String, SynthesisError>> + Send + 'a>>;

pub struct SynthesisInput<'a> {
    pub canonical: &'a str,
    pub members: &'a [MemberEvaluation],
    pub scores: &'a DimensionScores,
    pub total_commits: usize,
}

impl SynthesisInput<'_> {
    fn weight_percent(&self, commits: usize) -> f64 {
        if self.total_commits == 0 {
            return 0.0;
        }
        round_one_decimal(commits as f64 * 100.0 / self.total_commits as f64)
    }
}

pub trait NarrativeSynthesizer: Send + Sync {
    fn synthesize<'a>(&'a self, input: &'a SynthesisInput<'a>) -> SynthesisFuture<'a>;
}

// ── Template ─────────────────────────────────────────────────────────────────

/// Deterministic narrative built from the per-identity reasonings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSynthesizer;

impl TemplateSynthesizer {
    pub fn compose(input: &SynthesisInput<'_>) -> String {
        let names: Vec<&str> = input.members.iter().map(|m| m.identity.as_str()).collect();
        let mut out = format!(
            "Unified assessment of {} across {} identities ({}), {} commits in total.\n\n",
            input.canonical,
            input.members.len(),
            names.join(", "),
            input.total_commits
        );

        out.push_str("Weighting:\n");
        for member in input.members {
            let _ = writeln!(
                out,
                "- {}: {} commits ({}%)",
                member.identity,
                member.commits,
                input.weight_percent(member.commits)
            );
        }

        let (best, worst) = input.scores.extremes();
        let _ = write!(
            out,
            "\nStrongest dimension: {} ({}/100). Weakest dimension: {} ({}/100).\n",
            best.label(),
            input.scores.get(best),
            worst.label(),
            input.scores.get(worst)
        );

        out.push_str("\nPer-identity highlights:\n");
        for member in input.members {
            let highlight = first_paragraph(&member.result.reasoning);
            let _ = writeln!(out, "\n### {}\n{}", member.identity, highlight);
        }
        out.trim_end().to_string()
    }
}

impl NarrativeSynthesizer for TemplateSynthesizer {
    fn synthesize<'a>(&'a self, input: &'a SynthesisInput<'a>) -> SynthesisFuture<'a> {
        Box::pin(async move { Ok(Self::compose(input)) })
    }
}

fn first_paragraph(text: &str) -> &str {
    let text = text.trim();
    text.split("\n\n").next().unwrap_or(text).trim()
}

// ── LLM ──────────────────────────────────────────────────────────────────────

pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` synthesizer.
pub struct LlmSynthesizer {
    /// Pre-computed `"Bearer <key>"` header value.
    cached_auth_header: Option<String>,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    client: Client,
}

impl LlmSynthesizer {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            cached_auth_header: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| format!("Bearer {k}")),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
            max_tokens,
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn prompt(input: &SynthesisInput<'_>) -> String {
        let mut summaries = String::new();
        for member in input.members {
            let _ = write!(
                summaries,
                "\n### {} ({} commits, {}% weight):\n{}\n",
                member.identity,
                member.commits,
                input.weight_percent(member.commits),
                member.result.reasoning.trim()
            );
        }

        let mut scores = String::new();
        for (dimension, value) in input.scores.iter() {
            let _ = writeln!(scores, "- {}: {value}/100", dimension.label());
        }

        format!(
            "You are analyzing a software engineer who commits under several identities. \
             Each identity was evaluated separately; write one unified analysis.\n\
             \nIndividual analyses, weighted by commit count:\n{summaries}\
             \nTotal commits: {}\nWeighted average scores:\n{scores}\
             \nSynthesize insights across all identities, give more weight to identities \
             with more commits, identify common themes and keep a professional, objective \
             tone. Write 3-5 paragraphs.",
            input.total_commits
        )
    }
}

impl NarrativeSynthesizer for LlmSynthesizer {
    fn synthesize<'a>(&'a self, input: &'a SynthesisInput<'a>) -> SynthesisFuture<'a> {
        Box::pin(async move {
            let auth = self
                .cached_auth_header
                .as_deref()
                .ok_or(SynthesisError::MissingKey)?;

            let request = ChatRequest {
                model: &self.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: Self::prompt(input),
                }],
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            };

            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", auth)
                .json(&request)
                .send()
                .await
                .map_err(|e| SynthesisError::Request(e.without_url().to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SynthesisError::Status {
                    status: status.as_u16(),
                    message: truncate_with_ellipsis(body.trim(), 200),
                });
            }

            let chat: ChatResponse = response
                .json()
                .await
                .map_err(|e| SynthesisError::Request(e.to_string()))?;
            chat.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .ok_or(SynthesisError::EmptyResponse)
        })
    }
}
