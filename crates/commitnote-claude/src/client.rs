// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Anthropic Messages API client
//!
//! [`ClaudeSynthesizer`] sends a single prompt per change window and parses
//! the reply with [`parse_note`]. There is no retry: any failure is returned
//! to the caller as is.

use std::env;
#[cfg(any(test, feature = "test-util"))]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use commitnote_git::ChangeWindow;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SynthError;
use crate::note::{Note, parse_note};
use crate::prompt::build_prompt;

/// Environment variable holding the API key
pub const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
/// Base URL of the Anthropic API
pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
/// Value of the `anthropic-version` header
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Upper bound on generated tokens
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
/// HTTP timeout applied to the whole request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Language the note is written in
pub const DEFAULT_LANGUAGE: &str = "English";

/// Turns a change window into a note
#[async_trait]
pub trait NoteSynthesizer: Send + Sync {
    /// Synthesize a note describing `window`
    async fn synthesize(&self, window: &ChangeWindow) -> Result<Note, SynthError>;
}

/// Settings for [`ClaudeSynthesizer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthConfig {
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// API base URL, without the `/v1/messages` path
    pub api_base: String,
    /// Model identifier
    pub model: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Request timeout
    pub timeout: Duration,
    /// Language of the generated note
    pub language: String,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// [`NoteSynthesizer`] backed by the Anthropic Messages API
#[derive(Debug, Clone)]
pub struct ClaudeSynthesizer {
    client: reqwest::Client,
    config: SynthConfig,
}

impl ClaudeSynthesizer {
    /// Create a synthesizer; the API key is only read when synthesizing
    ///
    /// # Errors
    ///
    /// Returns `SynthError::Request` if the HTTP client cannot be built.
    pub fn new(config: SynthConfig) -> Result<Self, SynthError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.api_base.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<String, SynthError> {
        env::var(&self.config.api_key_env)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| SynthError::MissingApiKey(self.config.api_key_env.clone()))
    }

    async fn request_text(&self, api_key: &str, prompt: &str) -> Result<String, SynthError> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: [RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SynthError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        extract_text(&text)
    }
}

#[async_trait]
impl NoteSynthesizer for ClaudeSynthesizer {
    async fn synthesize(&self, window: &ChangeWindow) -> Result<Note, SynthError> {
        let api_key = self.api_key()?;
        let prompt = build_prompt(window, &self.config.language);

        info!(model = %self.config.model, "Generating note");
        debug!(prompt_chars = prompt.chars().count(), url = %self.messages_url(), "sending prompt");

        let text = self.request_text(&api_key, &prompt).await?;
        parse_note(&text)
    }
}

/// Pull the first text block out of a Messages API response body
fn extract_text(body: &str) -> Result<String, SynthError> {
    let response: MessagesResponse = serde_json::from_str(body)
        .map_err(|err| SynthError::InvalidResponse(err.to_string()))?;

    response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .find_map(|block| block.text)
        .ok_or_else(|| SynthError::InvalidResponse("response has no text content".to_string()))
}

/// [`NoteSynthesizer`] that parses a fixed reply without any network access
///
/// Counts how often it was asked to synthesize.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct StaticSynthesizer {
    reply: String,
    calls: AtomicUsize,
}

#[cfg(any(test, feature = "test-util"))]
impl StaticSynthesizer {
    /// Create a synthesizer that always answers with `reply`
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of synthesize calls so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl NoteSynthesizer for StaticSynthesizer {
    async fn synthesize(&self, _window: &ChangeWindow) -> Result<Note, SynthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        parse_note(&self.reply)
    }
}
