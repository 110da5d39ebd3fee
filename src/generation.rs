//! Text-generation collaborator used to phrase final answers.
//!
//! Only the interface matters to the engine: given a system prompt and a
//! user prompt, return prose or an error. [`OpenAiChat`] talks to any
//! OpenAI-compatible `/v1/chat/completions` endpoint, retrying transient
//! failures the same way the embedding providers do.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::GenerationConfig;
use crate::embedding::send_with_retry;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Chat-completion client for the OpenAI API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiChat {
    model: String,
    url: String,
    api_key: String,
    temperature: f32,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiChat {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model: config.model.clone(),
            url: url.trim_end_matches('/').to_string(),
            api_key,
            temperature: config.temperature,
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiChat {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
        });
        debug!(
            model = %self.model,
            prompt_len = user_prompt.len(),
            "POST {}/v1/chat/completions",
            self.url
        );

        let request = self
            .client
            .post(format!("{}/v1/chat/completions", self.url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body);

        let json = send_with_retry(request, self.max_retries, "OpenAI").await?;
        parse_chat_response(&json)
    }
}

fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .ok_or_else(|| {
            anyhow::anyhow!("Invalid chat response: expected choices[0].message.content")
        })?;
    if content.trim().is_empty() {
        bail!("Chat response was empty");
    }
    Ok(content.trim().to_string())
}

/// Create the configured generator, or `None` when generation is disabled.
pub fn create_generator(config: &GenerationConfig) -> Result<Option<Box<dyn TextGenerator>>> {
    match config.provider.as_str() {
        "disabled" => Ok(None),
        "openai" => Ok(Some(Box::new(OpenAiChat::new(config)?))),
        other => bail!("Unknown generation provider: {}", other),
    }
}
