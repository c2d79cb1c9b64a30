use std::future::Future;

use anyhow::{bail, Context, Result};
use log::debug;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::GeneratorConfig;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_owned(),
            content: content.to_owned(),
        }
    }

    pub fn user(content: String) -> Self {
        Self {
            role: "user".to_owned(),
            content,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// One chat completion round trip. Implementations return the reply text of
/// the first choice.
pub trait CompletionClient {
    fn complete(&self, request: &CompletionRequest) -> impl Future<Output = Result<String>>;
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    #[serde(flatten)]
    request: &'a CompletionRequest,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for an OpenAI compatible `/chat/completions` endpoint, Groq by
/// default.
#[derive(Clone, Debug)]
pub struct GroqClient {
    http: reqwest::Client,
    api_url: Url,
    api_key: SecretString,
    model: String,
}

impl GroqClient {
    /// Builds a client when the config carries a usable credential.
    pub fn from_config(config: &GeneratorConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.credential() else {
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Some(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: api_key.clone(),
            model: config.model.clone(),
        }))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl CompletionClient for GroqClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        debug!("Sending completion request to {} ({})", self.api_url, self.model);

        let response = self
            .http
            .post(self.api_url.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&ChatCompletionBody {
                model: &self.model,
                request,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            bail!("completion request failed: {status}");
        }

        let body: ChatCompletionResponse = response.json().await?;
        let Some(choice) = body.choices.into_iter().next() else {
            bail!("completion response has no choices");
        };

        Ok(choice.message.content.trim().to_owned())
    }
}

/// Strips a surrounding Markdown code fence, which chat models sometimes put
/// around JSON despite being told not to.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening line, or right before the
    // body when the whole fence sits on one line.
    match rest.split_once('\n') {
        Some((_, body)) => body.trim(),
        None => rest
            .trim_start()
            .strip_prefix("json")
            .unwrap_or(rest)
            .trim(),
    }
}
