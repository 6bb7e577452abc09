//! Ordering suggestions from an OpenAI-compatible chat-completions endpoint.

use std::time::Duration;

use dbrefactor_core::SuggestionResponse;
use dbrefactor_core::suggest::SYSTEM_PROMPT;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::{ClientError, ClientResult};

pub const API_KEY_ENV: &str = "DBREFACTOR_LLM_API_KEY";

pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Connection {
                url: base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url,
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            timeout,
        })
    }

    /// Sends `prompt` and parses the model's answer.
    pub async fn suggest_order(&self, prompt: &str) -> ClientResult<SuggestionResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        info!(model = %self.model, "requesting order suggestion");
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let mut req = self.http.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| self.transport_error(&url, e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(&url, e))?;
        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .or_else(|| v.get("error"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ClientError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClientError::InvalidResponse("model returned no content".to_string()))?;
        debug!(len = content.len(), "model answered");

        serde_json::from_str(strip_fences(&content))
            .map_err(|e| ClientError::InvalidResponse(format!("model answer is not valid JSON: {e}")))
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            ClientError::Connection {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

/// Models like to wrap JSON in ```json fences even when asked not to.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
