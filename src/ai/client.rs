use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GenerationError;

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const WEB_SEARCH_TOOL: &str = "web_search_20250305";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: Value,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Value::String(text.into()),
        }
    }

    pub fn assistant(content: Value) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorRequest {
    pub system: String,
    pub messages: Vec<Turn>,
    pub max_tokens: u32,
    pub search_budget: Option<u32>,
}

impl GeneratorRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            messages: vec![Turn::user(user)],
            max_tokens,
            search_budget: None,
        }
    }

    pub fn with_search(mut self, budget: u32) -> Self {
        self.search_budget = Some(budget);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorReply {
    Complete { text: String },
    Paused { text: String, content: Value },
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GeneratorRequest) -> Result<GeneratorReply, GenerationError>;
}

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Turn],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolSpec>>,
}

#[derive(Debug, Serialize)]
struct ToolSpec {
    #[serde(rename = "type")]
    tool_type: &'static str,
    name: &'static str,
    max_uses: u32,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<Value>,
    stop_reason: Option<String>,
}

pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
}

impl ClaudeClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    pub fn model_version(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for ClaudeClient {
    async fn generate(&self, request: &GeneratorRequest) -> Result<GeneratorReply, GenerationError> {
        let tools = request.search_budget.map(|max_uses| {
            vec![ToolSpec {
                tool_type: WEB_SEARCH_TOOL,
                name: "web_search",
                max_uses,
            }]
        });

        let body = MessageRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: &request.messages,
            tools,
        };

        let response = self
            .client
            .post(CLAUDE_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if is_rate_limit(status) {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(GenerationError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(GenerationError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let message: MessageResponse = response.json().await?;
        let text = collect_text(&message.content);

        match message.stop_reason.as_deref() {
            Some("pause_turn") => Ok(GeneratorReply::Paused {
                text,
                content: Value::Array(message.content),
            }),
            Some("refusal") => Err(GenerationError::Api("generator refused the request".to_string())),
            _ => Ok(GeneratorReply::Complete { text }),
        }
    }
}

fn is_rate_limit(status: StatusCode) -> bool {
    // 529 is the API's "overloaded" signal and clears up the same way.
    status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 529
}

fn parse_retry_after(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

fn collect_text(blocks: &[Value]) -> String {
    blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("")
}
