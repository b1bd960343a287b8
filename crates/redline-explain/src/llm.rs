//! LLM providers
//!
//! Two HTTP backends sit behind [`LlmClient`]: OpenAI-compatible chat
//! completions (OpenAI, Azure, local gateways) and an Ollama server. Both
//! send the same contract-review system instruction so that prompts only
//! carry the clause material.
//!
//! Author: hephaex@gmail.com

use std::time::Duration;

use async_trait::async_trait;
use redline_core::{LlmClient, LlmConfig, LlmProvider, RedlineError, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Instruction sent ahead of every prompt
pub const REVIEWER_INSTRUCTION: &str = "You review commercial contracts for a negotiating party. \
Answer in plain business English, stay within the clause text you are given, \
and never invent facts or cite law that is not in the prompt.";

/// Build the shared HTTP client; the transport timeout sits slightly above the
/// per-call deadline so the explainer's own timeout fires first.
fn http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.saturating_add(5)))
        .build()
        .unwrap_or_default()
}

/// Turn a provider reply into its decoded body or an `LlmError`
async fn decode<T: DeserializeOwned>(provider: &str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(200).collect();
        return Err(RedlineError::LlmError(format!(
            "{provider} returned {status}: {body}"
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| RedlineError::LlmError(format!("{provider} sent an unreadable body: {e}")))
}

// ============================================================================
// OpenAI-compatible chat completions
// ============================================================================

/// Chat-completions backend
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let defaults = LlmConfig::default();
        Self {
            http: http_client(defaults.timeout_secs),
            api_key: api_key.into(),
            endpoint: OPENAI_BASE_URL.to_string(),
            model: model.into(),
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
        }
    }

    /// Requires `openai_api_key`; `openai_base_url` switches to Azure or a gateway
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.openai_api_key.clone().ok_or_else(|| {
            RedlineError::ConfigError(format!(
                "{:?} provider needs an API key (OPENAI_API_KEY)",
                config.provider
            ))
        })?;

        Ok(Self {
            http: http_client(config.timeout_secs),
            api_key,
            endpoint: config
                .openai_base_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into().trim_end_matches('/').to_string();
        self
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: REVIEWER_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&self.request(prompt))
            .send()
            .await
            .map_err(|e| RedlineError::LlmError(format!("openai unreachable: {e}")))?;

        let reply: ChatResponse = decode("openai", response).await?;
        reply
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| RedlineError::LlmError("openai returned no completion".to_string()))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// Ollama
// ============================================================================

/// Ollama `/api/generate` backend
pub struct OllamaClient {
    http: Client,
    endpoint: String,
    model: String,
    options: OllamaOptions,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'static str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let defaults = LlmConfig::default();
        Self {
            http: http_client(defaults.timeout_secs),
            endpoint: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            options: OllamaOptions {
                temperature: defaults.temperature,
                num_predict: defaults.max_tokens,
            },
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            http: http_client(config.timeout_secs),
            endpoint: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            options: OllamaOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            system: REVIEWER_INSTRUCTION,
            prompt,
            stream: false,
            options: self.options,
        };

        let response = self
            .http
            .post(format!("{}/api/generate", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| RedlineError::LlmError(format!("ollama unreachable: {e}")))?;

        let reply: GenerateResponse = decode("ollama", response).await?;
        if reply.response.trim().is_empty() {
            return Err(RedlineError::LlmError("ollama returned no completion".to_string()));
        }
        Ok(reply.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Provider selected by `llm.provider`
pub fn create_llm_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    let client: Box<dyn LlmClient> = match config.provider {
        LlmProvider::OpenAI | LlmProvider::Azure => Box::new(OpenAiClient::from_config(config)?),
        LlmProvider::Ollama => Box::new(OllamaClient::from_config(config)),
    };
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_carries_reviewer_instruction() {
        let client = OpenAiClient::new("key", "gpt-4o-mini").with_base_url("http://gateway/v1/");
        assert_eq!(client.endpoint, "http://gateway/v1");

        let json = serde_json::to_value(client.request("Explain clause 4")).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], REVIEWER_INSTRUCTION);
        assert_eq!(json["messages"][1]["content"], "Explain clause 4");
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn test_ollama_options_follow_config() {
        let config = LlmConfig {
            provider: LlmProvider::Ollama,
            ollama_url: "http://ollama:11434/".to_string(),
            model: "llama3".to_string(),
            max_tokens: 256,
            ..LlmConfig::default()
        };
        let client = OllamaClient::from_config(&config);
        assert_eq!(client.endpoint, "http://ollama:11434");
        assert_eq!(client.options.num_predict, 256);

        let request = GenerateRequest {
            model: &client.model,
            system: REVIEWER_INSTRUCTION,
            prompt: "hi",
            stream: false,
            options: client.options,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 256);
    }

    #[test]
    fn test_factory_requires_key_for_hosted_providers() {
        for provider in [LlmProvider::OpenAI, LlmProvider::Azure] {
            let config = LlmConfig {
                provider,
                ..LlmConfig::default()
            };
            assert!(matches!(
                create_llm_client(&config),
                Err(RedlineError::ConfigError(_))
            ));
        }

        let config = LlmConfig {
            provider: LlmProvider::Ollama,
            ..LlmConfig::default()
        };
        assert_eq!(create_llm_client(&config).unwrap().name(), "ollama");
    }

    #[test]
    fn test_empty_completion_is_not_an_answer() {
        let reply: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(reply.choices.into_iter().find_map(|c| c.message.content).is_none());
    }
}
