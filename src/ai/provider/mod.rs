//! LLM Client Adapter
//!
//! Defines the [`LlmClient`] trait and the chat-completions wire types shared
//! with the response extractor. Two response modes are supported, since
//! providers evolve: free-text content expected to be JSON, and a forced
//! single tool call whose arguments are JSON.
//!
//! Every transport, timeout and envelope failure surfaces as one
//! `Generation` error; no partial envelope is ever treated as valid.

mod openai;

pub use openai::OpenAiClient;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::network;
use crate::types::{LicitaError, Result};

// =============================================================================
// Client Configuration
// =============================================================================

/// How the model is asked to return the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Assistant message content carrying a JSON object.
    #[default]
    Content,
    /// Forced tool call; the record arrives as the call's arguments.
    ToolCall,
}

/// Configuration for LLM clients.
///
/// API keys are never serialized back out and are redacted in debug output;
/// the client converts the key to `SecretString` internally.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider type. Only "openai" (chat-completions compatible) is built in.
    pub provider: String,
    /// Model name; provider default applies when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// API key; falls back to the provider's environment variable.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL for custom endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Total attempts per call (1 initial + retries), fixed backoff.
    pub max_attempts: usize,
    /// Fixed delay between attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// Response mode requested from the provider.
    pub mode: OutputMode,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            api_key: None,
            api_base: None,
            temperature: 0.7,
            max_tokens: 4096,
            timeout_secs: network::REQUEST_TIMEOUT_SECS,
            max_attempts: network::MAX_ATTEMPTS,
            retry_delay_ms: network::RETRY_DELAY_MS,
            mode: OutputMode::default(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("mode", &self.mode)
            .finish()
    }
}

// =============================================================================
// Chat Request / Response Envelope
// =============================================================================

/// One completion request: prompts plus the declared record schema.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    /// JSON-Schema declaration of the expected record.
    pub schema: Option<Value>,
    pub mode: OutputMode,
}

/// Provider response envelope, kept lenient: every level defaults so the
/// extractor can inspect whatever arrived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatEnvelope {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<UsageInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: AssistantMessage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallPayload>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallPayload {
    #[serde(default)]
    pub function: FunctionCallPayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionCallPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageInfo {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

// =============================================================================
// Client Trait
// =============================================================================

/// Shared client handle for the orchestrator.
pub type SharedClient = Arc<dyn LlmClient>;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one chat completion and return the raw envelope. Transport,
    /// status and envelope-shape failures are `Generation` errors.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatEnvelope>;

    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Model currently in use.
    fn model(&self) -> &str;
}

/// Create a shared client from configuration.
pub fn create_client(config: &ProviderConfig) -> Result<SharedClient> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiClient::new(config)?)),
        other => Err(LicitaError::Config(format!(
            "unknown provider: {other}. Supported: openai"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_transport_policy() {
        let config = ProviderConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_delay_ms, 1000);
        assert_eq!(config.mode, OutputMode::Content);
    }

    #[test]
    fn debug_redacts_the_api_key() {
        let config = ProviderConfig {
            api_key: Some("sk-secreta".to_string()),
            ..ProviderConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("sk-secreta"));
    }

    #[test]
    fn envelope_deserializes_content_mode() {
        let envelope: ChatEnvelope = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"{\"cidade\":\"Curitiba\"}"}}],
                "usage":{"prompt_tokens":120,"completion_tokens":80}}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.choices[0].message.content.as_deref(),
            Some("{\"cidade\":\"Curitiba\"}")
        );
        assert_eq!(envelope.usage.unwrap().completion_tokens, 80);
    }

    #[test]
    fn envelope_deserializes_tool_call_mode() {
        let envelope: ChatEnvelope = serde_json::from_str(
            r#"{"choices":[{"message":{"tool_calls":[
                {"id":"call_1","type":"function",
                 "function":{"name":"registrar_documento","arguments":"{\"cep\":\"80000\"}"}}
            ]}}]}"#,
        )
        .unwrap();
        let calls = envelope.choices[0].message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.arguments, "{\"cep\":\"80000\"}");
    }

    #[test]
    fn unexpected_envelope_shape_still_parses() {
        let envelope: ChatEnvelope = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(envelope.choices.is_empty());
    }

    #[test]
    fn unknown_provider_is_a_config_error() {
        let config = ProviderConfig {
            provider: "cohere".to_string(),
            ..ProviderConfig::default()
        };
        assert!(matches!(
            create_client(&config),
            Err(LicitaError::Config(_))
        ));
    }
}
