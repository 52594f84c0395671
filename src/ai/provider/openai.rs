//! OpenAI-compatible Chat Completions Client
//!
//! Sends the system/user prompt pair with the declared record schema and a
//! bounded retry policy: a fixed per-request timeout plus a small number of
//! fixed-backoff attempts for transient failures (timeouts, 429, 5xx).

use std::time::Duration;

use async_trait::async_trait;
use backon::{ConstantBuilder, Retryable};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{ChatEnvelope, ChatRequest, LlmClient, OutputMode, ProviderConfig};
use crate::types::{LicitaError, Result};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4-turbo";

/// Name of the forced tool call in [`OutputMode::ToolCall`].
const TOOL_NAME: &str = "registrar_documento";

pub struct OpenAiClient {
    /// API key stored securely; never exposed in logs or debug output.
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    max_attempts: usize,
    retry_delay: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                LicitaError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY or llm.api_key".to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = api_base.trim_end_matches('/').to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LicitaError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            client,
        })
    }

    fn build_body(&self, request: &ChatRequest) -> ChatCompletionBody {
        let mut system = request.system.clone();
        let mut response_format = None;
        let mut tools = None;
        let mut tool_choice = None;

        match request.mode {
            OutputMode::Content => {
                response_format = Some(ResponseFormat {
                    format_type: "json_object".to_string(),
                });
                // The schema rides along in the system message; json_object
                // alone does not constrain the field set.
                if let Some(schema) = &request.schema {
                    let rendered = serde_json::to_string_pretty(schema)
                        .unwrap_or_else(|_| schema.to_string());
                    system.push_str(
                        "\n\nO JSON retornado deve obedecer a este schema:\n```json\n",
                    );
                    system.push_str(&rendered);
                    system.push_str("\n```");
                }
            }
            OutputMode::ToolCall => {
                let parameters = request
                    .schema
                    .clone()
                    .unwrap_or_else(|| serde_json::json!({ "type": "object" }));
                tools = Some(vec![ToolSpec {
                    tool_type: "function".to_string(),
                    function: FunctionSpec {
                        name: TOOL_NAME.to_string(),
                        description:
                            "Registra os dados estruturados do documento de licitação gerado."
                                .to_string(),
                        parameters,
                    },
                }]);
                tool_choice = Some(ToolChoice {
                    tool_type: "function".to_string(),
                    function: ToolChoiceFunction {
                        name: TOOL_NAME.to_string(),
                    },
                });
            }
        }

        ChatCompletionBody {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            response_format,
            tools,
            tool_choice,
        }
    }

    async fn send_once(&self, body: &ChatCompletionBody) -> Result<ChatEnvelope> {
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                LicitaError::generation_transient(format!("requisição ao provedor falhou: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            let transient = status.as_u16() == 429 || status.is_server_error();
            return Err(LicitaError::Generation {
                message: format!("provedor retornou {status}: {preview}"),
                transient,
            });
        }

        let envelope: ChatEnvelope = response.json().await.map_err(|e| {
            LicitaError::generation(format!("resposta inesperada do provedor: {e}"))
        })?;

        if envelope.choices.is_empty() {
            return Err(LicitaError::generation("envelope sem choices"));
        }

        if let Some(usage) = envelope.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }

        Ok(envelope)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatEnvelope> {
        info!(
            model = %self.model,
            mode = ?request.mode,
            "sending chat completion"
        );

        let body = self.build_body(request);
        let backoff = ConstantBuilder::default()
            .with_delay(self.retry_delay)
            .with_max_times(self.max_attempts - 1);

        (|| async { self.send_once(&body).await })
            .retry(backoff)
            .when(|err: &LicitaError| err.is_transient())
            .notify(|err: &LicitaError, after: Duration| {
                warn!(error = %err, retry_in = ?after, "transient provider failure, retrying");
            })
            .await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request wire types

#[derive(Debug, Serialize)]
struct ChatCompletionBody {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize)]
struct ToolSpec {
    #[serde(rename = "type")]
    tool_type: String,
    function: FunctionSpec,
}

#[derive(Debug, Serialize)]
struct FunctionSpec {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    tool_type: String,
    function: ToolChoiceFunction,
}

#[derive(Debug, Serialize)]
struct ToolChoiceFunction {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::types::DocumentType;

    fn client(mode: OutputMode) -> OpenAiClient {
        OpenAiClient::new(&ProviderConfig {
            api_key: Some("sk-test".to_string()),
            mode,
            ..ProviderConfig::default()
        })
        .unwrap()
    }

    fn request(mode: OutputMode) -> ChatRequest {
        ChatRequest {
            system: "Gere APENAS JSON válido.".to_string(),
            user: "Gere os dados.".to_string(),
            schema: Some(catalog::schema(DocumentType::Institutional)),
            mode,
        }
    }

    #[test]
    fn content_mode_requests_json_object_and_embeds_the_schema() {
        let client = client(OutputMode::Content);
        let body = client.build_body(&request(OutputMode::Content));
        let rendered = serde_json::to_value(&body).unwrap();

        assert_eq!(rendered["response_format"]["type"], "json_object");
        assert!(rendered.get("tools").is_none());
        let system = rendered["messages"][0]["content"].as_str().unwrap();
        assert!(system.contains("```json"));
        assert!(system.contains("\"cidade\""));
    }

    #[test]
    fn tool_call_mode_forces_the_single_tool() {
        let client = client(OutputMode::ToolCall);
        let body = client.build_body(&request(OutputMode::ToolCall));
        let rendered = serde_json::to_value(&body).unwrap();

        assert!(rendered.get("response_format").is_none());
        assert_eq!(rendered["tools"][0]["function"]["name"], TOOL_NAME);
        assert_eq!(rendered["tool_choice"]["function"]["name"], TOOL_NAME);
        assert_eq!(
            rendered["tools"][0]["function"]["parameters"]["type"],
            "object"
        );
    }

    #[test]
    fn explicit_key_and_model_are_honored() {
        let client = OpenAiClient::new(&ProviderConfig {
            api_key: Some("sk-test".to_string()),
            model: Some("gpt-4o-mini".to_string()),
            ..ProviderConfig::default()
        })
        .unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");
        assert_eq!(client.name(), "openai");
        assert!(!format!("{client:?}").contains("sk-test"));
    }
}
