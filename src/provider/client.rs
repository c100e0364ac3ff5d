//! Unified inference client
//!
//! One `generate`/`health_check` contract over three wire protocols:
//! Ollama's native `/api/generate`, OpenAI-compatible chat completions
//! (vLLM), and a generic chat-completions endpoint used for every other
//! provider. The adapter is picked once when the client is built.

use super::{ProviderError, ProviderKind, ResolvedConfig};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;

/// Timeouts applied by [`InferenceClient`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Upper bound for a whole `generate` call
    #[serde(rename = "request_timeout_secs", with = "duration_secs")]
    pub request_timeout: Duration,
    /// Upper bound for a `health_check` call
    #[serde(rename = "health_timeout_secs", with = "duration_secs")]
    pub health_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            health_timeout: Duration::from_secs(DEFAULT_HEALTH_TIMEOUT_SECS),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Wire protocol spoken by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolAdapter {
    /// Ollama native API
    OllamaNative,
    /// OpenAI-compatible local server (vLLM)
    OpenAiCompatible,
    /// Any other chat-completions endpoint
    Generic,
}

impl ProtocolAdapter {
    pub fn for_provider(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::Ollama => ProtocolAdapter::OllamaNative,
            ProviderKind::Vllm => ProtocolAdapter::OpenAiCompatible,
            ProviderKind::Local
            | ProviderKind::Gemini
            | ProviderKind::OpenAi
            | ProviderKind::Anthropic => ProtocolAdapter::Generic,
        }
    }

    /// Backend name used in logs and errors
    pub fn label(&self) -> &'static str {
        match self {
            ProtocolAdapter::OllamaNative => "Ollama",
            ProtocolAdapter::OpenAiCompatible => "vLLM",
            ProtocolAdapter::Generic => "Generic",
        }
    }

    fn generate_path(&self) -> &'static str {
        match self {
            ProtocolAdapter::OllamaNative => "/api/generate",
            ProtocolAdapter::OpenAiCompatible | ProtocolAdapter::Generic => "/v1/chat/completions",
        }
    }

    fn health_path(&self) -> &'static str {
        match self {
            ProtocolAdapter::OllamaNative => "/api/tags",
            ProtocolAdapter::OpenAiCompatible | ProtocolAdapter::Generic => "/v1/models",
        }
    }

    fn request_body(
        &self,
        model: &str,
        temperature: f32,
        max_tokens: u32,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Value {
        match self {
            ProtocolAdapter::OllamaNative => {
                let mut body = json!({
                    "model": model,
                    "prompt": prompt,
                    "stream": false,
                    "options": {
                        "temperature": temperature,
                        "num_predict": max_tokens
                    }
                });
                if let Some(system) = system_prompt {
                    body["system"] = json!(system);
                }
                body
            }
            ProtocolAdapter::OpenAiCompatible | ProtocolAdapter::Generic => {
                let mut messages = Vec::with_capacity(2);
                if let Some(system) = system_prompt {
                    messages.push(json!({"role": "system", "content": system}));
                }
                messages.push(json!({"role": "user", "content": prompt}));

                json!({
                    "model": model,
                    "messages": messages,
                    "temperature": temperature,
                    "max_tokens": max_tokens
                })
            }
        }
    }

    fn extract_text(&self, body: &Value) -> Result<String, ProviderError> {
        let (pointer, field) = match self {
            ProtocolAdapter::OllamaNative => ("/response", "response"),
            ProtocolAdapter::OpenAiCompatible | ProtocolAdapter::Generic => {
                ("/choices/0/message/content", "choices[0].message.content")
            }
        };

        body.pointer(pointer)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Protocol {
                backend: self.label(),
                detail: format!("missing string field `{}`", field),
            })
    }
}

/// Client for one resolved provider configuration
#[derive(Debug, Clone)]
pub struct InferenceClient {
    config: ResolvedConfig,
    adapter: ProtocolAdapter,
    base_url: String,
    model: String,
    credential: Option<String>,
    temperature: f32,
    max_tokens: u32,
    options: ClientOptions,
    http_client: reqwest::Client,
}

impl InferenceClient {
    /// Create a client with default timeouts
    pub fn new(config: &ResolvedConfig) -> Result<Self, ProviderError> {
        Self::with_options(config, ClientOptions::default())
    }

    pub fn with_options(
        config: &ResolvedConfig,
        options: ClientOptions,
    ) -> Result<Self, ProviderError> {
        // No idle connections: every call opens and releases its own session
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(ProviderError::ClientBuild)?;

        Ok(Self {
            config: config.clone(),
            adapter: ProtocolAdapter::for_provider(config.provider()),
            base_url: config.endpoint().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
            credential: config.credential().map(str::to_string),
            temperature: config.temperature(),
            max_tokens: config.max_output_tokens(),
            options,
            http_client,
        })
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn adapter(&self) -> ProtocolAdapter {
        self.adapter
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Short description, e.g. `Ollama (llama3.1:8b @ http://localhost:11434)`
    pub fn describe(&self) -> String {
        format!("{} ({} @ {})", self.adapter.label(), self.model, self.base_url)
    }

    /// Generate a single non-streamed completion
    pub async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, ProviderError> {
        let backend = self.adapter.label();
        let url = format!("{}{}", self.base_url, self.adapter.generate_path());
        let body = self.adapter.request_body(
            &self.model,
            self.temperature,
            self.max_tokens,
            prompt,
            system_prompt,
        );

        let start = std::time::Instant::now();
        tracing::info!(
            target: "llm",
            backend = backend,
            model = %self.model,
            url = %url,
            has_system_prompt = system_prompt.is_some(),
            "Starting LLM generation"
        );

        let mut request = self
            .http_client
            .post(&url)
            .timeout(self.options.request_timeout)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(credential) = &self.credential {
            request = request.bearer_auth(credential);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(target: "llm", backend = backend, error = %e, "LLM generation failed");
            ProviderError::Transport {
                backend,
                url: url.clone(),
                source: e,
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ProviderError::Transport {
            backend,
            url: url.clone(),
            source: e,
        })?;
        let elapsed = start.elapsed();

        if !status.is_success() {
            tracing::error!(
                target: "llm",
                backend = backend,
                status = %status,
                error = %text,
                elapsed_ms = elapsed.as_millis() as u64,
                "LLM generation returned error"
            );
            return Err(ProviderError::Upstream {
                backend,
                status: status.as_u16(),
                body: text,
            });
        }

        let response_body: Value =
            serde_json::from_str(&text).map_err(|e| ProviderError::Protocol {
                backend,
                detail: format!("body is not JSON: {}", e),
            })?;
        let content = self.adapter.extract_text(&response_body)?;

        tracing::info!(
            target: "llm",
            backend = backend,
            model = %self.model,
            elapsed_ms = elapsed.as_millis() as u64,
            output_chars = content.chars().count(),
            "LLM generation completed"
        );

        Ok(content)
    }

    /// Liveness probe; any failure is reported as `false`
    pub async fn health_check(&self) -> bool {
        let url = format!("{}{}", self.base_url, self.adapter.health_path());

        let mut request = self
            .http_client
            .get(&url)
            .timeout(self.options.health_timeout);
        if let Some(credential) = &self.credential {
            request = request.bearer_auth(credential);
        }

        match request.send().await {
            Ok(response) => {
                let healthy = response.status().is_success();
                tracing::debug!(
                    target: "llm",
                    backend = self.adapter.label(),
                    status = %response.status(),
                    healthy,
                    "Health check finished"
                );
                healthy
            }
            Err(e) => {
                tracing::debug!(
                    target: "llm",
                    backend = self.adapter.label(),
                    timeout = e.is_timeout(),
                    error = %e,
                    "Health check failed"
                );
                false
            }
        }
    }
}
