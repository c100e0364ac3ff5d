//! Provider kinds and their static defaults

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini (hosted). Used when nothing else is configured.
    #[default]
    Gemini,
    /// OpenAI (hosted)
    OpenAi,
    /// Anthropic (hosted)
    Anthropic,
    /// Ollama's native local-inference protocol
    Ollama,
    /// vLLM or any other OpenAI-compatible local server
    Vllm,
    /// Unspecified local endpoint speaking chat completions
    Local,
}

/// Per-provider defaults, before environment lookups
#[derive(Debug, Clone, Copy)]
pub struct ProviderDefaults {
    pub model: &'static str,
    pub endpoint: &'static str,
    /// Variable that overrides `endpoint` (local providers)
    pub endpoint_env: Option<&'static str>,
    /// Credential variables, checked in order (hosted providers)
    pub credential_env: &'static [&'static str],
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Gemini,
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Ollama,
        ProviderKind::Vllm,
        ProviderKind::Local,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Vllm => "vllm",
            ProviderKind::Local => "local",
        }
    }

    /// Reachable only with an API credential
    pub fn is_hosted(&self) -> bool {
        matches!(
            self,
            ProviderKind::Gemini | ProviderKind::OpenAi | ProviderKind::Anthropic
        )
    }

    /// Self-hosted, identified by endpoint only
    pub fn is_local(&self) -> bool {
        !self.is_hosted()
    }

    pub fn defaults(&self) -> ProviderDefaults {
        match self {
            ProviderKind::Gemini => ProviderDefaults {
                model: "gemini-2.0-flash",
                endpoint: "https://generativelanguage.googleapis.com/v1beta",
                endpoint_env: None,
                credential_env: &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
            },
            ProviderKind::OpenAi => ProviderDefaults {
                model: "gpt-4o",
                endpoint: "https://api.openai.com/v1",
                endpoint_env: None,
                credential_env: &["OPENAI_API_KEY"],
            },
            ProviderKind::Anthropic => ProviderDefaults {
                model: "claude-3-5-sonnet-20241022",
                endpoint: "https://api.anthropic.com",
                endpoint_env: None,
                credential_env: &["ANTHROPIC_API_KEY"],
            },
            ProviderKind::Ollama => ProviderDefaults {
                model: "llama3.1:8b",
                endpoint: "http://localhost:11434",
                endpoint_env: Some("OLLAMA_BASE_URL"),
                credential_env: &[],
            },
            ProviderKind::Vllm => ProviderDefaults {
                model: "meta-llama/Llama-3.1-8B-Instruct",
                endpoint: "http://localhost:8000",
                endpoint_env: Some("VLLM_BASE_URL"),
                credential_env: &[],
            },
            ProviderKind::Local => ProviderDefaults {
                model: "local-model",
                endpoint: "http://localhost:8080",
                endpoint_env: None,
                credential_env: &[],
            },
        }
    }

    /// Namespace prefix the agent framework expects in front of the model name
    pub(crate) fn model_namespace(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => None,
            ProviderKind::OpenAi => Some("openai"),
            ProviderKind::Anthropic => Some("anthropic"),
            ProviderKind::Ollama => Some("ollama"),
            ProviderKind::Vllm => Some("vllm"),
            ProviderKind::Local => Some("custom"),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowercase = s.trim().to_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowercase)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}
