//! Provider configuration resolution
//!
//! Picks a provider (explicitly or from environment signals), fills in the
//! per-provider defaults and applies caller overrides on top. Resolution
//! never fails; an incomplete result is reported by [`ResolvedConfig::validate`].

use super::env::{Environment, ProcessEnv};
use super::kind::{ProviderKind, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use super::ProviderError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Option name to value, applied over provider defaults
pub type Overrides = BTreeMap<String, Value>;

const MIN_TEMPERATURE: f32 = 0.0;
const MAX_TEMPERATURE: f32 = 2.0;

/// Alternate override names and the canonical key that wins when both are given
const OVERRIDE_ALIASES: [(&str, &str); 3] = [
    ("endpoint", "base_url"),
    ("credential", "api_key"),
    ("max_output_tokens", "max_tokens"),
];

/// Environment signals checked during auto-detection, highest priority first
const DETECTION_ORDER: [(&str, ProviderKind); 6] = [
    ("OLLAMA_BASE_URL", ProviderKind::Ollama),
    ("VLLM_BASE_URL", ProviderKind::Vllm),
    ("OPENAI_API_KEY", ProviderKind::OpenAi),
    ("ANTHROPIC_API_KEY", ProviderKind::Anthropic),
    ("GOOGLE_API_KEY", ProviderKind::Gemini),
    ("GEMINI_API_KEY", ProviderKind::Gemini),
];

/// How the provider of a [`ResolvedConfig`] was chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderOrigin {
    /// Passed in by the caller
    Explicit,
    /// Found through an environment variable
    Detected { signal: &'static str },
    /// No signal present
    Default,
    /// Requested provider name was not recognized
    Fallback { requested: String },
}

/// Fully-defaulted, immutable provider settings
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    provider: ProviderKind,
    model: String,
    endpoint: String,
    credential: Option<String>,
    temperature: f32,
    max_output_tokens: u32,
    extra: BTreeMap<String, Value>,
    origin: ProviderOrigin,
}

/// Model identifier and request defaults handed to the agent framework
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestDefaults {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub temperature: f32,
}

/// Human-facing view of a configuration with the credential masked
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub provider: ProviderKind,
    pub model: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// `None` for local providers, `Some(None)` when a hosted key is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<Option<String>>,
    pub origin: ProviderOrigin,
}

/// Resolves configurations against an [`Environment`]
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver<E = ProcessEnv> {
    env: E,
}

impl ConfigResolver<ProcessEnv> {
    pub fn from_process() -> Self {
        Self { env: ProcessEnv }
    }
}

impl<E: Environment> ConfigResolver<E> {
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// Auto-detect the provider from environment signals
    pub fn detect(&self) -> (ProviderKind, ProviderOrigin) {
        DETECTION_ORDER
            .iter()
            .find(|&&(signal, _)| self.env.var(signal).is_some())
            .map(|&(signal, kind)| (kind, ProviderOrigin::Detected { signal }))
            .unwrap_or((ProviderKind::default(), ProviderOrigin::Default))
    }

    /// Resolve a configuration, auto-detecting when `explicit` is `None`
    pub fn resolve(&self, explicit: Option<ProviderKind>, overrides: Overrides) -> ResolvedConfig {
        let (provider, origin) = match explicit {
            Some(kind) => (kind, ProviderOrigin::Explicit),
            None => self.detect(),
        };
        self.build(provider, origin, overrides)
    }

    /// Resolve from a provider name; unknown names fall back to the default provider
    pub fn resolve_named(&self, name: &str, overrides: Overrides) -> ResolvedConfig {
        match name.parse::<ProviderKind>() {
            Ok(kind) => self.build(kind, ProviderOrigin::Explicit, overrides),
            Err(e) => {
                tracing::warn!(
                    requested = name,
                    fallback = %ProviderKind::default(),
                    "{}, using default provider",
                    e
                );
                let origin = ProviderOrigin::Fallback {
                    requested: name.to_string(),
                };
                self.build(ProviderKind::default(), origin, overrides)
            }
        }
    }

    fn build(
        &self,
        provider: ProviderKind,
        origin: ProviderOrigin,
        mut overrides: Overrides,
    ) -> ResolvedConfig {
        let defaults = provider.defaults();
        // A set-but-empty endpoint variable leaves the endpoint empty (and invalid)
        let endpoint = defaults
            .endpoint_env
            .and_then(|key| self.env.raw(key))
            .unwrap_or_else(|| defaults.endpoint.to_string());

        let mut config = ResolvedConfig {
            provider,
            model: defaults.model.to_string(),
            endpoint,
            credential: self.env.first_of(defaults.credential_env),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_TOKENS,
            extra: BTreeMap::new(),
            origin,
        };

        for (alias, canonical) in OVERRIDE_ALIASES {
            if overrides.contains_key(canonical) && overrides.remove(alias).is_some() {
                tracing::warn!(
                    alias,
                    canonical,
                    "Both override names given, using the canonical one"
                );
            }
        }
        for (key, value) in overrides {
            config.apply_override(key, value);
        }

        tracing::debug!(
            provider = %config.provider,
            model = %config.model,
            origin = ?config.origin,
            has_credential = config.credential.is_some(),
            "Resolved LLM configuration"
        );

        config
    }
}

/// Resolve against the process environment
pub fn resolve(explicit: Option<ProviderKind>, overrides: Overrides) -> ResolvedConfig {
    ConfigResolver::from_process().resolve(explicit, overrides)
}

impl ResolvedConfig {
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    /// Override keys that are not provider settings, kept verbatim
    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    pub fn origin(&self) -> &ProviderOrigin {
        &self.origin
    }

    /// True when the provider was substituted for an unrecognized request
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, ProviderOrigin::Fallback { .. })
    }

    /// Presence check only; no reachability probe is made
    pub fn validate(&self) -> bool {
        self.missing_field().is_none()
    }

    pub fn ensure_valid(&self) -> Result<(), ProviderError> {
        match self.missing_field() {
            Some(missing) => Err(ProviderError::ConfigurationIncomplete {
                provider: self.provider,
                missing,
            }),
            None => Ok(()),
        }
    }

    fn missing_field(&self) -> Option<&'static str> {
        if self.provider.is_hosted() {
            self.credential
                .as_deref()
                .filter(|c| !c.is_empty())
                .is_none()
                .then_some("api_key")
        } else {
            self.endpoint.is_empty().then_some("base_url")
        }
    }

    /// Provider-qualified model name and request defaults for the agent framework
    pub fn provider_request_defaults(&self) -> RequestDefaults {
        let model = match self.provider.model_namespace() {
            Some(namespace) => format!("{}/{}", namespace, self.model),
            None => self.model.clone(),
        };
        let base_url = Some(self.endpoint.clone());

        let (api_key, base_url) = match self.provider {
            ProviderKind::Gemini => (self.credential.clone(), None),
            ProviderKind::OpenAi | ProviderKind::Anthropic => (self.credential.clone(), base_url),
            ProviderKind::Ollama | ProviderKind::Vllm | ProviderKind::Local => (None, base_url),
        };

        RequestDefaults {
            model,
            api_key,
            base_url,
            temperature: self.temperature,
        }
    }

    pub fn summary(&self) -> ConfigSummary {
        let (base_url, api_key) = if self.provider.is_local() {
            (Some(self.endpoint.clone()), None)
        } else {
            (None, Some(self.credential.as_deref().map(mask_credential)))
        };

        ConfigSummary {
            provider: self.provider,
            model: self.model.clone(),
            valid: self.validate(),
            base_url,
            api_key,
            origin: self.origin.clone(),
        }
    }

    fn apply_override(&mut self, key: String, value: Value) {
        let applied = match key.as_str() {
            "model" => match value.as_str() {
                Some("") => {
                    tracing::warn!(provider = %self.provider, "Ignoring empty model override");
                    true
                }
                Some(model) => {
                    self.model = model.to_string();
                    true
                }
                None => false,
            },
            "base_url" | "endpoint" => match &value {
                Value::String(endpoint) => {
                    self.endpoint = endpoint.clone();
                    true
                }
                Value::Null => {
                    self.endpoint.clear();
                    true
                }
                _ => false,
            },
            "api_key" | "credential" => match &value {
                Value::String(credential) => {
                    self.credential = Some(credential.clone());
                    true
                }
                Value::Null => {
                    self.credential = None;
                    true
                }
                _ => false,
            },
            "temperature" => match value.as_f64() {
                Some(requested) => {
                    self.set_temperature(requested as f32);
                    true
                }
                None => false,
            },
            "max_tokens" | "max_output_tokens" => {
                match value.as_u64().and_then(|v| u32::try_from(v).ok()) {
                    Some(max_tokens) => {
                        self.max_output_tokens = max_tokens;
                        true
                    }
                    None => false,
                }
            }
            _ => {
                self.extra.insert(key, value);
                return;
            }
        };

        if !applied {
            tracing::warn!(
                key = %key,
                value = %value,
                "Override has the wrong type, keeping it as extra"
            );
            self.extra.insert(key, value);
        }
    }

    fn set_temperature(&mut self, requested: f32) {
        let clamped = requested.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);
        if clamped != requested {
            tracing::warn!(requested, clamped, "Temperature out of range, clamping");
        }
        self.temperature = clamped;
    }
}

impl fmt::Display for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LlmConfig(provider={}, model={})", self.provider, self.model)
    }
}

impl fmt::Display for ConfigSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LLM Configuration:")?;
        writeln!(f, "   Provider: {}", self.provider)?;
        writeln!(f, "   Model: {}", self.model)?;
        write!(f, "   Valid: {}", if self.valid { "yes" } else { "no" })?;
        if let Some(base_url) = &self.base_url {
            write!(f, "\n   Base URL: {}", base_url)?;
        }
        match &self.api_key {
            Some(Some(masked)) => write!(f, "\n   API Key: {}", masked)?,
            Some(None) => write!(f, "\n   API Key: not set")?,
            None => {}
        }
        Ok(())
    }
}

/// Replace all but the last four characters with `*`
pub fn mask_credential(credential: &str) -> String {
    let len = credential.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let visible: String = credential.chars().skip(len - 4).collect();
    format!("{}{}", "*".repeat(len - 4), visible)
}
