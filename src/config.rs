//! Configuration file for the llm-backend CLI
//!
//! ```yaml
//! llm:
//!   provider: ollama
//!   overrides:
//!     model: qwen2.5:7b
//!     temperature: 0.2
//! client:
//!   request_timeout_secs: 120
//! telemetry:
//!   verbose: true
//! ```

use crate::provider::{ClientOptions, ConfigResolver, Environment, Overrides, ResolvedConfig};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider selection and overrides
    pub llm: LlmConfig,

    /// Inference client timeouts
    pub client: ClientOptions,

    /// Logging settings
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name; auto-detected from the environment when unset
    pub provider: Option<String>,

    /// Settings applied over the provider defaults
    pub overrides: Overrides,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Directory for JSON log files
    pub log_dir: PathBuf,

    /// Mirror logs to the console at debug level
    pub verbose: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            verbose: false,
        }
    }
}

/// `$XDG_DATA_HOME/llm_backend/logs`, or `.llm_backend_logs` without a data dir
fn default_log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("llm_backend").join("logs"))
        .unwrap_or_else(|| PathBuf::from(".llm_backend_logs"))
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Save config to a YAML file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Set the provider name
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.llm.provider = Some(provider.into());
        self
    }

    /// Add or replace one override
    pub fn with_override(mut self, key: impl Into<String>, value: Value) -> Self {
        self.llm.overrides.insert(key.into(), value);
        self
    }

    /// Set verbose logging
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.telemetry.verbose = verbose;
        self
    }

    /// Set log directory
    pub fn with_log_dir(mut self, log_dir: PathBuf) -> Self {
        self.telemetry.log_dir = log_dir;
        self
    }

    /// Resolve the provider configuration against the process environment
    pub fn resolve(&self) -> ResolvedConfig {
        self.resolve_with(&ConfigResolver::from_process())
    }

    pub fn resolve_with<E: Environment>(&self, resolver: &ConfigResolver<E>) -> ResolvedConfig {
        let overrides = self.llm.overrides.clone();
        match self.llm.provider.as_deref() {
            Some(name) => resolver.resolve_named(name, overrides),
            None => resolver.resolve(None, overrides),
        }
    }
}

/// Parse a `key=value` override; the value is JSON when it parses, a string otherwise
pub fn parse_override(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Empty key in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderKind, ProviderOrigin};
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
llm:
  provider: vllm
  overrides:
    model: mistral-7b
    max_tokens: 512
    top_p: 0.9
client:
  request_timeout_secs: 30
telemetry:
  verbose: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.llm.provider.as_deref(), Some("vllm"));
        assert_eq!(config.client.request_timeout, Duration::from_secs(30));
        assert_eq!(config.client.health_timeout, Duration::from_secs(5));
        assert!(config.telemetry.verbose);

        let resolved = config.resolve_with(&ConfigResolver::new(HashMap::<&str, &str>::new()));
        assert_eq!(resolved.provider(), ProviderKind::Vllm);
        assert_eq!(resolved.model(), "mistral-7b");
        assert_eq!(resolved.max_output_tokens(), 512);
        assert_eq!(resolved.extra().get("top_p"), Some(&json!(0.9)));
    }

    #[test]
    fn test_empty_config_auto_detects() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        let env = HashMap::from([("OLLAMA_BASE_URL", "http://gpu:11434")]);
        let resolved = config.resolve_with(&ConfigResolver::new(env));
        assert_eq!(resolved.provider(), ProviderKind::Ollama);
        assert_eq!(
            resolved.origin(),
            &ProviderOrigin::Detected {
                signal: "OLLAMA_BASE_URL"
            }
        );
    }

    #[test]
    fn test_unknown_provider_name_falls_back() {
        let config = Config::default().with_provider("watsonx");
        let resolved = config.resolve_with(&ConfigResolver::new(HashMap::<&str, &str>::new()));
        assert!(resolved.is_fallback());
        assert_eq!(resolved.provider(), ProviderKind::Gemini);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("llm.yaml");

        let config = Config::default()
            .with_provider("ollama")
            .with_override("model", json!("phi3"))
            .with_verbose(true);
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.llm.provider.as_deref(), Some("ollama"));
        assert_eq!(loaded.llm.overrides.get("model"), Some(&json!("phi3")));
        assert!(loaded.telemetry.verbose);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = Config::load(Path::new("/nonexistent/llm.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/llm.yaml"));
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("temperature=0.3").unwrap(),
            ("temperature".to_string(), json!(0.3))
        );
        assert_eq!(parse_override("model=llama3").unwrap(), ("model".to_string(), json!("llama3")));
        assert_eq!(parse_override("api_key=null").unwrap(), ("api_key".to_string(), Value::Null));
        assert_eq!(parse_override("url=http://a=b").unwrap().1, json!("http://a=b"));
        assert!(parse_override("novalue").is_err());
        assert!(parse_override("=x").is_err());
    }
}
