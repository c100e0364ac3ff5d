//! Process-wide default configuration and client
//!
//! Written once at startup, read anywhere afterwards. There is no setter:
//! a second initialization is rejected instead of replacing the value.

use super::{resolve, InferenceClient, Overrides, ProviderError, ResolvedConfig};
use std::sync::OnceLock;

static DEFAULT_CONFIG: OnceLock<ResolvedConfig> = OnceLock::new();
static DEFAULT_CLIENT: OnceLock<InferenceClient> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Default {0} already initialized")]
    AlreadyInitialized(&'static str),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Install the process default configuration
pub fn init_default(config: ResolvedConfig) -> Result<&'static ResolvedConfig, InitError> {
    let mut installed = false;
    let current = DEFAULT_CONFIG.get_or_init(|| {
        installed = true;
        config
    });
    if !installed {
        return Err(InitError::AlreadyInitialized("configuration"));
    }
    tracing::info!(config = %current, "Default LLM configuration initialized");
    Ok(current)
}

/// The process default configuration
///
/// Resolved from the environment on first read when `init_default` was never called.
pub fn default_config() -> &'static ResolvedConfig {
    DEFAULT_CONFIG.get_or_init(|| resolve(None, Overrides::new()))
}

/// Install the process default client, built from `config`
pub fn init_default_client(config: &ResolvedConfig) -> Result<&'static InferenceClient, InitError> {
    if DEFAULT_CLIENT.get().is_some() {
        return Err(InitError::AlreadyInitialized("client"));
    }
    let client = InferenceClient::new(config)?;
    let mut installed = false;
    let client = DEFAULT_CLIENT.get_or_init(|| {
        installed = true;
        client
    });
    if !installed {
        return Err(InitError::AlreadyInitialized("client"));
    }
    tracing::info!(client = %client.describe(), "Default inference client initialized");
    Ok(client)
}

/// The process default client, if one was initialized
pub fn default_client() -> Option<&'static InferenceClient> {
    DEFAULT_CLIENT.get()
}
