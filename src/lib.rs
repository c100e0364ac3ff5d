//! llm_backend - LLM backend abstraction layer
//!
//! This crate provides:
//! - Provider resolution across hosted APIs and local inference servers
//! - A unified generate/health-check client over their wire protocols
//! - CLI for inspecting and smoke-testing the configured backend

pub mod config;
pub mod provider;
pub mod telemetry;

pub use config::Config;
pub use provider::{
    ClientOptions, ConfigResolver, InferenceClient, Overrides, ProviderError, ProviderKind,
    ProviderOrigin, RequestDefaults, ResolvedConfig,
};
pub use telemetry::Telemetry;
