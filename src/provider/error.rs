//! Provider errors

use super::ProviderKind;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Credential or endpoint missing; the caller has to supply it
    #[error("{provider} configuration incomplete: {missing} not set")]
    ConfigurationIncomplete {
        provider: ProviderKind,
        missing: &'static str,
    },
    /// Backend answered with a non-success status
    #[error("{backend} API error: {status} - {body}")]
    Upstream {
        backend: &'static str,
        status: u16,
        body: String,
    },
    /// Success status, but the body is not the shape the protocol promises
    #[error("{backend} returned an unexpected response: {detail}")]
    Protocol {
        backend: &'static str,
        detail: String,
    },
    /// Network failure or timeout
    #[error("{backend} request to {url} failed: {source}")]
    Transport {
        backend: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ProviderError {
    /// HTTP status for upstream errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Transport { source, .. } if source.is_timeout())
    }
}
