use std::time::Duration;

use thiserror::Error;

use crate::agents::config::ProviderKind;

pub type Result<T> = std::result::Result<T, PalError>;

#[derive(Debug, Error)]
pub enum PalError {
    #[error("{provider} is not configured: {message}")]
    Configuration {
        provider: ProviderKind,
        message: String,
    },
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: ProviderKind,
        status: Option<u16>,
        message: String,
    },
    #[error("{provider} request timed out after {}s", .after.as_secs())]
    Timeout {
        provider: ProviderKind,
        after: Duration,
    },
    #[error("{provider} returned an unreadable response: {message}")]
    ResponseParse {
        provider: ProviderKind,
        message: String,
    },
}

impl PalError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "AI-1001",
            Self::Transport { .. } => "AI-1002",
            Self::Timeout { .. } => "AI-1003",
            Self::ResponseParse { .. } => "AI-1004",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => {
                "A required API key or endpoint is missing. Fix the provider settings before retrying."
            }
            Self::Transport { .. } => {
                "The provider could not be reached or rejected the request. Retry with backoff."
            }
            Self::Timeout { .. } => {
                "The provider did not answer in time. Retry with fewer tokens or another provider."
            }
            Self::ResponseParse { .. } => {
                "The provider answered with a malformed payload. Its API may have changed."
            }
        }
    }

    /// Misconfiguration is the only kind that cannot succeed on a plain retry.
    pub fn is_retriable(&self) -> bool {
        !matches!(self, Self::Configuration { .. })
    }

    pub fn provider(&self) -> ProviderKind {
        match self {
            Self::Configuration { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::ResponseParse { provider, .. } => *provider,
        }
    }
}
