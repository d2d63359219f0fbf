use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single provider call.
///
/// Every variant means the same thing to a provider chain: this provider is
/// unusable for this request, try the next one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Empty result: {0}")]
    Empty(String),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Coarse grouping of provider failures used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    TransportOrAuth,
    RateLimitedOrEmpty,
    Malformed,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::TransportOrAuth => "transport",
            FailureClass::RateLimitedOrEmpty => "rate_limited",
            FailureClass::Malformed => "malformed",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProviderError {
    pub fn class(&self) -> FailureClass {
        match self {
            ProviderError::Transport(_)
            | ProviderError::Timeout(_)
            | ProviderError::Unauthorized(_)
            | ProviderError::Http { .. } => FailureClass::TransportOrAuth,
            ProviderError::RateLimited(_) | ProviderError::Empty(_) => {
                FailureClass::RateLimitedOrEmpty
            }
            ProviderError::Malformed(_) | ProviderError::InvalidData(_) => FailureClass::Malformed,
        }
    }
}

/// Returned when a time range label cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown time range '{0}', expected one of 1D, 1W, 1M, 3M, 1Y")]
pub struct UnknownTimeRange(pub String);
