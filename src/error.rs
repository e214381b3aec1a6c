// src/error.rs
//! Error taxonomy for the report pipeline.
//!
//! Each layer has its own enum; the HTTP layer collapses them into a handful of
//! status categories (see `api::ApiError`).

use thiserror::Error;

/// Failure of a single provider fetch (news, search, scrape).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure, timeout, or non-2xx status.
    #[error("{provider} unavailable: {reason}")]
    UpstreamUnavailable {
        provider: &'static str,
        reason: String,
    },
    /// Provider answered, but there was nothing usable in the response.
    #[error("{provider} returned no data")]
    NoDataFound { provider: &'static str },
}

impl FetchError {
    pub fn unavailable(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            provider,
            reason: reason.into(),
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable { provider, .. } | Self::NoDataFound { provider } => {
                provider
            }
        }
    }
}

/// Failure of the text-generation call.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("model response malformed: {0}")]
    ModelResponseMalformed(String),
}

/// Identity verification failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("token has expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("rate limit exceeded")]
pub struct RateLimited;

/// Terminal failure of one pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    RateLimited(#[from] RateLimited),
    #[error(transparent)]
    News(#[from] FetchError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}
