// src/ingest/types.rs
use std::fmt::Display;

use crate::error::FetchError;

/// One data-gathering provider. Each call returns short text items in provider order.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch(&self, sector: &str) -> Result<Vec<String>, FetchError>;

    /// Label used in response metadata (`sources`, diagnostics).
    fn name(&self) -> &'static str;

    /// How many items are forwarded to synthesis; `None` forwards all of them.
    fn forward_limit(&self) -> Option<usize> {
        None
    }
}

/// Outcome of an optional stage: either data, or the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Success(T),
    Degraded(String),
}

impl<T> StageOutcome<T> {
    pub fn from_result<E: Display>(res: Result<T, E>) -> Self {
        match res {
            Ok(v) => Self::Success(v),
            Err(e) => Self::Degraded(e.to_string()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}
