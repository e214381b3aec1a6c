// src/ingest/providers/serpapi.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::exclude::{normalize_domain, normalize_domains};
use crate::config::settings::SearchSettings;
use crate::error::FetchError;
use crate::ingest::types::SourceProvider;

const NAME: &str = "serpapi";
/// Links forwarded to the model; the rest only show up in diagnostics.
const FORWARDED_LINKS: usize = 3;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    link: Option<String>,
}

/// Google search through SerpAPI; returns result links.
pub struct SerpApiProvider {
    http: Client,
    settings: SearchSettings,
}

impl SerpApiProvider {
    pub fn new(http: Client, settings: SearchSettings) -> Self {
        Self { http, settings }
    }
}

pub fn search_query(sector: &str) -> String {
    format!("{sector} India market news")
}

/// Drop excluded links (case-insensitive substring match), keep the first `limit`.
fn filter_links(results: Vec<OrganicResult>, exclude: &[String], limit: usize) -> Vec<String> {
    let exclude = normalize_domains(exclude);
    results
        .into_iter()
        .filter_map(|r| r.link)
        .filter(|link| !link.is_empty())
        .filter(|link| {
            let link = normalize_domain(link);
            !exclude.iter().any(|d| link.contains(d.as_str()))
        })
        .take(limit)
        .collect()
}

#[async_trait]
impl SourceProvider for SerpApiProvider {
    async fn fetch(&self, sector: &str) -> Result<Vec<String>, FetchError> {
        let query = search_query(sector);
        let num = self.settings.num_results.to_string();

        let resp = self
            .http
            .get(&self.settings.base_url)
            .query(&[
                ("engine", "google"),
                ("q", query.as_str()),
                ("num", num.as_str()),
                ("api_key", self.settings.api_key.as_str()),
            ])
            .timeout(self.settings.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::unavailable(NAME, e.to_string()))?;

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::unavailable(NAME, format!("invalid body: {e}")))?;

        Ok(filter_links(
            body.organic_results,
            &self.settings.exclude_domains,
            self.settings.num_results,
        ))
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn forward_limit(&self) -> Option<usize> {
        Some(FORWARDED_LINKS)
    }
}
