// src/ingest/providers/newsdata.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::settings::NewsSettings;
use crate::error::FetchError;
use crate::ingest::types::SourceProvider;

const NAME: &str = "newsdata.io";

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    results: Option<Vec<NewsItem>>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    title: Option<String>,
    description: Option<String>,
}

/// NewsData.io latest-news lookup. Mandatory stage: every failure is surfaced.
pub struct NewsDataProvider {
    http: Client,
    settings: NewsSettings,
}

impl NewsDataProvider {
    pub fn new(http: Client, settings: NewsSettings) -> Self {
        Self { http, settings }
    }

    /// Sector keyword, optionally followed by the region qualifier.
    pub fn query_for(&self, sector: &str) -> String {
        match &self.settings.region_qualifier {
            Some(region) => format!("{sector} {region}"),
            None => sector.to_string(),
        }
    }
}

/// Per item: description, else title, else skip. Keeps provider order.
fn extract_texts(items: Vec<NewsItem>, max_items: usize) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|it| {
            it.description
                .filter(|d| !d.is_empty())
                .or(it.title.filter(|t| !t.is_empty()))
        })
        .take(max_items)
        .collect()
}

#[async_trait]
impl SourceProvider for NewsDataProvider {
    async fn fetch(&self, sector: &str) -> Result<Vec<String>, FetchError> {
        let query = self.query_for(sector);
        tracing::debug!(provider = NAME, query = %query, "fetching news");

        let resp = self
            .http
            .get(&self.settings.base_url)
            .query(&[
                ("apikey", self.settings.api_key.as_str()),
                ("q", query.as_str()),
                ("language", self.settings.language.as_str()),
                ("country", self.settings.country.as_str()),
            ])
            .timeout(self.settings.timeout)
            .send()
            .await
            .map_err(|e| FetchError::unavailable(NAME, format!("unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::unavailable(NAME, format!("HTTP {status}")));
        }

        let body: NewsResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::unavailable(NAME, format!("invalid body: {e}")))?;

        let items = body.results.unwrap_or_default();
        if items.is_empty() {
            return Err(FetchError::NoDataFound { provider: NAME });
        }

        let texts = extract_texts(items, self.settings.max_items);
        if texts.is_empty() {
            return Err(FetchError::NoDataFound { provider: NAME });
        }
        Ok(texts)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: Option<&str>, description: Option<&str>) -> NewsItem {
        NewsItem {
            title: title.map(str::to_string),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn description_wins_then_title_then_skip() {
        let items = vec![
            item(Some("T1"), Some("D1")),
            item(Some("T2"), Some("")),
            item(None, None),
            item(Some(""), None),
            item(None, Some("D5")),
        ];
        assert_eq!(extract_texts(items, 5), vec!["D1", "T2", "D5"]);
    }

    #[test]
    fn truncates_in_provider_order() {
        let items = (0..8).map(|i| item(Some(&format!("t{i}")), None)).collect();
        assert_eq!(extract_texts(items, 5), vec!["t0", "t1", "t2", "t3", "t4"]);
    }

    #[test]
    fn query_adds_region_when_configured() {
        let mut settings = NewsSettings::default();
        let p = NewsDataProvider::new(Client::new(), settings.clone());
        assert_eq!(p.query_for("pharma"), "pharma");

        settings.region_qualifier = Some("India".into());
        let p = NewsDataProvider::new(Client::new(), settings);
        assert_eq!(p.query_for("pharma"), "pharma India");
    }

    #[test]
    fn results_may_be_missing_from_body() {
        let body: NewsResponse = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(body.results.is_none());
    }
}
