// src/ingest/mod.rs
//! External fetchers: news (mandatory), web search and page scrape (optional).

pub mod html;
pub mod providers;
pub mod types;

use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::error::FetchError;
use crate::ingest::types::{SourceProvider, StageOutcome};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "provider_items_total",
            "Text items returned by external providers."
        );
        describe_counter!(
            "provider_errors_total",
            "Provider fetch/parse errors, labelled by provider."
        );
        describe_histogram!("provider_fetch_ms", "Provider round-trip time in milliseconds.");
    });
}

/// Normalize text extracted from markup: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());

    let out = re_tags.replace_all(s, " ");
    let out = html_escape::decode_html_entities(&out).to_string();
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Lowercase path segment for a sector name: "Real Estate" -> "real-estate".
pub fn slugify(sector: &str) -> String {
    static RE_SEP: OnceCell<regex::Regex> = OnceCell::new();
    let re_sep = RE_SEP.get_or_init(|| regex::Regex::new(r"[\s\-]+").unwrap());
    re_sep
        .replace_all(sector.trim(), "-")
        .trim_matches('-')
        .to_lowercase()
}

/// Run a provider with timing + error telemetry.
pub async fn fetch_with_telemetry(
    provider: &dyn SourceProvider,
    sector: &str,
) -> Result<Vec<String>, FetchError> {
    ensure_metrics_described();
    let t0 = std::time::Instant::now();
    let res = provider.fetch(sector).await;
    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    metrics::histogram!("provider_fetch_ms", "provider" => provider.name()).record(ms);

    match &res {
        Ok(items) => {
            counter!("provider_items_total", "provider" => provider.name())
                .increment(items.len() as u64);
            tracing::info!(provider = provider.name(), items = items.len(), ms, "provider ok");
        }
        Err(e) => {
            counter!("provider_errors_total", "provider" => provider.name()).increment(1);
            tracing::warn!(error = %e, provider = provider.name(), ms, "provider error");
        }
    }
    res
}

/// Optional stage: any failure becomes `Degraded` instead of aborting the run.
pub async fn gather_optional(
    provider: &dyn SourceProvider,
    sector: &str,
) -> StageOutcome<Vec<String>> {
    StageOutcome::from_result(fetch_with_telemetry(provider, sector).await)
}
