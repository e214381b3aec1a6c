// src/pipeline.rs
//! Pipeline orchestrator: quota → {news, enrichment} → synthesis → rendering → assembly.
//!
//! News and the optional enrichment fetch run concurrently and are joined before
//! synthesis. Enrichment failure degrades the run (recorded in diagnostics); news,
//! quota and synthesis failures abort it.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::analyze::{synthesize, AnalysisResult, TextGenerator};
use crate::auth::anon_hash;
use crate::error::PipelineError;
use crate::ingest::types::{SourceProvider, StageOutcome};
use crate::ingest::{fetch_with_telemetry, gather_optional};
use crate::quota::QuotaTracker;
use crate::report::render_markdown;

pub const SUMMARY_PREVIEW_CHARS: usize = 200;
pub const ELLIPSIS: &str = "...";
const NEWS_PREVIEW_ITEMS: usize = 2;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("analyze_requests_total", "Pipeline runs started.");
        describe_counter!("analyze_failures_total", "Pipeline runs aborted, by stage.");
        describe_counter!("quota_rejections_total", "Requests refused by the quota tracker.");
        describe_counter!("enrichment_degraded_total", "Runs that continued without enrichment.");
        describe_histogram!(
            "pipeline_duration_ms",
            "Pipeline time in milliseconds, by outcome (ok, news_failed, synthesis_failed)."
        );
    });
}

fn record_duration(started: Instant, outcome: &'static str) -> u64 {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    histogram!("pipeline_duration_ms", "outcome" => outcome).record(elapsed_ms as f64);
    elapsed_ms
}

/// Final payload returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub sector: String,
    pub summary: String,
    pub markdown: String,
    pub sources: Vec<String>,
    pub intermediate_results: PipelineRun,
}

/// Per-run diagnostics. Free-form; not a stable contract.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub step_1_news_data: NewsStep,
    pub step_2_enrichment: EnrichmentStep,
    pub step_3_ai_analysis: AnalysisStep,
    pub step_4_report: ReportStep,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsStep {
    pub provider: &'static str,
    pub items_count: usize,
    pub preview: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Degraded,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentStep {
    pub provider: Option<&'static str>,
    pub status: StepStatus,
    pub items: Vec<String>,
    pub total_items: usize,
    pub forwarded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EnrichmentStep {
    fn skipped() -> Self {
        Self {
            provider: None,
            status: StepStatus::Skipped,
            items: Vec::new(),
            total_items: 0,
            forwarded: 0,
            reason: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisStep {
    pub provider: &'static str,
    pub summary_length: usize,
    pub opportunities_count: usize,
    pub risks_count: usize,
    pub response_length: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportStep {
    pub markdown_length: usize,
}

/// First 200 chars of the summary followed by `"..."`.
pub fn preview_summary(summary: &str) -> String {
    let mut out: String = summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
    out.push_str(ELLIPSIS);
    out
}

pub struct Pipeline {
    quota: Arc<QuotaTracker>,
    news: Arc<dyn SourceProvider>,
    enrichment: Option<Arc<dyn SourceProvider>>,
    generator: Arc<dyn TextGenerator>,
}

impl Pipeline {
    pub fn new(
        quota: Arc<QuotaTracker>,
        news: Arc<dyn SourceProvider>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            quota,
            news,
            enrichment: None,
            generator,
        }
    }

    pub fn with_enrichment(mut self, provider: Arc<dyn SourceProvider>) -> Self {
        self.enrichment = Some(provider);
        self
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    /// Run all stages for one request on behalf of `identity`.
    pub async fn run(&self, identity: &str, sector: &str) -> Result<AnalyzeResponse, PipelineError> {
        ensure_metrics_described();
        let started = Instant::now();
        let who = anon_hash(identity);

        if let Err(e) = self.quota.consume(identity) {
            counter!("quota_rejections_total").increment(1);
            tracing::warn!(user = %who, sector, "quota exhausted");
            return Err(e.into());
        }
        counter!("analyze_requests_total").increment(1);
        tracing::info!(user = %who, sector, "pipeline start");

        // Stage 1 + 2: news (mandatory) joined with enrichment (optional).
        let enrichment_fut = async {
            match &self.enrichment {
                Some(p) => Some((p.clone(), gather_optional(p.as_ref(), sector).await)),
                None => None,
            }
        };
        let (news_res, enrichment) = tokio::join!(
            fetch_with_telemetry(self.news.as_ref(), sector),
            enrichment_fut
        );

        let news = news_res.inspect_err(|e| {
            counter!("analyze_failures_total", "stage" => "news").increment(1);
            record_duration(started, "news_failed");
            tracing::warn!(error = %e, sector, "news stage failed; aborting run");
        })?;

        let mut sources = vec![self.news.name().to_string()];
        let mut texts = news.clone();

        let enrichment_step = match enrichment {
            None => EnrichmentStep::skipped(),
            Some((provider, StageOutcome::Success(items))) => {
                let forwarded: Vec<String> = items
                    .iter()
                    .take(provider.forward_limit().unwrap_or(usize::MAX))
                    .cloned()
                    .collect();
                if !forwarded.is_empty() {
                    sources.push(provider.name().to_string());
                }
                let step = EnrichmentStep {
                    provider: Some(provider.name()),
                    status: StepStatus::Ok,
                    total_items: items.len(),
                    forwarded: forwarded.len(),
                    items,
                    reason: None,
                };
                texts.extend(forwarded);
                step
            }
            Some((provider, StageOutcome::Degraded(reason))) => {
                counter!("enrichment_degraded_total").increment(1);
                tracing::warn!(
                    provider = provider.name(),
                    reason = %reason,
                    sector,
                    "enrichment degraded; continuing with news only"
                );
                EnrichmentStep {
                    provider: Some(provider.name()),
                    status: StepStatus::Degraded,
                    items: Vec::new(),
                    total_items: 0,
                    forwarded: 0,
                    reason: Some(reason),
                }
            }
        };

        // Stage 3: synthesis.
        let analysis: AnalysisResult = synthesize(self.generator.as_ref(), sector, &texts)
            .await
            .inspect_err(|e| {
                counter!("analyze_failures_total", "stage" => "synthesis").increment(1);
                record_duration(started, "synthesis_failed");
                tracing::warn!(error = %e, sector, "synthesis failed; aborting run");
            })?;
        sources.push(self.generator.name().to_string());

        // Stage 4: rendering (total).
        let markdown = render_markdown(sector, &analysis);

        let elapsed_ms = record_duration(started, "ok");
        tracing::info!(
            user = %who,
            sector,
            elapsed_ms,
            sources = ?sources,
            degraded = enrichment_step.reason.is_some(),
            "pipeline done"
        );

        // Stage 5: assembly.
        Ok(AnalyzeResponse {
            sector: sector.to_string(),
            summary: preview_summary(&analysis.summary),
            intermediate_results: PipelineRun {
                step_1_news_data: NewsStep {
                    provider: self.news.name(),
                    items_count: news.len(),
                    preview: news.iter().take(NEWS_PREVIEW_ITEMS).cloned().collect(),
                },
                step_2_enrichment: enrichment_step,
                step_3_ai_analysis: AnalysisStep {
                    provider: self.generator.name(),
                    summary_length: analysis.summary.chars().count(),
                    opportunities_count: analysis.opportunities.len(),
                    risks_count: analysis.risks.len(),
                    response_length: analysis.raw_response_text.chars().count(),
                },
                step_4_report: ReportStep {
                    markdown_length: markdown.chars().count(),
                },
                elapsed_ms,
            },
            markdown,
            sources,
        })
    }
}
