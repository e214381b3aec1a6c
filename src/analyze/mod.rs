// src/analyze/mod.rs
//! Report synthesis: prompt construction, the text-generation call, and parsing of
//! the markdown reply into summary / opportunities / risks.

pub mod gemini;
pub mod sections;

use serde::Serialize;

use crate::analyze::sections::{extract_opportunities, extract_risks, extract_summary};
use crate::error::SynthesisError;

pub use gemini::GeminiClient;

/// Remote text generation: one prompt in, the first candidate's text out.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, SynthesisError>;
    /// Provider name for `sources` and diagnostics.
    fn name(&self) -> &'static str;
}

/// Parsed model reply. Every field is derived from `raw_response_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub opportunities: Vec<String>,
    pub risks: Vec<String>,
    pub raw_response_text: String,
}

impl AnalysisResult {
    pub fn parse(raw: String) -> Self {
        Self {
            summary: extract_summary(&raw),
            opportunities: extract_opportunities(&raw),
            risks: extract_risks(&raw),
            raw_response_text: raw,
        }
    }
}

pub fn build_prompt(sector: &str, texts: &[String]) -> String {
    let mut data = String::new();
    for t in texts {
        data.push_str("- ");
        data.push_str(t);
        data.push('\n');
    }
    format!(
        "Analyze the {sector} sector.\n\
         Reply in markdown using exactly these headings:\n\
         ## Summary\n\
         ### Opportunities\n\
         ### Risks\n\
         List opportunities and risks as bullet points starting with \"* \".\n\
         Using this data:\n\
         {data}"
    )
}

/// Prompt the generator with the sector and collected texts, then parse its reply.
pub async fn synthesize(
    generator: &dyn TextGenerator,
    sector: &str,
    texts: &[String],
) -> Result<AnalysisResult, SynthesisError> {
    let prompt = build_prompt(sector, texts);
    tracing::info!(
        provider = generator.name(),
        sector,
        items = texts.len(),
        "requesting analysis"
    );
    let raw = generator.generate(&prompt).await?;
    Ok(AnalysisResult::parse(raw))
}
