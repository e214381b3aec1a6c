// src/analyze/sections.rs
//! Shallow markdown-section scraper for the model's reply.
//!
//! Heading rules are matched with regexes, not a markdown parser. Rendering relies on
//! the exact empty/fallback behaviour below, so changes here change report output.

use once_cell::sync::Lazy;
use regex::Regex;

/// Chars of raw text used as summary when no `## Summary` heading exists.
pub const SUMMARY_FALLBACK_CHARS: usize = 300;

static RE_SUMMARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)## Summary\s*(.+?)(\n##|\z)").unwrap());
static RE_OPPORTUNITIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)###.*Opportunities\s*(.+?)(\n###|\z)").unwrap());
static RE_RISKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)###.*Risks\s*(.+?)(\n###|\z)").unwrap());
// No dot-all: one item never spans lines.
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*{1,2}\s*(.+)").unwrap());

/// Text under `## Summary` up to the next `##` heading, else the first 300 chars.
pub fn extract_summary(text: &str) -> String {
    match RE_SUMMARY.captures(text) {
        Some(c) => c[1].trim().to_string(),
        None => text.chars().take(SUMMARY_FALLBACK_CHARS).collect(),
    }
}

pub fn extract_opportunities(text: &str) -> Vec<String> {
    extract_section(&RE_OPPORTUNITIES, text)
}

pub fn extract_risks(text: &str) -> Vec<String> {
    extract_section(&RE_RISKS, text)
}

/// Bullet items of a `###` section; whole block if it has no bullets; empty if absent.
fn extract_section(re: &Regex, text: &str) -> Vec<String> {
    let Some(c) = re.captures(text) else {
        return Vec::new();
    };
    let content = c[1].trim();
    let items: Vec<String> = RE_BULLET
        .captures_iter(content)
        .map(|b| b[1].to_string())
        .collect();
    if items.is_empty() {
        vec![content.to_string()]
    } else {
        items
    }
}
