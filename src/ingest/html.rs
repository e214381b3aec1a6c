// src/ingest/html.rs
//! Text extraction from rendered page markup.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::normalize_text;

pub const MAX_PARAGRAPHS: usize = 10;
pub const MAX_HEADINGS: usize = 5;
/// Fragments shorter than this (in chars) are navigation noise, not content.
pub const MIN_TEXT_CHARS: usize = 50;

static RE_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static RE_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static RE_PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").unwrap());
static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h[1-6]\b[^>]*>(.*?)</h[1-6]\s*>").unwrap());

/// Strip `<script>`/`<style>` blocks from the document.
pub fn strip_scripts_and_styles(html: &str) -> String {
    let out = RE_SCRIPT.replace_all(html, "");
    RE_STYLE.replace_all(&out, "").into_owned()
}

/// First 10 paragraphs followed by first 5 headings, tag-free, each at least
/// [`MIN_TEXT_CHARS`] long.
pub fn extract_page_texts(html: &str) -> Vec<String> {
    let clean = strip_scripts_and_styles(html);

    let paragraphs = RE_PARAGRAPH
        .captures_iter(&clean)
        .take(MAX_PARAGRAPHS)
        .map(|c| normalize_text(&c[1]));
    let headings = RE_HEADING
        .captures_iter(&clean)
        .take(MAX_HEADINGS)
        .map(|c| normalize_text(&c[1]));

    paragraphs
        .chain(headings)
        .filter(|t| t.chars().count() >= MIN_TEXT_CHARS)
        .collect()
}
