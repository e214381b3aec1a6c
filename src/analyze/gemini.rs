// src/analyze/gemini.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::analyze::TextGenerator;
use crate::config::settings::GeminiSettings;
use crate::error::SynthesisError;

const NAME: &str = "gemini";

#[derive(Serialize)]
struct Req<'a> {
    contents: [Content<'a>; 1],
}
#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}
#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}
#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}
#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Gemini `generateContent` client. One request per call, no retries.
pub struct GeminiClient {
    http: Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(http: Client, settings: GeminiSettings) -> Self {
        Self { http, settings }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }
}

/// Text of the first part of the first candidate.
fn first_candidate_text(body: Resp) -> Result<String, SynthesisError> {
    let candidate = body.candidates.into_iter().next().ok_or_else(|| {
        SynthesisError::ModelResponseMalformed("response has no candidates".into())
    })?;
    candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| SynthesisError::ModelResponseMalformed("candidate has no text part".into()))
}

/// Provider message if the body is a Gemini error envelope, else the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, SynthesisError> {
        let req = Req {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&req)
            .timeout(self.settings.timeout)
            .send()
            .await
            .map_err(|e| SynthesisError::ModelUnavailable(format!("unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SynthesisError::ModelUnavailable(format!(
                "HTTP {status}: {}",
                error_message(&body)
            )));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| SynthesisError::ModelResponseMalformed(e.to_string()))?;
        let text = first_candidate_text(body)?;
        tracing::info!(provider = NAME, chars = text.len(), "generation complete");
        Ok(text)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
