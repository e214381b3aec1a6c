// src/api.rs
//! HTTP surface: routing, bearer-token extraction, error mapping.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::analyze::GeminiClient;
use crate::auth::{bearer_token, IdentityVerifier, JwtAuth, DEMO_IDENTITY};
use crate::config::{EnrichmentMode, Settings};
use crate::error::{AuthError, FetchError, PipelineError};
use crate::ingest::providers::{BrowserbaseProvider, NewsDataProvider, SerpApiProvider};
use crate::ingest::types::SourceProvider;
use crate::pipeline::{AnalyzeResponse, Pipeline};
use crate::quota::QuotaTracker;

static SECTOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z\s-]{2,50}$").unwrap());

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub auth: Arc<JwtAuth>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the real providers from settings. One shared HTTP client; each provider
    /// applies its own per-request timeout.
    pub fn from_settings(settings: &Settings, metrics: Option<PrometheusHandle>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .connect_timeout(std::time::Duration::from_secs(4))
            .build()?;

        let quota = Arc::new(QuotaTracker::new(settings.rate_limit_per_min));
        let news = Arc::new(NewsDataProvider::new(http.clone(), settings.news.clone()));
        let generator = Arc::new(GeminiClient::new(http.clone(), settings.gemini.clone()));

        let mut pipeline = Pipeline::new(quota, news, generator);
        let enrichment: Option<Arc<dyn SourceProvider>> = match settings.enrichment {
            EnrichmentMode::Search => Some(Arc::new(SerpApiProvider::new(
                http.clone(),
                settings.search.clone(),
            ))),
            EnrichmentMode::Scrape => Some(Arc::new(BrowserbaseProvider::new(
                http.clone(),
                settings.scrape.clone(),
            ))),
            EnrichmentMode::None => None,
        };
        if let Some(p) = enrichment {
            pipeline = pipeline.with_enrichment(p);
        }

        tracing::info!(
            enrichment = ?settings.enrichment,
            rate_limit_per_min = settings.rate_limit_per_min,
            "app state ready"
        );

        Ok(Self {
            pipeline: Arc::new(pipeline),
            auth: Arc::new(JwtAuth::new(&settings.secret_key)),
            metrics,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/demo-token", get(demo_token))
        .route("/analyze/{sector}", get(analyze))
        .route("/analyze/{sector}/download", get(download))
        .layer(CorsLayer::very_permissive())
        .with_state(state.clone());

    if let Some(handle) = state.metrics {
        router = router.merge(crate::metrics::router(handle));
    }
    router
}

// ------------------------------------------------------------
// Errors
// ------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
    /// 401
    Unauthorized(String),
    /// 422 - sector does not match the allowed pattern
    InvalidSector(String),
    /// 429
    RateLimited,
    /// 500 - a mandatory provider failed
    Upstream(String),
    /// 500
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::InvalidSector(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_sector", msg)
            }
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Rate limit exceeded".to_string(),
            ),
            ApiError::Upstream(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "upstream_failure", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_type.into(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(match err {
            AuthError::Missing => "Not authenticated".into(),
            AuthError::Expired => "Token has expired".into(),
            AuthError::Invalid => "Invalid token".into(),
        })
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::RateLimited(_) => ApiError::RateLimited,
            PipelineError::News(e @ FetchError::NoDataFound { .. }) => {
                ApiError::Upstream(format!("No news found for this sector ({e})"))
            }
            PipelineError::News(e) => ApiError::Upstream(format!("News API error: {e}")),
            PipelineError::Synthesis(e) => ApiError::Upstream(format!("Analysis failed: {e}")),
        }
    }
}

// ------------------------------------------------------------
// Extractors
// ------------------------------------------------------------

/// Caller identity from a verified bearer token.
pub struct Identity(pub String);

impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let token = bearer_token(header)?;
        let sub = state.auth.verify(token)?;
        Ok(Identity(sub))
    }
}

fn validate_sector(sector: &str) -> Result<(), ApiError> {
    if SECTOR_RE.is_match(sector) {
        Ok(())
    } else {
        Err(ApiError::InvalidSector(format!(
            "sector must be 2-50 letters, spaces or hyphens, got '{sector}'"
        )))
    }
}

// ------------------------------------------------------------
// Handlers
// ------------------------------------------------------------

#[derive(Serialize)]
struct DemoTokenResp {
    token: String,
    usage: &'static str,
    example: String,
}

async fn demo_token(State(state): State<AppState>) -> Result<Json<DemoTokenResp>, ApiError> {
    let token = state
        .auth
        .create_token(DEMO_IDENTITY)
        .map_err(|e| ApiError::Internal(format!("token encoding failed: {e}")))?;
    Ok(Json(DemoTokenResp {
        example: format!("Authorization: Bearer {token}"),
        usage: "Add this token to the Authorization header as: Bearer <token>",
        token,
    }))
}

async fn analyze(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(sector): Path<String>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    validate_sector(&sector)?;
    let resp = state.pipeline.run(&user, &sector).await?;
    Ok(Json(resp))
}

async fn download(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(sector): Path<String>,
) -> Result<Response, ApiError> {
    validate_sector(&sector)?;
    // Must precede `run`: a header failure may not consume quota.
    let disposition = attachment_disposition(&sector)?;
    let resp = state.pipeline.run(&user, &sector).await?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/markdown; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        resp.markdown,
    )
        .into_response())
}

/// `{sector}_market_analysis.md` with control characters and quotes replaced by `_`.
fn attachment_filename(sector: &str) -> String {
    let safe: String = sector
        .chars()
        .map(|c| if c.is_control() || c == '"' || c == '\\' { '_' } else { c })
        .collect();
    format!("{safe}_market_analysis.md")
}

fn attachment_disposition(sector: &str) -> Result<HeaderValue, ApiError> {
    let value = format!("attachment; filename=\"{}\"", attachment_filename(sector));
    HeaderValue::from_str(&value)
        .map_err(|e| ApiError::Internal(format!("content-disposition for '{sector}': {e}")))
}
