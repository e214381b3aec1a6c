// tests/common/mod.rs
// Shared fakes: in-process providers/generators and a local stub HTTP server.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sector_report_service::analyze::TextGenerator;
use sector_report_service::error::{FetchError, SynthesisError};
use sector_report_service::ingest::types::SourceProvider;
use sector_report_service::pipeline::Pipeline;
use sector_report_service::quota::QuotaTracker;

pub const CANNED_REPLY: &str =
    "## Summary\nFoo bar.\n### Opportunities\n* A\n* B\n### Risks\n* C";

/// Provider returning fixed items (or a fixed error), counting calls.
pub struct FakeSource {
    pub label: &'static str,
    pub reply: Result<Vec<String>, fn() -> FetchError>,
    pub forward: Option<usize>,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn ok(label: &'static str, items: &[&str]) -> Self {
        Self {
            label,
            reply: Ok(items.iter().map(|s| s.to_string()).collect()),
            forward: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(label: &'static str, err: fn() -> FetchError) -> Self {
        Self {
            label,
            reply: Err(err),
            forward: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_forward(mut self, n: usize) -> Self {
        self.forward = Some(n);
        self
    }

    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay = d;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SourceProvider for FakeSource {
    async fn fetch(&self, _sector: &str) -> Result<Vec<String>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.reply {
            Ok(v) => Ok(v.clone()),
            Err(make) => Err(make()),
        }
    }

    fn name(&self) -> &'static str {
        self.label
    }

    fn forward_limit(&self) -> Option<usize> {
        self.forward
    }
}

/// Generator returning a fixed reply and remembering the last prompt.
pub struct FakeGenerator {
    pub reply: Result<String, fn() -> SynthesisError>,
    pub calls: AtomicUsize,
    pub last_prompt: std::sync::Mutex<Option<String>>,
}

impl FakeGenerator {
    pub fn ok(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: std::sync::Mutex::new(None),
        }
    }

    pub fn failing(err: fn() -> SynthesisError) -> Self {
        Self {
            reply: Err(err),
            calls: AtomicUsize::new(0),
            last_prompt: std::sync::Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> String {
        self.last_prompt.lock().unwrap().clone().unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        match &self.reply {
            Ok(s) => Ok(s.clone()),
            Err(make) => Err(make()),
        }
    }

    fn name(&self) -> &'static str {
        "fake-llm"
    }
}

pub fn pipeline(
    limit: u32,
    news: Arc<FakeSource>,
    enrichment: Option<Arc<FakeSource>>,
    generator: Arc<FakeGenerator>,
) -> Pipeline {
    let p = Pipeline::new(Arc::new(QuotaTracker::new(limit)), news, generator);
    match enrichment {
        Some(e) => p.with_enrichment(e),
        None => p,
    }
}

/// Serve `router` on an ephemeral local port; returns `http://127.0.0.1:PORT`.
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr: SocketAddr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    format!("http://{addr}")
}
