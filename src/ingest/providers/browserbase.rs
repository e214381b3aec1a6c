// src/ingest/providers/browserbase.rs
//! Browserbase page scrape.
//!
//! A remote Chromium session is created over REST, then driven through the Chrome
//! DevTools Protocol on the session's websocket: attach to the page target, navigate,
//! wait for `document.readyState == "complete"`, read the rendered markup.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::config::settings::ScrapeSettings;
use crate::error::FetchError;
use crate::ingest::html::extract_page_texts;
use crate::ingest::slugify;
use crate::ingest::types::SourceProvider;

const NAME: &str = "browserbase";
const READY_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    id: String,
    connect_url: String,
}

pub struct BrowserbaseProvider {
    http: Client,
    settings: ScrapeSettings,
}

impl BrowserbaseProvider {
    pub fn new(http: Client, settings: ScrapeSettings) -> Self {
        Self { http, settings }
    }

    /// Page scraped for `sector`, e.g. `.../industry/real-estate-india`.
    pub fn target_url(&self, sector: &str) -> String {
        self.settings
            .url_template
            .replace("{slug}", &slugify(sector))
    }

    async fn create_session(&self) -> Result<SessionInfo, FetchError> {
        let url = format!("{}/sessions", self.settings.api_base.trim_end_matches('/'));
        let resp = self
            .http
            .post(url)
            .header("X-BB-API-Key", &self.settings.api_key)
            .json(&json!({ "projectId": self.settings.project_id }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::unavailable(NAME, format!("session create: {e}")))?;

        resp.json()
            .await
            .map_err(|e| FetchError::unavailable(NAME, format!("session body: {e}")))
    }

    async fn scrape(&self, url: &str) -> Result<String, FetchError> {
        let session = self.create_session().await?;
        tracing::info!(provider = NAME, session = %session.id, url, "session created");

        let mut cdp = Cdp::connect(&session.connect_url).await?;
        let html = cdp.page_content(url).await;
        cdp.close().await;

        let html = html?;
        tracing::info!(provider = NAME, bytes = html.len(), "page loaded");
        Ok(html)
    }
}

#[async_trait]
impl SourceProvider for BrowserbaseProvider {
    async fn fetch(&self, sector: &str) -> Result<Vec<String>, FetchError> {
        if self.settings.api_key.is_empty() || self.settings.project_id.is_empty() {
            return Err(FetchError::unavailable(NAME, "missing API key or project id"));
        }

        let url = self.target_url(sector);
        let html = tokio::time::timeout(self.settings.timeout, self.scrape(&url))
            .await
            .map_err(|_| FetchError::unavailable(NAME, "session timed out"))??;

        let texts = extract_page_texts(&html);
        if texts.is_empty() {
            return Err(FetchError::NoDataFound { provider: NAME });
        }
        Ok(texts)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

// ------------------------------------------------------------
// Minimal CDP client
// ------------------------------------------------------------

struct Cdp {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u64,
}

impl Cdp {
    async fn connect(url: &str) -> Result<Self, FetchError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| FetchError::unavailable(NAME, format!("cdp connect: {e}")))?;
        Ok(Self { ws, next_id: 0 })
    }

    /// Send one command and wait for its reply; events in between are skipped.
    async fn call(
        &mut self,
        method: &str,
        params: Value,
        session_id: Option<&str>,
    ) -> Result<Value, FetchError> {
        self.next_id += 1;
        let id = self.next_id;
        let mut cmd = json!({ "id": id, "method": method, "params": params });
        if let Some(sid) = session_id {
            cmd["sessionId"] = Value::String(sid.to_string());
        }

        self.ws
            .send(Message::Text(cmd.to_string().into()))
            .await
            .map_err(|e| FetchError::unavailable(NAME, format!("cdp send {method}: {e}")))?;

        while let Some(msg) = self.ws.next().await {
            let msg =
                msg.map_err(|e| FetchError::unavailable(NAME, format!("cdp read {method}: {e}")))?;
            let Message::Text(text) = msg else {
                continue;
            };
            let Ok(reply) = serde_json::from_str::<Value>(text.as_str()) else {
                continue;
            };
            if reply.get("id").and_then(Value::as_u64) != Some(id) {
                continue;
            }
            if let Some(err) = reply.get("error") {
                return Err(FetchError::unavailable(
                    NAME,
                    format!("cdp {method} failed: {err}"),
                ));
            }
            return Ok(reply.get("result").cloned().unwrap_or(Value::Null));
        }
        Err(FetchError::unavailable(
            NAME,
            format!("cdp connection closed during {method}"),
        ))
    }

    async fn page_target(&mut self) -> Result<String, FetchError> {
        let targets = self.call("Target.getTargets", json!({}), None).await?;
        let existing = targets
            .get("targetInfos")
            .and_then(Value::as_array)
            .and_then(|infos| {
                infos
                    .iter()
                    .find(|t| t.get("type").and_then(Value::as_str) == Some("page"))
            })
            .and_then(|t| t.get("targetId").and_then(Value::as_str))
            .map(str::to_string);
        if let Some(id) = existing {
            return Ok(id);
        }

        let created = self
            .call("Target.createTarget", json!({ "url": "about:blank" }), None)
            .await?;
        created
            .get("targetId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| FetchError::unavailable(NAME, "no page target"))
    }

    async fn evaluate(&mut self, expression: &str, sid: &str) -> Result<Value, FetchError> {
        let res = self
            .call(
                "Runtime.evaluate",
                json!({ "expression": expression, "returnByValue": true }),
                Some(sid),
            )
            .await?;
        Ok(res
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn page_content(&mut self, url: &str) -> Result<String, FetchError> {
        let target_id = self.page_target().await?;
        let attached = self
            .call(
                "Target.attachToTarget",
                json!({ "targetId": target_id, "flatten": true }),
                None,
            )
            .await?;
        let sid = attached
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| FetchError::unavailable(NAME, "attach returned no sessionId"))?;

        let nav = self
            .call("Page.navigate", json!({ "url": url }), Some(&sid))
            .await?;
        if let Some(err) = nav.get("errorText").and_then(Value::as_str) {
            if !err.is_empty() {
                return Err(FetchError::unavailable(NAME, format!("navigate: {err}")));
            }
        }

        // Bounded by the caller's session timeout.
        loop {
            let state = self.evaluate("document.readyState", &sid).await?;
            if state.as_str() == Some("complete") {
                break;
            }
            tokio::time::sleep(READY_POLL).await;
        }

        match self
            .evaluate("document.documentElement.outerHTML", &sid)
            .await?
        {
            Value::String(html) => Ok(html),
            other => Err(FetchError::unavailable(
                NAME,
                format!("unexpected page content: {other}"),
            )),
        }
    }

    async fn close(mut self) {
        if let Err(e) = self.ws.close(None).await {
            tracing::debug!(error = %e, provider = NAME, "cdp close");
        }
    }
}
