// src/config/settings.rs
use anyhow::{anyhow, bail, Context, Result};
use std::{env, str::FromStr, time::Duration};

use crate::config::exclude;

pub const DEFAULT_RATE_LIMIT_PER_MIN: u32 = 5;

/// Which optional provider enriches the news text before synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrichmentMode {
    /// Web search links (SerpAPI).
    #[default]
    Search,
    /// Rendered page text (Browserbase).
    Scrape,
    None,
}

impl FromStr for EnrichmentMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" | "serpapi" => Ok(Self::Search),
            "scrape" | "browserbase" => Ok(Self::Scrape),
            "none" | "off" | "" => Ok(Self::None),
            other => Err(anyhow!("unsupported ENRICHMENT mode: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsSettings {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub country: String,
    /// Appended to the sector keyword when set, e.g. "India".
    pub region_qualifier: Option<String>,
    pub max_items: usize,
    pub timeout: Duration,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://newsdata.io/api/1/news".to_string(),
            language: "en".to_string(),
            country: "us".to_string(),
            region_qualifier: None,
            max_items: 5,
            timeout: Duration::from_secs(8),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub api_key: String,
    pub base_url: String,
    pub num_results: usize,
    /// Links containing any of these substrings are dropped.
    pub exclude_domains: Vec<String>,
    pub timeout: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://serpapi.com/search".to_string(),
            num_results: 5,
            exclude_domains: Vec::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub api_key: String,
    pub project_id: String,
    pub api_base: String,
    /// Target page; `{slug}` is replaced by the slugified sector.
    pub url_template: String,
    pub timeout: Duration,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            api_base: "https://api.browserbase.com/v1".to_string(),
            url_template: "https://www.ibef.org/industry/{slug}-india".to_string(),
            timeout: Duration::from_secs(45),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// All runtime settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub secret_key: String,
    pub rate_limit_per_min: u32,
    pub enrichment: EnrichmentMode,
    pub news: NewsSettings,
    pub search: SearchSettings,
    pub scrape: ScrapeSettings,
    pub gemini: GeminiSettings,
}

impl Settings {
    /// Read settings from the process environment (call `dotenvy::dotenv()` first).
    ///
    /// `SECRET_KEY` is mandatory; provider keys may be empty, in which case the
    /// corresponding calls fail at request time.
    pub fn from_env() -> Result<Self> {
        let secret_key = env::var("SECRET_KEY").unwrap_or_default();
        if secret_key.trim().is_empty() {
            bail!("Missing SECRET_KEY env var");
        }

        let rate_limit_per_min = env_parse("RATE_LIMIT_PER_MIN", DEFAULT_RATE_LIMIT_PER_MIN)?;
        let enrichment = match env::var("ENRICHMENT") {
            Ok(v) => v.parse()?,
            Err(_) => EnrichmentMode::default(),
        };

        let mut news = NewsSettings {
            api_key: env_or("NEWSDATA_API_KEY", ""),
            ..NewsSettings::default()
        };
        if let Ok(c) = env::var("NEWS_COUNTRY") {
            news.country = c.trim().to_ascii_lowercase();
        }
        news.region_qualifier = env::var("NEWS_REGION_QUALIFIER")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let search = SearchSettings {
            api_key: env_or("SERPAPI_KEY", ""),
            exclude_domains: exclude::load_default().context("loading search exclude list")?,
            ..SearchSettings::default()
        };

        let mut scrape = ScrapeSettings {
            api_key: env_or("BROWSERBASE_API_KEY", ""),
            project_id: env_or("BROWSERBASE_PROJECT_ID", ""),
            ..ScrapeSettings::default()
        };
        if let Ok(t) = env::var("SCRAPE_URL_TEMPLATE") {
            if !t.contains("{slug}") {
                bail!("SCRAPE_URL_TEMPLATE must contain a {{slug}} placeholder");
            }
            scrape.url_template = t;
        }

        let mut gemini = GeminiSettings {
            api_key: env_or("GEMINI_API_KEY", ""),
            ..GeminiSettings::default()
        };
        if let Ok(m) = env::var("GEMINI_MODEL") {
            gemini.model = m;
        }

        Ok(Self {
            secret_key,
            rate_limit_per_min,
            enrichment,
            news,
            search,
            scrape,
            gemini,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("parsing {name}={raw}")),
        Err(_) => Ok(default),
    }
}
