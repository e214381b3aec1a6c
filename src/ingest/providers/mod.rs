// src/ingest/providers/mod.rs
pub mod browserbase;
pub mod newsdata;
pub mod serpapi;

pub use browserbase::BrowserbaseProvider;
pub use newsdata::NewsDataProvider;
pub use serpapi::SerpApiProvider;
