// src/config/mod.rs
//! Runtime configuration: environment settings and the search exclude list.

pub mod exclude;
pub mod settings;

pub use settings::{EnrichmentMode, Settings};
