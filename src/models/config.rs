//! Configuration model loaded from external sources.

use std::collections::HashMap;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::processing::clustering::{ClusteringMode, MatchConfig, MatchResult};
use crate::{DEFAULT_SEMANTIC_THRESHOLD, DEFAULT_TEXT_THRESHOLD};

#[derive(Clone, Debug, Deserialize)]
/// Settings for the matching worker.
pub struct ServerConfig {
    pub zmq_address: String,
    pub processed_dir: String,
    pub matched_dir: String,
    pub embedding_model: String,
    pub text_threshold: f64,
    pub semantic_threshold: f32,
    pub mode: ClusteringMode,
    /// Drop listings whose title does not contain every query word.
    pub filter_by_query: bool,
    /// Platforms scraped for each category.
    pub categories: HashMap<String, Vec<String>>,
}

impl ServerConfig {
    /// Defaults, then `config/default.yaml` when present, then `APP__*`
    /// environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let platforms = vec!["amazon", "flipkart"];
        Config::builder()
            .set_default("zmq_address", "tcp://127.0.0.1:5555")?
            .set_default("processed_dir", "data/processed")?
            .set_default("matched_dir", "data/matched")?
            .set_default("embedding_model", "all-MiniLM-L6-v2")?
            .set_default("text_threshold", DEFAULT_TEXT_THRESHOLD)?
            .set_default("semantic_threshold", f64::from(DEFAULT_SEMANTIC_THRESHOLD))?
            .set_default("mode", "seed_anchored")?
            .set_default("filter_by_query", false)?
            .set_default("categories.electronics", platforms.clone())?
            .set_default("categories.computers", platforms.clone())?
            .set_default("categories.clothing", platforms)
    }

    /// Validated engine configuration for one matching run.
    pub fn match_config(&self) -> MatchResult<MatchConfig> {
        Ok(MatchConfig::new(self.text_threshold, self.semantic_threshold)?.with_mode(self.mode))
    }

    pub fn platforms(&self, category: &str) -> &[String] {
        self.categories
            .get(&category.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
