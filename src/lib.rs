pub mod domain;
pub mod models;
pub mod processing;
pub mod repository;

/// Minimum token-sort ratio that confirms a cross-platform match.
pub const DEFAULT_TEXT_THRESHOLD: f64 = 85.0;

/// Minimum cosine similarity that confirms a match the lexical test missed.
pub const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.75;
