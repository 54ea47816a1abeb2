//! Blocking keys used to prune listing pairs before similarity scoring.
//!
//! A pair is only scored when both titles yield the same model code, or,
//! when either title has no model code, the same screen size. Titles that
//! yield neither key never match anything.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::listing::Listing;

static SCREEN_SIZE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\d{2}(?:\.\d)?)\s*(?:inch|")"#).unwrap());

static TWO_DIGIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{2})\b").unwrap());

static MODEL_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9\-]{5,}").unwrap());

/// Coarse attributes extracted from a title.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockingKey {
    pub model_code: Option<String>,
    pub screen_size: Option<String>,
}

impl BlockingKey {
    /// Decide whether two keys may describe the same model.
    ///
    /// Model codes win when both sides have one; screen size is consulted
    /// only otherwise.
    pub fn same_model(&self, other: &BlockingKey) -> bool {
        if let (Some(a), Some(b)) = (&self.model_code, &other.model_code) {
            return a.to_lowercase() == b.to_lowercase();
        }
        if let (Some(a), Some(b)) = (&self.screen_size, &other.screen_size) {
            return a == b;
        }
        false
    }
}

/// Derives a [`BlockingKey`] from a listing title.
///
/// Implementations must be deterministic: the engine extracts each key once
/// per run and reuses it for every comparison.
pub trait KeyExtractor: Send + Sync {
    fn extract(&self, title: &str) -> BlockingKey;
}

/// Regex heuristic that reads model codes and screen sizes out of free text.
#[derive(Clone, Copy, Debug, Default)]
pub struct TitleKeyExtractor;

impl KeyExtractor for TitleKeyExtractor {
    fn extract(&self, title: &str) -> BlockingKey {
        BlockingKey {
            model_code: extract_model_code(title),
            screen_size: extract_screen_size(title),
        }
    }
}

/// Extract a screen size such as `14` or `15.6` from a title.
///
/// Sizes written as `15.6 inch` or `14"` are preferred. Otherwise the first
/// standalone two-digit number is returned, which may well be something else
/// entirely (RAM, generation, year suffix).
pub fn extract_screen_size(title: &str) -> Option<String> {
    let lowered = title.to_lowercase();
    if let Some(captures) = SCREEN_SIZE_PATTERN.captures(&lowered) {
        return captures.get(1).map(|m| m.as_str().to_string());
    }

    TWO_DIGIT_PATTERN
        .captures(title)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract the first run of five or more ASCII letters, digits or hyphens.
pub fn extract_model_code(title: &str) -> Option<String> {
    MODEL_CODE_PATTERN
        .find(title)
        .map(|m| m.as_str().to_string())
}

/// Blocking check for two listings using [`TitleKeyExtractor`].
pub fn same_model(a: &Listing, b: &Listing) -> bool {
    let extractor = TitleKeyExtractor;
    extractor
        .extract(&a.title)
        .same_model(&extractor.extract(&b.title))
}
