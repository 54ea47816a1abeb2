//! Helpers for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;

use listing_matcher::domain::listing::Listing;
use listing_matcher::processing::embedding::{EmbeddingError, EmbeddingProvider, EmbeddingResult};
use listing_matcher::repository::JsonFileRepository;
use tempfile::TempDir;

/// Temporary processed/matched directory pair used in integration tests.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        TestDir {
            dir: tempfile::tempdir().expect("Failed to create temp dir."),
        }
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.dir.path().join("processed")
    }

    pub fn matched_dir(&self) -> PathBuf {
        self.dir.path().join("matched")
    }

    pub fn repo(&self) -> JsonFileRepository {
        JsonFileRepository::new(self.processed_dir(), self.matched_dir())
    }

    /// Write a processed listings file the way the normalizer would.
    pub fn write_processed(&self, platform: &str, category: &str, query: &str, body: &str) {
        std::fs::create_dir_all(self.processed_dir()).expect("Failed to create processed dir.");
        let path = self.repo().processed_path(platform, category, query);
        std::fs::write(path, body).expect("Failed to write processed file.");
    }
}

/// Embeddings looked up by exact title. Unknown titles fail the batch.
#[derive(Default)]
pub struct LookupEmbeddings {
    vectors: HashMap<String, Vec<f32>>,
    pub calls: usize,
}

impl LookupEmbeddings {
    pub fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(title, vector)| (title.to_string(), vector.clone()))
                .collect(),
            calls: 0,
        }
    }
}

impl EmbeddingProvider for LookupEmbeddings {
    fn embed_batch(&mut self, titles: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        self.calls += 1;
        titles
            .iter()
            .map(|title| {
                self.vectors
                    .get(title)
                    .cloned()
                    .ok_or_else(|| EmbeddingError::Inference(format!("no vector for {title}")))
            })
            .collect()
    }
}

/// A laptop and phone batch spread over three platforms.
///
/// Seed-anchored clustering with default thresholds groups it as
/// `[0, 0, 1, 2, 3, 4, 3, 1]`.
pub fn laptop_batch() -> (Vec<Listing>, LookupEmbeddings) {
    let rows: Vec<(&str, &str, Vec<f32>)> = vec![
        (
            "amazon",
            "ASUS Vivobook 15 E1504FA-NK543WS 15.6 inch Laptop",
            vec![1.0, 0.0, 0.0, 0.0],
        ),
        (
            "flipkart",
            "Asus Vivobook 15 E1504FA-NK543WS Ryzen 5 Laptop",
            vec![1.0, 0.0, 0.0, 0.0],
        ),
        (
            "amazon",
            "Dell Inspiron 14 5430 14 inch laptop",
            vec![0.0, 1.0, 0.0, 0.0],
        ),
        (
            "flipkart",
            "HP Pavilion 14 inch laptop Ryzen 5",
            vec![0.0, 0.0, 1.0, 0.0],
        ),
        (
            "amazon",
            "Apple MacBook Air M2 13.6 inch 8GB 256GB",
            vec![0.0, 0.0, 0.0, 1.0],
        ),
        (
            "amazon",
            "Apple MacBook Air M2 13.6 inch 8GB 256GB",
            vec![0.0, 0.0, 0.0, 1.0],
        ),
        (
            "flipkart",
            "Apple 2022 MacBook Air M2 8GB 256GB Midnight",
            vec![0.0, 0.0, 0.2, 1.0],
        ),
        (
            "croma",
            "Dell Inspiron 5430 14 inch Intel i5",
            vec![0.0, 0.9, 0.1, 0.0],
        ),
    ];

    let listings = rows
        .iter()
        .map(|(platform, title, _)| Listing::new(*platform, *title))
        .collect();
    let embeddings = LookupEmbeddings::new(
        &rows
            .iter()
            .map(|(_, title, vector)| (*title, vector.clone()))
            .collect::<Vec<_>>(),
    );

    (listings, embeddings)
}
