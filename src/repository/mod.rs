use std::path::PathBuf;

use thiserror::Error;

use crate::domain::group::ProductGroup;
use crate::domain::listing::{Listing, MatchedListing};

pub mod json;

pub use json::JsonFileRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(PathBuf),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

pub trait ListingReader {
    /// Listings one platform produced for a category and query, in file
    /// order. A platform without data yields [`RepositoryError::NotFound`].
    fn list_listings(
        &self,
        platform: &str,
        category: &str,
        query: &str,
    ) -> RepositoryResult<Vec<Listing>>;
}

pub trait MatchWriter {
    fn save_matched(
        &self,
        category: &str,
        query: &str,
        listings: &[MatchedListing],
    ) -> RepositoryResult<usize>;
    fn save_groups(
        &self,
        category: &str,
        query: &str,
        groups: &[ProductGroup],
    ) -> RepositoryResult<usize>;
}
