use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::group::ProductGroup;
use crate::domain::listing::{Listing, MatchedListing};
use crate::repository::{ListingReader, MatchWriter, RepositoryError, RepositoryResult};

/// Reads processed listings from and writes clustered batches to JSON files.
///
/// Every record read from a platform file is tagged with that platform.
///
/// Input lives at `{processed_dir}/{platform}_{category}_{query}.json`,
/// output at `{matched_dir}/{category}_{query}_matched.json` and
/// `{matched_dir}/{category}_{query}_groups.json`.
#[derive(Clone, Debug)]
pub struct JsonFileRepository {
    processed_dir: PathBuf,
    matched_dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(processed_dir: impl Into<PathBuf>, matched_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed_dir: processed_dir.into(),
            matched_dir: matched_dir.into(),
        }
    }

    pub fn processed_path(&self, platform: &str, category: &str, query: &str) -> PathBuf {
        self.processed_dir
            .join(format!("{platform}_{category}_{query}.json"))
    }

    pub fn matched_path(&self, category: &str, query: &str) -> PathBuf {
        self.matched_dir
            .join(format!("{category}_{query}_matched.json"))
    }

    pub fn groups_path(&self, category: &str, query: &str) -> PathBuf {
        self.matched_dir.join(format!("{category}_{query}_groups.json"))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> RepositoryResult<()> {
        fs::create_dir_all(&self.matched_dir).map_err(|source| RepositoryError::Io {
            path: self.matched_dir.clone(),
            source,
        })?;

        let body = serde_json::to_vec_pretty(value).map_err(|source| RepositoryError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        fs::write(path, body).map_err(|source| RepositoryError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ListingReader for JsonFileRepository {
    fn list_listings(
        &self,
        platform: &str,
        category: &str,
        query: &str,
    ) -> RepositoryResult<Vec<Listing>> {
        let path = self.processed_path(platform, category, query);

        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound(path));
            }
            Err(source) => return Err(RepositoryError::Io { path, source }),
        };

        let mut listings: Vec<Listing> =
            serde_json::from_slice(&body).map_err(|source| RepositoryError::Json {
                path: path.clone(),
                source,
            })?;

        // The file a record came from decides its platform.
        for listing in listings.iter_mut() {
            listing.platform = platform.to_string();
        }

        Ok(listings)
    }
}

impl MatchWriter for JsonFileRepository {
    fn save_matched(
        &self,
        category: &str,
        query: &str,
        listings: &[MatchedListing],
    ) -> RepositoryResult<usize> {
        self.write_json(&self.matched_path(category, query), &listings)?;
        Ok(listings.len())
    }

    fn save_groups(
        &self,
        category: &str,
        query: &str,
        groups: &[ProductGroup],
    ) -> RepositoryResult<usize> {
        self.write_json(&self.groups_path(category, query), &groups)?;
        Ok(groups.len())
    }
}
