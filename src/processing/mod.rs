use serde::Deserialize;
use thiserror::Error;

pub mod blocking;
pub mod clustering;
pub mod embedding;
pub mod matching;
pub mod similarity;

#[derive(Deserialize, Debug)]
pub enum ZMQMessage {
    Match(MatchRequest),
}

/// Cluster the processed listings of every platform mapped to `category`
/// that were scraped for `query`.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
pub struct MatchRequest {
    pub category: String,
    pub query: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {field} {value:?}: must be non-empty and free of path separators")]
pub struct InvalidRequest {
    pub field: &'static str,
    pub value: String,
}

impl MatchRequest {
    /// Category and query end up in file names, so neither may contain a
    /// path separator, a `..` sequence or a NUL byte.
    pub fn validate(&self) -> Result<(), InvalidRequest> {
        for (field, value) in [("category", &self.category), ("query", &self.query)] {
            let unsafe_name = value.trim().is_empty()
                || value.contains(['/', '\\', '\0'])
                || value.contains("..");
            if unsafe_name {
                return Err(InvalidRequest {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{InvalidRequest, MatchRequest};

    fn request(category: &str, query: &str) -> MatchRequest {
        MatchRequest {
            category: category.to_string(),
            query: query.to_string(),
        }
    }

    #[test]
    fn plain_names_are_valid() {
        assert_eq!(request("electronics", "macbook air").validate(), Ok(()));
        assert_eq!(request("electronics", "15.6 inch laptop").validate(), Ok(()));
    }

    #[test]
    fn path_like_names_are_rejected() {
        assert_eq!(
            request("electronics", "../../etc/passwd").validate(),
            Err(InvalidRequest {
                field: "query",
                value: "../../etc/passwd".to_string(),
            })
        );
        assert!(request("a/b", "laptop").validate().is_err());
        assert!(request("electronics", "lap\\top").validate().is_err());
        assert!(request("electronics", "..").validate().is_err());
        assert!(request("electronics", "lap\0top").validate().is_err());
        assert!(request("", "laptop").validate().is_err());
    }
}
