use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("unknown embedding model: {0}")]
    UnknownModel(String),
    #[error("failed to initialize embedder: {0}")]
    Init(String),
    #[error("failed to generate embeddings: {0}")]
    Inference(String),
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Maps titles to fixed-length vectors.
///
/// The output must be index-aligned with the input and independent of the
/// order in which listings are later compared.
pub trait EmbeddingProvider {
    fn embed_batch(&mut self, titles: &[String]) -> EmbeddingResult<Vec<Vec<f32>>>;
}

/// Resolve a configured model name to a `fastembed` model.
pub fn parse_embedding_model(name: &str) -> EmbeddingResult<EmbeddingModel> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
            Ok(EmbeddingModel::AllMiniLML6V2)
        }
        "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "multilingual-e5-large" | "intfloat/multilingual-e5-large" => {
            Ok(EmbeddingModel::MultilingualE5Large)
        }
        _ => Err(EmbeddingError::UnknownModel(name.to_string())),
    }
}

/// Local ONNX embedder backed by `fastembed`.
pub struct FastEmbedProvider {
    model: TextEmbedding,
}

impl FastEmbedProvider {
    pub fn try_new(model: EmbeddingModel) -> EmbeddingResult<Self> {
        let model = TextEmbedding::try_new(InitOptions::new(model))
            .map_err(|error| EmbeddingError::Init(format!("{error:?}")))?;
        Ok(Self { model })
    }

    pub fn from_name(name: &str) -> EmbeddingResult<Self> {
        Self::try_new(parse_embedding_model(name)?)
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed_batch(&mut self, titles: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .embed(titles.to_vec(), None)
            .map_err(|error| EmbeddingError::Inference(format!("{error:?}")))?;

        Ok(embeddings
            .iter()
            .map(|value| normalize_embedding(value))
            .collect())
    }
}

/// Normalize a vector to unit length.
///
/// Returns the original vector when the norm is zero.
pub fn normalize_embedding(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        vec.to_vec()
    } else {
        vec.iter().map(|x| x / norm).collect()
    }
}

#[cfg(test)]
mod tests {
    use fastembed::EmbeddingModel;

    use super::{EmbeddingError, normalize_embedding, parse_embedding_model};

    #[test]
    fn normalize_embedding_scales_to_unit_length() {
        let normalized = normalize_embedding(&[3.0, 4.0]);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_embedding_keeps_zero_vector() {
        assert_eq!(normalize_embedding(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn parses_known_model_names() {
        assert!(matches!(
            parse_embedding_model("all-MiniLM-L6-v2"),
            Ok(EmbeddingModel::AllMiniLML6V2)
        ));
        assert!(matches!(
            parse_embedding_model("word2vec"),
            Err(EmbeddingError::UnknownModel(name)) if name == "word2vec"
        ));
    }
}
