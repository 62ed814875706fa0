//! Dense text embeddings
//!
//! [`Embedder`] is the seam between the pipeline and the model. The real
//! implementation runs BGE-M3 locally through candle ([`BgeM3Embedder`]);
//! [`HashEmbedder`] is a deterministic stand-in for tests and dry runs.
//!
//! Passages and queries are encoded asymmetrically: passages are prefixed
//! with `"passage: "` and queries with `"query: "` before encoding. All
//! vectors are L2-normalized, so cosine distance ranges over `[0, 2]`.

mod bge;
mod download;
mod hardware;
mod mock;
mod models;

pub use bge::BgeM3Embedder;
pub use download::{ModelDownloader, ModelFiles};
pub use hardware::{create_device, ComputeDevice, HardwareCapabilities, HardwareDetector};
pub use mock::HashEmbedder;
pub use models::EmbeddingModel;

use thiserror::Error;

pub const PASSAGE_PREFIX: &str = "passage: ";
pub const QUERY_PREFIX: &str = "query: ";

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Model download failed: {0}")]
    Download(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Model error: {0}")]
    Model(#[from] candle_core::Error),

    #[error("Invalid model config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Embedding failed: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encodes text into fixed-length, L2-normalized vectors.
///
/// Implementations are blocking and CPU/GPU bound; async callers should
/// run them on a blocking thread.
pub trait Embedder: Send + Sync {
    /// Identifier of the underlying model
    fn name(&self) -> &str;

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Encodes `text` as-is
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Number of model tokens in `text`, special tokens included
    fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError>;

    fn encode_passage(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed(&format!("{}{}", PASSAGE_PREFIX, text))
    }

    fn encode_query(&self, query: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed(&format!("{}{}", QUERY_PREFIX, query))
    }
}

/// Scales `v` to unit length in place. A zero vector is left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0; 4];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn test_prefixes_are_applied() {
        struct Echo;
        impl Embedder for Echo {
            fn name(&self) -> &str {
                "echo"
            }
            fn dimension(&self) -> usize {
                1
            }
            fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
                Ok(vec![text.len() as f32])
            }
            fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError> {
                Ok(text.split_whitespace().count())
            }
        }

        assert_eq!(Echo.encode_passage("abc").unwrap(), vec![12.0]);
        assert_eq!(Echo.encode_query("abc").unwrap(), vec![10.0]);
    }
}
