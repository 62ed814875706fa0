//! Deterministic embedder for tests and offline runs

use super::{l2_normalize, Embedder, EmbeddingError, PASSAGE_PREFIX, QUERY_PREFIX};
use sha2::{Digest, Sha256};

/// Feature-hashed bag of words.
///
/// Each lowercase alphanumeric word is hashed into one of `dimension`
/// buckets; texts sharing words end up close in cosine distance. The
/// passage/query prefixes are stripped first so both sides are comparable.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    fail_on: Option<String>,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail_on: None,
        }
    }

    /// Makes `embed` fail for any text containing `needle`
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    fn words(text: &str) -> impl Iterator<Item = String> + '_ {
        let text = text
            .strip_prefix(PASSAGE_PREFIX)
            .or_else(|| text.strip_prefix(QUERY_PREFIX))
            .unwrap_or(text);
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                return Err(EmbeddingError::Inference(format!(
                    "Refusing to embed text containing {:?}",
                    needle
                )));
            }
        }

        let mut vector = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return Ok(vector);
        }
        for word in Self::words(text) {
            let digest = Sha256::digest(word.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let index = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
            vector[index] += 1.0;
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }

    /// Word count plus the two special tokens a real tokenizer adds
    fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError> {
        Ok(Self::words(text).count() + 2)
    }
}
