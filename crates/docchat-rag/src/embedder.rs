//! Offline hashing embedder

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use docchat_core::{Embedder, Error, Result};

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("token pattern is valid"));

const BIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic embedder based on feature hashing.
///
/// Lowercased word tokens and adjacent-word bigrams are hashed with MD5 into a fixed
/// number of buckets with a hash-derived sign, then the vector is L2-normalised.
/// Texts sharing vocabulary get a high cosine similarity. Useful without a model
/// server and in tests; the same text always produces the same vector.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashEmbedder {
    pub const DEFAULT_DIMENSION: usize = 384;

    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::Configuration(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            model_id: format!("hash-{}", dimension),
        })
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = md5::compute(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    /// Compute the embedding synchronously
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = TOKEN_PATTERN
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .collect();

        let mut vector = vec![0.0; self.dimension];
        for token in &tokens {
            self.add_feature(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.add_feature(&mut vector, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in vector.iter_mut() {
                *value /= magnitude;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dimension: Self::DEFAULT_DIMENSION,
            model_id: format!("hash-{}", Self::DEFAULT_DIMENSION),
        }
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
