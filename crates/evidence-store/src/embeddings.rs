use crate::error::Result;
use async_trait::async_trait;
use ndarray::Array1;
use sha2::{Digest, Sha256};

/// Text-to-vector seam. The store only depends on this trait so tests and
/// alternative backends can be injected.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Deterministic feature-hashing embedder: lowercase tokens are hashed into
/// signed buckets of a fixed-dimension vector, then L2-normalized.
///
/// Not a learned model, but it is stable across processes, needs no model
/// assets, and preserves the property retrieval relies on: texts sharing
/// vocabulary land near each other under cosine similarity. Corpora built
/// with a learned embedder ship precomputed vectors and bypass this.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub const DEFAULT_DIMENSION: usize = 256;

    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut accum = Array1::<f32>::zeros(self.dimension);
        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let bucket =
                u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize
                    % self.dimension;
            let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
            accum[bucket] += sign;
        }

        let norm = accum.dot(&accum).sqrt();
        if norm > 0.0 {
            accum /= norm;
        }
        // Empty/blank text stays the zero vector; callers treat that as a
        // degenerate query, not an error.
        accum.to_vec()
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// Cosine similarity between two vectors of equal length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
