use crate::embeddings::cosine_similarity;
use crate::error::{EvidenceStoreError, Result};

/// Brute-force cosine index. Corpora here are a few thousand chunks at
/// most, so O(n) scans are fine; the interface leaves room for an ANN
/// upgrade without touching the store.
pub struct NnIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl NnIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Append a vector; its index position is its id.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        if vector.len() != self.dimension {
            return Err(EvidenceStoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.push(vector.to_vec());
        Ok(self.vectors.len() - 1)
    }

    /// K nearest neighbors as (id, score), score descending. Returns at
    /// most the corpus size when `k` exceeds it.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(EvidenceStoreError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scores: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(id, vector)| (id, cosine_similarity(query, vector)))
            .collect();

        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scores.truncate(k);
        Ok(scores)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_search_ranks_by_similarity() {
        let mut index = NnIndex::new(3);
        index.add(&[1.0, 0.0, 0.0]).unwrap();
        index.add(&[0.9, 0.1, 0.0]).unwrap();
        index.add(&[0.0, 1.0, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(results[1].0, 1);
    }

    #[test]
    fn top_k_larger_than_corpus_is_clamped() {
        let mut index = NnIndex::new(2);
        index.add(&[1.0, 0.0]).unwrap();
        let results = index.search(&[1.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut index = NnIndex::new(3);
        assert!(index.add(&[1.0, 0.0]).is_err());
        index.add(&[1.0, 0.0, 0.0]).unwrap();
        assert!(index.search(&[1.0, 0.0], 1).is_err());
    }
}
