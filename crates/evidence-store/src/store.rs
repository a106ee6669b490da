use crate::embeddings::Embedder;
use crate::error::{EvidenceStoreError, Result};
use crate::index::NnIndex;
use crate::types::{CorpusRecord, EvidenceChunk, RetrievedChunk, StoredChunk};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Read-only store over the two evidence corpora (case studies plus
/// handbook excerpts). Loaded once at startup; retrieval never mutates it,
/// so concurrent readers need no locking.
pub struct EvidenceStore {
    chunks: HashMap<String, StoredChunk>,
    /// Chunk ids in load order; position doubles as the index id.
    order: Vec<String>,
    index: NnIndex,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for EvidenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceStore")
            .field("chunks", &self.chunks.len())
            .field("order", &self.order.len())
            .finish_non_exhaustive()
    }
}

impl EvidenceStore {
    /// Load a JSONL corpus (one `CorpusRecord` per line). Records without a
    /// precomputed embedding are embedded with `embedder`; records with one
    /// must match its dimension. Chunk ids must be unique within the
    /// corpus; a duplicate id fails the load.
    pub async fn load(path: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading evidence corpus from {:?}", path);
        let raw = tokio::fs::read_to_string(path).await?;

        let mut records = Vec::new();
        for (line_no, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: CorpusRecord = serde_json::from_str(line).map_err(|e| {
                EvidenceStoreError::CorpusError(format!(
                    "{:?} line {}: {e}",
                    path,
                    line_no + 1
                ))
            })?;
            records.push(record);
        }

        Self::from_records(records, embedder).await
    }

    /// Build a store from in-memory records (the test seam).
    pub async fn from_records(
        records: Vec<CorpusRecord>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let mut chunks = HashMap::new();
        let mut order = Vec::new();
        let mut index = NnIndex::new(embedder.dimension());

        // Embed the records that shipped without vectors in one batch.
        let missing: Vec<&str> = records
            .iter()
            .filter(|r| r.embedding.is_none())
            .map(|r| r.text.as_str())
            .collect();
        let mut computed = if missing.is_empty() {
            Vec::new()
        } else {
            log::info!("Embedding {} corpus records without vectors", missing.len());
            embedder.embed_batch(&missing).await?
        }
        .into_iter();

        for record in records {
            if chunks.contains_key(&record.id) {
                return Err(EvidenceStoreError::CorpusError(format!(
                    "duplicate chunk id '{}'",
                    record.id
                )));
            }
            let vector = match record.embedding {
                Some(v) => v,
                None => computed.next().ok_or_else(|| {
                    EvidenceStoreError::EmbeddingError("batch embedding underrun".to_string())
                })?,
            };
            index.add(&vector)?;

            let chunk = EvidenceChunk {
                id: record.id.clone(),
                kind: record.kind,
                source: record.title,
                text: record.text,
                mechanism: record.mechanism,
            };
            order.push(record.id.clone());
            chunks.insert(record.id, StoredChunk { chunk, vector });
        }

        log::info!("Evidence store ready: {} chunks", chunks.len());
        Ok(Self {
            chunks,
            order,
            index,
            embedder,
        })
    }

    /// Retrieve up to `top_k` chunks ranked by descending cosine
    /// similarity to `query`.
    ///
    /// Degenerate queries (empty/blank text embeds to the zero vector) are
    /// tolerated: the first `top_k` chunks come back with score 0 instead
    /// of an error.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        log::debug!("Retrieving evidence for query '{query}' (top_k={top_k})");

        let query_vector = self.embedder.embed(query).await?;
        let degenerate = query_vector.iter().all(|x| *x == 0.0);

        let neighbors: Vec<(usize, f32)> = if degenerate {
            log::debug!("Degenerate query vector; returning corpus head");
            (0..self.order.len().min(top_k)).map(|i| (i, 0.0)).collect()
        } else {
            self.index.search(&query_vector, top_k)?
        };

        let mut results = Vec::with_capacity(neighbors.len());
        for (idx, score) in neighbors {
            let id = &self.order[idx];
            if let Some(stored) = self.chunks.get(id) {
                results.push(RetrievedChunk {
                    chunk: stored.chunk.clone(),
                    score,
                });
            }
        }

        log::debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }

    pub fn get_chunk(&self, id: &str) -> Option<&EvidenceChunk> {
        self.chunks.get(id).map(|s| &s.chunk)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
