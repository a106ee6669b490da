use rca_protocol::EvidenceKind;
use serde::{Deserialize, Serialize};

/// A retrievable unit of text from one of the two corpora.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceChunk {
    pub id: String,
    pub kind: EvidenceKind,
    /// Source/title label (case title, handbook section name, catalog tag).
    pub source: String,
    pub text: String,
    /// Mechanism tag, when a case record was labeled during ingestion.
    #[serde(default)]
    pub mechanism: Option<String>,
}

/// Chunk plus its embedding as kept inside the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub chunk: EvidenceChunk,
    pub vector: Vec<f32>,
}

/// Query-time result: a chunk annotated with its similarity score.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: EvidenceChunk,
    pub score: f32,
}

/// One line of the corpus JSONL file. The embedding is optional; records
/// without one are embedded at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub id: String,
    pub kind: EvidenceKind,
    #[serde(default)]
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub mechanism: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}
