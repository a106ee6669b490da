//! # RCA Evidence Store
//!
//! Storage and similarity retrieval for the two evidence corpora (prior
//! case studies and handbook/standard excerpts), plus the deterministic
//! reference catalog of mechanism definitions.
//!
//! The store is loaded once from a prebuilt JSONL corpus and treated as
//! read-only for the life of the process. Retrieval embeds the query and
//! runs a cosine nearest-neighbor scan; degenerate queries (empty text)
//! return a best-effort result instead of failing.

mod catalog;
mod embeddings;
mod error;
mod index;
mod shared;
mod store;
mod types;

pub use catalog::{CatalogEntry, MechanismCatalog, MultiText, CATALOG_TAG};
pub use embeddings::{cosine_similarity, Embedder, HashingEmbedder};
pub use error::{EvidenceStoreError, Result};
pub use index::NnIndex;
pub use shared::SharedStore;
pub use store::EvidenceStore;
pub use types::{CorpusRecord, EvidenceChunk, RetrievedChunk, StoredChunk};

// Re-export the protocol kinds for convenience.
pub use rca_protocol::EvidenceKind;
