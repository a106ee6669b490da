//! # RCA Agents
//!
//! The retrieval-and-reasoning pipeline for failure-mechanism diagnosis:
//! query building, evidence selection, the mechanism reasoner, the
//! recommendation generator, and the generative-invocation adapter they
//! share.
//!
//! Design stance: generative-model unreliability never fails the caller.
//! Transport failures and malformed output are folded into error-shaped
//! strings at the adapter, and each generative step degrades to a fixed,
//! schema-valid fallback. Only evidence-store problems surface as errors.

mod error;
mod llm;
mod pipeline;
mod prompts;
mod query;
mod recommend;
mod reasoner;
mod select;

pub use error::{AgentError, LlmError, Result};
pub use llm::{invoke, ChatModel, OpenAiChat};
pub use pipeline::{analyze, AnalysisOptions};
pub use query::build_query;
pub use recommend::{deterministic_gaps, recommend};
pub use reasoner::{candidate_mechanisms, reason};
pub use select::{EvidenceSelector, SelectedEvidence, DEFAULT_TOP_K, MAX_CASES, MAX_HANDBOOK};

// Re-export the shared record types so binary callers need one import.
pub use rca_protocol::{
    AnalysisReport, HandbookSnippet, Incident, Mechanism, MechanismsOut, RecsOut, SimilarCase,
};
