use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Evidence store error: {0}")]
    Evidence(#[from] rca_evidence_store::EvidenceStoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of the generative endpoint itself. These never escape the
/// invocation adapter; they are folded into an error-shaped string so the
/// pipeline can degrade instead of failing the caller.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Response parse error: {0}")]
    Parse(String),
}
