//! Caller-facing error taxonomy.
//!
//! Internal plumbing uses `anyhow`; these enums mark the boundaries where an
//! error has to be classified before it reaches a user.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of an external model (embedding or answer synthesis).
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("oracle unreachable: {0}")]
    Unreachable(String),

    #[error("oracle timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("oracle returned HTTP {status}")]
    Status { status: u16 },

    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),

    #[error("embedding failed: {0}")]
    Embedding(String),
}

/// Failure to obtain a usable vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("no PDF documents found under {}", path.display())]
    NoCorpus { path: PathBuf },

    #[error("persisted index at {} is unusable: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("index build failed: {0:#}")]
    Build(anyhow::Error),
}

/// Errors surfaced by the QA orchestrator.
#[derive(Debug, Error)]
pub enum QaError {
    #[error("Query is empty. Please type a question.")]
    EmptyQuery,

    #[error("Query is too long ({len} characters, maximum is {max}).")]
    QueryTooLong { len: usize, max: usize },

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl QaError {
    /// Whether the caller can fix this by editing the query.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyQuery | Self::QueryTooLong { .. })
    }

    /// Message safe to show to an end user.
    ///
    /// Validation messages are returned verbatim; everything else collapses
    /// to a generic sentence so oracle payloads and internal detail stay in
    /// the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyQuery | Self::QueryTooLong { .. } => self.to_string(),
            Self::Oracle(_) => "Inference failed. Please try again in a moment.".to_string(),
            Self::Index(_) => "The document index is not available.".to_string(),
            Self::Internal(_) => "Something went wrong while answering your question.".to_string(),
        }
    }
}

/// A PDF that could not be read during a corpus scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionFailure {
    pub path: PathBuf,
    pub reason: String,
}
