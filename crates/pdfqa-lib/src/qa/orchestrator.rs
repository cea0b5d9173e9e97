use std::sync::Arc;

use tracing::{debug, error, info};

use super::cache::{CachedResult, QueryCache};
use super::prompt;
use super::sanitize;
use super::sources::{format_sources, with_source_warning};
use crate::config::QaConfig;
use crate::error::{OracleError, QaError};
use crate::oracle::AnswerOracle;
use crate::retrieval::Retriever;

/// An answer ready to show, with its citation lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaResponse {
    /// The sanitized query that was answered, safe to render as HTML.
    pub query: String,
    pub answer: String,
    pub sources: Vec<String>,
    /// Whether the answer came from the query cache.
    pub cached: bool,
}

/// Validates, sanitizes and answers queries against one retriever and oracle.
///
/// `answer` blocks on retrieval and the oracle; async callers run it on a
/// blocking worker (see [`crate::service::ChatService`]).
pub struct QaOrchestrator {
    retriever: Arc<dyn Retriever>,
    oracle: Arc<dyn AnswerOracle>,
    cache: Arc<QueryCache>,
    config: QaConfig,
}

impl QaOrchestrator {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        oracle: Arc<dyn AnswerOracle>,
        cache: Arc<QueryCache>,
        config: QaConfig,
    ) -> Self {
        Self {
            retriever,
            oracle,
            cache,
            config,
        }
    }

    /// Answer `raw`, consulting the cache first.
    ///
    /// Failures leave the cache untouched.
    pub fn answer(&self, raw: &str) -> Result<QaResponse, QaError> {
        let query = sanitize::prepare(raw, self.config.max_query_chars)?;

        let (result, cached) = match self.cache.get(&query) {
            Some(hit) => {
                debug!(query_len = query.len(), "Answer served from cache");
                (hit, true)
            }
            None => {
                let result = self.synthesize(&query).inspect_err(|e| {
                    error!(error = %e, "Failed to answer query");
                })?;
                self.cache.set(query.clone(), result.clone());
                (result, false)
            }
        };

        let sources = format_sources(&result.source_documents, self.config.display_sources);
        let answer = with_source_warning(result.answer, &sources);
        info!(
            cached,
            source_count = sources.len(),
            answer_len = answer.len(),
            "Answered query"
        );
        Ok(QaResponse {
            query,
            answer,
            sources,
            cached,
        })
    }

    fn synthesize(&self, query: &str) -> Result<CachedResult, QaError> {
        let chunks = self.retriever.retrieve(query).map_err(classify)?;
        debug!(retrieved = chunks.len(), "Retrieved context");

        let prompt = prompt::render(&chunks, query);
        let answer = self.oracle.complete(&prompt)?;
        debug!(oracle = %self.oracle.name(), "Oracle answered");

        Ok(CachedResult {
            answer,
            source_documents: chunks,
        })
    }
}

fn classify(err: anyhow::Error) -> QaError {
    match err.downcast::<OracleError>() {
        Ok(oracle) => QaError::Oracle(oracle),
        Err(other) => QaError::Internal(other),
    }
}
