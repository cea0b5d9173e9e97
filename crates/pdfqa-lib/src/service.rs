use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error};

use crate::error::{OracleError, QaError};
use crate::qa::QaOrchestrator;
use crate::transcript::{ChatTurn, Transcript};

/// Result of [`ChatService::submit_query`].
///
/// Both variants carry the transcript as it stands after the call; a rejected
/// query leaves it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitResult {
    Answered {
        answer: String,
        sources: Vec<String>,
        transcript: Vec<ChatTurn>,
    },
    Rejected {
        /// Caller-safe message.
        error: String,
        /// The query itself was invalid, as opposed to a pipeline failure.
        validation: bool,
        transcript: Vec<ChatTurn>,
    },
}

/// Async front door over a [`QaOrchestrator`] and a shared [`Transcript`].
pub struct ChatService {
    qa: Arc<QaOrchestrator>,
    transcript: Arc<Transcript>,
    deadline: Duration,
}

impl ChatService {
    pub fn new(qa: Arc<QaOrchestrator>, transcript: Arc<Transcript>, deadline: Duration) -> Self {
        Self {
            qa,
            transcript,
            deadline,
        }
    }

    /// Answer `raw` on the blocking pool, failing with a timeout once the
    /// deadline passes.
    pub async fn submit_query(&self, raw: &str) -> SubmitResult {
        let qa = Arc::clone(&self.qa);
        let query = raw.to_string();
        let task = tokio::task::spawn_blocking(move || qa.answer(&query));

        let result = match tokio::time::timeout(self.deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(QaError::Internal(anyhow::anyhow!(
                "answer task failed: {join_err}"
            ))),
            Err(_) => Err(QaError::Oracle(OracleError::Timeout {
                secs: self.deadline.as_secs(),
            })),
        };

        match result {
            Ok(response) => {
                self.transcript.push(ChatTurn::new(
                    response.query.clone(),
                    response.answer.clone(),
                    response.sources.clone(),
                ));
                SubmitResult::Answered {
                    answer: response.answer,
                    sources: response.sources,
                    transcript: self.transcript.snapshot(),
                }
            }
            Err(e) => {
                let validation = e.is_validation();
                if validation {
                    debug!(error = %e, "Rejected query");
                } else {
                    error!(error = %format!("{e:#}"), "Query failed");
                }
                SubmitResult::Rejected {
                    error: e.user_message(),
                    validation,
                    transcript: self.transcript.snapshot(),
                }
            }
        }
    }

    /// Snapshot of the chat history.
    pub fn transcript(&self) -> Vec<ChatTurn> {
        self.transcript.snapshot()
    }

}
