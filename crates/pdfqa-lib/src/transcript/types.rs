use serde::{Deserialize, Serialize};

/// One answered question, kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub user_query: String,
    pub answer: String,
    pub source_citations: Vec<String>,
    /// RFC 3339 time the answer completed.
    pub answered_at: String,
}

impl ChatTurn {
    pub fn new(user_query: String, answer: String, source_citations: Vec<String>) -> Self {
        Self {
            user_query,
            answer,
            source_citations,
            answered_at: jiff::Timestamp::now().to_string(),
        }
    }
}
