pub mod ollama;

pub use ollama::OllamaClient;

use crate::error::OracleError;

/// A text-completion service that turns a fully rendered prompt into an
/// answer.
pub trait AnswerOracle: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, OracleError>;

    /// Model name, for logging.
    fn name(&self) -> &str;
}
