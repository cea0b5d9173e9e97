pub mod cache;
pub mod orchestrator;
pub mod prompt;
pub mod sanitize;
pub mod sources;

pub use cache::{CachedResult, QueryCache};
pub use orchestrator::{QaOrchestrator, QaResponse};
