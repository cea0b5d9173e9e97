pub mod fingerprint;
pub mod manager;
pub mod vector;

pub use manager::{INDEX_FILE, IndexAction, IndexManager, IndexOutcome, is_valid};
pub use vector::VectorIndex;
