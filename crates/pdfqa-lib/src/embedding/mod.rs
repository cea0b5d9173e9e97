pub mod embedder;

pub use embedder::{Embed, FastEmbedder, l2_normalize};
