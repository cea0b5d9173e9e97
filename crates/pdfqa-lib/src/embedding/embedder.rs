use std::fs;
use std::path::Path;

use anyhow::Context;
use fastembed::{
    InitOptionsUserDefined, Pooling, TextEmbedding, TokenizerFiles, UserDefinedEmbeddingModel,
};
use tracing::debug;

use crate::config::{EMBED_BATCH_SIZE, EMBEDDING_DIMENSION};

/// Subdirectory name under the model directory for all-MiniLM-L6-v2 files.
pub const MODEL_SUBDIR: &str = "all-minilm-l6-v2";

/// Identifier recorded in the index so a model swap forces a rebuild.
pub const MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Files that must be present in `<model_dir>/all-minilm-l6-v2/`.
pub const MODEL_FILES: [&str; 5] = [
    "model.onnx",
    "tokenizer.json",
    "config.json",
    "special_tokens_map.json",
    "tokenizer_config.json",
];

/// Maps text to fixed-length vectors.
///
/// Implementations must be deterministic for a fixed model and return
/// exactly one vector of [`Embed::dimension`] floats per input.
pub trait Embed: Send {
    fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Stable identifier of the underlying model.
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    fn embed_one(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .context("Embedder returned no vector")
    }
}

/// all-MiniLM-L6-v2 served by fastembed from files on disk.
pub struct FastEmbedder {
    model: TextEmbedding,
}

impl FastEmbedder {
    /// Load the model from `model_dir/all-minilm-l6-v2/`.
    ///
    /// If the files are not found, returns an error instructing the user to
    /// run `pdfqa model download`.
    pub fn new(model_dir: &Path) -> anyhow::Result<Self> {
        let base = model_dir.join(MODEL_SUBDIR);

        let onnx_bytes = fs::read(base.join("model.onnx")).with_context(|| {
            format!(
                "Embedding model not found at {}. Run 'pdfqa model download' first.",
                base.display()
            )
        })?;

        let read = |name: &str| {
            fs::read(base.join(name)).with_context(|| format!("Missing {name}"))
        };
        let tokenizer_files = TokenizerFiles {
            tokenizer_file: read("tokenizer.json")?,
            config_file: read("config.json")?,
            special_tokens_map_file: read("special_tokens_map.json")?,
            tokenizer_config_file: read("tokenizer_config.json")?,
        };

        let user_model =
            UserDefinedEmbeddingModel::new(onnx_bytes, tokenizer_files).with_pooling(Pooling::Mean);

        let model =
            TextEmbedding::try_new_from_user_defined(user_model, InitOptionsUserDefined::default())
                .context("Failed to initialize all-MiniLM-L6-v2")?;

        debug!(path = %base.display(), "Loaded embedding model");
        Ok(Self { model })
    }
}

impl Embed for FastEmbedder {
    fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        let owned: Vec<String> = texts.iter().map(|s| (*s).to_string()).collect();
        let mut embeddings = self
            .model
            .embed(owned, Some(EMBED_BATCH_SIZE))
            .context("Failed to embed texts")?;
        for vector in &mut embeddings {
            l2_normalize(vector);
        }
        Ok(embeddings)
    }

    fn model_id(&self) -> &str {
        MODEL_ID
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }
}

/// Scale `vector` to unit length in place. Zero vectors are left as-is.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfqa_test_util::model::{model_dir, model_files_present};

    fn model_embedder() -> FastEmbedder {
        assert!(
            model_files_present(MODEL_SUBDIR, &MODEL_FILES),
            "model files missing under {}; run 'pdfqa model download'",
            model_dir().display()
        );
        FastEmbedder::new(&model_dir()).unwrap()
    }

    #[test]
    fn normalize_yields_unit_length() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        let mut v = vec![0.0; 4];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn missing_model_points_at_download() {
        let tmp = tempfile::tempdir().unwrap();
        let Err(err) = FastEmbedder::new(tmp.path()) else {
            panic!("expected missing model error");
        };
        assert!(format!("{err:#}").contains("pdfqa model download"));
    }

    #[test]
    #[ignore = "requires downloaded model files"]
    fn embed_batch_returns_unit_vectors() {
        let mut embedder = model_embedder();
        let embeddings = embedder.embed_batch(&["hello world", "how are you"]).unwrap();
        assert_eq!(embeddings.len(), 2);
        for v in &embeddings {
            assert_eq!(v.len(), EMBEDDING_DIMENSION);
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    #[ignore = "requires downloaded model files"]
    fn embedding_is_deterministic() {
        let mut embedder = model_embedder();
        let a = embedder.embed_one("pressure limits").unwrap();
        let b = embedder.embed_one("pressure limits").unwrap();
        assert_eq!(a, b);
    }
}
