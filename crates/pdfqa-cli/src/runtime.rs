use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use pdfqa_lib::config::AppConfig;
use pdfqa_lib::embedding::embedder::MODEL_ID;
use pdfqa_lib::embedding::{Embed, FastEmbedder};
use pdfqa_lib::oracle::{AnswerOracle, OllamaClient};

use crate::cli::Cli;

/// Factory for the model-backed collaborators, so commands can run against
/// fakes in tests.
pub trait Backend {
    /// Identifier of the embedding model `embedder` would load.
    fn model_id(&self) -> String;

    fn embedder(&self, config: &AppConfig) -> anyhow::Result<Box<dyn Embed>>;

    fn oracle(&self, config: &AppConfig) -> anyhow::Result<Arc<dyn AnswerOracle>>;
}

/// all-MiniLM-L6-v2 through fastembed and an Ollama server.
pub struct ModelBackend;

impl Backend for ModelBackend {
    fn model_id(&self) -> String {
        MODEL_ID.to_string()
    }

    fn embedder(&self, config: &AppConfig) -> anyhow::Result<Box<dyn Embed>> {
        Ok(Box::new(FastEmbedder::new(&config.paths.model_dir)?))
    }

    fn oracle(&self, config: &AppConfig) -> anyhow::Result<Arc<dyn AnswerOracle>> {
        Ok(Arc::new(OllamaClient::new(config.oracle.clone())?))
    }
}

/// Resolved configuration plus the backend commands draw models from.
pub struct Runtime<'a> {
    pub config: AppConfig,
    pub backend: &'a dyn Backend,
}

impl<'a> Runtime<'a> {
    pub fn new(config: AppConfig, backend: &'a dyn Backend) -> Self {
        Self { config, backend }
    }
}

/// Load the config file named by `--config` (if any) and apply flag overrides.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(base) = &cli.base_dir {
        config.paths.base_dir.clone_from(base);
    }
    if let Some(model_dir) = &cli.model_dir {
        config.paths.model_dir.clone_from(model_dir);
    }
    if let Some(url) = &cli.ollama_url {
        config.oracle.base_url.clone_from(url);
    }
    Ok(config)
}

/// Ensure `dir` exists, for commands that write into it.
pub fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}
