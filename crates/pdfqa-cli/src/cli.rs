use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pdfqa", about = "Ask questions about a local folder of PDFs")]
pub struct Cli {
    /// Directory containing `documents/` and `databases/`.
    #[arg(long, global = true, env = "PDFQA_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long, global = true, env = "PDFQA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the downloaded embedding model.
    #[arg(long, global = true, env = "PDFQA_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Base URL of the Ollama server.
    #[arg(long, global = true, env = "PDFQA_OLLAMA_URL")]
    pub ollama_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the vector index from the documents folder, or reuse it if current.
    Ingest {
        /// Rebuild even if a current index exists.
        #[arg(long)]
        force: bool,
    },

    /// Answer a single question. Pass `-` to read it from stdin.
    Ask {
        question: String,
    },

    /// Interactive question loop. `/history` shows the transcript, `/quit` exits.
    Chat,

    /// Show the state of the persisted index.
    Status,

    /// Manage the embedding model.
    Model {
        #[command(subcommand)]
        model_command: ModelCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModelCommand {
    /// Download the embedding model files from Hugging Face.
    Download {
        /// Force re-download even if files already exist.
        #[arg(long)]
        force: bool,
    },
}
