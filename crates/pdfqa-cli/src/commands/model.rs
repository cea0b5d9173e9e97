use std::io::{Read, Write};

use anyhow::Context;
use pdfqa_lib::embedding::embedder::{MODEL_FILES, MODEL_SUBDIR};
use tracing::info;

use crate::output::ConsoleIO;
use crate::runtime::{Runtime, ensure_dir};

/// Hugging Face repository with an ONNX export of all-MiniLM-L6-v2.
const HF_REPO: &str = "Xenova/all-MiniLM-L6-v2";

/// Repository path for a local file name in [`MODEL_FILES`].
fn remote_path(local_name: &str) -> String {
    if local_name == "model.onnx" {
        format!("onnx/{local_name}")
    } else {
        local_name.to_string()
    }
}

/// Run the `pdfqa model download` command.
pub fn run_model_download<IN, OUT, ERR>(
    force: bool,
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: Read,
    OUT: Write,
    ERR: Write,
{
    let model_dir = runtime.config.paths.model_dir.join(MODEL_SUBDIR);

    if force && model_dir.exists() {
        writeln!(io.stderr(), "Removing existing model files...")?;
        std::fs::remove_dir_all(&model_dir)
            .with_context(|| format!("Failed to remove {}", model_dir.display()))?;
    }

    if MODEL_FILES
        .iter()
        .all(|local| model_dir.join(local).exists())
    {
        writeln!(
            io.stdout(),
            "Model already downloaded at {}",
            model_dir.display()
        )?;
        return Ok(());
    }

    ensure_dir(&model_dir)?;

    writeln!(io.stderr(), "Downloading all-MiniLM-L6-v2...")?;
    let api = hf_hub::api::sync::Api::new()?;
    let repo = api.model(HF_REPO.to_string());

    for local_name in MODEL_FILES {
        let dest = model_dir.join(local_name);
        if dest.exists() {
            writeln!(io.stderr(), "  {local_name} (cached)")?;
            continue;
        }
        writeln!(io.stderr(), "  {local_name}...")?;
        let cached = repo
            .get(&remote_path(local_name))
            .with_context(|| format!("Failed to download {local_name} from {HF_REPO}"))?;
        std::fs::copy(&cached, &dest)
            .with_context(|| format!("Failed to write {}", dest.display()))?;
    }

    info!(model_dir = %model_dir.display(), "Embedding model downloaded");
    writeln!(io.stdout(), "Model downloaded to {}", model_dir.display())?;
    Ok(())
}
