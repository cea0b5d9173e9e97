use std::path::PathBuf;

/// Embedding model directory for model-dependent tests.
///
/// `PDFQA_MODEL_DIR` wins; otherwise `~/.pdfqa/models`, the same default the
/// CLI downloads into.
pub fn model_dir() -> PathBuf {
    match std::env::var_os("PDFQA_MODEL_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .unwrap_or_default()
            .join(".pdfqa")
            .join("models"),
    }
}

/// Whether `model_dir()/subdir` holds every file in `files`.
pub fn model_files_present(subdir: &str, files: &[&str]) -> bool {
    let dir = model_dir().join(subdir);
    files.iter().all(|file| dir.join(file).is_file())
}
