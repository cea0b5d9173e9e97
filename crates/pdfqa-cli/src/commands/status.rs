use std::io::{Read, Write};

use pdfqa_lib::pipeline::ingest::index_manager;

use crate::output::ConsoleIO;
use crate::runtime::Runtime;

/// Run the `pdfqa status` command. Loads no models.
pub fn run_status<IN, OUT, ERR>(
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: Read,
    OUT: Write,
    ERR: Write,
{
    let manager = index_manager(&runtime.config);
    let status = manager.status(&runtime.backend.model_id())?;
    let out = io.stdout();

    writeln!(out, "Index:     {}", status.path.display())?;
    writeln!(out, "Documents: {}", manager.documents_dir().display())?;
    writeln!(out, "Valid:     {}", if status.valid { "yes" } else { "no" })?;

    let Some(meta) = &status.meta else {
        writeln!(out, "No index has been built yet. Run 'pdfqa ingest'.")?;
        return Ok(());
    };
    writeln!(out, "Chunks:    {}", meta.chunk_count)?;
    writeln!(out, "Model:     {} ({} dimensions)", meta.model_id, meta.dimension)?;
    writeln!(out, "Built at:  {}", meta.built_at)?;
    let corpus = match status.fingerprint_matches {
        Some(true) => "up to date",
        Some(false) => "changed since last build (run 'pdfqa ingest')",
        None => "unknown (documents folder missing)",
    };
    writeln!(out, "Corpus:    {corpus}")?;
    Ok(())
}
