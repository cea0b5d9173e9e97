use std::io::{Read, Write};

use pdfqa_lib::index::IndexAction;
use pdfqa_lib::pipeline::ingest::run_ingest;

use crate::output::ConsoleIO;
use crate::runtime::Runtime;

/// Run the `pdfqa ingest` command.
pub fn run_ingest_cmd<IN, OUT, ERR>(
    force: bool,
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: Read,
    OUT: Write,
    ERR: Write,
{
    let mut embedder = runtime.backend.embedder(&runtime.config)?;
    let report = run_ingest(&runtime.config, embedder.as_mut(), force)?;

    for failure in &report.failures {
        writeln!(
            io.stderr(),
            "Skipped {}: {}",
            failure.path.display(),
            failure.reason
        )?;
    }

    let index_dir = runtime.config.paths.index_path();
    match report.action {
        IndexAction::Built => writeln!(
            io.stdout(),
            "Built index with {} chunks at {}",
            report.chunk_count(),
            index_dir.display()
        )?,
        IndexAction::Reused => writeln!(
            io.stdout(),
            "Index is up to date ({} chunks) at {}",
            report.chunk_count(),
            index_dir.display()
        )?,
    }
    Ok(())
}
