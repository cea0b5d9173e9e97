pub mod ask;
pub mod chat;
pub mod ingest;
pub mod model;
pub mod status;

use pdfqa_lib::pipeline::ingest::run_ingest;
use pdfqa_lib::pipeline::query::build_orchestrator;
use pdfqa_lib::qa::QaOrchestrator;

use crate::runtime::Runtime;

/// Load (or build) the index and wire it to the backend's models.
pub(crate) fn open_orchestrator(runtime: &Runtime) -> anyhow::Result<QaOrchestrator> {
    let mut embedder = runtime.backend.embedder(&runtime.config)?;
    let report = run_ingest(&runtime.config, embedder.as_mut(), false)?;
    let oracle = runtime.backend.oracle(&runtime.config)?;
    build_orchestrator(&runtime.config, report.index, embedder, oracle)
}
