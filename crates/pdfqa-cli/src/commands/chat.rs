use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use pdfqa_lib::service::{ChatService, SubmitResult};
use pdfqa_lib::transcript::Transcript;
use tracing::debug;

use super::open_orchestrator;
use crate::output::{ConsoleIO, read_line, write_answer, write_transcript};
use crate::runtime::Runtime;

const HISTORY_COMMAND: &str = "/history";
const QUIT_COMMANDS: [&str; 2] = ["/quit", "/exit"];

/// Run the interactive `pdfqa chat` loop until `/quit` or end of input.
pub fn run_chat<IN, OUT, ERR>(
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: Read,
    OUT: Write,
    ERR: Write,
{
    // Models and the blocking HTTP client are created outside the async
    // runtime and dropped after it.
    let qa = open_orchestrator(runtime)?;
    let service = ChatService::new(
        Arc::new(qa),
        Arc::new(Transcript::new()),
        Duration::from_secs(runtime.config.qa.request_timeout_secs),
    );
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    writeln!(
        io.stderr(),
        "Ask a question about your documents. {HISTORY_COMMAND} shows past answers, /quit exits."
    )?;

    loop {
        write!(io.stderr(), "> ")?;
        io.stderr().flush()?;
        let Some(line) = read_line(io.stdin())? else {
            break;
        };
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if QUIT_COMMANDS.contains(&input) {
            break;
        }
        if input == HISTORY_COMMAND {
            write_transcript(io.stdout(), &service.transcript())?;
            continue;
        }

        match rt.block_on(service.submit_query(input)) {
            SubmitResult::Answered {
                answer, sources, ..
            } => {
                write_answer(io.stdout(), &answer, &sources)?;
                writeln!(io.stdout())?;
            }
            SubmitResult::Rejected {
                error, validation, ..
            } => {
                debug!(validation, "Query rejected");
                writeln!(io.stderr(), "{error}")?;
            }
        }
    }

    debug!(turns = service.transcript().len(), "Chat session ended");
    Ok(())
}
