use std::io::{Read, Write};

use pdfqa_lib::qa::sanitize;

use super::open_orchestrator;
use crate::output::{ConsoleIO, write_response};
use crate::runtime::Runtime;

/// Run the `pdfqa ask` command. A question of `-` is read from stdin.
///
/// The question is validated before any model is loaded, so a bad query
/// fails fast.
pub fn run_ask<IN, OUT, ERR>(
    question: &str,
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: Read,
    OUT: Write,
    ERR: Write,
{
    let question = if question == "-" {
        let mut buf = String::new();
        io.stdin().read_to_string(&mut buf)?;
        buf
    } else {
        question.to_string()
    };

    if let Err(e) = sanitize::prepare(&question, runtime.config.qa.max_query_chars) {
        anyhow::bail!(e.user_message());
    }

    let qa = open_orchestrator(runtime)?;
    match qa.answer(&question) {
        Ok(response) => {
            write_response(io.stdout(), &response)?;
            Ok(())
        }
        Err(e) => anyhow::bail!(e.user_message()),
    }
}
