pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;
pub mod runtime;

#[cfg(test)]
pub mod test_util;

use std::io::{Read, Write};

use clap::Parser;

use cli::{Cli, Command, ModelCommand};
use output::ConsoleIO;
use runtime::{Backend, Runtime, resolve_config};

/// Main CLI entry point. Parses args, resolves configuration and dispatches
/// to the appropriate command.
pub fn try_run<IN, OUT, ERR>(
    args: &[&str],
    backend: &dyn Backend,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: Read,
    OUT: Write,
    ERR: Write,
{
    let cli = Cli::try_parse_from(args)?;
    let config = resolve_config(&cli)?;
    let runtime = Runtime::new(config, backend);

    match cli.command {
        Command::Ingest { force } => commands::ingest::run_ingest_cmd(force, &runtime, io),
        Command::Ask { question } => commands::ask::run_ask(&question, &runtime, io),
        Command::Chat => commands::chat::run_chat(&runtime, io),
        Command::Status => commands::status::run_status(&runtime, io),
        Command::Model { model_command } => match model_command {
            ModelCommand::Download { force } => {
                commands::model::run_model_download(force, &runtime, io)
            }
        },
    }
}
