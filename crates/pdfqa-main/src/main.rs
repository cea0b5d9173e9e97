use std::process::ExitCode;

use pdfqa_cli::logging::init_logging;
use pdfqa_cli::output::StdIO;
use pdfqa_cli::runtime::ModelBackend;

fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {e:#}");
    }

    let args: Vec<String> = std::env::args().collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let mut io = StdIO::new();

    match pdfqa_cli::try_run(&args, &ModelBackend, &mut io) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Help and version requests surface as clap errors too.
            if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
                let _ = clap_err.print();
                return if clap_err.use_stderr() {
                    ExitCode::from(2)
                } else {
                    ExitCode::SUCCESS
                };
            }
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
