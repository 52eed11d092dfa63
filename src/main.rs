//! code-critique binary entry point

use clap::Parser;
use code_critique::cli::{self, Cli};
use code_critique::CritiqueError;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also land here
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("code_critique={}", cli.log_level)));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn report_error(err: &anyhow::Error) {
    let (diagnosis, hint) = match err.downcast_ref::<CritiqueError>() {
        Some(e) => (e.to_string(), e.hint()),
        None => (
            format!("{:#}", err),
            "Re-run with --log-level debug for details".to_string(),
        ),
    };
    eprintln!("\n{} {}", style("error:").red().bold(), diagnosis);
    eprintln!("{} {}", style("hint:").yellow().bold(), hint);
}
