//! Doppel CLI: generate test doubles for Rust structs
//!
//! ## Usage
//!
//! ```bash
//! doppel Engine                       # scan ., write ./engine_mock.rs
//! doppel -C crates/app -o tests Engine
//! doppel --catalog types.yaml --stdout Engine
//! ```

use clap::Parser;
use doppel_cli::{logging, Cli, CliConfig, CliError, CliResult, Emitted};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.has_message() {
                eprintln!("{e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap prints help, version and usage errors itself
            let _ = e.print();
            return if e.use_stderr() {
                Err(CliError::Silent)
            } else {
                Ok(())
            };
        }
    };

    let config = CliConfig::from_cli(&cli)?;
    logging::init(config.verbosity, config.log_format);
    tracing::debug!(?config, "starting");

    let mut stdout = std::io::stdout().lock();
    match doppel_cli::run(&config, &mut stdout)? {
        Emitted::Written(path) => {
            tracing::info!(type_name = %config.type_name, path = %path.display(), "generated");
        }
        Emitted::Printed => {}
    }
    Ok(())
}
