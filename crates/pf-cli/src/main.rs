//! posterframe CLI entry point

use clap::Parser;
use pf_cli::cli::formatter_for;
use pf_cli::config::CliOverrides;
use pf_cli::{Cli, Config, ExitCode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let config = match Config::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Config error: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    let overrides = CliOverrides {
        output_format: cli.output.map(|format| format.to_string()),
        verbose: if cli.verbose { Some(true) } else { None },
        debug: if cli.debug { Some(true) } else { None },
        ..Default::default()
    };
    let config = config.with_overrides(&overrides);

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Logs go to stderr so JSON on stdout stays parseable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let formatter = formatter_for(&config);
    match cli.execute_with_config(config).await {
        Ok(code) => code.to_exit_code(),
        Err(e) => {
            let code = ExitCode::GeneralError;
            formatter.report_error(&format!("{e:#}"), code);
            code.to_exit_code()
        }
    }
}
