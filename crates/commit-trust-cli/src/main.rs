use clap::Parser;

mod args;
mod config;
pub mod exit_codes;
mod git;
mod output;
mod run;

use args::Cli;
use config::RunConfig;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    // Logs go to stderr; stdout carries only the outcome.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = RunConfig::from(&cli);

    let report = run::run(&config, interrupted()).await;

    let code = match output::emit(&report.outcome, cli.pretty) {
        Ok(()) => report.exit_code,
        Err(e) => {
            tracing::error!(error = ?e, "failed to write outcome");
            exit_codes::CONFIG_ERROR
        }
    };
    std::process::exit(code);
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
