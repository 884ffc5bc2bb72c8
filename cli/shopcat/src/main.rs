use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use shop_catalog::Catalog;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::Cli;
use crate::config::{Config, ConfigSources};
use crate::logger::init_logger;

mod cli;
mod config;
mod logger;

async fn run(args: Cli) -> Result<bool> {
    let config = Config::load(ConfigSources::from_process(args.config.as_deref()))?;
    debug!(store_url = ?config.store_url, mock_data = ?config.mock_data, "loaded config");

    let catalog = Catalog::new(config.client_config()?).context("Could not set up the catalog")?;

    // Ctrl-C stops waiting on a background product creation
    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = args.command.handle(&catalog, &cancel).await;
    ctrl_c.abort();
    let outcome = outcome?;

    println!("{}", serde_json::to_string_pretty(&outcome.output)?);
    Ok(outcome.success)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    if let Err(err) = init_logger(args.verbose) {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        },
    }
}
