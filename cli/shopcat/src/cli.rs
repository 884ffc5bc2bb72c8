use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use shop_catalog::types::{
    CreateRequest,
    HealthStatus,
    SearchFilters,
    SearchRequest,
    SortDirection,
    SortEntry,
    SortField,
};
use shop_catalog::Catalog;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const SHORT_HELP: &str = "Search, inspect and create products in a store catalog.";
const LONG_HELP: &str = "Search, inspect and create products in a store catalog.

Results are printed to stdout as JSON. Store credentials are read from
$XDG_CONFIG_HOME/shopcat/shopcat.toml, a file passed with --config and
SHOPCAT_* environment variables, in increasing order of precedence.";

#[derive(Debug, Parser)]
#[command(about = SHORT_HELP, long_about = LONG_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Read configuration from this file in addition to the defaults.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity.
    ///
    /// Invoke multiple times for increasing detail.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Search products, one page at a time.")]
    Search(SearchArgs),
    #[command(about = "Show one product with all of its variants.")]
    Get(GetArgs),
    #[command(about = "List all inventory locations.")]
    Locations,
    #[command(about = "Create a product from a JSON file.")]
    Create(CreateArgs),
    #[command(about = "Check that the store can be reached.")]
    Health,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free text to search for.
    pub query: Option<String>,

    /// Page number, starting at 1.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Results per page.
    #[arg(long, default_value_t = shop_catalog::types::DEFAULT_PAGE_LIMIT)]
    pub limit: u32,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub vendor: Option<String>,

    #[arg(long, value_name = "PRICE")]
    pub price_min: Option<f64>,

    #[arg(long, value_name = "PRICE")]
    pub price_max: Option<f64>,

    /// Only show products with inventory.
    #[arg(long)]
    pub available_only: bool,

    /// Sort by FIELD or FIELD:asc / FIELD:desc.
    #[arg(long, value_name = "FIELD[:DIRECTION]", value_parser = parse_sort)]
    pub sort: Vec<SortEntry>,
}

impl From<SearchArgs> for SearchRequest {
    fn from(args: SearchArgs) -> Self {
        SearchRequest {
            query: args.query,
            page: args.page,
            limit: args.limit,
            filters: SearchFilters {
                category: args.category,
                vendor: args.vendor,
                price_min: args.price_min,
                price_max: args.price_max,
                available_only: args.available_only,
            },
            sort: args.sort,
        }
    }
}

fn parse_sort(value: &str) -> Result<SortEntry, String> {
    let (field, direction) = match value.split_once(':') {
        Some((field, "asc")) => (field, SortDirection::Asc),
        Some((field, "desc")) => (field, SortDirection::Desc),
        Some((_, other)) => return Err(format!("unknown sort direction '{other}'")),
        None => (value, SortDirection::Asc),
    };
    let field = field.parse::<SortField>().map_err(|err| err.to_string())?;
    Ok(SortEntry { field, direction })
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Numeric product id or global product id.
    pub identifier: String,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// JSON file describing the product.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Result of running a command.
#[derive(Debug, PartialEq)]
pub struct Outcome {
    pub output: Value,
    pub success: bool,
}

impl Outcome {
    fn success(output: Value) -> Self {
        Self {
            output,
            success: true,
        }
    }
}

impl Command {
    pub async fn handle(self, catalog: &Catalog, cancel: &CancellationToken) -> Result<Outcome> {
        debug!(command = ?self, "running command");
        let outcome = match self {
            Command::Search(args) => {
                let page = catalog.search(&args.into()).await?;
                Outcome::success(serde_json::to_value(page)?)
            },
            Command::Get(args) => {
                let record = catalog.get_by_identifier(&args.identifier).await?;
                Outcome::success(serde_json::to_value(record)?)
            },
            Command::Locations => {
                let locations = catalog.list_locations().await?;
                Outcome::success(serde_json::to_value(locations)?)
            },
            Command::Create(args) => {
                let contents = std::fs::read_to_string(&args.file)
                    .with_context(|| format!("Could not read '{}'", args.file.display()))?;
                let request: CreateRequest = serde_json::from_str(&contents)
                    .with_context(|| format!("Could not parse '{}'", args.file.display()))?;
                let id = catalog.create_with_cancellation(&request, cancel).await?;
                Outcome::success(serde_json::json!({ "id": id }))
            },
            Command::Health => {
                let report = catalog.check_health().await;
                Outcome {
                    success: report.status != HealthStatus::Error,
                    output: serde_json::to_value(report)?,
                }
            },
        };
        Ok(outcome)
    }
}
