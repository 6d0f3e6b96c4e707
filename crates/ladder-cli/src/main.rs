mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use commands::catalog::CatalogArgs;
use commands::plan::PlanArgs;
use commands::summary::SummaryArgs;
use commands::yields::YieldsArgs;

/// Bond ladder planning against a yearly cash-flow target
#[derive(Parser)]
#[command(
    name = "ladder",
    version,
    about = "Bond ladder planning against a yearly cash-flow target",
    long_about = "Selects which securities to buy, and how many, so that maturities \
                  and coupons fund a monthly cash need year by year. Works backward \
                  from the last year, always buying the best cash-adjusted yield."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log filter, e.g. "debug" or "ladder_core=trace"
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a bond ladder from a catalog and yearly targets
    Plan(PlanArgs),
    /// Load and clean brokerage exports into a catalog
    Catalog(CatalogArgs),
    /// Rank candidate securities by cash-adjusted yield for one horizon
    Yields(YieldsArgs),
    /// Recompute investment, payout, IRR and MOIC for a saved plan
    Summary(SummaryArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Plan(args) => commands::plan::run_plan(args),
        Commands::Catalog(args) => commands::catalog::run_catalog(args),
        Commands::Yields(args) => commands::yields::run_yields(args),
        Commands::Summary(args) => commands::summary::run_summary(args),
        Commands::Version => {
            println!("ladder {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
