use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use ladder_core::ladder::security::Security;
use ladder_core::ladder::yield_adjuster::{rank_candidates, RankingInput, DEFAULT_CASH_YIELD};

use crate::commands::catalog::CatalogSource;
use crate::input;

/// Arguments for scoring candidates at one horizon
#[derive(Args)]
pub struct YieldsArgs {
    /// JSON file holding a list of securities (alternative to --catalog)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub source: CatalogSource,

    /// Latest date the cash is needed (YYYY-MM-DD)
    #[arg(long)]
    pub horizon: NaiveDate,

    /// Annual yield on idle cash as a decimal
    #[arg(long)]
    pub cash_yield: Option<Decimal>,

    /// Ignore securities maturing more than this many months early
    #[arg(long)]
    pub max_idle_months: Option<u32>,

    /// Show only the best N candidates
    #[arg(long)]
    pub top: Option<usize>,
}

pub fn run_yields(args: YieldsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let securities: Vec<Security> = if !args.source.is_empty() {
        args.source.load()?.securities
    } else if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(list) = input::stdin::read_stdin()? {
        list
    } else {
        return Err("--catalog <export.csv>, --input <securities.json> or stdin required".into());
    };

    let ranking = RankingInput {
        securities,
        horizon: args.horizon,
        cash_yield: args.cash_yield.unwrap_or(DEFAULT_CASH_YIELD),
        max_idle_months: args.max_idle_months,
        top: args.top,
    };
    let output = rank_candidates(&ranking)?;
    Ok(serde_json::to_value(output)?)
}
