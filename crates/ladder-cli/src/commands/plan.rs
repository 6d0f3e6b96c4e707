use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

use ladder_core::ladder::planner::{self, LadderInput, TargetSchedule};
use ladder_core::ladder::yield_adjuster::DEFAULT_CASH_YIELD;
use ladder_core::{Money, Year};

use crate::commands::catalog::CatalogSource;
use crate::input;

/// Arguments for ladder planning
#[derive(Args)]
pub struct PlanArgs {
    /// Path to JSON input file (flags below override its fields)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub source: CatalogSource,

    /// Monthly targets per year (comma-separated, e.g. "2025=33000,2026=33500")
    #[arg(long, value_delimiter = ',')]
    pub targets: Option<Vec<String>>,

    /// First year of a linear target schedule
    #[arg(long)]
    pub from: Option<Year>,

    /// Last year of a linear target schedule
    #[arg(long)]
    pub to: Option<Year>,

    /// Monthly target in the first year of a linear schedule
    #[arg(long)]
    pub base_monthly: Option<Decimal>,

    /// Yearly increase of the monthly target in a linear schedule
    #[arg(long, default_value = "0")]
    pub annual_step: Decimal,

    /// Annual yield on idle cash as a decimal (default 0.01)
    #[arg(long)]
    pub cash_yield: Option<Decimal>,

    /// Ignore securities maturing more than this many months early
    #[arg(long)]
    pub max_idle_months: Option<u32>,

    /// Return a partially funded ladder instead of failing on a coverage gap
    #[arg(long)]
    pub allow_partial: bool,
}

pub fn run_plan(args: PlanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let document: Option<LadderInput> = if let Some(ref path) = args.input {
        Some(input::file::read_json(path)?)
    } else if args.source.is_empty() {
        input::stdin::read_stdin()?
    } else {
        None
    };

    if document.is_none() && args.source.is_empty() {
        return Err("--input <file.json>, --catalog <export.csv> or stdin required".into());
    }

    let mut ladder_input = document.unwrap_or_else(|| LadderInput {
        securities: Vec::new(),
        target_monthly_cashflow_by_year: BTreeMap::new(),
        cash_yield: DEFAULT_CASH_YIELD,
        max_idle_months: None,
        allow_partial: false,
    });

    if !args.source.is_empty() {
        let catalog = args.source.load()?;
        tracing::info!(
            accepted = catalog.report.accepted,
            skipped = catalog.report.skipped,
            duplicates = catalog.report.duplicates,
            "catalog loaded"
        );
        ladder_input.securities = catalog.securities;
    }

    if let Some(targets) = targets_from_args(&args)? {
        ladder_input.target_monthly_cashflow_by_year = targets;
    }
    if ladder_input.target_monthly_cashflow_by_year.is_empty() {
        return Err("No targets given: use --targets, --from/--to/--base-monthly or an input file".into());
    }

    if let Some(cash_yield) = args.cash_yield {
        ladder_input.cash_yield = cash_yield;
    }
    if args.max_idle_months.is_some() {
        ladder_input.max_idle_months = args.max_idle_months;
    }
    if args.allow_partial {
        ladder_input.allow_partial = true;
    }

    let result = planner::plan_ladder(&ladder_input)?;
    Ok(serde_json::to_value(result)?)
}

fn targets_from_args(
    args: &PlanArgs,
) -> Result<Option<BTreeMap<Year, Money>>, Box<dyn std::error::Error>> {
    if let Some(ref pairs) = args.targets {
        let mut targets = BTreeMap::new();
        for pair in pairs {
            let (year, amount) = pair
                .split_once('=')
                .ok_or_else(|| format!("Invalid target '{pair}', expected YEAR=AMOUNT"))?;
            let year: Year = year
                .trim()
                .parse()
                .map_err(|_| format!("Invalid year in target '{pair}'"))?;
            let amount = Decimal::from_str(amount.trim())
                .map_err(|_| format!("Invalid amount in target '{pair}'"))?;
            targets.insert(year, amount);
        }
        return Ok(Some(targets));
    }

    match (args.from, args.to, args.base_monthly) {
        (Some(from), Some(to), Some(base)) => {
            let schedule = TargetSchedule::linear(from, to, base, args.annual_step);
            Ok(Some(schedule.to_targets()?))
        }
        (None, None, None) => Ok(None),
        _ => Err("--from, --to and --base-monthly must be given together".into()),
    }
}
