use clap::Args;
use serde_json::Value;

use ladder_core::ladder::plan::CashFlowPlan;
use ladder_core::ladder::planner::LadderOutput;
use ladder_core::ladder::summary;

use crate::input;

/// Arguments for re-summarizing a saved ladder
#[derive(Args)]
pub struct SummaryArgs {
    /// Path to the JSON written by `ladder plan --output json`
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let document: Value = if let Some(ref path) = args.input {
        input::file::read_json_value(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <plan.json> or stdin required for summary".into());
    };

    // Accept either the full envelope or just its result.
    let result = match document {
        Value::Object(mut map) if map.contains_key("result") => map.remove("result").unwrap_or_default(),
        other => other,
    };
    let saved: LadderOutput = serde_json::from_value(result)?;

    let plan = CashFlowPlan::from_rows(&saved.plan);
    let summary = summary::summarize(&plan, &saved.purchases);
    Ok(serde_json::to_value(summary)?)
}
