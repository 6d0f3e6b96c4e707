use napi::Result as NapiResult;
use napi_derive::napi;
use serde_json::Value;

use ladder_core::ladder::plan::CashFlowPlan;
use ladder_core::ladder::planner::{self, LadderInput, LadderOutput};
use ladder_core::ladder::summary;
use ladder_core::ladder::yield_adjuster::{self, RankingInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

#[napi]
pub fn plan_ladder(input_json: String) -> NapiResult<String> {
    let input: LadderInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = planner::plan_ladder(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn adjusted_yields(input_json: String) -> NapiResult<String> {
    let input: RankingInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = yield_adjuster::rank_candidates(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Accepts a planLadder envelope or its bare `result`.
#[napi]
pub fn summarize_ladder(plan_json: String) -> NapiResult<String> {
    let document: Value = serde_json::from_str(&plan_json).map_err(to_napi_error)?;
    let result = match document {
        Value::Object(mut map) if map.contains_key("result") => {
            map.remove("result").unwrap_or_default()
        }
        other => other,
    };
    let saved: LadderOutput = serde_json::from_value(result).map_err(to_napi_error)?;

    let plan = CashFlowPlan::from_rows(&saved.plan);
    let output = summary::summarize(&plan, &saved.purchases);
    serde_json::to_string(&output).map_err(to_napi_error)
}
