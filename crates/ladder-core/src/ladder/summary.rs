use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::ladder::plan::CashFlowPlan;
use crate::ladder::security::Security;
use crate::time_value;
use crate::types::{Money, Multiple, Rate};

const IRR_GUESS: Rate = dec!(0.05);

/// Headline figures for a finished ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderSummary {
    /// Σ price × quantity over purchased securities
    pub total_investment: Money,
    /// Σ twelve months of target over all plan years
    #[serde(default)]
    pub total_target: Money,
    /// Σ cash received over all plan years
    pub total_cashflow: Money,
    /// IRR of `[-investment, year 1, year 2, ...]`; `None` when not computable
    pub irr: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irr_note: Option<String>,
    /// Multiple on invested capital
    pub moic: Option<Multiple>,
    pub securities_purchased: usize,
    pub unmet_need: Money,
}

pub fn summarize(plan: &CashFlowPlan, securities: &[Security]) -> LadderSummary {
    let total_investment: Money = securities.iter().map(Security::amount).sum();
    let total_cashflow = plan.total_actual();
    let securities_purchased = securities.iter().filter(|s| s.is_purchased()).count();

    let (irr, irr_note) = if total_investment.is_zero() {
        (None, Some("No securities purchased; IRR is not computable".to_string()))
    } else {
        let mut flows = Vec::with_capacity(plan.len() + 1);
        flows.push(-total_investment);
        flows.extend(plan.years().map(|(_, y)| y.actual_cashflow_received));
        match time_value::irr(&flows, IRR_GUESS) {
            Ok(r) => (Some(r), None),
            Err(e) => (None, Some(format!("IRR is not computable: {e}"))),
        }
    };

    let moic = if total_investment > Decimal::ZERO {
        Some(total_cashflow / total_investment)
    } else {
        None
    };

    LadderSummary {
        total_investment,
        total_target: plan.total_target(),
        total_cashflow,
        irr,
        irr_note,
        moic,
        securities_purchased,
        unmet_need: plan.unmet_need(),
    }
}
