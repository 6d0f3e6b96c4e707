//! Ladder planning entry point: validate the request, allocate on a private
//! copy of the catalog, and package plan, purchases and summary.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::LadderError;
use crate::ladder::allocation::{AllocationContext, AllocationParams, AllocationStep};
use crate::ladder::plan::{CashFlowPlan, PlanRow};
use crate::ladder::security::{validate_catalog, Security};
use crate::ladder::summary::{summarize, LadderSummary};
use crate::ladder::yield_adjuster::DEFAULT_CASH_YIELD;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Year};
use crate::LadderResult;

fn default_cash_yield() -> Rate {
    DEFAULT_CASH_YIELD
}

/// Input for ladder planning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderInput {
    /// Cleaned catalog of candidate securities
    pub securities: Vec<Security>,
    /// Monthly cash needed in each calendar year
    pub target_monthly_cashflow_by_year: BTreeMap<Year, Money>,
    /// Annual rate earned by idle cash (default 1%)
    #[serde(default = "default_cash_yield")]
    pub cash_yield: Rate,
    /// Ignore securities maturing more than this many months before the
    /// date they must cover
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_idle_months: Option<u32>,
    /// Return the partially funded ladder instead of failing on a coverage gap
    #[serde(default)]
    pub allow_partial: bool,
}

/// Output of ladder planning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderOutput {
    pub plan: Vec<PlanRow>,
    /// Purchased securities, latest maturity first
    pub purchases: Vec<Security>,
    pub steps: Vec<AllocationStep>,
    pub summary: LadderSummary,
    /// Earliest date no security could cover, when the catalog ran short
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_gap: Option<NaiveDate>,
}

#[derive(Serialize)]
struct Assumptions {
    cash_yield: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_idle_months: Option<u32>,
    allow_partial: bool,
    catalog_size: usize,
    first_year: Option<Year>,
    last_year: Option<Year>,
}

/// Plan a bond ladder covering the requested yearly cash needs.
pub fn plan_ladder(input: &LadderInput) -> LadderResult<ComputationOutput<LadderOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let mut plan = CashFlowPlan::new(&input.target_monthly_cashflow_by_year)?;
    let mut securities: Vec<Security> = input.securities.clone();
    securities.iter_mut().for_each(Security::reset_allocation);

    let params = AllocationParams {
        cash_yield: input.cash_yield,
        max_idle_months: input.max_idle_months,
    };

    if plan.is_empty() {
        warnings.push("No target cash flows given; nothing to allocate".into());
    } else if securities.is_empty() {
        warnings.push("Catalog is empty; plan is unfunded".into());
    }

    let (steps, coverage_gap) = {
        let mut ctx = AllocationContext::new(&mut securities, &mut plan, &params);
        let outcome = ctx.run();
        let steps = ctx.into_trace().steps;
        match outcome {
            Ok(()) => (steps, None),
            Err(LadderError::CoverageGap { horizon }) if input.allow_partial => {
                warn!(%horizon, "coverage gap, returning partial ladder");
                warnings.push(format!(
                    "Coverage gap: no security can fund cash needed on or before {horizon}"
                ));
                (steps, Some(horizon))
            }
            Err(e) => return Err(e),
        }
    };

    let summary = summarize(&plan, &securities);
    if let Some(note) = &summary.irr_note {
        warnings.push(note.clone());
    }
    if summary.unmet_need > Decimal::ZERO && coverage_gap.is_none() && !securities.is_empty() {
        warnings.push(format!(
            "Unmet need of {} remains after allocation",
            summary.unmet_need.round_dp(2)
        ));
    }

    let mut purchases: Vec<Security> = securities.into_iter().filter(Security::is_purchased).collect();
    purchases.sort_by(|a, b| {
        b.maturity_date
            .cmp(&a.maturity_date)
            .then_with(|| b.yield_to_worst.cmp(&a.yield_to_worst))
            .then_with(|| a.cusip.cmp(&b.cusip))
    });

    info!(
        purchases = purchases.len(),
        total_investment = %summary.total_investment,
        "ladder planned"
    );

    let assumptions = Assumptions {
        cash_yield: input.cash_yield,
        max_idle_months: input.max_idle_months,
        allow_partial: input.allow_partial,
        catalog_size: input.securities.len(),
        first_year: plan.first_year(),
        last_year: plan.last_year(),
    };

    let output = LadderOutput {
        plan: plan.rows(),
        purchases,
        steps,
        summary,
        coverage_gap,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Greedy backward bond ladder allocation with cash-adjusted yield selection",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &LadderInput) -> LadderResult<()> {
    if input.cash_yield < Decimal::ZERO {
        return Err(LadderError::InvalidInput {
            field: "cash_yield".into(),
            reason: "Cash yield cannot be negative".into(),
        });
    }
    validate_catalog(&input.securities)
}

/// Yearly monthly targets that grow by a fixed step each year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSchedule {
    pub first_year: Year,
    pub last_year: Year,
    /// Monthly target in the first year
    pub base_monthly: Money,
    /// Added to the monthly target for every year after the first
    #[serde(default)]
    pub annual_step: Money,
}

impl TargetSchedule {
    pub fn linear(first_year: Year, last_year: Year, base_monthly: Money, annual_step: Money) -> Self {
        TargetSchedule {
            first_year,
            last_year,
            base_monthly,
            annual_step,
        }
    }

    pub fn to_targets(&self) -> LadderResult<BTreeMap<Year, Money>> {
        if self.last_year < self.first_year {
            return Err(LadderError::InvalidInput {
                field: "last_year".into(),
                reason: "Last year must not precede first year".into(),
            });
        }
        Ok((self.first_year..=self.last_year)
            .map(|year| {
                let offset = Decimal::from(year - self.first_year);
                (year, self.base_monthly + offset * self.annual_step)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_linear_schedule() {
        let targets = TargetSchedule::linear(2025, 2027, dec!(30000), dec!(250))
            .to_targets()
            .unwrap();
        assert_eq!(targets[&2025], dec!(30000));
        assert_eq!(targets[&2027], dec!(30500));
        assert!(TargetSchedule::linear(2027, 2025, dec!(1), dec!(0))
            .to_targets()
            .is_err());
    }

    #[test]
    fn test_input_catalog_is_not_mutated() {
        let input = LadderInput {
            securities: vec![Security::new(
                "BILL",
                Decimal::ZERO,
                dec!(98),
                dec!(5),
                date(2024, 12, 15),
            )],
            target_monthly_cashflow_by_year: [(2025, dec!(1000))].into(),
            cash_yield: DEFAULT_CASH_YIELD,
            max_idle_months: None,
            allow_partial: false,
        };
        let out = plan_ladder(&input).unwrap();
        assert_eq!(out.result.purchases.len(), 1);
        assert_eq!(out.result.purchases[0].quantity_purchased, 120);
        assert_eq!(input.securities[0].quantity_purchased, 0);
    }

    #[test]
    fn test_allow_partial_turns_gap_into_warning() {
        let mut input = LadderInput {
            securities: vec![Security::new(
                "MID",
                Decimal::ZERO,
                dec!(97),
                dec!(4),
                date(2026, 6, 30),
            )],
            target_monthly_cashflow_by_year: [(2026, dec!(100)), (2027, dec!(100))].into(),
            cash_yield: DEFAULT_CASH_YIELD,
            max_idle_months: None,
            allow_partial: false,
        };
        assert!(matches!(
            plan_ladder(&input),
            Err(LadderError::CoverageGap { .. })
        ));

        input.allow_partial = true;
        let out = plan_ladder(&input).unwrap();
        assert_eq!(out.result.coverage_gap, Some(date(2026, 6, 29)));
        assert_eq!(out.result.steps.len(), 1);
        assert!(out.warnings.iter().any(|w| w.contains("Coverage gap")));
        assert!(out.result.summary.unmet_need > Decimal::ZERO);
    }

    #[test]
    fn test_negative_cash_yield_rejected() {
        let input = LadderInput {
            securities: vec![],
            target_monthly_cashflow_by_year: BTreeMap::new(),
            cash_yield: dec!(-0.01),
            max_idle_months: None,
            allow_partial: false,
        };
        assert!(matches!(
            plan_ladder(&input),
            Err(LadderError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_defaults_from_json() {
        let json = r#"{
            "securities": [],
            "target_monthly_cashflow_by_year": {"2025": "1000"}
        }"#;
        let input: LadderInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.cash_yield, dec!(0.01));
        assert!(!input.allow_partial);
        let out = plan_ladder(&input).unwrap();
        assert_eq!(out.result.summary.irr, None);
        assert_eq!(out.result.plan.len(), 1);
    }
}
