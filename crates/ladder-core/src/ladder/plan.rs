//! Cash-flow plan: per-year targets and what the ladder actually delivers.
//!
//! The plan is only mutated through [`CashFlowPlan::commit`], which keeps the
//! remaining target clamped at zero and the received total non-negative.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::LadderError;
use crate::types::{Money, Year};
use crate::LadderResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Round a currency amount to cents (banker's rounding).
pub fn to_cents(amount: Money) -> Money {
    amount.round_dp(2)
}

/// State of one plan year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanYear {
    pub target_monthly_cashflow: Money,
    /// Starts at twelve months of target; never increases, never negative
    pub target_cashflow_remaining: Money,
    pub actual_cashflow_received: Money,
}

impl PlanYear {
    /// `None` when twelve months of the target leave Decimal range.
    fn new(target_monthly_cashflow: Money) -> Option<Self> {
        Some(PlanYear {
            target_monthly_cashflow,
            target_cashflow_remaining: target_monthly_cashflow.checked_mul(MONTHS_PER_YEAR)?,
            actual_cashflow_received: Decimal::ZERO,
        })
    }

    pub fn target_annual_cashflow(&self) -> Money {
        self.target_monthly_cashflow
            .checked_mul(MONTHS_PER_YEAR)
            .unwrap_or(Decimal::MAX)
    }
}

/// Flattened plan year for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRow {
    pub year: Year,
    pub target_monthly_cashflow: Money,
    pub target_annual_cashflow: Money,
    pub target_cashflow_remaining: Money,
    pub actual_cashflow_received: Money,
}

/// Year-indexed cash-flow plan covering a contiguous range of years.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowPlan {
    years: BTreeMap<Year, PlanYear>,
}

impl CashFlowPlan {
    /// Build a plan from yearly monthly targets. Years missing between the
    /// first and last target get a zero target.
    pub fn new(target_monthly_cashflow_by_year: &BTreeMap<Year, Money>) -> LadderResult<Self> {
        let mut years = BTreeMap::new();

        let (Some(&first), Some(&last)) = (
            target_monthly_cashflow_by_year.keys().next(),
            target_monthly_cashflow_by_year.keys().next_back(),
        ) else {
            return Ok(CashFlowPlan::default());
        };

        // Dates are only representable within chrono's range.
        if NaiveDate::from_ymd_opt(first, 1, 1).is_none()
            || NaiveDate::from_ymd_opt(last, 12, 31).is_none()
        {
            return Err(LadderError::InvalidInput {
                field: "target_monthly_cashflow_by_year".into(),
                reason: format!("Years {first}..={last} are outside the supported date range"),
            });
        }

        let mut total_target = Decimal::ZERO;
        for year in first..=last {
            let field = || format!("target_monthly_cashflow_by_year[{year}]");
            let target = target_monthly_cashflow_by_year
                .get(&year)
                .copied()
                .unwrap_or(Decimal::ZERO);
            if target < Decimal::ZERO {
                return Err(LadderError::InvalidInput {
                    field: field(),
                    reason: "Target cash flow cannot be negative".into(),
                });
            }
            // The whole plan's target must stay summable.
            let checked = PlanYear::new(target).and_then(|row| {
                Some((total_target.checked_add(row.target_cashflow_remaining)?, row))
            });
            let Some((total, row)) = checked else {
                return Err(LadderError::InvalidInput {
                    field: field(),
                    reason: "Target cash flow is too large".into(),
                });
            };
            total_target = total;
            years.insert(year, row);
        }

        Ok(CashFlowPlan { years })
    }

    /// Rebuild a plan from report rows, e.g. a saved ladder output.
    pub fn from_rows(rows: &[PlanRow]) -> Self {
        let years = rows
            .iter()
            .map(|r| {
                (
                    r.year,
                    PlanYear {
                        target_monthly_cashflow: r.target_monthly_cashflow,
                        target_cashflow_remaining: r.target_cashflow_remaining,
                        actual_cashflow_received: r.actual_cashflow_received,
                    },
                )
            })
            .collect();
        CashFlowPlan { years }
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn first_year(&self) -> Option<Year> {
        self.years.keys().next().copied()
    }

    pub fn last_year(&self) -> Option<Year> {
        self.years.keys().next_back().copied()
    }

    /// January 1st of the first plan year.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.first_year()
            .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
    }

    /// December 31st of the last plan year.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.last_year()
            .and_then(|y| NaiveDate::from_ymd_opt(y, 12, 31))
    }

    pub fn get(&self, year: Year) -> Option<&PlanYear> {
        self.years.get(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = (Year, &PlanYear)> {
        self.years.iter().map(|(y, p)| (*y, p))
    }

    pub fn remaining(&self, year: Year) -> Money {
        self.years
            .get(&year)
            .map(|p| p.target_cashflow_remaining)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn actual(&self, year: Year) -> Money {
        self.years
            .get(&year)
            .map(|p| p.actual_cashflow_received)
            .unwrap_or(Decimal::ZERO)
    }

    /// Share of the year's remaining need attributed to one calendar month:
    /// `remaining / month` (1-based), in cents. Walking a year backward from
    /// December therefore spreads the remaining need evenly across the months
    /// still to be planned.
    pub fn monthly_draw(&self, year: Year, month: u32) -> Money {
        if month == 0 {
            return Decimal::ZERO;
        }
        to_cents(self.remaining(year) / Decimal::from(month))
    }

    /// Commit a flow against a year. Returns `false` (and changes nothing)
    /// when the year is outside the plan.
    pub fn commit(&mut self, year: Year, amount: Money) -> bool {
        debug_assert!(amount >= Decimal::ZERO, "committed flows are never negative");
        let Some(entry) = self.years.get_mut(&year) else {
            return false;
        };
        entry.actual_cashflow_received += amount;
        // Overshoot (usually a coupon) is absorbed, not carried forward.
        entry.target_cashflow_remaining =
            (entry.target_cashflow_remaining - amount).max(Decimal::ZERO);
        true
    }

    pub fn total_actual(&self) -> Money {
        self.years.values().map(|p| p.actual_cashflow_received).sum()
    }

    pub fn total_target(&self) -> Money {
        self.years
            .values()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.target_annual_cashflow()))
    }

    /// Need left uncovered once allocation has finished.
    pub fn unmet_need(&self) -> Money {
        self.years.values().map(|p| p.target_cashflow_remaining).sum()
    }

    pub fn rows(&self) -> Vec<PlanRow> {
        self.years
            .iter()
            .map(|(year, p)| PlanRow {
                year: *year,
                target_monthly_cashflow: p.target_monthly_cashflow,
                target_annual_cashflow: p.target_annual_cashflow(),
                target_cashflow_remaining: p.target_cashflow_remaining,
                actual_cashflow_received: p.actual_cashflow_received,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn targets(pairs: &[(Year, Money)]) -> BTreeMap<Year, Money> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_new_fills_gap_years_with_zero() {
        let plan = CashFlowPlan::new(&targets(&[(2025, dec!(1000)), (2028, dec!(2000))])).unwrap();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.get(2026).unwrap().target_monthly_cashflow, Decimal::ZERO);
        assert_eq!(plan.remaining(2028), dec!(24000));
        assert_eq!(plan.start_date(), NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(plan.end_date(), NaiveDate::from_ymd_opt(2028, 12, 31));
    }

    #[test]
    fn test_empty_targets_give_empty_plan() {
        let plan = CashFlowPlan::new(&BTreeMap::new()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.start_date(), None);
        assert_eq!(plan.unmet_need(), Decimal::ZERO);
    }

    #[test]
    fn test_negative_target_rejected() {
        assert!(CashFlowPlan::new(&targets(&[(2025, dec!(-1))])).is_err());
    }

    #[test]
    fn test_oversized_target_rejected() {
        let huge = Decimal::MAX / dec!(2);
        let err = CashFlowPlan::new(&targets(&[(2025, huge)])).unwrap_err();
        assert!(matches!(
            err,
            LadderError::InvalidInput { ref field, .. } if field == "target_monthly_cashflow_by_year[2025]"
        ));

        // Each year fits on its own but the plan total does not.
        let big = Decimal::MAX / dec!(20);
        assert!(CashFlowPlan::new(&targets(&[(2025, big), (2026, big)])).is_err());
    }

    #[test]
    fn test_years_outside_date_range_rejected_before_filling() {
        let err = CashFlowPlan::new(&targets(&[(i32::MIN, dec!(1)), (i32::MAX, dec!(1))])).unwrap_err();
        assert!(matches!(err, LadderError::InvalidInput { .. }));
    }

    #[test]
    fn test_commit_clamps_remaining_but_keeps_actual() {
        let mut plan = CashFlowPlan::new(&targets(&[(2025, dec!(10))])).unwrap();
        assert!(plan.commit(2025, dec!(100)));
        let year = plan.get(2025).unwrap();
        assert_eq!(year.target_cashflow_remaining, Decimal::ZERO);
        assert_eq!(year.actual_cashflow_received, dec!(100));
    }

    #[test]
    fn test_commit_outside_plan_is_ignored() {
        let mut plan = CashFlowPlan::new(&targets(&[(2025, dec!(10))])).unwrap();
        assert!(!plan.commit(2024, dec!(5)));
        assert_eq!(plan.total_actual(), Decimal::ZERO);
    }

    #[test]
    fn test_monthly_draws_walking_back_from_december_are_level() {
        let mut plan = CashFlowPlan::new(&targets(&[(2025, dec!(1000))])).unwrap();
        for month in (1..=12).rev() {
            let draw = plan.monthly_draw(2025, month);
            assert_eq!(draw, dec!(1000));
            plan.commit(2025, draw);
        }
        assert_eq!(plan.remaining(2025), Decimal::ZERO);
        assert_eq!(plan.actual(2025), dec!(12000));
    }

    #[test]
    fn test_monthly_draw_front_loads_a_partial_year() {
        let mut plan = CashFlowPlan::new(&targets(&[(2025, dec!(1000))])).unwrap();
        plan.commit(2025, dec!(6000));
        // six months of the year left to plan for: 6000 / 6
        assert_eq!(plan.monthly_draw(2025, 6), dec!(1000));
        assert_eq!(plan.monthly_draw(2025, 3), dec!(2000));
    }

    #[test]
    fn test_rows_roundtrip() {
        let mut plan = CashFlowPlan::new(&targets(&[(2025, dec!(1000)), (2026, dec!(500))])).unwrap();
        plan.commit(2026, dec!(123.45));
        let rebuilt = CashFlowPlan::from_rows(&plan.rows());
        assert_eq!(rebuilt, plan);
    }
}
