//! Backward allocation engine.
//!
//! Starting at the last day of the plan and walking back in time, each step
//! buys the single eligible security with the best cash-adjusted yield,
//! attributes the months between the current horizon and that security's
//! maturity to it, books its coupons, and moves the horizon to the day before
//! it matures. The loop ends once the horizon falls before the plan's first
//! day, or fails with [`LadderError::CoverageGap`] when nothing in the
//! catalog can pay out in time.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::error::LadderError;
use crate::ladder::plan::{to_cents, CashFlowPlan};
use crate::ladder::security::Security;
use crate::ladder::yield_adjuster::{
    score_candidates, selection_order, CandidateScore, DEFAULT_CASH_YIELD,
};
use crate::types::{Money, Rate};
use crate::LadderResult;

/// Tunables for one allocation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationParams {
    /// Annual rate earned by idle cash, used to penalize early maturities
    pub cash_yield: Rate,
    /// Only consider securities maturing at most this many months before the
    /// horizon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_idle_months: Option<u32>,
}

impl Default for AllocationParams {
    fn default() -> Self {
        AllocationParams {
            cash_yield: DEFAULT_CASH_YIELD,
            max_idle_months: None,
        }
    }
}

/// One purchase decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationStep {
    /// Latest date this purchase had to cover
    pub horizon: NaiveDate,
    pub cusip: String,
    pub maturity_date: NaiveDate,
    pub months_idle: i32,
    pub adjusted_yield: Rate,
    /// Monthly draws attributed to the security's principal
    pub cash_drawn: Money,
    pub quantity: u64,
    /// Coupon booked in each year from the plan start through maturity
    pub coupon_per_year: Money,
    /// Horizon handed to the following step
    pub next_horizon: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationTrace {
    pub steps: Vec<AllocationStep>,
}

/// Mutable state of a single run: the catalog copy, the plan, and what has
/// been selected so far.
pub struct AllocationContext<'a> {
    securities: &'a mut [Security],
    plan: &'a mut CashFlowPlan,
    params: &'a AllocationParams,
    selected: Vec<bool>,
    steps: Vec<AllocationStep>,
}

impl<'a> AllocationContext<'a> {
    pub fn new(
        securities: &'a mut [Security],
        plan: &'a mut CashFlowPlan,
        params: &'a AllocationParams,
    ) -> Self {
        let selected = vec![false; securities.len()];
        AllocationContext {
            securities,
            plan,
            params,
            selected,
            steps: Vec::new(),
        }
    }

    /// Steps committed so far; still valid after a coverage gap.
    pub fn steps(&self) -> &[AllocationStep] {
        &self.steps
    }

    pub fn into_trace(self) -> AllocationTrace {
        AllocationTrace { steps: self.steps }
    }

    /// Run the loop to completion.
    pub fn run(&mut self) -> LadderResult<()> {
        let (Some(start_date), Some(end_date)) = (self.plan.start_date(), self.plan.end_date())
        else {
            debug!("empty plan, nothing to allocate");
            return Ok(());
        };
        if self.securities.is_empty() {
            warn!("empty catalog, plan left unfunded");
            return Ok(());
        }

        let mut horizon = end_date;
        while horizon >= start_date {
            horizon = self.step(horizon, start_date)?;
        }

        info!(
            purchases = self.steps.len(),
            unmet_need = %self.plan.unmet_need(),
            "allocation complete"
        );
        Ok(())
    }

    /// Buy one security covering `horizon`; returns the next horizon.
    fn step(&mut self, horizon: NaiveDate, start_date: NaiveDate) -> LadderResult<NaiveDate> {
        let (idx, score) = self
            .select(horizon)
            .ok_or(LadderError::CoverageGap { horizon })?;

        debug!(
            cusip = %score.cusip,
            maturity_date = %score.maturity_date,
            adjusted_yield = %score.adjusted_yield,
            %horizon,
            "selected security"
        );

        self.selected[idx] = true;
        let cash_drawn = self.draw_monthly(idx, horizon);

        let security = &mut self.securities[idx];
        let quantity = (cash_drawn / security.redemption)
            .floor()
            .to_u64()
            .ok_or_else(|| LadderError::InvalidInput {
                field: format!("securities[{}]", security.cusip),
                reason: format!("Quantity for {cash_drawn} of principal is out of range"),
            })?;
        security.quantity_purchased = quantity;

        let coupon_per_year = self.book_coupons(idx, start_date);

        let next_horizon = score.maturity_date.pred_opt().ok_or_else(|| {
            LadderError::DateError(format!("No date before maturity {}", score.maturity_date))
        })?;

        self.steps.push(AllocationStep {
            horizon,
            cusip: score.cusip,
            maturity_date: score.maturity_date,
            months_idle: score.months_idle,
            adjusted_yield: score.adjusted_yield,
            cash_drawn,
            quantity,
            coupon_per_year,
            next_horizon,
        });

        Ok(next_horizon)
    }

    /// Best candidate not yet selected in this run.
    fn select(&self, horizon: NaiveDate) -> Option<(usize, CandidateScore)> {
        score_candidates(
            &*self.securities,
            horizon,
            self.params.cash_yield,
            self.params.max_idle_months,
        )
        .into_iter()
        .filter(|(idx, _)| !self.selected[*idx])
        .min_by(|(_, a), (_, b)| selection_order(a, b))
    }

    /// Walk month by month from the horizon back to the maturity month,
    /// attributing each plan month's share of the remaining need to the
    /// security. Returns the total drawn.
    fn draw_monthly(&mut self, idx: usize, horizon: NaiveDate) -> Money {
        let maturity = self.securities[idx].maturity_date;
        let last = (maturity.year(), maturity.month());
        let (mut year, mut month) = (horizon.year(), horizon.month());
        let mut drawn = Decimal::ZERO;

        loop {
            let draw = self.plan.monthly_draw(year, month);
            if draw > Decimal::ZERO && self.plan.commit(year, draw) {
                trace!(year, month, %draw, "cash needed");
                self.securities[idx].record_cash(year, draw);
                drawn += draw;
            }
            if (year, month) <= last {
                break;
            }
            if month == 1 {
                year -= 1;
                month = 12;
            } else {
                month -= 1;
            }
        }
        drawn
    }

    /// Book the annual coupon in every plan year from the start through the
    /// maturity year. Returns the per-year coupon.
    fn book_coupons(&mut self, idx: usize, start_date: NaiveDate) -> Money {
        let security = &mut self.securities[idx];
        if security.coupon_rate <= Decimal::ZERO || security.quantity_purchased == 0 {
            return Decimal::ZERO;
        }
        let coupon = to_cents(security.annual_coupon());
        for year in start_date.year()..=security.maturity_date.year() {
            if self.plan.commit(year, coupon) {
                trace!(year, %coupon, "coupon");
                security.record_cash(year, coupon);
            }
        }
        coupon
    }
}

/// Allocate `securities` against `plan`, mutating both in place.
///
/// The plan's first and last years bound the run. On a coverage gap the
/// error carries the unmet horizon and both tables keep whatever was
/// committed before it; use [`AllocationContext`] directly to also keep the
/// partial trace.
pub fn allocate(
    securities: &mut [Security],
    plan: &mut CashFlowPlan,
    params: &AllocationParams,
) -> LadderResult<AllocationTrace> {
    let mut ctx = AllocationContext::new(securities, plan, params);
    ctx.run()?;
    Ok(ctx.into_trace())
}
