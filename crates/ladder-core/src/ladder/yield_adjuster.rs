//! Cash-adjusted yield: a security's yield to worst, less the opportunity
//! cost of holding its maturity proceeds as cash until they are needed.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

use crate::error::LadderError;
use crate::ladder::security::{validate_catalog, Security};
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::LadderResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

/// Default annual rate earned on idle cash (1%).
pub const DEFAULT_CASH_YIELD: Rate = dec!(0.01);

/// Whole calendar months between maturity and the horizon. Days are ignored:
/// a security maturing in the horizon's own month scores 0.
pub fn months_idle(maturity_date: NaiveDate, horizon: NaiveDate) -> i32 {
    (horizon.month() as i32 - maturity_date.month() as i32)
        + 12 * (horizon.year() - maturity_date.year())
}

/// Yield of `security` if its proceeds must fund cash needs up to `horizon`.
///
/// `None` marks the security ineligible: it matures in or after the
/// horizon's month, so it cannot pay out in time. Eligible securities may
/// still score below zero when the idle period is long.
pub fn adjusted_yield(security: &Security, horizon: NaiveDate, cash_yield: Rate) -> Option<Rate> {
    let idle = months_idle(security.maturity_date, horizon);
    if idle <= 0 {
        return None;
    }
    Some(security.yield_to_worst / PERCENT - Decimal::from(idle) * cash_yield / MONTHS_PER_YEAR)
}

/// Score of one eligible candidate at a given horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub cusip: String,
    pub maturity_date: NaiveDate,
    pub months_idle: i32,
    pub adjusted_yield: Rate,
}

/// Score every security that can cover `horizon`, optionally limited to
/// those idle for at most `max_idle_months`. Results keep catalog order and
/// carry each security's catalog index.
pub fn score_candidates(
    securities: &[Security],
    horizon: NaiveDate,
    cash_yield: Rate,
    max_idle_months: Option<u32>,
) -> Vec<(usize, CandidateScore)> {
    securities
        .iter()
        .enumerate()
        .filter_map(|(idx, s)| {
            let idle = months_idle(s.maturity_date, horizon);
            if let Some(window) = max_idle_months {
                if i64::from(idle) > i64::from(window) {
                    return None;
                }
            }
            adjusted_yield(s, horizon, cash_yield).map(|y| {
                (
                    idx,
                    CandidateScore {
                        cusip: s.cusip.clone(),
                        maturity_date: s.maturity_date,
                        months_idle: idle,
                        adjusted_yield: y,
                    },
                )
            })
        })
        .collect()
}

/// Order in which candidates are preferred: highest adjusted yield, then
/// earliest maturity, then lowest identifier.
pub fn selection_order(a: &CandidateScore, b: &CandidateScore) -> Ordering {
    b.adjusted_yield
        .cmp(&a.adjusted_yield)
        .then_with(|| a.maturity_date.cmp(&b.maturity_date))
        .then_with(|| a.cusip.cmp(&b.cusip))
}

// ---------------------------------------------------------------------------
// Ranking at a single horizon
// ---------------------------------------------------------------------------

fn default_cash_yield() -> Rate {
    DEFAULT_CASH_YIELD
}

/// Input for ranking a catalog against one cash-need date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingInput {
    pub securities: Vec<Security>,
    /// Latest date the cash is needed
    pub horizon: NaiveDate,
    #[serde(default = "default_cash_yield")]
    pub cash_yield: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_idle_months: Option<u32>,
    /// Keep only the best N candidates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,
}

/// Eligible candidates, best first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingOutput {
    pub horizon: NaiveDate,
    pub candidates: Vec<CandidateScore>,
    /// Securities that mature too late (or too early) to be considered
    pub ineligible: usize,
}

/// Rank every security by cash-adjusted yield for cash needed at `horizon`,
/// in the order the allocation engine would prefer them.
pub fn rank_candidates(input: &RankingInput) -> LadderResult<ComputationOutput<RankingOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_yield < Decimal::ZERO {
        return Err(LadderError::InvalidInput {
            field: "cash_yield".into(),
            reason: "Cash yield cannot be negative".into(),
        });
    }
    validate_catalog(&input.securities)?;

    let mut candidates: Vec<CandidateScore> = score_candidates(
        &input.securities,
        input.horizon,
        input.cash_yield,
        input.max_idle_months,
    )
    .into_iter()
    .map(|(_, score)| score)
    .collect();
    candidates.sort_by(selection_order);

    let ineligible = input.securities.len() - candidates.len();
    if candidates.is_empty() {
        warnings.push(format!(
            "No security matures before {}; the horizon cannot be covered",
            input.horizon
        ));
    } else if candidates.iter().all(|c| c.adjusted_yield < Decimal::ZERO) {
        warnings.push("Every candidate scores below zero after the idle cash penalty".into());
    }
    if let Some(top) = input.top {
        candidates.truncate(top);
    }

    let output = RankingOutput {
        horizon: input.horizon,
        candidates,
        ineligible,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Yield to worst less idle-cash opportunity cost per whole month",
        &serde_json::json!({
            "cash_yield": input.cash_yield.to_string(),
            "max_idle_months": input.max_idle_months,
            "catalog_size": input.securities.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn security(cusip: &str, ytw: Decimal, maturity: NaiveDate) -> Security {
        Security::new(cusip, Decimal::ZERO, dec!(95), ytw, maturity)
    }

    #[test]
    fn test_months_idle_crosses_years() {
        assert_eq!(months_idle(date(2026, 6, 30), date(2027, 12, 31)), 18);
        assert_eq!(months_idle(date(2026, 12, 1), date(2027, 1, 31)), 1);
        assert_eq!(months_idle(date(2027, 6, 15), date(2027, 6, 14)), 0);
        assert_eq!(months_idle(date(2028, 1, 1), date(2027, 12, 31)), -1);
    }

    #[test]
    fn test_adjusted_yield_penalizes_idle_months() {
        let s = security("A", dec!(4), date(2026, 6, 30));
        // 0.04 - 18 * 0.01 / 12 = 0.025
        assert_eq!(
            adjusted_yield(&s, date(2027, 12, 31), DEFAULT_CASH_YIELD),
            Some(dec!(0.025))
        );
    }

    #[test]
    fn test_same_month_maturity_is_ineligible() {
        let s = security("A", dec!(9), date(2030, 12, 1));
        assert_eq!(adjusted_yield(&s, date(2030, 12, 31), DEFAULT_CASH_YIELD), None);
    }

    #[test]
    fn test_long_idle_can_score_negative() {
        let s = security("A", dec!(4), date(2026, 6, 30));
        // 54 idle months: 0.04 - 0.045
        assert_eq!(
            adjusted_yield(&s, date(2030, 12, 31), DEFAULT_CASH_YIELD),
            Some(dec!(-0.005))
        );
    }

    #[test]
    fn test_zero_cash_yield_returns_raw_yield() {
        let s = security("A", dec!(4.25), date(2026, 6, 30));
        assert_eq!(
            adjusted_yield(&s, date(2029, 1, 1), Decimal::ZERO),
            Some(dec!(0.0425))
        );
    }

    #[test]
    fn test_score_candidates_skips_late_maturities_and_window() {
        let catalog = vec![
            security("NEAR", dec!(4), date(2027, 10, 15)),
            security("FAR", dec!(6), date(2025, 1, 15)),
            security("SAME_MONTH", dec!(5), date(2027, 12, 1)),
            security("LATE", dec!(7), date(2028, 3, 15)),
        ];
        let horizon = date(2027, 12, 31);

        let all = score_candidates(&catalog, horizon, DEFAULT_CASH_YIELD, None);
        let ids: Vec<&str> = all.iter().map(|(_, c)| c.cusip.as_str()).collect();
        assert_eq!(ids, vec!["NEAR", "FAR"]);
        assert_eq!(all[1].0, 1);

        let windowed = score_candidates(&catalog, horizon, DEFAULT_CASH_YIELD, Some(12));
        let ids: Vec<&str> = windowed.iter().map(|(_, c)| c.cusip.as_str()).collect();
        assert_eq!(ids, vec!["NEAR"]);
    }

    #[test]
    fn test_widest_window_keeps_every_eligible_security() {
        let catalog = vec![
            security("NEAR", dec!(4), date(2027, 10, 15)),
            security("FAR", dec!(6), date(1990, 1, 15)),
        ];
        let scored = score_candidates(&catalog, date(2027, 12, 31), DEFAULT_CASH_YIELD, Some(u32::MAX));
        assert_eq!(scored.len(), 2);
    }

    fn score(cusip: &str, y: Rate, maturity: NaiveDate) -> CandidateScore {
        CandidateScore {
            cusip: cusip.into(),
            maturity_date: maturity,
            months_idle: 1,
            adjusted_yield: y,
        }
    }

    #[test]
    fn test_selection_order_prefers_yield_then_maturity_then_id() {
        let mut scores = vec![
            score("C", dec!(0.03), date(2027, 1, 1)),
            score("B", dec!(0.04), date(2027, 1, 1)),
            score("A", dec!(0.04), date(2027, 1, 1)),
            score("D", dec!(0.04), date(2026, 1, 1)),
        ];
        scores.sort_by(selection_order);
        let ids: Vec<&str> = scores.iter().map(|s| s.cusip.as_str()).collect();
        assert_eq!(ids, vec!["D", "A", "B", "C"]);
    }

    #[test]
    fn test_rank_candidates_best_first() {
        let input = RankingInput {
            securities: vec![
                security("A", dec!(4), date(2026, 6, 30)),
                security("B", dec!(5), date(2027, 6, 15)),
                security("C", dec!(6), date(2027, 12, 15)),
            ],
            horizon: date(2027, 12, 31),
            cash_yield: DEFAULT_CASH_YIELD,
            max_idle_months: None,
            top: None,
        };
        let out = rank_candidates(&input).unwrap();
        let ids: Vec<&str> = out.result.candidates.iter().map(|c| c.cusip.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(out.result.ineligible, 1);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_rank_candidates_warns_when_nothing_fits() {
        let input = RankingInput {
            securities: vec![security("LATE", dec!(5), date(2031, 1, 15))],
            horizon: date(2030, 12, 31),
            cash_yield: DEFAULT_CASH_YIELD,
            max_idle_months: None,
            top: Some(5),
        };
        let out = rank_candidates(&input).unwrap();
        assert!(out.result.candidates.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_rank_candidates_rejects_negative_cash_yield() {
        let input = RankingInput {
            securities: vec![],
            horizon: date(2030, 12, 31),
            cash_yield: dec!(-0.01),
            max_idle_months: None,
            top: None,
        };
        assert!(rank_candidates(&input).is_err());
    }
}
