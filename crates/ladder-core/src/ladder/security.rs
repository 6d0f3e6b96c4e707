//! Security record: a cleaned view of one tradable fixed-income instrument,
//! plus the annotations the allocation engine writes while building a ladder.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::LadderError;
use crate::types::{Money, Rate, Year};
use crate::LadderResult;

/// Face value returned at maturity, per lot.
pub const DEFAULT_REDEMPTION: Money = dec!(100);

fn default_redemption() -> Money {
    DEFAULT_REDEMPTION
}

/// One instrument from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    /// Unique identifier (CUSIP), the join key across all derived tables
    pub cusip: String,
    /// Annual coupon as a fraction of redemption (0.02 = 2%)
    #[serde(default)]
    pub coupon_rate: Rate,
    /// Ask price per 100 of redemption
    pub price: Money,
    /// Face value returned at maturity per lot
    #[serde(default = "default_redemption")]
    pub redemption: Money,
    /// Annualized yield to worst, in percent (4.5 = 4.5%)
    pub yield_to_worst: Decimal,
    pub maturity_date: NaiveDate,
    #[serde(default)]
    pub description: String,
    /// Brokerage flags, e.g. "CP" for call protected
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,

    /// Lots of `redemption` bought; written once per allocation run
    #[serde(default)]
    pub quantity_purchased: u64,
    /// Total cash attributed to this security across all years
    #[serde(default)]
    pub cash_allocated: Money,
    #[serde(default)]
    pub cash_allocated_by_year: BTreeMap<Year, Money>,
}

impl Security {
    pub fn new(
        cusip: impl Into<String>,
        coupon_rate: Rate,
        price: Money,
        yield_to_worst: Decimal,
        maturity_date: NaiveDate,
    ) -> Self {
        Security {
            cusip: cusip.into(),
            coupon_rate,
            price,
            redemption: DEFAULT_REDEMPTION,
            yield_to_worst,
            maturity_date,
            description: String::new(),
            attributes: Vec::new(),
            quantity_purchased: 0,
            cash_allocated: Decimal::ZERO,
            cash_allocated_by_year: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_purchased(&self) -> bool {
        self.quantity_purchased > 0
    }

    /// Cost of the purchased lots at the ask price.
    pub fn amount(&self) -> Money {
        self.price * Decimal::from(self.quantity_purchased)
    }

    /// Annual coupon paid on the purchased lots.
    pub fn annual_coupon(&self) -> Money {
        self.coupon_rate * self.redemption * Decimal::from(self.quantity_purchased)
    }

    pub(crate) fn record_cash(&mut self, year: Year, amount: Money) {
        self.cash_allocated += amount;
        *self
            .cash_allocated_by_year
            .entry(year)
            .or_insert(Decimal::ZERO) += amount;
    }

    /// Clear the allocation annotations so the record can seed a new run.
    pub fn reset_allocation(&mut self) {
        self.quantity_purchased = 0;
        self.cash_allocated = Decimal::ZERO;
        self.cash_allocated_by_year.clear();
    }
}

/// Reject records the ingestion step should never have let through.
pub fn validate_catalog(securities: &[Security]) -> LadderResult<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(securities.len());

    for security in securities {
        let field = |name: &str| format!("securities[{}].{name}", security.cusip);

        if security.cusip.trim().is_empty() {
            return Err(LadderError::InvalidInput {
                field: "securities[].cusip".into(),
                reason: "Identifier cannot be empty".into(),
            });
        }
        if !seen.insert(security.cusip.as_str()) {
            return Err(LadderError::InvalidInput {
                field: field("cusip"),
                reason: "Duplicate identifier in catalog".into(),
            });
        }
        if security.price <= Decimal::ZERO {
            return Err(LadderError::InvalidInput {
                field: field("price"),
                reason: "Price must be positive".into(),
            });
        }
        if security.redemption <= Decimal::ZERO {
            return Err(LadderError::InvalidInput {
                field: field("redemption"),
                reason: "Redemption must be positive".into(),
            });
        }
        if security.coupon_rate < Decimal::ZERO {
            return Err(LadderError::InvalidInput {
                field: field("coupon_rate"),
                reason: "Coupon rate cannot be negative".into(),
            });
        }
    }
    Ok(())
}
