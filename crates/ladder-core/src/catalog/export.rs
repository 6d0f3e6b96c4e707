use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Read;
use std::str::FromStr;
use tracing::debug;

use crate::catalog::{CatalogFilter, CatalogReport};
use crate::error::LadderError;
use crate::ladder::security::Security;
use crate::LadderResult;

const COL_CUSIP: &str = "Cusip";
const COL_ATTRIBUTES: &str = "Attributes";
const COL_COUPON: &str = "Coupon";
const COL_PRICE: &str = "Price Ask";
const COL_YIELD: &str = "Ask Yield to Worst";
const COL_MATURITY: &str = "Maturity Date";
const COL_DESCRIPTION: &str = "Description";

const MATURITY_FORMAT: &str = "%m/%d/%Y";

struct Columns {
    cusip: usize,
    attributes: usize,
    coupon: usize,
    price: usize,
    yield_to_worst: usize,
    maturity: usize,
    description: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> LadderResult<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| LadderError::Catalog(format!("Missing column '{name}'")))
        };
        Ok(Columns {
            cusip: require(COL_CUSIP)?,
            attributes: require(COL_ATTRIBUTES)?,
            coupon: require(COL_COUPON)?,
            price: require(COL_PRICE)?,
            yield_to_worst: require(COL_YIELD)?,
            maturity: require(COL_MATURITY)?,
            description: find(COL_DESCRIPTION),
        })
    }
}

/// Parse one export. Trailing disclaimer lines and other short rows are
/// tolerated and counted as incomplete.
pub fn parse_export<R: Read>(
    reader: R,
    filter: &CatalogFilter,
    report: &mut CatalogReport,
) -> LadderResult<Vec<Security>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = Columns::locate(rdr.headers()?)?;

    let mut securities = Vec::new();
    for record in rdr.records() {
        let record = record?;
        report.rows_read += 1;

        let field = |idx: usize| record.get(idx).map(str::trim).filter(|v| !v.is_empty());

        let (Some(raw_cusip), Some(attributes)) = (field(columns.cusip), field(columns.attributes))
        else {
            report.incomplete += 1;
            continue;
        };
        let cusip = clean_identifier(raw_cusip);
        if cusip.is_empty() {
            report.incomplete += 1;
            continue;
        }

        if let Some(required) = &filter.required_attribute {
            if !attributes.contains(required.as_str()) {
                report.filtered += 1;
                continue;
            }
        }

        let price = field(columns.price).and_then(parse_decimal);
        let yield_to_worst = field(columns.yield_to_worst).and_then(parse_decimal);
        let maturity = field(columns.maturity)
            .and_then(|v| NaiveDate::parse_from_str(v, MATURITY_FORMAT).ok());

        let (Some(price), Some(yield_to_worst), Some(maturity)) = (price, yield_to_worst, maturity)
        else {
            debug!(%cusip, "row skipped: missing price, yield or maturity");
            report.skipped += 1;
            continue;
        };
        if price <= Decimal::ZERO {
            debug!(%cusip, %price, "row skipped: non-positive price");
            report.skipped += 1;
            continue;
        }

        // Coupon is quoted in percent; blanks and "--" mean zero coupon.
        let coupon_pct = field(columns.coupon)
            .and_then(parse_decimal)
            .unwrap_or(Decimal::ZERO);
        if coupon_pct < Decimal::ZERO {
            debug!(%cusip, %coupon_pct, "row skipped: negative coupon");
            report.skipped += 1;
            continue;
        }

        let description = columns
            .description
            .and_then(field)
            .map(|d| d.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        let mut security = Security::new(cusip, coupon_pct / dec!(100), price, yield_to_worst, maturity)
            .with_description(description);
        security.attributes = attributes
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|a| !a.is_empty())
            .map(String::from)
            .collect();
        securities.push(security);
    }

    Ok(securities)
}

/// Strip spreadsheet formula quoting: `="912797GK7"` becomes `912797GK7`.
pub fn clean_identifier(raw: &str) -> String {
    raw.replace("=\"", "").replace('"', "").trim().to_string()
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%' | ' '))
        .collect();
    Decimal::from_str(&cleaned).ok()
}
