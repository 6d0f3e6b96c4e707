//! Cell formatting for human-readable output: currency, percentages, and
//! collapsed free text.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

const MONEY_FIELDS: &[&str] = &[
    "target_monthly_cashflow",
    "target_annual_cashflow",
    "target_cashflow_remaining",
    "actual_cashflow_received",
    "total_investment",
    "total_target",
    "total_cashflow",
    "unmet_need",
    "cash_allocated",
    "cash_drawn",
    "coupon_per_year",
];

/// Price per 100 of face, shown with cents.
const PRICE_FIELDS: &[&str] = &["price", "redemption"];

/// Rates stored as decimals (0.045), shown as percentages.
const RATE_FIELDS: &[&str] = &["irr", "adjusted_yield", "cash_yield", "coupon_rate"];

const ORDER_URL: &str = "https://oltx.fidelity.com/ftgw/fbc/oftrade/EntrOrder?\
ORDER_TYPE=F&ORDERSYSTEM=TORD&BROKERAGE_ORDER_ACTION=B&SECURITY_ID=";

/// Already quoted in percent.
const PERCENT_FIELDS: &[&str] = &["yield_to_worst"];

/// Format a field for a table cell, using the key to pick a style.
pub fn format_field(key: &str, value: &Value) -> String {
    let Some(number) = as_decimal(value) else {
        return format_plain(value);
    };
    if MONEY_FIELDS.contains(&key) {
        money(number, 0)
    } else if PRICE_FIELDS.contains(&key) {
        money(number, 2)
    } else if RATE_FIELDS.contains(&key) {
        percent(number * Decimal::ONE_HUNDRED)
    } else if PERCENT_FIELDS.contains(&key) {
        percent(number)
    } else if key == "moic" {
        format!("{}x", number.round_dp(2))
    } else {
        format_plain(value)
    }
}

pub fn format_plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.split_whitespace().collect::<Vec<_>>().join(" "),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_plain).collect::<Vec<_>>().join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, format_field("cash_allocated", v)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

/// `$ 1,234` style with thousands separators.
pub fn money(amount: Decimal, decimals: u32) -> String {
    let rounded = amount.round_dp(decimals);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.*}", decimals as usize, rounded.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text.clone(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}$ {grouped}.{f}"),
        None => format!("{sign}$ {grouped}"),
    }
}

/// Brokerage buy ticket for one security.
pub fn order_link(cusip: &str) -> String {
    format!("{ORDER_URL}{cusip}")
}

pub fn percent(value: Decimal) -> String {
    format!("{:.2}%", value.round_dp(2))
}
