use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::style::{format_field, order_link};

/// Columns left out of wide tables; they stay available in JSON output.
const HIDDEN_COLUMNS: &[&str] = &["attributes", "description"];

/// Security lists that get a brokerage order link per row.
const LINKED_TABLES: &[&str] = &["purchases", "securities", "candidates"];

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                print_sections(result);
                print_envelope_notes(map);
            } else {
                print_sections(map);
            }
        }
        Value::Array(arr) => print_records(arr, false),
        _ => println!("{}", value),
    }
}

/// Scalars first as a Field/Value table, then one titled table per nested
/// object or array of records.
fn print_sections(map: &Map<String, Value>) {
    let scalars: Vec<(&String, &Value)> = map
        .iter()
        .filter(|(_, v)| !is_section(v))
        .collect();
    if !scalars.is_empty() {
        print_field_table(scalars);
    }

    for (key, val) in map.iter().filter(|(_, v)| is_section(v)) {
        println!("\n{}:", title(key));
        match val {
            Value::Object(inner) => print_field_table(inner.iter().collect()),
            Value::Array(arr) => print_records(arr, LINKED_TABLES.contains(&key.as_str())),
            _ => {}
        }
    }
}

fn is_section(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(arr) => arr.iter().any(Value::is_object),
        _ => false,
    }
}

fn print_field_table(rows: Vec<(&String, &Value)>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in rows {
        builder.push_record([key.as_str(), &format_field(key, val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_records(arr: &[Value], with_order_link: bool) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first
            .keys()
            .map(String::as_str)
            .filter(|k| !HIDDEN_COLUMNS.contains(k))
            .collect();
        let mut header_row: Vec<String> = headers.iter().map(|h| title(h)).collect();
        if with_order_link {
            header_row.push("Order".into());
        }
        let mut builder = Builder::default();
        builder.push_record(header_row);

        for item in arr {
            if let Value::Object(map) = item {
                let mut row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(|v| format_field(h, v)).unwrap_or_default())
                    .collect();
                if with_order_link {
                    row.push(
                        map.get("cusip")
                            .and_then(Value::as_str)
                            .map(order_link)
                            .unwrap_or_default(),
                    );
                }
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_field("", item));
        }
    }
}

/// `target_monthly_cashflow` -> `Target Monthly Cashflow`
fn title(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_title_case() {
        assert_eq!(title("target_monthly_cashflow"), "Target Monthly Cashflow");
        assert_eq!(title("irr"), "Irr");
    }

    #[test]
    fn test_sections() {
        assert!(is_section(&json!({"a": 1})));
        assert!(is_section(&json!([{"a": 1}])));
        assert!(!is_section(&json!(["CP", "SP"])));
        assert!(!is_section(&json!("2026-06-29")));
    }
}
