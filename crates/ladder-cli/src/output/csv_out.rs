use serde_json::{Map, Value};
use std::io;

use super::{style::format_plain, unwrap_result, PRIMARY_TABLES};

/// Write output as CSV to stdout.
///
/// A plan, catalog, or ranking writes its main record list; anything else
/// becomes a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match unwrap_result(value) {
        Value::Object(map) => match primary_table(map) {
            Some(rows) => write_array_csv(&mut wtr, rows),
            None => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        other => {
            let _ = wtr.write_record([&format_csv_value(other)]);
        }
    }

    let _ = wtr.flush();
}

fn primary_table(map: &Map<String, Value>) -> Option<&[Value]> {
    PRIMARY_TABLES.iter().find_map(|key| match map.get(*key) {
        Some(Value::Array(rows)) => Some(rows.as_slice()),
        _ => None,
    })
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

/// Raw values, no currency styling, so the file loads back cleanly.
fn format_csv_value(value: &Value) -> String {
    match value {
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
        Value::Array(arr) => arr.iter().map(format_plain).collect::<Vec<_>>().join(" "),
        other => format_plain(other),
    }
}
