pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod style;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Arrays rendered as their own table, in preference order.
pub const PRIMARY_TABLES: [&str; 4] = ["plan", "purchases", "securities", "candidates"];

/// The envelope's result if present, otherwise the value itself.
pub fn unwrap_result(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}
