use serde_json::{Map, Value};

use super::{style::format_plain, unwrap_result};

/// Key answers in order of priority. Searched in the result, then in its
/// `summary` and `report` sections.
const PRIORITY_KEYS: [&str; 6] = [
    "total_investment",
    "irr",
    "moic",
    "accepted",
    "adjusted_yield",
    "coverage_gap",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = unwrap_result(value);

    if let Value::Object(map) = result_obj {
        if let Some(val) = find_priority(map) {
            println!("{}", format_plain(val));
            return;
        }

        // Ranking output: the best candidate's identifier
        if let Some(Value::Array(candidates)) = map.get("candidates") {
            match candidates.first().and_then(|c| c.get("cusip")) {
                Some(cusip) => println!("{}", format_plain(cusip)),
                None => println!("(none)"),
            }
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_plain(val));
            return;
        }
    }

    println!("{}", format_plain(result_obj));
}

fn find_priority(map: &Map<String, Value>) -> Option<&Value> {
    let scopes = [
        Some(map),
        map.get("summary").and_then(Value::as_object),
        map.get("report").and_then(Value::as_object),
    ];
    for key in PRIORITY_KEYS {
        for scope in scopes.iter().flatten() {
            if let Some(val) = scope.get(key) {
                if !val.is_null() {
                    return Some(val);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_reports_total_investment() {
        let value = json!({"plan": [], "summary": {"total_investment": "22168", "irr": "0.054"}});
        let found = find_priority(value.as_object().unwrap()).unwrap();
        assert_eq!(found, "22168");
    }

    #[test]
    fn test_catalog_reports_accepted_count() {
        let value = json!({"securities": [], "report": {"rows_read": 9, "accepted": 7}});
        let found = find_priority(value.as_object().unwrap()).unwrap();
        assert_eq!(found, 7);
    }
}
