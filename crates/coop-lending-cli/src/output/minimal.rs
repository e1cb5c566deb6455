use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "monthly_payment",
        "payment_to_income_ratio",
        "ready_to_submit",
    ];

    if let Value::Object(map) = result_obj {
        // schedules nest the headline figures under "summary"
        let map = match map.get("summary") {
            Some(Value::Object(summary)) => summary,
            _ => map,
        };

        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
