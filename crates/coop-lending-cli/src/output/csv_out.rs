use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
///
/// A result that carries a list of rows (a schedule) is written as that
/// table; otherwise a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                if let Some(Value::Array(rows)) = result.get("rows") {
                    write_array_csv(&mut wtr, rows);
                } else {
                    let _ = wtr.write_record(["field", "value"]);
                    for (key, val) in result {
                        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                    }
                }
            } else if let Some(Value::Array(results)) = map.get("results") {
                write_array_csv(&mut wtr, results);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

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

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr
            .iter()
            .map(format_csv_value)
            .collect::<Vec<_>>()
            .join("; "),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
