use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else if let Some(Value::Array(results)) = map.get("results") {
                print_array_table(results);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    if let Value::Object(res_map) = result {
        // Scalars and nested objects go in the field table; lists of rows
        // (e.g. a repayment schedule) get their own table underneath.
        let (lists, fields): (Vec<_>, Vec<_>) =
            res_map.iter().partition(|(_, v)| is_row_list(v));

        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in fields {
            match val {
                Value::Object(inner) => {
                    for (k, v) in inner {
                        builder.push_record([format!("{key}.{k}"), format_value(v)]);
                    }
                }
                _ => builder.push_record([key.clone(), format_value(val)]),
            }
        }
        println!("{}", Table::from(builder));

        for (key, val) in lists {
            if let Value::Array(rows) = val {
                println!("\n{}:", key);
                print_array_table(rows);
            }
        }
    } else {
        print_flat_object(envelope);
    }

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

fn is_row_list(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if matches!(arr.first(), Some(Value::Object(_))))
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
