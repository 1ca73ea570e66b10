use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Nested objects deeper than this are printed as inline JSON.
const MAX_FLATTEN_DEPTH: usize = 2;

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Array(rows)) => print_rows(rows),
            Some(Value::Object(result)) => print_fields(result),
            _ => print_fields(map),
        },
        Value::Array(rows) => print_rows(rows),
        other => println!("{}", format_value(other)),
    }

    if let Value::Object(envelope) = value {
        print_notes(envelope);
    }
}

/// Field/value table; nested sections become dotted keys.
fn print_fields(map: &Map<String, Value>) {
    let mut flat = Vec::new();
    flatten("", map, 0, format_value, &mut flat);
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flat {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));
}

/// One row per element, headers from the first object.
fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        if rows.is_empty() {
            println!("(empty)");
        }
        for item in rows {
            println!("{}", format_value(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in rows {
        if let Value::Object(map) = item {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h).map(format_value).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

pub(crate) fn flatten(
    prefix: &str,
    map: &Map<String, Value>,
    depth: usize,
    render: fn(&Value) -> String,
    out: &mut Vec<(String, String)>,
) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match val {
            Value::Object(inner) if depth < MAX_FLATTEN_DEPTH => {
                flatten(&name, inner, depth + 1, render, out)
            }
            other => out.push((name, render(other))),
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) => format!("{:.4}", f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
