use serde_json::{Map, Value};
use std::io;

type Writer<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// A single result becomes `field,value` rows with nested records flattened
/// to dotted keys (`breakdown.mao.adjusted_arv`). Lists of records (method
/// comparisons, sensitivity points) become one row per record.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value.get("result").unwrap_or(value);
    let rows = match result.get("results") {
        Some(Value::Array(points)) => Some(points.as_slice()),
        _ => result.as_array().map(Vec::as_slice),
    };

    let written = match (rows, result) {
        (Some(records), _) => write_records(&mut wtr, records),
        (None, Value::Object(map)) => write_fields(&mut wtr, map),
        (None, other) => wtr.write_record([cell(other)]),
    };
    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV output error: {}", e);
    }
}

fn write_fields(wtr: &mut Writer<'_>, map: &Map<String, Value>) -> csv::Result<()> {
    let mut flat = Vec::new();
    flatten("", map, &mut flat);
    wtr.write_record(["field", "value"])?;
    for (key, val) in flat {
        wtr.write_record([key.as_str(), val.as_str()])?;
    }
    Ok(())
}

fn write_records(wtr: &mut Writer<'_>, records: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = records.first() else {
        for item in records {
            wtr.write_record([cell(item)])?;
        }
        return Ok(());
    };

    let mut header = Vec::new();
    flatten("", first, &mut header);
    let keys: Vec<String> = header.into_iter().map(|(k, _)| k).collect();
    wtr.write_record(&keys)?;

    for item in records {
        if let Value::Object(map) = item {
            let mut flat = Vec::new();
            flatten("", map, &mut flat);
            let row: Vec<String> = keys
                .iter()
                .map(|k| {
                    flat.iter()
                        .find(|(fk, _)| fk == k)
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default()
                })
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

fn flatten(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten(&name, inner, out),
            _ => out.push((name, cell(val))),
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
