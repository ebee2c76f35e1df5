use serde_json::Value;
use std::io::{self, Read};

/// Read a piped deal document. YAML is a superset of JSON, so either works.
/// Returns None when stdin is a terminal or carries nothing.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let document = buffer.trim();
    if document.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_yaml::from_str(document)
        .map_err(|e| format!("Failed to parse deal from stdin: {}", e))?;
    log::debug!("read {} bytes of deal input from stdin", document.len());
    Ok(Some(value))
}
