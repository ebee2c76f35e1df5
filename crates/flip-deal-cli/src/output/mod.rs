pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
///
/// CSV and minimal output carry no room for the envelope's warnings, so those
/// go to stderr instead.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => {
            csv_out::print_csv(value);
            warnings_to_stderr(value);
        }
        OutputFormat::Minimal => {
            minimal::print_minimal(value);
            warnings_to_stderr(value);
        }
    }
}

fn warnings_to_stderr(value: &Value) {
    if let Some(warnings) = value.get("warnings").and_then(|w| w.as_array()) {
        for w in warnings.iter().filter_map(|w| w.as_str()) {
            eprintln!("warning: {w}");
        }
    }
}
