use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use flip_deal_core::deal::DealInputs;
use flip_deal_core::settings::CalculationSettings;

use super::stdin;

/// Read a JSON or YAML file (chosen by extension) into a typed struct.
pub fn read_document<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let is_yaml = canonical
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let value: T = if is_yaml {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    log::debug!("loaded {}", canonical.display());
    Ok(value)
}

/// Settings from `path`, or the defaults when no file is given.
pub fn load_settings(path: Option<&str>) -> Result<CalculationSettings, Box<dyn std::error::Error>> {
    match path {
        Some(p) => read_document(p),
        None => {
            log::debug!("no settings file given, using defaults");
            Ok(CalculationSettings::default())
        }
    }
}

/// Deal inputs from `path`, falling back to a document piped on stdin.
pub fn load_deal(path: Option<&str>) -> Result<DealInputs, Box<dyn std::error::Error>> {
    if let Some(p) = path {
        return read_document(p);
    }
    match stdin::read_stdin()? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Err("--deal <file> or a deal document on stdin is required".into()),
    }
}

/// Resolve and validate the path.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
