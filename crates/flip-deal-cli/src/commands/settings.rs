use clap::{Args, Subcommand};
use serde_json::Value;

use flip_deal_core::settings::{self, CalculationSettings, SettingsUpdate};

use crate::input::file;

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print the default calculation settings
    Defaults,
    /// Validate a settings file
    Validate(ValidateArgs),
    /// Apply a partial update to a settings file and print the merged result
    Update(UpdateArgs),
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to a settings file (JSON or YAML)
    #[arg(long)]
    pub settings: String,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Current settings (JSON or YAML); defaults apply when omitted
    #[arg(long)]
    pub settings: Option<String>,

    /// Partial update document (JSON or YAML)
    #[arg(long)]
    pub update: String,
}

pub fn run_settings(cmd: SettingsCommand) -> Result<Value, Box<dyn std::error::Error>> {
    match cmd {
        SettingsCommand::Defaults => Ok(serde_json::json!({
            "result": CalculationSettings::default(),
        })),
        SettingsCommand::Validate(args) => {
            let s: CalculationSettings = file::read_document(&args.settings)?;
            s.validate()?;
            Ok(serde_json::json!({ "result": { "valid": true } }))
        }
        SettingsCommand::Update(args) => {
            let current = file::load_settings(args.settings.as_deref())?;
            let update: SettingsUpdate = file::read_document(&args.update)?;
            let next = settings::apply_update(&current, &update)?;
            Ok(serde_json::json!({ "result": next }))
        }
    }
}
