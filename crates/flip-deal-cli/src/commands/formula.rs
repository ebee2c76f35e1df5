use clap::Args;
use serde_json::Value;

use flip_deal_core::formula::{self, FormulaKind};

use crate::input::file;

/// Arguments for rendering a formula preview
#[derive(Args)]
pub struct PreviewArgs {
    /// Formula to render: mao, roi, contingency, holding, selling, profit, alerts
    #[arg(long)]
    pub which: FormulaKind,

    /// Path to a settings file (JSON or YAML); defaults apply when omitted
    #[arg(long)]
    pub settings: Option<String>,

    /// Deal to substitute into the formula; a sample deal is used when omitted
    #[arg(long)]
    pub deal: Option<String>,
}

pub fn run_preview(args: PreviewArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let settings = file::load_settings(args.settings.as_deref())?;
    let deal = match args.deal.as_deref() {
        Some(path) => Some(file::read_document(path)?),
        None => None,
    };
    let preview = formula::preview_formula(&settings, args.which, deal.as_ref())?;
    Ok(serde_json::json!({ "result": preview }))
}
