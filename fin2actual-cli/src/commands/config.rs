//! Config command - show the effective configuration

use anyhow::Result;
use colored::Colorize;

use fin2actual_core::config::Config;

use super::ensure_dir;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let dir = ensure_dir()?;
    let config = Config::load(&dir)?;
    let view = config.masked();

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{} {}", "Settings:".bold(), dir.join("settings.json").display());

    let mut table = output::create_table();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec![
        "Financier export".to_string(),
        view.financier_json.clone().unwrap_or_default(),
    ]);
    table.add_row(vec!["Actual URL".to_string(), view.actual_url.clone()]);
    table.add_row(vec!["Actual API key".to_string(), view.actual_api_key.clone()]);
    table.add_row(vec!["Actual budget".to_string(), view.actual_budget_id.clone()]);
    table.add_row(vec![
        "Budget password".to_string(),
        view.actual_password.clone().unwrap_or_default(),
    ]);
    table.add_row(vec!["Import label".to_string(), view.import_label.clone()]);
    println!("{}", table);

    match config.actual.validate() {
        Ok(()) => output::success("Actual settings look complete"),
        Err(e) => output::warning(&e.to_string()),
    }
    Ok(())
}
