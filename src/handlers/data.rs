//! Backup, restore, maintenance and settings handlers

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use super::output::print_json;
use super::AppContext;
use crate::cli::{DataCommand, SettingsCommand};
use crate::types::{ExportBundle, Settings};

pub fn handle_data(ctx: &AppContext, cmd: DataCommand) -> Result<()> {
    match cmd {
        DataCommand::Export { out } => {
            let bundle = ctx.store.export_all();
            match out {
                Some(path) => {
                    let json = serde_json::to_string_pretty(&bundle)?;
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    if ctx.json {
                        return print_json(&export_report(&bundle, &path));
                    }
                    println!(
                        "Exported {} campaign(s) to {}",
                        bundle.campaigns.len(),
                        path.display()
                    );
                    Ok(())
                }
                None => print_json(&bundle),
            }
        }
        DataCommand::Import { path } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let blob: Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", path.display()))?;
            if !ctx.store.import_all(&blob) {
                anyhow::bail!("Import failed: {} is not a valid backup", path.display());
            }
            println!("Imported backup from {}", path.display());
            Ok(())
        }
        DataCommand::Purge { days } => {
            let days = days.unwrap_or(ctx.config.retention_days);
            if days < 0 {
                anyhow::bail!("--days must not be negative");
            }
            let removed = ctx.store.purge_older_than(days)?;
            println!("Removed {} campaign(s) older than {} days", removed, days);
            Ok(())
        }
        DataCommand::Info => {
            let info = ctx.store.storage_footprint();
            if ctx.json {
                return print_json(&info);
            }
            println!("Campaigns:     {}", info.campaign_count);
            println!("Statistic days: {}", info.statistic_day_count);
            println!("Stored bytes:  {}", info.byte_size);
            match info.last_campaign_timestamp {
                Some(ts) => println!("Last campaign: {}", ts.to_rfc3339()),
                None => println!("Last campaign: none"),
            }
            Ok(())
        }
    }
}

pub fn handle_settings(ctx: &AppContext, cmd: SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::Get => print_json(&ctx.store.settings()),
        SettingsCommand::Set { key, value } => {
            let mut patch = Settings::new();
            patch.insert(key, parse_setting_value(&value));
            let merged = ctx.store.save_settings(patch)?;
            print_json(&merged)
        }
    }
}

fn export_report(bundle: &ExportBundle, path: &Path) -> Value {
    json!({
        "path": path.display().to_string(),
        "campaigns": bundle.campaigns.len(),
        "statisticDays": bundle.statistics.len(),
        "exportedAt": bundle.exported_at,
    })
}

/// JSON if it parses, otherwise the raw string.
fn parse_setting_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
