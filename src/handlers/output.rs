//! Terminal output helpers

use anyhow::Result;
use serde::Serialize;

use crate::types::Campaign;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn format_cost(amount: f64, currency: &str) -> String {
    format!("{:.2} {}", amount, currency)
}

/// Percentage of recipients reached, one decimal place.
pub fn success_rate(campaign: &Campaign) -> String {
    if campaign.total_recipients == 0 {
        return "0.0%".to_string();
    }
    let rate = f64::from(campaign.successful_sends) / f64::from(campaign.total_recipients) * 100.0;
    format!("{:.1}%", rate)
}

/// First `max` characters, with an ellipsis when cut.
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{}...", cut)
    }
}

pub fn campaign_line(campaign: &Campaign, currency: &str) -> String {
    format!(
        "{}  {}  {:<7}  {}/{} sent ({})  {}  {}",
        campaign.id,
        campaign.created_at.format("%Y-%m-%d %H:%M"),
        campaign.status().as_str(),
        campaign.successful_sends,
        campaign.total_recipients,
        success_rate(campaign),
        format_cost(campaign.total_cost, currency),
        preview(&campaign.message, 40)
    )
}
