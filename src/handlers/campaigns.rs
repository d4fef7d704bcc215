//! Campaign history and statistics handlers

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::output::{campaign_line, format_cost, print_json, success_rate};
use super::AppContext;
use crate::cli::{CampaignsCommand, StatsCommand};
use crate::defaults::DEFAULT_DAILY_STATS_DAYS;
use crate::types::{parse_timestamp, Campaign};

pub fn handle_campaigns(ctx: &AppContext, cmd: CampaignsCommand) -> Result<()> {
    match cmd {
        CampaignsCommand::List { limit } => {
            let mut campaigns = ctx.store.list_campaigns();
            if let Some(limit) = limit {
                campaigns.truncate(limit);
            }
            print_campaigns(ctx, &campaigns)
        }
        CampaignsCommand::Show { id } => {
            let campaign = ctx
                .store
                .get_campaign(&id)
                .with_context(|| format!("Campaign '{}' not found", id))?;
            print_campaign_detail(ctx, &campaign)
        }
        CampaignsCommand::Search { query } => print_campaigns(ctx, &ctx.store.search(&query)),
        CampaignsCommand::FilterDate { from, to } => {
            let start = parse_bound(&from, false)?;
            let end = parse_bound(&to, true)?;
            if start > end {
                anyhow::bail!("--from must not be after --to");
            }
            print_campaigns(ctx, &ctx.store.filter_by_date_range(start, end))
        }
        CampaignsCommand::FilterStatus { status } => {
            print_campaigns(ctx, &ctx.store.filter_by_status(&status))
        }
        CampaignsCommand::Delete { id } => {
            if !ctx.store.delete_campaign(&id)? {
                anyhow::bail!("Campaign '{}' not found", id);
            }
            println!("Deleted campaign {}", id);
            Ok(())
        }
        CampaignsCommand::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to clear all data without --yes");
            }
            ctx.store.clear_all()?;
            println!("All campaign data cleared");
            Ok(())
        }
    }
}

pub fn handle_stats(ctx: &AppContext, cmd: StatsCommand) -> Result<()> {
    let currency = &ctx.config.currency;
    match cmd {
        StatsCommand::Daily { days } => {
            let daily = ctx
                .store
                .daily_statistics(days.unwrap_or(DEFAULT_DAILY_STATS_DAYS));
            if ctx.json {
                return print_json(&daily);
            }
            if daily.is_empty() {
                println!("No statistics yet");
            }
            for day in &daily {
                println!(
                    "{}  {} campaign(s)  {} sent  {} ok  {} failed  {}",
                    day.date,
                    day.total_campaigns,
                    day.total_messages_sent,
                    day.total_successful,
                    day.total_failed,
                    format_cost(day.total_cost, currency)
                );
            }
            Ok(())
        }
        StatsCommand::Overall => {
            let overall = ctx.store.overall_statistics();
            if ctx.json {
                return print_json(&overall);
            }
            println!("Campaigns:    {}", overall.total_campaigns);
            println!("Messages:     {}", overall.total_messages);
            println!("Successful:   {}", overall.total_successful);
            println!("Failed:       {}", overall.total_failed);
            println!("Success rate: {:.1}%", overall.success_rate);
            println!("Total cost:   {}", format_cost(overall.total_cost, currency));
            Ok(())
        }
        StatsCommand::Recalculate => {
            ctx.store.recalculate()?;
            println!("Statistics rebuilt from campaign history");
            Ok(())
        }
    }
}

fn print_campaigns(ctx: &AppContext, campaigns: &[Campaign]) -> Result<()> {
    if ctx.json {
        return print_json(campaigns);
    }
    if campaigns.is_empty() {
        println!("No campaigns found");
    }
    for campaign in campaigns {
        println!("{}", campaign_line(campaign, &ctx.config.currency));
    }
    Ok(())
}

fn print_campaign_detail(ctx: &AppContext, campaign: &Campaign) -> Result<()> {
    if ctx.json {
        return print_json(campaign);
    }
    println!("Campaign {}", campaign.id);
    println!("  Created:    {}", campaign.created_at.to_rfc3339());
    println!("  Status:     {}", campaign.status().as_str());
    println!("  Recipients: {}", campaign.total_recipients);
    if let Some(valid) = campaign.valid_numbers {
        println!("  Valid:      {}", valid);
    }
    println!("  Invalid:    {}", campaign.invalid_numbers);
    println!(
        "  Delivered:  {} ok, {} failed ({})",
        campaign.successful_sends,
        campaign.failed_sends,
        success_rate(campaign)
    );
    println!(
        "  Cost:       {}",
        format_cost(campaign.total_cost, &ctx.config.currency)
    );
    if !campaign.invalid_numbers_list.is_empty() {
        println!("  Rejected:   {}", campaign.invalid_numbers_list.join(", "));
    }
    println!();
    println!("{}", campaign.message);
    Ok(())
}

/// A timestamp, or a bare date meaning the start (or end) of that UTC day.
fn parse_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Some(ts) = parse_timestamp(raw) {
        return Ok(ts);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        Some(NaiveTime::MIN)
    }
    .context("Invalid time of day")?;
    Ok(date.and_time(time).and_utc())
}
