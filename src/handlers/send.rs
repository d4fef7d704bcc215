//! Send, segment and recipient-check handlers

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use super::output::{format_cost, print_json, success_rate};
use super::AppContext;
use crate::cli::{RecipientArgs, SendArgs};
use crate::services::composer::{Draft, SubmitError};
use crate::services::recipients::RecipientPipeline;
use crate::services::segmentation::estimate_cost;

/// Read recipients from whichever source was given.
pub fn resolve_recipients(args: &RecipientArgs) -> Result<Vec<String>> {
    if let Some(text) = &args.numbers {
        return Ok(RecipientPipeline::parse_manual_list(text));
    }
    if let Some(path) = &args.numbers_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(RecipientPipeline::parse_manual_list(&text));
    }
    if let Some(path) = &args.csv {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let numbers = RecipientPipeline::parse_csv(&content);
        info!("Found {} phone numbers in {}", numbers.len(), path.display());
        return Ok(numbers);
    }
    anyhow::bail!("No recipients given. Use --numbers, --numbers-file or --csv.")
}

pub async fn handle_send(ctx: &AppContext, args: SendArgs) -> Result<()> {
    let numbers = resolve_recipients(&args.recipients)?;
    let draft = Draft::new(args.message, numbers);

    let quiet = ctx.json;
    let outcome = ctx
        .composer
        .submit_observed(draft, |update| {
            if !quiet {
                eprintln!("[{:>3}%] {}", update.percent, update.label);
            }
        })
        .await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(SubmitError::Validation(e)) => {
            anyhow::bail!("Invalid {}: {}", e.field.as_str(), e.reason)
        }
        Err(SubmitError::Send(e)) => anyhow::bail!("Send failed: {}", e),
    };

    if ctx.json {
        return print_json(&outcome);
    }

    let campaign = &outcome.campaign;
    println!("Campaign {} sent", campaign.id);
    println!(
        "  Recipients: {} ({} valid, {} invalid)",
        campaign.total_recipients,
        campaign.valid_numbers.unwrap_or(outcome.summary.valid as u32),
        campaign.invalid_numbers
    );
    println!(
        "  Delivered:  {} ok, {} failed ({})",
        campaign.successful_sends,
        campaign.failed_sends,
        success_rate(campaign)
    );
    println!(
        "  Message:    {} chars, {} part(s), {}",
        outcome.message_length,
        outcome.segmentation.part_count,
        outcome.segmentation.encoding.as_str()
    );
    if campaign.total_cost > 0.0 {
        println!(
            "  Cost:       {}",
            format_cost(campaign.total_cost, &ctx.config.currency)
        );
    }
    if !campaign.invalid_numbers_list.is_empty() {
        println!("  Rejected:   {}", campaign.invalid_numbers_list.join(", "));
    }
    if !outcome.stored {
        eprintln!("Warning: the campaign was sent but could not be saved to history");
    }
    Ok(())
}

pub fn handle_segment(ctx: &AppContext, message: &str, recipients: usize) -> Result<()> {
    let segmentation = ctx.composer.pipeline().segment_message(message);
    let estimate = ctx
        .config
        .unit_price
        .map(|price| estimate_cost(&segmentation, recipients, price));

    if ctx.json {
        return print_json(&json!({
            "segmentation": segmentation,
            "estimatedCost": estimate,
            "currency": ctx.config.currency,
        }));
    }

    println!(
        "{} characters, {} part(s), {}",
        segmentation.length,
        segmentation.part_count,
        segmentation.encoding.as_str()
    );
    if let Some(cost) = estimate {
        println!(
            "Estimated cost for {} recipient(s): {}",
            recipients,
            format_cost(cost, &ctx.config.currency)
        );
    }
    Ok(())
}

pub fn handle_check(ctx: &AppContext, args: &RecipientArgs) -> Result<()> {
    let numbers = resolve_recipients(args)?;
    let pipeline = ctx.composer.pipeline();
    let summary = pipeline.summarize(&numbers);
    let classification = pipeline.classify(&numbers);

    if ctx.json {
        return print_json(&json!({
            "summary": summary,
            "valid": classification.valid,
            "invalid": classification.invalid,
        }));
    }

    println!(
        "{} number(s): {} valid, {} invalid",
        summary.total, summary.valid, summary.invalid
    );
    for number in &classification.valid {
        let international = pipeline.plan().to_international(number);
        println!("  ok       {}", pipeline.plan().format_for_display(&international));
    }
    for number in &classification.invalid {
        println!("  invalid  {}", number);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::context;
    use std::io::Write;

    fn args() -> RecipientArgs {
        RecipientArgs {
            numbers: None,
            numbers_file: None,
            csv: None,
        }
    }

    #[test]
    fn test_resolve_from_text() {
        let numbers = resolve_recipients(&RecipientArgs {
            numbers: Some("0241234567\n\n0551234567".to_string()),
            ..args()
        })
        .unwrap();
        assert_eq!(numbers, vec!["0241234567", "0551234567"]);
    }

    #[test]
    fn test_resolve_from_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "name,phone\nAma,0241234567\nKofi,n/a\n").unwrap();

        let numbers = resolve_recipients(&RecipientArgs {
            csv: Some(file.path().to_path_buf()),
            ..args()
        })
        .unwrap();
        assert_eq!(numbers, vec!["0241234567"]);
    }

    #[test]
    fn test_resolve_missing_file_is_error() {
        let result = resolve_recipients(&RecipientArgs {
            numbers_file: Some("/nonexistent/numbers.txt".into()),
            ..args()
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_send_failure_is_an_error() {
        let ctx = context();
        let result = handle_send(
            &ctx,
            SendArgs {
                message: "Hello".to_string(),
                recipients: RecipientArgs {
                    numbers: Some("0241234567".to_string()),
                    ..args()
                },
            },
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("offline"));
        assert!(ctx.store.list_campaigns().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_draft_names_the_field() {
        let ctx = context();
        let err = handle_send(
            &ctx,
            SendArgs {
                message: "   ".to_string(),
                recipients: RecipientArgs {
                    numbers: Some("0241234567".to_string()),
                    ..args()
                },
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("Invalid message"));
    }
}
