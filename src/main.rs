//! smscast - bulk SMS campaign composer
//!
//! Validates a message and its recipients, posts them to the bulk-send
//! endpoint, and keeps a local campaign history with daily statistics.

mod cli;
mod config;
mod db;
mod defaults;
mod handlers;
mod services;
mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::db::FileKeyValueStore;
use crate::handlers::AppContext;
use crate::services::campaign_store::CampaignStore;
use crate::services::composer::Composer;
use crate::services::contacts::ContactBook;
use crate::services::numbering::NumberingPlan;
use crate::services::recipients::RecipientPipeline;
use crate::services::sender::HttpCampaignSender;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let logs_dir = config::Config::logs_dir();
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "smscast.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // stderr keeps stdout clean for command output
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,smscast=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let config = config::Config::from_env()?;
    debug!(endpoint = %config.endpoint_url, data_dir = %config.data_dir.display(), "Configuration loaded");

    let plan = NumberingPlan::new(
        &config.country_code,
        &config.leading_digits,
        config.subscriber_digits,
    )
    .context("Invalid numbering plan configuration")?;

    let kv = Arc::new(
        FileKeyValueStore::open(&config.data_dir)
            .with_context(|| format!("Failed to open data dir {}", config.data_dir.display()))?,
    );
    let store = Arc::new(CampaignStore::new(kv.clone()));

    match store.purge_older_than(config.retention_days) {
        Ok(0) => {}
        Ok(removed) => info!(
            "Purged {} campaigns older than {} days",
            removed, config.retention_days
        ),
        Err(e) => warn!("Startup purge failed: {}", e),
    }

    let sender = Arc::new(HttpCampaignSender::new(
        config.endpoint_url.clone(),
        config.request_timeout,
    )?);
    let composer = Composer::new(RecipientPipeline::new(plan.clone()), sender, store.clone());

    let ctx = AppContext {
        contacts: ContactBook::new(kv, plan),
        composer,
        store,
        json: cli.json,
        config,
    };

    handlers::run(&ctx, cli).await
}
