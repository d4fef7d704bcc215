//! Command handlers
//!
//! Each subcommand maps to one handler. Handlers print results and return
//! `anyhow::Result`; an `Err` ends the process with a non-zero exit code.

pub mod campaigns;
pub mod contacts;
pub mod data;
pub mod output;
pub mod send;

use std::sync::Arc;

use anyhow::Result;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::services::campaign_store::CampaignStore;
use crate::services::composer::Composer;
use crate::services::contacts::ContactBook;

/// Everything a handler may need
pub struct AppContext {
    pub config: Config,
    pub store: Arc<CampaignStore>,
    pub contacts: ContactBook,
    pub composer: Composer,
    /// Print JSON instead of text
    pub json: bool,
}

pub async fn run(ctx: &AppContext, cli: Cli) -> Result<()> {
    match cli.command {
        Command::Send(args) => send::handle_send(ctx, args).await,
        Command::Segment {
            message,
            recipients,
        } => send::handle_segment(ctx, &message, recipients),
        Command::Check(args) => send::handle_check(ctx, &args),
        Command::Campaigns(cmd) => campaigns::handle_campaigns(ctx, cmd),
        Command::Stats(cmd) => campaigns::handle_stats(ctx, cmd),
        Command::Data(cmd) => data::handle_data(ctx, cmd),
        Command::Settings(cmd) => data::handle_settings(ctx, cmd),
        Command::Contacts(cmd) => contacts::handle_contacts(ctx, cmd),
    }
}
