//! CLI argument parsing for the smscast binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "smscast", about = "Bulk SMS campaign composer", version)]
pub struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a message and recipients, send it, and record the campaign
    Send(SendArgs),
    /// Show encoding, length and part count for a message
    Segment {
        #[arg(long)]
        message: String,
        /// Recipients to price the estimate for
        #[arg(long, default_value_t = 1)]
        recipients: usize,
    },
    /// Classify recipients against the numbering plan without sending
    Check(RecipientArgs),
    /// Browse and manage campaign history
    #[command(subcommand)]
    Campaigns(CampaignsCommand),
    /// Daily and overall statistics
    #[command(subcommand)]
    Stats(StatsCommand),
    /// Backup, restore and maintenance of stored data
    #[command(subcommand)]
    Data(DataCommand),
    /// Read or update stored settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Manage the contact list
    #[command(subcommand)]
    Contacts(ContactsCommand),
}

#[derive(Args)]
pub struct SendArgs {
    #[arg(long)]
    pub message: String,

    #[command(flatten)]
    pub recipients: RecipientArgs,
}

/// Exactly one recipient source
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct RecipientArgs {
    /// Numbers separated by newlines
    #[arg(long)]
    pub numbers: Option<String>,

    /// File with one number per line
    #[arg(long)]
    pub numbers_file: Option<PathBuf>,

    /// CSV file; the first phone-like cell of each row is used
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum CampaignsCommand {
    /// List campaigns, newest first
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    Show {
        id: String,
    },
    /// Case-insensitive search on message text or id
    Search {
        query: String,
    },
    /// Campaigns created within an inclusive range (YYYY-MM-DD or RFC 3339)
    FilterDate {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// success, partial or failed
    FilterStatus {
        status: String,
    },
    Delete {
        id: String,
    },
    /// Remove all campaigns, statistics and settings
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum StatsCommand {
    /// Per-day totals, newest first
    Daily {
        #[arg(long)]
        days: Option<usize>,
    },
    Overall,
    /// Rebuild the statistics index from campaign history
    Recalculate,
}

#[derive(Subcommand)]
pub enum DataCommand {
    /// Write a full backup as JSON
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Restore sections from a JSON backup
    Import {
        path: PathBuf,
    },
    /// Drop campaigns older than the given number of days
    Purge {
        #[arg(long)]
        days: Option<i64>,
    },
    /// Storage footprint
    Info,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    Get,
    /// Set one key; the value is parsed as JSON, else stored as a string
    Set {
        key: String,
        value: String,
    },
}

#[derive(Subcommand)]
pub enum ContactsCommand {
    List,
    Add(ContactArgs),
    Search {
        query: String,
    },
    Delete {
        id: String,
    },
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Total, distinct categories and companies
    Summary,
    /// Import contacts from CSV with a header row
    Import {
        path: PathBuf,
    },
    /// Export contacts as CSV
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct ContactArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub company: String,
    #[arg(long, default_value = "")]
    pub location: String,
    #[arg(long, default_value = "")]
    pub category: String,
    #[arg(long, default_value = "")]
    pub notes: String,
}
