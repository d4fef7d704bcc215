//! Contact list types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored contact, persisted under `sms_users`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub full_name: String,
    pub email: String,
    /// International form, e.g. `+233241234567`
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Request to add a contact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub notes: String,
}

/// Result of a CSV contact import
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Contact list counters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub total: usize,
    pub categories: usize,
    pub companies: usize,
}
