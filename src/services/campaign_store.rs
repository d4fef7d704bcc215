//! Campaign store
//!
//! Keeps the campaign history (newest first, capped at `MAX_CAMPAIGNS`), the
//! per-day statistics index and the settings object in a `KeyValueStore`.
//! The statistics index is always `fold(campaigns)`: saves add to it
//! incrementally, while evictions past the cap, deletions and purges
//! rebuild it from scratch.
//!
//! Reads are forgiving. A corrupt or unreadable value is logged and treated
//! as empty, so a damaged history never blocks sending.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::{KeyValueStore, StoreError};
use crate::defaults::MAX_CAMPAIGNS;
use crate::types::{
    Campaign, CampaignStatus, DailyStatistic, ExportBundle, OverallStatistics, Settings,
    StatisticsIndex, StorageInfo,
};

pub const CAMPAIGNS_KEY: &str = "sms_campaigns";
pub const STATISTICS_KEY: &str = "sms_statistics";
pub const SETTINGS_KEY: &str = "sms_settings";

/// Prefix shared by every key this application persists
pub const KEY_PREFIX: &str = "sms_";

pub struct CampaignStore {
    kv: Arc<dyn KeyValueStore>,
    // Held across read-modify-write cycles
    write_lock: Mutex<()>,
}

impl CampaignStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    // ==========================================================================
    // Campaigns
    // ==========================================================================

    /// Record a campaign at the head of the history and add it to its day's
    /// statistics. The oldest entries beyond the cap are dropped.
    pub fn save_campaign(&self, campaign: Campaign) -> Result<Campaign, StoreError> {
        if !campaign.is_consistent() {
            return Err(StoreError::InconsistentCampaign(campaign.id));
        }

        let _guard = self.write_lock.lock();

        let mut campaigns = self.load_campaigns();
        campaigns.insert(0, campaign.clone());
        let dropped = campaigns.len().saturating_sub(MAX_CAMPAIGNS);
        campaigns.truncate(MAX_CAMPAIGNS);
        self.write_json(CAMPAIGNS_KEY, &campaigns)?;

        // Evicted campaigns must leave the index too
        let stats = if dropped > 0 {
            debug!("Dropped {} oldest campaigns beyond the history cap", dropped);
            Self::fold_statistics(&campaigns)
        } else {
            let mut stats = self.load_statistics();
            stats
                .entry(campaign.date())
                .or_insert_with(|| DailyStatistic::empty(campaign.date()))
                .add(&campaign);
            stats
        };
        self.write_json(STATISTICS_KEY, &stats)?;

        info!(
            "Saved campaign {} ({} recipients, {} ok, {} failed)",
            campaign.id, campaign.total_recipients, campaign.successful_sends, campaign.failed_sends
        );
        Ok(campaign)
    }

    /// Full history, newest first. Empty if storage is missing or corrupt.
    pub fn list_campaigns(&self) -> Vec<Campaign> {
        self.load_campaigns()
    }

    pub fn get_campaign(&self, id: &str) -> Option<Campaign> {
        self.load_campaigns().into_iter().find(|c| c.id == id)
    }

    /// Remove a campaign and rebuild statistics. Returns whether it existed.
    pub fn delete_campaign(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();

        let mut campaigns = self.load_campaigns();
        let before = campaigns.len();
        campaigns.retain(|c| c.id != id);
        let removed = campaigns.len() != before;

        self.write_json(CAMPAIGNS_KEY, &campaigns)?;
        self.write_json(STATISTICS_KEY, &Self::fold_statistics(&campaigns))?;

        if removed {
            info!("Deleted campaign {}", id);
        }
        Ok(removed)
    }

    // ==========================================================================
    // Statistics
    // ==========================================================================

    /// Discard the statistics index and rebuild it from the campaign list.
    pub fn recalculate(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let campaigns = self.load_campaigns();
        self.write_json(STATISTICS_KEY, &Self::fold_statistics(&campaigns))
    }

    fn fold_statistics(campaigns: &[Campaign]) -> StatisticsIndex {
        let mut stats = StatisticsIndex::new();
        for campaign in campaigns {
            stats
                .entry(campaign.date())
                .or_insert_with(|| DailyStatistic::empty(campaign.date()))
                .add(campaign);
        }
        stats
    }

    pub fn statistics(&self) -> StatisticsIndex {
        self.load_statistics()
    }

    /// Up to `days` most recent day buckets, newest first.
    pub fn daily_statistics(&self, days: usize) -> Vec<DailyStatistic> {
        self.load_statistics()
            .into_values()
            .rev()
            .take(days)
            .collect()
    }

    pub fn overall_statistics(&self) -> OverallStatistics {
        OverallStatistics::fold(&self.load_campaigns())
    }

    // ==========================================================================
    // Search and filter
    // ==========================================================================

    /// Case-insensitive substring match on message or id.
    pub fn search(&self, query: &str) -> Vec<Campaign> {
        let query = query.to_lowercase();
        self.load_campaigns()
            .into_iter()
            .filter(|c| {
                c.message.to_lowercase().contains(&query) || c.id.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Campaigns with `start <= created_at <= end`.
    pub fn filter_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Campaign> {
        self.load_campaigns()
            .into_iter()
            .filter(|c| c.created_at >= start && c.created_at <= end)
            .collect()
    }

    /// `success`, `partial` or `failed`; any other value returns everything.
    pub fn filter_by_status(&self, status: &str) -> Vec<Campaign> {
        let campaigns = self.load_campaigns();
        match CampaignStatus::parse(status) {
            Some(status) => campaigns.into_iter().filter(|c| status.matches(c)).collect(),
            None => campaigns,
        }
    }

    // ==========================================================================
    // Settings
    // ==========================================================================

    pub fn settings(&self) -> Settings {
        self.read_json(SETTINGS_KEY)
    }

    /// Shallow-merge `patch` over the stored settings; returns the result.
    pub fn save_settings(&self, patch: Settings) -> Result<Settings, StoreError> {
        let _guard = self.write_lock.lock();
        let mut settings: Settings = self.read_json(SETTINGS_KEY);
        settings.extend(patch);
        self.write_json(SETTINGS_KEY, &settings)?;
        Ok(settings)
    }

    // ==========================================================================
    // Import / export / maintenance
    // ==========================================================================

    pub fn export_all(&self) -> ExportBundle {
        ExportBundle {
            campaigns: self.load_campaigns(),
            statistics: self.load_statistics(),
            settings: self.settings(),
            exported_at: Utc::now(),
        }
    }

    /// Replace each section present in `blob`. Every present section is
    /// checked before anything is written; a malformed blob changes nothing
    /// and reports `false`.
    pub fn import_all(&self, blob: &serde_json::Value) -> bool {
        let Some(object) = blob.as_object() else {
            warn!("Import rejected: backup is not a JSON object");
            return false;
        };

        let campaigns = match Self::section::<Vec<Campaign>>(object, "campaigns") {
            Ok(section) => section,
            Err(e) => {
                warn!("Import rejected: invalid campaigns section: {}", e);
                return false;
            }
        };
        let statistics = match Self::section::<StatisticsIndex>(object, "statistics") {
            Ok(section) => section,
            Err(e) => {
                warn!("Import rejected: invalid statistics section: {}", e);
                return false;
            }
        };
        let settings = match Self::section::<Settings>(object, "settings") {
            Ok(section) => section,
            Err(e) => {
                warn!("Import rejected: invalid settings section: {}", e);
                return false;
            }
        };

        match self.apply_import(campaigns, statistics, settings) {
            Ok(()) => {
                info!("Imported backup");
                true
            }
            Err(e) => {
                warn!("Import failed while writing: {}", e);
                false
            }
        }
    }

    /// Absent or `null` sections are `None`; present ones must deserialize.
    fn section<T: DeserializeOwned>(
        object: &serde_json::Map<String, serde_json::Value>,
        name: &str,
    ) -> Result<Option<T>, serde_json::Error> {
        match object.get(name) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some),
        }
    }

    fn apply_import(
        &self,
        campaigns: Option<Vec<Campaign>>,
        statistics: Option<StatisticsIndex>,
        settings: Option<Settings>,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();

        let rebuild_statistics = campaigns.is_some() && statistics.is_none();

        if let Some(mut campaigns) = campaigns {
            campaigns.truncate(MAX_CAMPAIGNS);
            self.write_json(CAMPAIGNS_KEY, &campaigns)?;
        }
        if let Some(statistics) = statistics {
            self.write_json(STATISTICS_KEY, &statistics)?;
        }
        if let Some(settings) = settings {
            self.write_json(SETTINGS_KEY, &settings)?;
        }

        if rebuild_statistics {
            let campaigns = self.load_campaigns();
            self.write_json(STATISTICS_KEY, &Self::fold_statistics(&campaigns))?;
        }
        Ok(())
    }

    /// Drop campaigns created more than `days_to_keep` days ago. A window
    /// reaching past the representable calendar keeps everything.
    pub fn purge_older_than(&self, days_to_keep: i64) -> Result<usize, StoreError> {
        let cutoff = TimeDelta::try_days(days_to_keep)
            .and_then(|window| Utc::now().checked_sub_signed(window));
        match cutoff {
            Some(cutoff) => self.purge_before(cutoff),
            None => {
                debug!("Retention of {} days exceeds the calendar, nothing to purge", days_to_keep);
                Ok(0)
            }
        }
    }

    /// Drop campaigns created before `cutoff`, then rebuild statistics.
    /// Returns the number removed.
    pub fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock();

        let mut campaigns = self.load_campaigns();
        let before = campaigns.len();
        campaigns.retain(|c| c.created_at >= cutoff);
        let removed = before - campaigns.len();

        self.write_json(CAMPAIGNS_KEY, &campaigns)?;
        self.write_json(STATISTICS_KEY, &Self::fold_statistics(&campaigns))?;

        if removed > 0 {
            info!("Purged {} campaigns created before {}", removed, cutoff);
        }
        Ok(removed)
    }

    /// Remove campaigns, statistics and settings.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        self.kv.remove(CAMPAIGNS_KEY)?;
        self.kv.remove(STATISTICS_KEY)?;
        self.kv.remove(SETTINGS_KEY)?;
        info!("Cleared all campaign data");
        Ok(())
    }

    pub fn storage_footprint(&self) -> StorageInfo {
        let campaigns = self.load_campaigns();
        let statistics = self.load_statistics();

        let byte_size = match self.kv.keys() {
            Ok(keys) => keys
                .iter()
                .filter(|key| key.starts_with(KEY_PREFIX))
                .filter_map(|key| self.kv.get(key).ok().flatten())
                .map(|value| value.len())
                .sum(),
            Err(e) => {
                warn!("Failed to enumerate storage keys: {}", e);
                0
            }
        };

        StorageInfo {
            campaign_count: campaigns.len(),
            statistic_day_count: statistics.len(),
            byte_size,
            last_campaign_timestamp: campaigns.first().map(|c| c.created_at),
        }
    }

    // ==========================================================================
    // Raw access
    // ==========================================================================

    fn load_campaigns(&self) -> Vec<Campaign> {
        self.read_json(CAMPAIGNS_KEY)
    }

    fn load_statistics(&self) -> StatisticsIndex {
        self.read_json(STATISTICS_KEY)
    }

    fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.kv.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                return T::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse {}: {}", key, e);
                T::default()
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        self.kv.set(key, &json)
    }
}
