//! Campaign records and the statistics derived from them

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One completed bulk-send attempt, as returned by the send endpoint.
///
/// Field names follow the endpoint payload (snake_case), which is also the
/// persisted format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub message: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub total_recipients: u32,
    #[serde(default)]
    pub successful_sends: u32,
    #[serde(default)]
    pub failed_sends: u32,
    #[serde(default)]
    pub invalid_numbers: u32,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_numbers: Option<u32>,
    /// First few rejected numbers, for display
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_numbers_list: Vec<String>,
}

impl Campaign {
    /// Calendar date bucket for statistics.
    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// `successful_sends + failed_sends <= total_recipients` and a non-negative cost.
    pub fn is_consistent(&self) -> bool {
        let sends = u64::from(self.successful_sends) + u64::from(self.failed_sends);
        sends <= u64::from(self.total_recipients) && self.total_cost >= 0.0
    }

    pub fn status(&self) -> CampaignStatus {
        if self.failed_sends == 0 {
            CampaignStatus::Success
        } else if self.successful_sends == 0 {
            CampaignStatus::Failed
        } else {
            CampaignStatus::Partial
        }
    }
}

/// The endpoint emits naive local ISO timestamps (`2024-05-01T12:30:00.123456`);
/// exported data carries RFC 3339. Accept both, treating naive values as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid timestamp '{}'", raw))
    })
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Outcome class used by the status filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// No failed sends
    Success,
    /// Some sends succeeded and some failed
    Partial,
    /// No successful sends
    Failed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "partial" => Some(Self::Partial),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Filter predicate. The classes overlap: a campaign with zero sends is
    /// both `success` and `failed`.
    pub fn matches(&self, campaign: &Campaign) -> bool {
        match self {
            Self::Success => campaign.failed_sends == 0,
            Self::Partial => campaign.successful_sends > 0 && campaign.failed_sends > 0,
            Self::Failed => campaign.successful_sends == 0,
        }
    }
}

/// Running totals for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStatistic {
    pub date: NaiveDate,
    pub total_campaigns: u32,
    pub total_messages_sent: u64,
    pub total_successful: u64,
    pub total_failed: u64,
    pub total_cost: f64,
}

impl DailyStatistic {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_campaigns: 0,
            total_messages_sent: 0,
            total_successful: 0,
            total_failed: 0,
            total_cost: 0.0,
        }
    }

    pub fn add(&mut self, campaign: &Campaign) {
        self.total_campaigns += 1;
        self.total_messages_sent += u64::from(campaign.total_recipients);
        self.total_successful += u64::from(campaign.successful_sends);
        self.total_failed += u64::from(campaign.failed_sends);
        self.total_cost += campaign.total_cost;
    }
}

/// Statistics index persisted under `sms_statistics`, keyed by ISO date.
pub type StatisticsIndex = BTreeMap<NaiveDate, DailyStatistic>;

/// Totals across every stored campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStatistics {
    pub total_campaigns: usize,
    pub total_messages: u64,
    pub total_successful: u64,
    pub total_failed: u64,
    pub total_cost: f64,
    /// Percentage of successful sends; 0 when nothing was sent
    pub success_rate: f64,
}

impl OverallStatistics {
    pub fn fold<'a>(campaigns: impl IntoIterator<Item = &'a Campaign>) -> Self {
        let mut overall = Self {
            total_campaigns: 0,
            total_messages: 0,
            total_successful: 0,
            total_failed: 0,
            total_cost: 0.0,
            success_rate: 0.0,
        };

        for campaign in campaigns {
            overall.total_campaigns += 1;
            overall.total_messages += u64::from(campaign.total_recipients);
            overall.total_successful += u64::from(campaign.successful_sends);
            overall.total_failed += u64::from(campaign.failed_sends);
            overall.total_cost += campaign.total_cost;
        }

        if overall.total_messages > 0 {
            overall.success_rate =
                overall.total_successful as f64 / overall.total_messages as f64 * 100.0;
        }

        overall
    }
}

/// Introspection of the persisted footprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageInfo {
    pub campaign_count: usize,
    pub statistic_day_count: usize,
    /// Total length of all persisted values under the `sms_` prefix
    pub byte_size: usize,
    pub last_campaign_timestamp: Option<DateTime<Utc>>,
}

/// Free-form settings object persisted under `sms_settings`
pub type Settings = serde_json::Map<String, serde_json::Value>;

/// Full backup of the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub campaigns: Vec<Campaign>,
    pub statistics: StatisticsIndex,
    pub settings: Settings,
    pub exported_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn campaign(successful: u32, failed: u32) -> Campaign {
        Campaign {
            id: "20240501_120000".to_string(),
            message: "Hello".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            total_recipients: 10,
            successful_sends: successful,
            failed_sends: failed,
            invalid_numbers: 0,
            total_cost: 0.0,
            valid_numbers: None,
            invalid_numbers_list: Vec::new(),
        }
    }

    #[test]
    fn test_deserialize_endpoint_payload_with_naive_timestamp() {
        let json = r#"{
            "id": "20240501_123000",
            "message": "Hi all",
            "total_recipients": 3,
            "valid_numbers": 2,
            "invalid_numbers": 1,
            "successful_sends": 2,
            "failed_sends": 0,
            "total_cost": 1.6,
            "created_at": "2024-05-01T12:30:00.123456",
            "details": [],
            "invalid_numbers_list": ["notanumber"]
        }"#;

        let campaign: Campaign = serde_json::from_str(json).unwrap();
        assert_eq!(campaign.total_recipients, 3);
        assert_eq!(campaign.valid_numbers, Some(2));
        assert_eq!(campaign.date(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(campaign.invalid_numbers_list, vec!["notanumber"]);
    }

    #[test]
    fn test_timestamp_accepts_rfc3339() {
        let parsed = parse_timestamp("2024-05-01T23:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 21, 30, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_consistency_invariant() {
        assert!(campaign(6, 4).is_consistent());
        assert!(!campaign(8, 4).is_consistent());
    }

    #[test]
    fn test_status_classes() {
        assert_eq!(campaign(10, 0).status(), CampaignStatus::Success);
        assert_eq!(campaign(4, 6).status(), CampaignStatus::Partial);
        assert_eq!(campaign(0, 10).status(), CampaignStatus::Failed);

        let empty = campaign(0, 0);
        assert!(CampaignStatus::Success.matches(&empty));
        assert!(CampaignStatus::Failed.matches(&empty));
        assert!(!CampaignStatus::Partial.matches(&empty));
        assert_eq!(CampaignStatus::parse("bogus"), None);
    }

    #[test]
    fn test_overall_success_rate_handles_zero_messages() {
        let overall = OverallStatistics::fold(std::iter::empty());
        assert_eq!(overall.total_campaigns, 0);
        assert_eq!(overall.success_rate, 0.0);

        let campaigns = vec![campaign(3, 1), campaign(5, 1)];
        let overall = OverallStatistics::fold(&campaigns);
        assert_eq!(overall.total_messages, 20);
        assert_eq!(overall.total_successful, 8);
        assert!((overall.success_rate - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_index_serializes_with_date_keys() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut index = StatisticsIndex::new();
        let mut stat = DailyStatistic::empty(date);
        stat.add(&campaign(3, 1));
        index.insert(date, stat);

        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json["2024-05-01"]["total_messages_sent"], 10);
        assert_eq!(json["2024-05-01"]["date"], "2024-05-01");

        let back: StatisticsIndex = serde_json::from_value(json).unwrap();
        assert_eq!(back, index);
    }
}
