//! Configuration management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{self, Context, Result};

use crate::defaults;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the bulk-send endpoint
    pub endpoint_url: String,

    /// Directory holding the persisted campaign/statistics/settings/contact keys
    pub data_dir: PathBuf,

    /// Request timeout for the send endpoint
    pub request_timeout: Duration,

    /// Campaigns older than this are purged at startup
    pub retention_days: i64,

    /// Currency label for costs (the endpoint reports plain numbers)
    pub currency: String,

    /// Optional per-part price used for cost estimates
    pub unit_price: Option<f64>,

    /// Numbering plan: country calling code without `+`
    pub country_code: String,

    /// Numbering plan: allowed first subscriber digit, as a character-class body (e.g. `2-5`)
    pub leading_digits: String,

    /// Numbering plan: digits following the leading digit
    pub subscriber_digits: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: defaults::DEFAULT_ENDPOINT_URL.to_string(),
            data_dir: PathBuf::from("data"),
            request_timeout: Duration::from_secs(defaults::DEFAULT_REQUEST_TIMEOUT_SECS),
            retention_days: defaults::DEFAULT_RETENTION_DAYS,
            currency: defaults::DEFAULT_CURRENCY.to_string(),
            unit_price: None,
            country_code: defaults::DEFAULT_COUNTRY_CODE.to_string(),
            leading_digits: defaults::DEFAULT_LEADING_DIGITS.to_string(),
            subscriber_digits: defaults::DEFAULT_SUBSCRIBER_DIGITS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(url) = std::env::var("SMS_ENDPOINT_URL") {
            config.endpoint_url = url;
        }

        if let Ok(dir) = std::env::var("SMS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(secs) = std::env::var("SMS_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .context("SMS_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
            if secs == 0 {
                anyhow::bail!("SMS_REQUEST_TIMEOUT_SECS must be greater than zero");
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(days) = std::env::var("SMS_RETENTION_DAYS") {
            config.retention_days = days
                .parse()
                .context("SMS_RETENTION_DAYS must be a whole number of days")?;
            if config.retention_days < 0 {
                anyhow::bail!("SMS_RETENTION_DAYS must not be negative");
            }
        }

        if let Ok(currency) = std::env::var("SMS_CURRENCY") {
            config.currency = currency;
        }

        if let Ok(price) = std::env::var("SMS_UNIT_PRICE") {
            config.unit_price = Some(parse_unit_price(&price)?);
        }

        if let Ok(code) = std::env::var("SMS_COUNTRY_CODE") {
            config.country_code = code.trim_start_matches('+').to_string();
        }

        if let Ok(leading) = std::env::var("SMS_LEADING_DIGITS") {
            config.leading_digits = leading;
        }

        if let Ok(digits) = std::env::var("SMS_SUBSCRIBER_DIGITS") {
            config.subscriber_digits = digits
                .parse()
                .context("SMS_SUBSCRIBER_DIGITS must be a whole number")?;
        }

        Ok(config)
    }

    /// Directory for rolling log files
    pub fn logs_dir() -> String {
        std::env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string())
    }
}

/// A finite, non-negative price per message part.
fn parse_unit_price(raw: &str) -> Result<f64> {
    let price: f64 = raw
        .trim()
        .parse()
        .context("SMS_UNIT_PRICE must be a decimal number")?;
    if !price.is_finite() || price < 0.0 {
        anyhow::bail!("SMS_UNIT_PRICE must be a finite, non-negative number");
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_ghana_plan() {
        let config = Config::default();
        assert_eq!(config.country_code, "233");
        assert_eq!(config.leading_digits, "2-5");
        assert_eq!(config.subscriber_digits, 8);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.retention_days, 90);
    }

    #[test]
    fn test_unit_price_must_be_finite_and_non_negative() {
        assert_eq!(parse_unit_price("0.8").unwrap(), 0.8);
        assert_eq!(parse_unit_price(" 0 ").unwrap(), 0.0);
        assert!(parse_unit_price("-0.5").is_err());
        assert!(parse_unit_price("NaN").is_err());
        assert!(parse_unit_price("inf").is_err());
        assert!(parse_unit_price("cheap").is_err());
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_currency_from_env() {
        std::env::set_var("SMS_CURRENCY", "GHS");

        let config = Config::from_env().unwrap();
        assert_eq!(config.currency, "GHS");

        std::env::remove_var("SMS_CURRENCY");
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_rejects_zero_timeout() {
        std::env::set_var("SMS_REQUEST_TIMEOUT_SECS", "0");

        assert!(Config::from_env().is_err());

        std::env::remove_var("SMS_REQUEST_TIMEOUT_SECS");
    }
}
