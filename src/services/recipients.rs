//! Recipient pipeline: parse typed or CSV input, classify against the
//! numbering plan, and gate submissions.

use tracing::debug;

use crate::defaults::{MAX_MESSAGE_LENGTH, MAX_RECIPIENTS};
use crate::services::numbering::NumberingPlan;
use crate::services::segmentation;
use crate::types::{FormField, MessageSegmentation, PhoneClassification, RecipientSummary};

/// Cleaned length bounds for a CSV cell to count as a phone number.
const MIN_PHONE_CHARS: usize = 9;
const MAX_PHONE_CHARS: usize = 15;

/// User input rejected before anything is sent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct ValidationError {
    /// Input the user should fix
    pub field: FormField,
    pub reason: String,
}

impl ValidationError {
    fn new(field: FormField, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecipientPipeline {
    plan: NumberingPlan,
}

impl RecipientPipeline {
    pub fn new(plan: NumberingPlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &NumberingPlan {
        &self.plan
    }

    /// One number per line; blank lines dropped, order and duplicates kept.
    pub fn parse_manual_list(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// First phone-like cell of each line. Cells are split on bare commas
    /// with quotes stripped; lines without a candidate contribute nothing.
    pub fn parse_csv(content: &str) -> Vec<String> {
        let mut numbers = Vec::new();

        for line in content.split('\n') {
            let candidate = line
                .split(',')
                .map(|cell| cell.trim().replace('"', ""))
                .find(|cell| !cell.is_empty() && looks_like_phone_number(cell));

            if let Some(cell) = candidate {
                numbers.push(cell);
            }
        }

        debug!("Extracted {} phone numbers from CSV content", numbers.len());
        numbers
    }

    pub fn classify<S: AsRef<str>>(&self, numbers: &[S]) -> PhoneClassification {
        let mut result = PhoneClassification::default();
        for number in numbers {
            let number = number.as_ref();
            if self.plan.is_valid(number) {
                result.valid.push(number.to_string());
            } else {
                result.invalid.push(number.to_string());
            }
        }
        result
    }

    pub fn summarize<S: AsRef<str>>(&self, numbers: &[S]) -> RecipientSummary {
        let valid = numbers
            .iter()
            .filter(|n| self.plan.is_valid(n.as_ref()))
            .count();
        RecipientSummary {
            total: numbers.len(),
            valid,
            invalid: numbers.len() - valid,
        }
    }

    pub fn segment_message(&self, text: &str) -> MessageSegmentation {
        segmentation::segment_message(text)
    }

    /// Checks a draft before submission. `message` is taken as entered;
    /// surrounding whitespace does not count toward its length.
    pub fn validate_submission<S: AsRef<str>>(
        &self,
        message: &str,
        numbers: &[S],
    ) -> Result<(), ValidationError> {
        let message = message.trim();

        if message.is_empty() {
            return Err(ValidationError::new(
                FormField::Message,
                "Please enter a message to send.",
            ));
        }

        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ValidationError::new(
                FormField::Message,
                format!(
                    "Message is too long. Maximum {} characters allowed.",
                    MAX_MESSAGE_LENGTH
                ),
            ));
        }

        if numbers.is_empty() {
            return Err(ValidationError::new(
                FormField::Recipients,
                "Please enter phone numbers or upload a CSV file.",
            ));
        }

        if numbers.len() > MAX_RECIPIENTS {
            return Err(ValidationError::new(
                FormField::Recipients,
                format!("Maximum {} phone numbers allowed.", MAX_RECIPIENTS),
            ));
        }

        if !numbers.iter().any(|n| self.plan.is_valid(n.as_ref())) {
            return Err(ValidationError::new(
                FormField::Recipients,
                "No valid phone numbers found. Please check the format.",
            ));
        }

        Ok(())
    }
}

/// 9 to 15 characters once everything but digits and `+` is removed.
pub fn looks_like_phone_number(text: &str) -> bool {
    let cleaned = NumberingPlan::normalize(text);
    (MIN_PHONE_CHARS..=MAX_PHONE_CHARS).contains(&cleaned.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> RecipientPipeline {
        RecipientPipeline::default()
    }

    #[test]
    fn test_parse_manual_list() {
        let numbers = RecipientPipeline::parse_manual_list(
            "  0241234567 \n\n+233551234567\r\n0241234567\n   \n",
        );
        assert_eq!(numbers, vec!["0241234567", "+233551234567", "0241234567"]);
    }

    #[test]
    fn test_parse_csv_takes_first_phone_cell_per_line() {
        let numbers = RecipientPipeline::parse_csv("John,233241234567\nBad,123");
        assert_eq!(numbers, vec!["233241234567"]);
    }

    #[test]
    fn test_parse_csv_strips_quotes_and_skips_headers() {
        let content = "name,phone,alt\r\n\"Ama\",\"+233 24 123 4567\",0551234567\n,,\nKofi,0201234567\n";
        let numbers = RecipientPipeline::parse_csv(content);
        assert_eq!(numbers, vec!["+233 24 123 4567", "0201234567"]);
    }

    #[test]
    fn test_looks_like_phone_number_bounds() {
        assert!(!looks_like_phone_number("12345678"));
        assert!(looks_like_phone_number("123456789"));
        assert!(looks_like_phone_number("+12345678901234"));
        assert!(!looks_like_phone_number("1234567890123456"));
        assert!(!looks_like_phone_number("John"));
    }

    #[test]
    fn test_classify_preserves_order() {
        let result = pipeline().classify(&["0241234567", "notanumber", "+233551234567"]);
        assert_eq!(result.valid, vec!["0241234567", "+233551234567"]);
        assert_eq!(result.invalid, vec!["notanumber"]);
    }

    #[test]
    fn test_summarize_counts() {
        let summary = pipeline().summarize(&["0241234567", "123", "241234567"]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.valid, 2);
        assert_eq!(summary.invalid, 1);
    }

    #[test]
    fn test_overlong_message_is_rejected() {
        let message = "a".repeat(1601);
        let err = pipeline()
            .validate_submission(&message, &["+233201234567"])
            .unwrap_err();
        assert_eq!(err.field, FormField::Message);
        assert!(err.reason.contains("too long"));
    }

    #[test]
    fn test_message_at_limit_is_accepted() {
        let message = "a".repeat(1600);
        assert!(pipeline()
            .validate_submission(&message, &["+233201234567"])
            .is_ok());
    }

    #[test]
    fn test_blank_message_is_rejected() {
        let err = pipeline()
            .validate_submission("   ", &["0241234567"])
            .unwrap_err();
        assert_eq!(err.field, FormField::Message);
    }

    #[test]
    fn test_recipient_count_limits() {
        let none: Vec<String> = Vec::new();
        let err = pipeline().validate_submission("Hi", &none).unwrap_err();
        assert_eq!(err.field, FormField::Recipients);

        let too_many = vec!["0241234567".to_string(); 301];
        let err = pipeline().validate_submission("Hi", &too_many).unwrap_err();
        assert_eq!(err.field, FormField::Recipients);
        assert!(err.reason.contains("300"));

        let exactly = vec!["0241234567".to_string(); 300];
        assert!(pipeline().validate_submission("Hi", &exactly).is_ok());
    }

    #[test]
    fn test_requires_at_least_one_valid_number() {
        let err = pipeline()
            .validate_submission("Hi", &["123", "notanumber"])
            .unwrap_err();
        assert_eq!(err.field, FormField::Recipients);
        assert!(pipeline()
            .validate_submission("Hi", &["123", "0241234567"])
            .is_ok());
    }
}
