//! Recipient and message-shape types

use serde::{Deserialize, Serialize};

/// SMS character encoding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Gsm7,
    Unicode,
}

impl Encoding {
    /// Characters that fit in one part
    pub fn part_size(&self) -> usize {
        match self {
            Self::Gsm7 => 160,
            Self::Unicode => 70,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gsm7 => "GSM-7",
            Self::Unicode => "Unicode",
        }
    }
}

/// How a message splits into SMS parts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageSegmentation {
    pub encoding: Encoding,
    pub length: usize,
    pub part_count: usize,
}

/// Numbers partitioned by the numbering plan, input order preserved
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhoneClassification {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

/// Live counters for the recipient input
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecipientSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

/// Form input a validation failure points at
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Message,
    Recipients,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Recipients => "recipients",
        }
    }
}
