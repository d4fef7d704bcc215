//! Send endpoint wire types

use serde::{Deserialize, Serialize};

use super::Campaign;

/// Recipients as the endpoint accepts them: raw text or a list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PhoneNumbersInput {
    Text(String),
    List(Vec<String>),
}

/// Request body posted to the send endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendRequest {
    pub message: String,
    pub phone_numbers: PhoneNumbersInput,
}

impl SendRequest {
    pub fn new(message: impl Into<String>, numbers: Vec<String>) -> Self {
        Self {
            message: message.into(),
            phone_numbers: PhoneNumbersInput::List(numbers),
        }
    }
}

/// Response body from the send endpoint, success or failure
#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    pub success: bool,
    #[serde(default)]
    pub campaign: Option<Campaign>,
    #[serde(default)]
    pub message_length: Option<usize>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A successful send
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub campaign: Campaign,
    pub message_length: usize,
}
