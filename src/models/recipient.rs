// src/models/recipient.rs
use serde::{Deserialize, Serialize};

/// One stored device registration. The token may be missing or empty in storage.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RecipientRecord {
    #[serde(default)]
    pub token: Option<String>,
}

impl RecipientRecord {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn without_token() -> Self {
        Self { token: None }
    }

    /// The token if it is usable for delivery
    pub fn usable_token(self) -> Option<String> {
        self.token.filter(|token| !token.is_empty())
    }
}

/// Usable tokens in record order. Duplicates are kept.
pub fn collect_tokens(records: Vec<RecipientRecord>) -> Vec<String> {
    records
        .into_iter()
        .filter_map(RecipientRecord::usable_token)
        .collect()
}
