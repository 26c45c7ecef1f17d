//! Access token representation and expiry logic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds before `expires_at` at which a token is already treated as expired.
const EXPIRY_MARGIN_SECS: u64 = 60;

/// A bearer token obtained from the identity provider.
///
/// Tokens live only in memory; the `Debug` impl never prints the value.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    #[serde(rename = "access_token")]
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

impl AccessToken {
    /// Create a new token with the given value and `Bearer` type.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
            token_type: Some("Bearer".to_string()),
        }
    }

    /// Set the expiry to `expires_in_secs` seconds from now.
    #[must_use]
    pub fn with_expiry(mut self, expires_in_secs: u64) -> Self {
        self.expires_at = Some(now_secs().saturating_add(expires_in_secs));
        self
    }

    /// Return `true` if the token expires within 60 seconds.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let Some(expires_at) = self.expires_at else {
            return false;
        };
        now_secs().saturating_add(EXPIRY_MARGIN_SECS) >= expires_at
    }

    /// Seconds of validity left, or `None` when the token has no expiry.
    #[must_use]
    pub fn remaining_secs(&self) -> Option<u64> {
        self.expires_at.map(|at| at.saturating_sub(now_secs()))
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .finish()
    }
}
