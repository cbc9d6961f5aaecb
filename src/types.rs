//! Core types for gha

use chrono::{DateTime, Utc};
use std::fmt;
use zeroize::Zeroizing;

/// A string that must never reach logs or disk
///
/// `Debug` and `Display` print `[REDACTED]`; the backing buffer is zeroed
/// when dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Access the raw value
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// One account (user or organization) the app is installed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    /// Installation ID
    pub id: u64,
    /// Login of the account the app is installed on
    pub account_login: String,
}

/// Installation access token minted for a single invocation
#[derive(Debug, Clone)]
pub struct InstallationToken {
    /// Token value, injected into the child as `GH_TOKEN`
    pub value: SecretString,
    /// When GitHub will stop accepting the token
    pub expires_at: DateTime<Utc>,
}
