//! Shipment tracking codes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fabflow_core::{DomainError, DomainResult, ValueObject};

/// Tracking code assigned to a delivery (e.g. `TRK3F9A01BC`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingCode(String);

impl TrackingCode {
    pub fn new(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(DomainError::validation(format!(
                "tracking code {raw:?} must be non-empty ASCII alphanumeric"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TrackingCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TrackingCode> for String {
    fn from(value: TrackingCode) -> Self {
        value.0
    }
}

impl core::fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for TrackingCode {}

/// Source of candidate tracking codes.
///
/// Candidates need not be unique on their own; the caller rejects codes it
/// has already issued and asks again.
pub trait TrackingCodeGenerator: Send {
    fn next_code(&mut self) -> DomainResult<TrackingCode>;
}

/// `<prefix>` + 8 upper-case hex characters from a random v4 UUID.
#[derive(Debug, Clone)]
pub struct UuidTrackingCodes {
    prefix: String,
}

impl UuidTrackingCodes {
    pub const DEFAULT_PREFIX: &'static str = "TRK";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for UuidTrackingCodes {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl TrackingCodeGenerator for UuidTrackingCodes {
    fn next_code(&mut self) -> DomainResult<TrackingCode> {
        let hex = Uuid::new_v4().simple().to_string();
        TrackingCode::new(format!("{}{}", self.prefix, hex[..8].to_ascii_uppercase()))
    }
}

/// Deterministic `<prefix>00000001`, `<prefix>00000002`, ... (tests, demos).
#[derive(Debug, Clone)]
pub struct SequentialTrackingCodes {
    prefix: String,
    next: u64,
}

impl SequentialTrackingCodes {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl TrackingCodeGenerator for SequentialTrackingCodes {
    fn next_code(&mut self) -> DomainResult<TrackingCode> {
        let code = TrackingCode::new(format!("{}{:08}", self.prefix, self.next))?;
        self.next += 1;
        Ok(code)
    }
}
