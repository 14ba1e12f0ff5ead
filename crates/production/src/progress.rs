//! Completion percentage and the policy that drives it.

use serde::{Deserialize, Serialize};

use fabflow_core::{DomainError, DomainResult, ValueObject};

/// Completion percentage, 0..=100.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Completion(u8);

impl Completion {
    pub const NONE: Completion = Completion(0);
    pub const FULL: Completion = Completion(100);

    pub fn new(percent: u8) -> DomainResult<Self> {
        if percent > 100 {
            return Err(DomainError::validation(format!(
                "completion must be within 0..=100 (got {percent})"
            )));
        }
        Ok(Self(percent))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    pub fn is_full(&self) -> bool {
        self.0 == 100
    }

    /// Add `step` percentage points, capped at 100.
    pub fn saturating_add(self, step: u8) -> Self {
        Self(self.0.saturating_add(step).min(100))
    }
}

impl TryFrom<u8> for Completion {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Completion> for u8 {
    fn from(value: Completion) -> Self {
        value.0
    }
}

impl core::fmt::Display for Completion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl ValueObject for Completion {}

/// How far production moves on start and on each advance.
///
/// `initial` must leave room for at least one advance (1..=99); `step` is
/// 1..=100.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProgressPolicy")]
pub struct ProgressPolicy {
    initial: u8,
    step: u8,
}

#[derive(Deserialize)]
struct RawProgressPolicy {
    initial: u8,
    step: u8,
}

impl TryFrom<RawProgressPolicy> for ProgressPolicy {
    type Error = DomainError;

    fn try_from(raw: RawProgressPolicy) -> Result<Self, Self::Error> {
        Self::new(raw.initial, raw.step)
    }
}

impl ProgressPolicy {
    pub const DEFAULT_INITIAL: u8 = 25;
    pub const DEFAULT_STEP: u8 = 25;

    pub fn new(initial: u8, step: u8) -> DomainResult<Self> {
        if !(1..=99).contains(&initial) {
            return Err(DomainError::validation(format!(
                "initial progress must be within 1..=99 (got {initial})"
            )));
        }
        if !(1..=100).contains(&step) {
            return Err(DomainError::validation(format!(
                "progress step must be within 1..=100 (got {step})"
            )));
        }
        Ok(Self { initial, step })
    }

    pub fn initial(&self) -> u8 {
        self.initial
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    /// Completion when production starts.
    pub fn started(&self) -> Completion {
        Completion(self.initial)
    }

    /// Completion after one advance from `current`.
    pub fn advanced(&self, current: Completion) -> Completion {
        current.saturating_add(self.step)
    }
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self {
            initial: Self::DEFAULT_INITIAL,
            step: Self::DEFAULT_STEP,
        }
    }
}

impl ValueObject for ProgressPolicy {}
