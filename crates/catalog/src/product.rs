use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fabflow_core::{DomainError, DomainResult, Entity, ValueObject};

/// Stock keeping unit: the product identifier (e.g. `PKG001`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn new(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(DomainError::validation(format!(
                "sku {trimmed:?} cannot contain whitespace"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for Sku {}

/// Sustainability rating, 0..=100.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SustainabilityScore(u8);

impl SustainabilityScore {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> DomainResult<Self> {
        if value > Self::MAX {
            return Err(DomainError::validation(format!(
                "sustainability score must be within 0..=100 (got {value})"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SustainabilityScore {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SustainabilityScore> for u8 {
    fn from(value: SustainabilityScore) -> Self {
        value.0
    }
}

impl ValueObject for SustainabilityScore {}

/// A sellable product. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    sku: Sku,
    name: String,
    category: String,
    /// Unit price in currency units, two decimal places.
    unit_price: Decimal,
    sustainability_score: SustainabilityScore,
}

impl Product {
    pub fn new(
        sku: &str,
        name: &str,
        category: &str,
        unit_price: Decimal,
        sustainability_score: u8,
    ) -> DomainResult<Self> {
        let sku = Sku::new(sku)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation(format!("product {sku}: name cannot be empty")));
        }

        if unit_price <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "product {sku}: unit price must be positive"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            category: category.trim().to_string(),
            unit_price,
            sustainability_score: SustainabilityScore::new(sustainability_score)?,
            sku,
        })
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn sustainability_score(&self) -> SustainabilityScore {
        self.sustainability_score
    }
}

impl Entity for Product {
    type Id = Sku;

    fn id(&self) -> &Self::Id {
        &self.sku
    }
}
