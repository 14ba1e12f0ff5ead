use std::collections::BTreeMap;

use rust_decimal_macros::dec;

use fabflow_core::{DomainError, DomainResult, Entity};

use crate::product::{Product, Sku};

/// Read-only product lookup keyed by SKU.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductCatalog {
    products: BTreeMap<Sku, Product>,
}

impl ProductCatalog {
    /// Build a catalog; duplicate SKUs are rejected.
    pub fn new(products: impl IntoIterator<Item = Product>) -> DomainResult<Self> {
        let mut map = BTreeMap::new();
        for product in products {
            let sku = product.id().clone();
            if map.insert(sku.clone(), product).is_some() {
                return Err(DomainError::validation(format!("duplicate sku {sku}")));
            }
        }
        Ok(Self { products: map })
    }

    /// The packaging catalog the dashboard ships with.
    ///
    /// # Panics
    ///
    /// If a built-in row fails product or catalog validation.
    pub fn sample() -> Self {
        let rows = [
            ("PKG001", "Eco-Friendly Bouquet Wrapper", "Flower Shop", dec!(15.99), 95),
            ("PKG002", "Biodegradable Gift Box", "Gift Store", dec!(8.50), 90),
            ("PKG003", "Compostable Food Container", "Food & Beverage", dec!(12.75), 88),
            ("PKG004", "Recycled Paper Bag", "General", dec!(3.25), 85),
            ("PKG005", "Plant-Based Drink Cup", "Food & Beverage", dec!(6.99), 92),
            ("PKG006", "Sustainable Gift Wrap", "Gift Store", dec!(4.50), 87),
        ];

        rows.into_iter()
            .map(|(sku, name, category, price, score)| {
                Product::new(sku, name, category, price, score)
            })
            .collect::<DomainResult<Vec<_>>>()
            .and_then(Self::new)
            .expect("built-in sample catalog is valid")
    }

    pub fn get(&self, sku: &str) -> Option<&Product> {
        let sku = Sku::new(sku).ok()?;
        self.products.get(&sku)
    }

    /// Like [`get`](Self::get), but an unknown or malformed SKU is a validation failure.
    pub fn require(&self, sku: &str) -> DomainResult<&Product> {
        self.get(sku)
            .ok_or_else(|| DomainError::validation(format!("unknown product {:?}", sku.trim())))
    }

    /// Products in SKU order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
