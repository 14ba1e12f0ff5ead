//! Product reference data.
//!
//! Products are immutable once built: the catalog is assembled at startup and
//! only ever read afterwards.

pub mod catalog;
pub mod product;

pub use catalog::ProductCatalog;
pub use product::{Product, Sku, SustainabilityScore};
