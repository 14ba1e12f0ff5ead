//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are immutable: two instances with the
/// same attributes are the same value. Constructors validate, so an existing
/// value object is always in range (a `Completion` is never above 100, a
/// score never outside 0..=100).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
