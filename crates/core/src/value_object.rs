//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; they are defined entirely by their
//! attribute values. A normalized legal name is the canonical example here: two
//! normalized names with the same text denote the same comparable entity name,
//! whichever raw spelling they came from.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**.
///
/// - **Value Object**: `NormalizedVat("00895100709")`, equal to any other
///   normalized VAT with the same digits.
/// - **Entity**: a partner record, which stays the same partner while its raw
///   name is edited in the ERP.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct NormalizedVat(String);
///
/// impl ValueObject for NormalizedVat {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
