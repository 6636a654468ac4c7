//! Cart domain model.
//!
//! # Responsibility
//! - Define the canonical cart line item and the add-item request shape.
//! - Own identity derivation and numeric coercion rules.
//!
//! # Invariants
//! - A stored line item always has a non-empty name, a finite non-negative
//!   price and a quantity of at least 1.
//! - Derived ids depend only on the name slug and the price rounded to cents.

pub mod coerce;
pub mod line_item;
