//! Cart line item model and identity derivation.

use super::coerce::sanitize_price;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_SLUG_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// One distinct purchasable entry in the cart.
///
/// Serialized field names match the persisted browser record
/// `{id, name, description, price, quantity, notes}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Unique key inside one cart.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Unit price in dollars.
    pub price: f64,
    /// Always at least 1.
    pub quantity: u32,
    /// Free-text kitchen notes.
    pub notes: String,
}

impl CartLineItem {
    /// Price multiplied by quantity.
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Input for `CartStore::add_item`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddItemRequest {
    /// Caller-supplied id; empty or `None` derives one from name and price.
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub price: f64,
    /// Units to add. `None` means 1.
    pub quantity: Option<u32>,
    pub notes: String,
}

impl AddItemRequest {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Id this request merges into.
    pub fn resolved_id(&self) -> String {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => derive_item_id(&self.name, sanitize_price(self.price)),
        }
    }
}

/// Returns whether a name is usable for a line item.
///
/// Only the empty string is rejected; whitespace-only names are kept so carts
/// saved by other clients with such lines survive a reload.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
}

/// Derives a stable line-item id from a display name and unit price.
///
/// Rules:
/// - lowercase the name, collapse every run of non `[a-z0-9]` characters into
///   one `-`, trim `-` at both ends;
/// - when the price is nonzero, append `-<price rounded to cents>`.
///
/// Prices that round to the same cent share an id, so `14.5` and `14.499`
/// merge into one line.
pub fn derive_item_id(name: &str, price: f64) -> String {
    let lowered = name.to_lowercase();
    let collapsed = NON_SLUG_RUN_RE.replace_all(&lowered, "-");
    let slug = collapsed.trim_matches('-');

    if price == 0.0 || !price.is_finite() {
        return slug.to_string();
    }
    let cents = (price * 100.0).round() as i64;
    format!("{slug}-{cents}")
}
