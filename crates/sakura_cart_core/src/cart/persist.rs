//! Persisted cart record codec.
//!
//! The record is a JSON array of `{id, name, description, price, quantity,
//! notes}` objects written by this crate or by older browser builds.
//! Decoding is lenient: bad entries are dropped one by one and a payload that
//! is not an array yields an empty cart.

use crate::model::coerce::{number_or, sanitize_price, string_or_empty};
use crate::model::line_item::{derive_item_id, is_valid_name, CartLineItem};
use log::warn;
use serde_json::Value;
use std::collections::HashSet;

pub(crate) fn encode_items(items: &[CartLineItem]) -> serde_json::Result<String> {
    serde_json::to_string(items)
}

pub(crate) fn decode_items(raw: &str) -> Vec<CartLineItem> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "event=cart_load module=cart status=error error_code=unparsable_record error={}",
                err
            );
            return Vec::new();
        }
    };

    let Value::Array(entries) = parsed else {
        warn!("event=cart_load module=cart status=error error_code=record_not_array");
        return Vec::new();
    };

    let total = entries.len();
    let mut seen = HashSet::new();
    let items: Vec<CartLineItem> = entries
        .iter()
        .filter_map(decode_entry)
        .filter(|item| seen.insert(item.id.clone()))
        .collect();

    if items.len() != total {
        warn!(
            "event=cart_load module=cart status=partial dropped_entries={}",
            total - items.len()
        );
    }
    items
}

fn decode_entry(entry: &Value) -> Option<CartLineItem> {
    let object = entry.as_object()?;
    let name = match object.get("name") {
        Some(Value::String(name)) if is_valid_name(name) => name.clone(),
        _ => return None,
    };

    let price = sanitize_price(number_or(object.get("price"), 0.0));
    let quantity = coerce_stored_quantity(number_or(object.get("quantity"), 1.0));
    let id = match object.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => derive_item_id(&name, price),
    };

    Some(CartLineItem {
        id,
        name,
        description: string_or_empty(object.get("description")),
        price,
        quantity,
        notes: string_or_empty(object.get("notes")),
    })
}

fn coerce_stored_quantity(value: f64) -> u32 {
    if !value.is_finite() || value < 1.0 {
        return 1;
    }
    // Float-to-int `as` saturates at u32::MAX.
    value.floor() as u32
}
