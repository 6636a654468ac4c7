//! Checkout export and order forwarding.
//!
//! # Responsibility
//! - Shape cart snapshots into the `{items, subtotal, totalItems}` summary.
//! - Build checkout requests stamped with an order note and submission time.
//! - Validate and relay checkout requests to an external webhook.
//!
//! # Invariants
//! - Summaries are computed from a snapshot, never from cached totals.
//! - Timestamps are ISO-8601 UTC with millisecond precision.

mod forwarder;
#[cfg(feature = "webhook")]
mod http;
mod note;

pub use forwarder::{
    ForwardRequest, ForwardResponse, OrderForwarder, TransportError, WebhookReply,
    WebhookTransport,
};
#[cfg(feature = "webhook")]
pub use http::ReqwestWebhookTransport;
pub use note::{load_order_note, save_order_note};

use crate::model::line_item::CartLineItem;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Derived payload sent to checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub items: Vec<CartLineItem>,
    pub subtotal: f64,
    pub total_items: u64,
}

impl OrderSummary {
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let subtotal = items.iter().map(CartLineItem::line_total).sum();
        let total_items = items.iter().map(|item| u64::from(item.quantity)).sum();
        Self {
            items,
            subtotal,
            total_items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Checkout construction failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Checkout needs at least one line item.
    EmptyCart,
}

impl Display for CheckoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCart => write!(f, "add at least one item before checking out"),
        }
    }
}

impl Error for CheckoutError {}

/// Order summary plus customer note and submission time.
///
/// Serialized flat: `{items, subtotal, totalItems, orderNote, submittedAt}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub summary: OrderSummary,
    pub order_note: String,
    pub submitted_at: String,
}

impl CheckoutRequest {
    /// Builds a request; the note is trimmed.
    pub fn new(
        summary: OrderSummary,
        order_note: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, CheckoutError> {
        if summary.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        Ok(Self {
            summary,
            order_note: order_note.trim().to_string(),
            submitted_at: iso_timestamp(submitted_at),
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Formats a UTC instant like `2024-05-01T18:30:00.000Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
