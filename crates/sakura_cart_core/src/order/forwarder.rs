//! Stateless order forwarding handler.
//!
//! # Responsibility
//! - Validate a checkout payload posted by the storefront.
//! - Sanitize line items and relay the order to a configured webhook.
//! - Answer with forwarding status and the ordering-portal redirect.
//!
//! # Invariants
//! - The handler never panics and never returns an error; every outcome is an
//!   HTTP-style status plus a JSON body.
//! - A webhook failure still answers 200 with `forwarded = false`.

use super::iso_timestamp;
use crate::config::ForwarderConfig;
use crate::model::coerce::number_or;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde_json::{json, Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Incoming request as seen by the forwarding endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    pub method: String,
    pub body: Option<String>,
}

impl ForwardRequest {
    pub fn post(body: impl Into<String>) -> Self {
        Self {
            method: "POST".to_string(),
            body: Some(body.into()),
        }
    }
}

/// Endpoint answer; the body is always JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardResponse {
    pub status_code: u16,
    pub body: Value,
}

impl ForwardResponse {
    pub const CONTENT_TYPE: &'static str = "application/json";

    fn message(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            body: json!({ "message": message }),
        }
    }

    pub fn body_text(&self) -> String {
        self.body.to_string()
    }
}

/// Status line returned by the webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookReply {
    pub status: u16,
    pub status_text: String,
}

impl WebhookReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Webhook request failed before any response arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError(pub String);

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "webhook transport failed: {}", self.0)
    }
}

impl Error for TransportError {}

/// Outbound JSON POST used to reach the order webhook.
pub trait WebhookTransport {
    fn post_json(&self, url: &str, payload: &Value) -> Result<WebhookReply, TransportError>;
}

impl<T: WebhookTransport + ?Sized> WebhookTransport for &T {
    fn post_json(&self, url: &str, payload: &Value) -> Result<WebhookReply, TransportError> {
        (**self).post_json(url, payload)
    }
}

/// Validates checkout payloads and relays them to the order webhook.
pub struct OrderForwarder<T: WebhookTransport> {
    config: ForwarderConfig,
    transport: T,
}

impl<T: WebhookTransport> OrderForwarder<T> {
    pub fn new(config: ForwarderConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    /// Handles one request; `now` stamps orders that lack `submittedAt`.
    ///
    /// # Contract
    /// - non-POST → 405
    /// - unparsable or `null` body, or a `null` line item → 500
    /// - missing, non-array or empty `items` → 400
    /// - otherwise 200 `{forwarded, webhookResponse, redirectUrl}`
    pub fn handle(&self, request: &ForwardRequest, now: DateTime<Utc>) -> ForwardResponse {
        if !request.method.eq_ignore_ascii_case("POST") {
            warn!(
                "event=order_forward module=order status=rejected reason=method_not_allowed method={}",
                request.method
            );
            return ForwardResponse::message(405, "Method Not Allowed");
        }

        let raw = request
            .body
            .as_deref()
            .filter(|body| !body.is_empty())
            .unwrap_or("{}");
        let payload: Value = match serde_json::from_str(raw) {
            Ok(Value::Null) => return unprocessable("null_payload"),
            Ok(payload) => payload,
            Err(err) => {
                error!(
                    "event=order_forward module=order status=error error_code=invalid_json error={}",
                    err
                );
                return ForwardResponse::message(500, "Unable to process order");
            }
        };

        let items = match payload.get("items") {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => {
                warn!("event=order_forward module=order status=rejected reason=empty_cart");
                return ForwardResponse::message(400, "Cart is empty");
            }
        };
        if items.iter().any(Value::is_null) {
            return unprocessable("null_line_item");
        }

        let order = sanitize_order(&payload, items, now);
        let (forwarded, webhook_response) = self.relay(&order);

        info!(
            "event=order_forward module=order status=ok forwarded={} line_items={}",
            forwarded,
            items.len()
        );
        ForwardResponse {
            status_code: 200,
            body: json!({
                "forwarded": forwarded,
                "webhookResponse": webhook_response.map(|reply| json!({
                    "status": reply.status,
                    "statusText": reply.status_text,
                })),
                "redirectUrl": self.config.redirect_url,
            }),
        }
    }

    fn relay(&self, order: &Value) -> (bool, Option<WebhookReply>) {
        let Some(url) = self.config.webhook_url.as_deref() else {
            return (false, None);
        };

        match self.transport.post_json(url, order) {
            Ok(reply) => (reply.is_success(), Some(reply)),
            Err(err) => {
                error!(
                    "event=order_webhook module=order status=error error={}",
                    err
                );
                (false, None)
            }
        }
    }
}

fn unprocessable(error_code: &str) -> ForwardResponse {
    error!(
        "event=order_forward module=order status=error error_code={}",
        error_code
    );
    ForwardResponse::message(500, "Unable to process order")
}

/// JavaScript truthiness, which decides whether a relayed field keeps its value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Builds the webhook payload from an untrusted checkout body.
fn sanitize_order(payload: &Value, items: &[Value], now: DateTime<Utc>) -> Value {
    let sanitized: Vec<Value> = items.iter().map(sanitize_item).collect();
    let quantity_sum: f64 = sanitized
        .iter()
        .filter_map(|item| item.get("quantity").and_then(Value::as_f64))
        .sum();

    let submitted_at = match payload.get("submittedAt") {
        Some(value) if is_truthy(value) => value.clone(),
        _ => Value::String(iso_timestamp(now)),
    };
    let order_note = payload
        .get("orderNote")
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()));

    json!({
        "items": sanitized,
        "subtotal": json_number(number_or(payload.get("subtotal"), 0.0)),
        "totalItems": json_number(number_or(payload.get("totalItems"), quantity_sum)),
        "orderNote": order_note,
        "submittedAt": submitted_at,
    })
}

fn sanitize_item(item: &Value) -> Value {
    let mut out = Map::new();
    for key in ["id", "name"] {
        if let Some(value) = item.get(key) {
            out.insert(key.to_string(), value.clone());
        }
    }
    out.insert(
        "quantity".to_string(),
        json_number(number_or(item.get("quantity"), 0.0)),
    );
    out.insert(
        "price".to_string(),
        json_number(number_or(item.get("price"), 0.0)),
    );
    let notes = match item.get("notes") {
        Some(value) if is_truthy(value) => value.clone(),
        _ => Value::String(String::new()),
    };
    out.insert("notes".to_string(), notes);
    Value::Object(out)
}

/// Whole numbers serialize without a fractional part; non-finite becomes null.
fn json_number(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}
