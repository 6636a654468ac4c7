use chrono::{TimeZone, Utc};
use sakura_cart_core::{
    load_order_note, save_order_note, AddItemRequest, CartStore, CheckoutRequest,
    ForwardRequest, ForwardResponse, ForwarderConfig, MemoryStorage, OrderForwarder,
    TransportError, WebhookReply, WebhookTransport,
};
use serde_json::{json, Value};
use std::cell::RefCell;

#[derive(Default)]
struct RecordingTransport {
    posts: RefCell<Vec<(String, Value)>>,
    reply: Option<WebhookReply>,
}

impl RecordingTransport {
    fn replying(status: u16, status_text: &str) -> Self {
        Self {
            posts: RefCell::default(),
            reply: Some(WebhookReply {
                status,
                status_text: status_text.to_string(),
            }),
        }
    }
}

impl WebhookTransport for RecordingTransport {
    fn post_json(&self, url: &str, payload: &Value) -> Result<WebhookReply, TransportError> {
        self.posts
            .borrow_mut()
            .push((url.to_string(), payload.clone()));
        self.reply
            .clone()
            .ok_or_else(|| TransportError("connection refused".to_string()))
    }
}

fn config_with_webhook() -> ForwarderConfig {
    ForwarderConfig::default().with_webhook_url(Some("https://hooks.example.com/orders".into()))
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap()
}

#[test]
fn rejects_non_post_methods() {
    let forwarder = OrderForwarder::new(ForwarderConfig::default(), RecordingTransport::default());
    let request = ForwardRequest {
        method: "GET".to_string(),
        body: None,
    };

    let response = forwarder.handle(&request, now());
    assert_eq!(response.status_code, 405);
    assert_eq!(response.body, json!({ "message": "Method Not Allowed" }));
    assert_eq!(response.body_text(), r#"{"message":"Method Not Allowed"}"#);
    assert_eq!(ForwardResponse::CONTENT_TYPE, "application/json");
}

#[test]
fn rejects_empty_or_missing_items() {
    let forwarder = OrderForwarder::new(ForwarderConfig::default(), RecordingTransport::default());

    for body in [r#"{"items":[]}"#, r#"{"items":"nope"}"#, "{}"] {
        let response = forwarder.handle(&ForwardRequest::post(body), now());
        assert_eq!(response.status_code, 400, "body {body}");
        assert_eq!(response.body["message"], "Cart is empty");
    }

    let response = forwarder.handle(
        &ForwardRequest {
            method: "POST".to_string(),
            body: None,
        },
        now(),
    );
    assert_eq!(response.status_code, 400);
}

#[test]
fn unparsable_body_is_server_error() {
    let forwarder = OrderForwarder::new(ForwarderConfig::default(), RecordingTransport::default());
    let response = forwarder.handle(&ForwardRequest::post("{broken"), now());

    assert_eq!(response.status_code, 500);
    assert_eq!(response.body["message"], "Unable to process order");
}

#[test]
fn null_payload_or_null_line_item_is_server_error() {
    let transport = RecordingTransport::replying(200, "OK");
    let forwarder = OrderForwarder::new(config_with_webhook(), &transport);

    for body in ["null", r#"{"items":[null]}"#, r#"{"items":[{"id":"a","name":"Ramen"},null]}"#] {
        let response = forwarder.handle(&ForwardRequest::post(body), now());
        assert_eq!(response.status_code, 500, "body {body}");
        assert_eq!(response.body["message"], "Unable to process order");
    }
    assert!(transport.posts.borrow().is_empty());
}

#[test]
fn empty_body_counts_as_empty_object() {
    let forwarder = OrderForwarder::new(ForwarderConfig::default(), RecordingTransport::default());
    let response = forwarder.handle(&ForwardRequest::post(""), now());

    assert_eq!(response.status_code, 400);
    assert_eq!(response.body["message"], "Cart is empty");
}

#[test]
fn present_note_and_timestamp_values_are_relayed_as_sent() {
    let transport = RecordingTransport::replying(200, "OK");
    let forwarder = OrderForwarder::new(config_with_webhook(), &transport);
    let body = json!({
        "items": [{"id": "a", "name": "Ramen", "quantity": 1, "price": 12, "notes": 7}],
        "orderNote": null,
        "submittedAt": 1714588200000_i64
    });

    forwarder.handle(&ForwardRequest::post(body.to_string()), now());
    let posts = transport.posts.borrow();
    let payload = &posts[0].1;
    assert_eq!(payload["orderNote"], Value::Null);
    assert_eq!(payload["submittedAt"], 1714588200000_i64);
    assert_eq!(payload["items"][0]["notes"], 7);
}

#[test]
fn falsy_timestamp_is_replaced_with_now() {
    let transport = RecordingTransport::replying(200, "OK");
    let forwarder = OrderForwarder::new(config_with_webhook(), &transport);
    let body = r#"{"items":[{"id":"a","name":"Ramen","quantity":1}],"submittedAt":""}"#;

    forwarder.handle(&ForwardRequest::post(body), now());
    let posts = transport.posts.borrow();
    assert_eq!(posts[0].1["submittedAt"], "2024-05-01T18:30:00.000Z");
    assert_eq!(posts[0].1["orderNote"], "");
}

#[test]
fn without_webhook_answers_not_forwarded_with_redirect() {
    let transport = RecordingTransport::default();
    let forwarder = OrderForwarder::new(ForwarderConfig::default(), &transport);
    let response = forwarder.handle(
        &ForwardRequest::post(r#"{"items":[{"id":"a","name":"Ramen","quantity":1,"price":12}]}"#),
        now(),
    );

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.body,
        json!({
            "forwarded": false,
            "webhookResponse": null,
            "redirectUrl": "https://order.sakuraramen208.com/",
        })
    );
    assert!(transport.posts.borrow().is_empty());
}

#[test]
fn forwards_sanitized_payload_to_webhook() {
    let transport = RecordingTransport::replying(202, "Accepted");
    let forwarder = OrderForwarder::new(config_with_webhook(), &transport);
    let body = json!({
        "items": [
            {"id": "tonkotsu-ramen-1450", "name": "Tonkotsu Ramen", "quantity": "2", "price": 14.5,
             "notes": "extra egg", "description": "dropped"},
            {"id": "x", "name": "Mystery", "quantity": "lots", "price": null}
        ],
        "subtotal": "29",
        "orderNote": "pickup at 6"
    });

    let response = forwarder.handle(&ForwardRequest::post(body.to_string()), now());
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body["forwarded"], true);
    assert_eq!(
        response.body["webhookResponse"],
        json!({ "status": 202, "statusText": "Accepted" })
    );

    let posts = transport.posts.borrow();
    assert_eq!(posts.len(), 1);
    let (url, payload) = &posts[0];
    assert_eq!(url, "https://hooks.example.com/orders");
    assert_eq!(
        *payload,
        json!({
            "items": [
                {"id": "tonkotsu-ramen-1450", "name": "Tonkotsu Ramen", "quantity": 2, "price": 14.5,
                 "notes": "extra egg"},
                {"id": "x", "name": "Mystery", "quantity": 0, "price": 0, "notes": ""}
            ],
            "subtotal": 29,
            "totalItems": 2,
            "orderNote": "pickup at 6",
            "submittedAt": "2024-05-01T18:30:00.000Z"
        })
    );
}

#[test]
fn webhook_error_status_is_not_forwarded() {
    let transport = RecordingTransport::replying(503, "Service Unavailable");
    let forwarder = OrderForwarder::new(config_with_webhook(), &transport);
    let response = forwarder.handle(
        &ForwardRequest::post(r#"{"items":[{"id":"a","name":"Ramen","quantity":1}]}"#),
        now(),
    );

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body["forwarded"], false);
    assert_eq!(response.body["webhookResponse"]["status"], 503);
}

#[test]
fn transport_failure_still_answers_ok() {
    let transport = RecordingTransport::default();
    let forwarder = OrderForwarder::new(config_with_webhook(), &transport);
    let response = forwarder.handle(
        &ForwardRequest::post(r#"{"items":[{"id":"a","name":"Ramen","quantity":1}]}"#),
        now(),
    );

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body["forwarded"], false);
    assert_eq!(response.body["webhookResponse"], Value::Null);
    assert_eq!(transport.posts.borrow().len(), 1);
}

#[test]
fn checkout_request_from_cart_is_accepted_by_forwarder() {
    let storage = MemoryStorage::new();
    let mut cart = CartStore::new(&storage);
    cart.add_item(AddItemRequest::new("Tonkotsu Ramen", 14.5).with_quantity(2));
    cart.add_item(AddItemRequest::new("Gyoza", 6.0).with_notes("crispy"));

    save_order_note(&storage, cart.config(), " leave at counter ").unwrap();
    let note = load_order_note(&storage, cart.config());
    let request = CheckoutRequest::new(cart.order_summary(), &note, now()).unwrap();
    assert_eq!(request.order_note, "leave at counter");

    let transport = RecordingTransport::replying(200, "OK");
    let forwarder = OrderForwarder::new(config_with_webhook(), &transport);
    let response = forwarder.handle(&ForwardRequest::post(request.to_json().unwrap()), now());
    assert_eq!(response.body["forwarded"], true);

    let posts = transport.posts.borrow();
    let payload = &posts[0].1;
    assert_eq!(payload["totalItems"], 3);
    assert_eq!(payload["subtotal"], 35);
    assert_eq!(payload["items"][1]["notes"], "crispy");
    assert_eq!(payload["orderNote"], "leave at counter");
}
