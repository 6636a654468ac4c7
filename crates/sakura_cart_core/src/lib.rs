//! Shopping cart core for the Sakura Ramen storefront.
//! This crate owns cart invariants, persistence and checkout export.

pub mod cart;
pub mod config;
pub mod currency;
pub mod logging;
pub mod model;
pub mod order;
pub mod storage;

pub use cart::{CartStore, ListenerResult, SubscriptionId};
pub use config::{CartConfig, ForwarderConfig};
pub use currency::format_usd;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::line_item::{derive_item_id, AddItemRequest, CartLineItem};
pub use order::{
    load_order_note, save_order_note, CheckoutError, CheckoutRequest, ForwardRequest,
    ForwardResponse, OrderForwarder, OrderSummary, TransportError, WebhookReply,
    WebhookTransport,
};
#[cfg(feature = "webhook")]
pub use order::ReqwestWebhookTransport;
pub use storage::{
    latest_schema_version, MemoryStorage, SqliteStorage, StorageAdapter, StorageError,
    StorageResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
