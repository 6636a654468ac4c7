//! Static configuration for the cart and the order forwarder.

use log::info;

/// Storage key holding the serialized cart.
pub const DEFAULT_STORAGE_KEY: &str = "sakura-ramen-cart-v1";
/// Storage key holding the free-text checkout note.
pub const DEFAULT_ORDER_NOTE_KEY: &str = "sakura-ramen-order-note";
/// Scratch key written and removed once to probe storage availability.
pub const DEFAULT_PROBE_KEY: &str = "__sakura_cart_test__";
/// External ordering portal the customer is sent to after forwarding.
pub const DEFAULT_ORDER_PORTAL_URL: &str = "https://order.sakuraramen208.com/";
/// Environment variable naming the order webhook endpoint.
pub const ORDER_WEBHOOK_URL_ENV: &str = "ORDER_WEBHOOK_URL";

/// Storage keys used by `CartStore` and the order-note helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    pub storage_key: String,
    pub order_note_key: String,
    pub probe_key: String,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            order_note_key: DEFAULT_ORDER_NOTE_KEY.to_string(),
            probe_key: DEFAULT_PROBE_KEY.to_string(),
        }
    }
}

/// Settings for `OrderForwarder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwarderConfig {
    /// Webhook receiving sanitized orders. `None` disables forwarding.
    pub webhook_url: Option<String>,
    /// Returned to the caller so it can open the ordering portal.
    pub redirect_url: String,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            redirect_url: DEFAULT_ORDER_PORTAL_URL.to_string(),
        }
    }
}

impl ForwarderConfig {
    /// Reads `ORDER_WEBHOOK_URL`; unset or blank leaves forwarding disabled.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let config = Self::default().with_webhook_url(lookup(ORDER_WEBHOOK_URL_ENV));
        info!(
            "event=config_load module=config status=ok webhook_configured={}",
            config.webhook_url.is_some()
        );
        config
    }

    pub fn with_webhook_url(mut self, url: Option<String>) -> Self {
        self.webhook_url = url
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self
    }

    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{CartConfig, ForwarderConfig, DEFAULT_ORDER_PORTAL_URL};

    #[test]
    fn default_cart_keys_match_site_storage_layout() {
        let config = CartConfig::default();
        assert_eq!(config.storage_key, "sakura-ramen-cart-v1");
        assert_eq!(config.order_note_key, "sakura-ramen-order-note");
    }

    #[test]
    fn webhook_url_is_read_from_order_webhook_variable() {
        let config = ForwarderConfig::from_lookup(|name| {
            (name == "ORDER_WEBHOOK_URL").then(|| "https://hooks.example.com/order".to_string())
        });
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://hooks.example.com/order")
        );

        let config = ForwarderConfig::from_lookup(|_| None);
        assert_eq!(config.webhook_url, None);
    }

    #[test]
    fn blank_webhook_url_disables_forwarding() {
        let config = ForwarderConfig::default().with_webhook_url(Some("   ".to_string()));
        assert_eq!(config.webhook_url, None);
        assert_eq!(config.redirect_url, DEFAULT_ORDER_PORTAL_URL);

        let config = ForwarderConfig::default()
            .with_webhook_url(Some(" https://hooks.example.com/order ".to_string()));
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://hooks.example.com/order")
        );
    }
}
