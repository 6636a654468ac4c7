//! Cart state store.
//!
//! # Responsibility
//! - Own the ordered list of cart line items for one storefront session.
//! - Persist every mutation to a `StorageAdapter` and notify listeners.
//! - Compute derived values (item count, subtotal, order summary) on demand.
//!
//! # Invariants
//! - Item ids are unique; insertion order is preserved across updates.
//! - Every stored quantity is at least 1; a quantity update below 1 removes
//!   the item instead.
//! - State is loaded lazily on first access, once per store.
//! - Storage availability is probed once; after a failed probe the store runs
//!   memory-only for its whole lifetime.
//! - Listeners are notified only after the persistence write for the same
//!   mutation has completed.
//! - No operation returns an error: bad input is coerced or ignored, storage
//!   failures are logged.

mod listeners;
mod persist;

pub use listeners::{ListenerResult, SubscriptionId};

use crate::config::CartConfig;
use crate::model::coerce::sanitize_price;
use crate::model::line_item::{is_valid_name, AddItemRequest, CartLineItem};
use crate::order::OrderSummary;
use crate::storage::StorageAdapter;
use listeners::ListenerRegistry;
use log::{debug, info, warn};
use once_cell::unsync::OnceCell;

/// Single source of truth for one shopping cart.
pub struct CartStore<S: StorageAdapter> {
    storage: S,
    config: CartConfig,
    storage_available: OnceCell<bool>,
    items: OnceCell<Vec<CartLineItem>>,
    listeners: ListenerRegistry,
}

impl<S: StorageAdapter> CartStore<S> {
    /// Creates a store over `storage` using default keys.
    ///
    /// Nothing is read until the first operation touches the cart.
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, CartConfig::default())
    }

    pub fn with_config(storage: S, config: CartConfig) -> Self {
        Self {
            storage,
            config,
            storage_available: OnceCell::new(),
            items: OnceCell::new(),
            listeners: ListenerRegistry::default(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    /// Returns whether persistence is active, probing storage on first call.
    pub fn is_storage_available(&self) -> bool {
        *self
            .storage_available
            .get_or_init(|| probe_storage(&self.storage, &self.config.probe_key))
    }

    /// Loads persisted state if needed, writes it back normalized and
    /// notifies listeners.
    ///
    /// Loading happens once; repeated calls only re-persist and re-notify.
    pub fn initialize(&mut self) -> Vec<CartLineItem> {
        let count = self.loaded().len();
        info!(
            "event=cart_init module=cart status=ok items={} storage_available={}",
            count,
            self.is_storage_available()
        );
        self.commit();
        self.snapshot()
    }

    /// Returns a deep copy of the current line items.
    pub fn snapshot(&self) -> Vec<CartLineItem> {
        self.loaded().clone()
    }

    /// Returns a copy of one line item.
    pub fn item(&self, id: &str) -> Option<CartLineItem> {
        self.loaded().iter().find(|item| item.id == id).cloned()
    }

    /// Sum of quantities over all line items.
    pub fn item_count(&self) -> u64 {
        self.loaded()
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    /// Sum of `price * quantity` over all line items.
    pub fn subtotal(&self) -> f64 {
        self.loaded().iter().map(CartLineItem::line_total).sum()
    }

    /// Exportable `{items, subtotal, totalItems}` view for checkout.
    pub fn order_summary(&self) -> OrderSummary {
        OrderSummary::from_items(self.snapshot())
    }

    /// Adds units of an item, merging into an existing line with the same
    /// resolved id.
    ///
    /// # Contract
    /// - Blank names are ignored and nothing is persisted.
    /// - On merge, quantity accumulates and notes are replaced only by
    ///   non-empty notes; name, description and price are left as stored.
    /// - New lines get at least quantity 1.
    pub fn add_item(&mut self, request: AddItemRequest) -> Vec<CartLineItem> {
        if !is_valid_name(&request.name) {
            debug!("event=cart_add module=cart status=skipped reason=empty_name");
            return self.snapshot();
        }

        let id = request.resolved_id();
        let quantity = request.quantity.unwrap_or(1);
        let price = sanitize_price(request.price);

        let merged = self.mutate(|items| {
            if let Some(existing) = items.iter_mut().find(|item| item.id == id) {
                existing.quantity = existing.quantity.saturating_add(quantity).max(1);
                if !request.notes.is_empty() {
                    existing.notes = request.notes;
                }
                return true;
            }

            items.push(CartLineItem {
                id: id.clone(),
                name: request.name,
                description: request.description,
                price,
                quantity: quantity.max(1),
                notes: request.notes,
            });
            false
        });

        debug!(
            "event=cart_add module=cart status=ok item_id={} quantity={} merged={}",
            id, quantity, merged
        );
        self.commit();
        self.snapshot()
    }

    /// Sets the quantity of one line.
    ///
    /// NaN or values below 1 remove the line; fractional values are floored.
    /// Unknown ids leave the cart untouched.
    pub fn set_quantity(&mut self, id: &str, quantity: f64) -> Vec<CartLineItem> {
        if self.item(id).is_none() {
            return self.snapshot();
        }
        if quantity.is_nan() || quantity < 1.0 {
            return self.remove_item(id);
        }

        // Float-to-int `as` saturates, so +inf clamps to u32::MAX.
        let next = quantity.floor() as u32;
        self.mutate(|items| {
            if let Some(target) = items.iter_mut().find(|item| item.id == id) {
                target.quantity = next;
            }
        });

        debug!(
            "event=cart_set_quantity module=cart status=ok item_id={} quantity={}",
            id, next
        );
        self.commit();
        self.snapshot()
    }

    /// Removes the line with `id`, if present, then persists and notifies.
    pub fn remove_item(&mut self, id: &str) -> Vec<CartLineItem> {
        let removed = self.mutate(|items| {
            let before = items.len();
            items.retain(|item| item.id != id);
            before != items.len()
        });

        debug!(
            "event=cart_remove module=cart status=ok item_id={} removed={}",
            id, removed
        );
        self.commit();
        self.snapshot()
    }

    /// Replaces the notes of one line verbatim; empty text clears them.
    pub fn set_note(&mut self, id: &str, note: impl Into<String>) -> Vec<CartLineItem> {
        if self.item(id).is_none() {
            return self.snapshot();
        }

        let note = note.into();
        self.mutate(|items| {
            if let Some(target) = items.iter_mut().find(|item| item.id == id) {
                target.notes = note;
            }
        });

        debug!("event=cart_set_note module=cart status=ok item_id={}", id);
        self.commit();
        self.snapshot()
    }

    /// Empties the cart.
    pub fn clear(&mut self) -> Vec<CartLineItem> {
        self.mutate(|items| items.clear());
        debug!("event=cart_clear module=cart status=ok");
        self.commit();
        self.snapshot()
    }

    /// Registers a listener and immediately calls it with the current state.
    ///
    /// A failing listener is logged and never affects other listeners.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&[CartLineItem]) -> ListenerResult + 'static,
    {
        let snapshot = self.snapshot();
        let id = self.listeners.register(Box::new(listener));
        self.listeners.notify_one(id, &snapshot);
        id
    }

    /// Stops notifications for `id`. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unregister(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn loaded(&self) -> &Vec<CartLineItem> {
        self.items.get_or_init(|| self.load_persisted())
    }

    fn mutate<T>(&mut self, apply: impl FnOnce(&mut Vec<CartLineItem>) -> T) -> T {
        let mut items = match self.items.take() {
            Some(items) => items,
            None => self.load_persisted(),
        };
        let outcome = apply(&mut items);
        self.items = OnceCell::from(items);
        outcome
    }

    fn load_persisted(&self) -> Vec<CartLineItem> {
        if !self.is_storage_available() {
            return Vec::new();
        }

        match self.storage.get(&self.config.storage_key) {
            Ok(Some(raw)) => persist::decode_items(&raw),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(
                    "event=cart_load module=cart status=error error_code=storage_read_failed error={}",
                    err
                );
                Vec::new()
            }
        }
    }

    fn commit(&mut self) {
        self.persist();
        let snapshot = self.snapshot();
        let failures = self.listeners.notify_all(&snapshot);
        if failures > 0 {
            warn!(
                "event=cart_notify module=cart status=partial failed_listeners={}",
                failures
            );
        }
    }

    fn persist(&self) {
        if !self.is_storage_available() {
            return;
        }

        let encoded = match persist::encode_items(self.loaded()) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(
                    "event=cart_persist module=cart status=error error_code=encode_failed error={}",
                    err
                );
                return;
            }
        };

        if let Err(err) = self.storage.set(&self.config.storage_key, &encoded) {
            warn!(
                "event=cart_persist module=cart status=error error_code=storage_write_failed error={}",
                err
            );
        }
    }
}

fn probe_storage<S: StorageAdapter>(storage: &S, probe_key: &str) -> bool {
    let outcome = storage
        .set(probe_key, "1")
        .and_then(|()| storage.remove(probe_key));

    match outcome {
        Ok(()) => true,
        Err(err) => {
            warn!(
                "event=storage_probe module=cart status=unavailable error={}",
                err
            );
            false
        }
    }
}
