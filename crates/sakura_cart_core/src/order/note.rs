//! Checkout note persistence.
//!
//! The note is plain text stored under `CartConfig::order_note_key`, separate
//! from the cart record so clearing one never touches the other.

use crate::config::CartConfig;
use crate::storage::{StorageAdapter, StorageResult};
use log::warn;

/// Stores the checkout note. An empty note is stored as empty text.
pub fn save_order_note<S: StorageAdapter + ?Sized>(
    storage: &S,
    config: &CartConfig,
    note: &str,
) -> StorageResult<()> {
    storage.set(&config.order_note_key, note)
}

/// Reads the checkout note; absent or unreadable notes read as empty.
pub fn load_order_note<S: StorageAdapter + ?Sized>(storage: &S, config: &CartConfig) -> String {
    match storage.get(&config.order_note_key) {
        Ok(note) => note.unwrap_or_default(),
        Err(err) => {
            warn!(
                "event=order_note_load module=order status=error error={}",
                err
            );
            String::new()
        }
    }
}
