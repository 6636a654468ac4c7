//! Publish/subscribe registry for cart change notifications.
//!
//! # Invariants
//! - Listeners run in registration order.
//! - A listener that returns an error or panics is logged and skipped; the
//!   remaining listeners still run and the registry stays usable.

use crate::model::line_item::CartLineItem;
use log::error;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{self, AssertUnwindSafe};

const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

/// Outcome reported by a cart listener.
pub type ListenerResult = Result<(), Box<dyn Error + Send + Sync>>;

type Listener = Box<dyn FnMut(&[CartLineItem]) -> ListenerResult>;

/// Handle returned by `CartStore::subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    listeners: BTreeMap<SubscriptionId, Listener>,
}

impl ListenerRegistry {
    pub(crate) fn register(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, listener);
        id
    }

    pub(crate) fn unregister(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Delivers one snapshot to every listener. Returns the failure count.
    pub(crate) fn notify_all(&mut self, snapshot: &[CartLineItem]) -> usize {
        let mut failures = 0;
        for (id, listener) in self.listeners.iter_mut() {
            if !deliver(*id, listener, snapshot) {
                failures += 1;
            }
        }
        failures
    }

    /// Delivers one snapshot to a single listener.
    pub(crate) fn notify_one(&mut self, id: SubscriptionId, snapshot: &[CartLineItem]) -> bool {
        match self.listeners.get_mut(&id) {
            Some(listener) => deliver(id, listener, snapshot),
            None => false,
        }
    }
}

fn deliver(id: SubscriptionId, listener: &mut Listener, snapshot: &[CartLineItem]) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| listener(snapshot))) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            error!(
                "event=cart_notify module=cart status=error subscription={} error={}",
                id,
                truncate(&err.to_string())
            );
            false
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|text| (*text).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!(
                "event=cart_notify module=cart status=panic subscription={} payload={}",
                id,
                truncate(&message)
            );
            false
        }
    }
}

fn truncate(value: &str) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if flat.chars().count() <= MAX_PANIC_PAYLOAD_CHARS {
        return flat;
    }
    let mut short: String = flat.chars().take(MAX_PANIC_PAYLOAD_CHARS).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::{ListenerRegistry, ListenerResult};
    use crate::model::line_item::CartLineItem;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    type BoxedListener = Box<dyn FnMut(&[CartLineItem]) -> ListenerResult>;

    fn recording(log: &Log, tag: &'static str) -> BoxedListener {
        let log = Rc::clone(log);
        Box::new(move |_: &[CartLineItem]| -> ListenerResult {
            log.borrow_mut().push(tag);
            Ok(())
        })
    }

    #[test]
    fn notify_runs_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ListenerRegistry::default();
        registry.register(recording(&log, "first"));
        registry.register(recording(&log, "second"));

        assert_eq!(registry.notify_all(&[]), 0);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn failing_listeners_are_isolated() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ListenerRegistry::default();
        registry.register(Box::new(|_: &[CartLineItem]| -> ListenerResult {
            Err("render failed".into())
        }));
        registry.register(Box::new(|_: &[CartLineItem]| -> ListenerResult {
            panic!("listener blew up")
        }));
        registry.register(recording(&log, "healthy"));

        assert_eq!(registry.notify_all(&[]), 2);
        assert_eq!(*log.borrow(), vec!["healthy"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut registry = ListenerRegistry::default();
        let id = registry.register(Box::new(|_: &[CartLineItem]| -> ListenerResult {
            Ok(())
        }));
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(!registry.notify_one(id, &[]));
    }
}
