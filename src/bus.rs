//! Typed event bus connecting services and views.
//!
//! DESIGN
//! ======
//! Each event type has its own subscriber list, keyed by `TypeId`. A
//! subscriber opts into an event by implementing [`Handler<E>`] for it and
//! registering once per event kind. Handlers are held weakly: whoever owns
//! the component keeps it alive, and dropping it unsubscribes.
//!
//! Dispatch is synchronous and in registration order. The registry lock is
//! released before any handler runs, so handlers may publish or subscribe.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::util::lock;

/// Capability to receive events of type `E`.
pub trait Handler<E>: Send + Sync {
    fn handle(&self, event: &E);
}

type Subscribers<E> = Vec<Weak<dyn Handler<E>>>;

#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of type `E`.
    pub fn subscribe<E, H>(&self, handler: &Arc<H>)
    where
        E: 'static,
        H: Handler<E> + 'static,
    {
        let erased: Arc<dyn Handler<E>> = handler.clone();
        let weak = Arc::downgrade(&erased);
        let mut registry = lock(&self.registry);
        let slot = registry
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Subscribers::<E>::new()));
        if let Some(list) = slot.downcast_mut::<Subscribers<E>>() {
            list.push(weak);
        }
    }

    /// Deliver `event` to every live subscriber. Returns how many were called.
    pub fn publish<E: 'static>(&self, event: &E) -> usize {
        let handlers = self.live::<E>();
        for handler in &handlers {
            handler.handle(event);
        }
        handlers.len()
    }

    /// Number of live subscribers for `E`.
    #[must_use]
    pub fn subscriber_count<E: 'static>(&self) -> usize {
        self.live::<E>().len()
    }

    /// Upgrade live subscribers, pruning dropped ones, without holding the lock
    /// past the return.
    fn live<E: 'static>(&self) -> Vec<Arc<dyn Handler<E>>> {
        let mut registry = lock(&self.registry);
        let Some(list) = registry
            .get_mut(&TypeId::of::<E>())
            .and_then(|slot| slot.downcast_mut::<Subscribers<E>>())
        else {
            return Vec::new();
        };
        list.retain(|weak| weak.strong_count() > 0);
        list.iter().filter_map(Weak::upgrade).collect()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds = lock(&self.registry).len();
        f.debug_struct("EventBus").field("event_kinds", &kinds).finish()
    }
}

#[cfg(test)]
#[path = "bus_test.rs"]
mod tests;
