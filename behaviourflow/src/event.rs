//! Typed observer registry used by owners to deliver events to nodes.
//!
//! Listeners are grouped per event type. Subscribing or unsubscribing while an
//! event of the same type is being dispatched is staged and applied once the
//! outermost dispatch of that type completes, so a dispatch always runs over
//! the listener set it started with. Every listener runs even if an earlier one
//! fails; failures are reported together afterwards.

use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use parking_lot::Mutex;

use crate::error::EventError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerFn = dyn FnMut(&dyn Any) -> anyhow::Result<()> + Send;
type SharedListener = Arc<Mutex<Box<ListenerFn>>>;

enum PendingChange {
    Add(ListenerId, SharedListener),
    Remove(ListenerId),
}

#[derive(Default)]
struct Channel {
    listeners: Vec<(ListenerId, SharedListener)>,
    dispatch_depth: usize,
    pending: Vec<PendingChange>,
}

impl Channel {
    fn apply(&mut self, change: PendingChange) {
        match change {
            PendingChange::Add(id, listener) => self.listeners.push((id, listener)),
            PendingChange::Remove(id) => self.listeners.retain(|(listener, _)| *listener != id),
        }
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    channels: HashMap<TypeId, Channel>,
    owners: HashMap<ListenerId, TypeId>,
}

#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("EventBus")
            .field("channels", &registry.channels.len())
            .field("listeners", &registry.owners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener<E, F>(&self, mut listener: F) -> ListenerId
    where
        E: Any,
        F: FnMut(&E) -> anyhow::Result<()> + Send + 'static,
    {
        let erased: Box<ListenerFn> = Box::new(move |event: &dyn Any| match event.downcast_ref::<E>() {
            Some(event) => listener(event),
            None => Ok(()),
        });
        let shared = Arc::new(Mutex::new(erased));

        let mut registry = self.registry.lock();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.owners.insert(id, TypeId::of::<E>());

        let channel = registry.channels.entry(TypeId::of::<E>()).or_default();
        if channel.dispatch_depth > 0 {
            log::trace!("events: staging listener {id:?} for {}", type_name::<E>());
            channel.pending.push(PendingChange::Add(id, shared));
        } else {
            channel.listeners.push((id, shared));
        }

        id
    }

    /// Returns `false` when `id` is not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.lock();
        let Some(type_id) = registry.owners.remove(&id) else {
            return false;
        };

        if let Some(channel) = registry.channels.get_mut(&type_id) {
            if channel.dispatch_depth > 0 {
                channel.pending.push(PendingChange::Remove(id));
            } else {
                channel.apply(PendingChange::Remove(id));
            }
        }

        true
    }

    pub fn listener_count<E: Any>(&self) -> usize {
        let registry = self.registry.lock();
        registry
            .owners
            .values()
            .filter(|type_id| **type_id == TypeId::of::<E>())
            .count()
    }

    /// Delivers `event` to every listener registered for `E`.
    pub fn send<E: Any>(&self, event: &E) -> Result<(), EventError> {
        let snapshot: Vec<(ListenerId, SharedListener)> = {
            let mut registry = self.registry.lock();
            let Some(channel) = registry.channels.get_mut(&TypeId::of::<E>()) else {
                return Ok(());
            };
            channel.dispatch_depth += 1;
            channel.listeners.clone()
        };

        let payload: &dyn Any = event;
        let mut errors = Vec::new();
        for (id, listener) in snapshot {
            // A listener that re-sends the event it is handling cannot be re-entered.
            let Some(mut listener) = listener.try_lock() else {
                log::warn!("events: listener {id:?} is already handling {}", type_name::<E>());
                continue;
            };
            if let Err(error) = (*listener)(payload) {
                log::error!("events: listener {id:?} failed on {}: {error:#}", type_name::<E>());
                errors.push(error);
            }
        }

        {
            let mut registry = self.registry.lock();
            if let Some(channel) = registry.channels.get_mut(&TypeId::of::<E>()) {
                channel.dispatch_depth -= 1;
                if channel.dispatch_depth == 0 {
                    let pending = std::mem::take(&mut channel.pending);
                    for change in pending {
                        channel.apply(change);
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(EventError::Listeners {
                event: type_name::<E>(),
                errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug)]
    struct Noise(u32);

    #[derive(Debug)]
    struct Alarm;

    #[test]
    fn delivers_only_to_matching_type() {
        let bus = EventBus::new();
        let heard = Arc::new(AtomicUsize::new(0));

        let counter = heard.clone();
        bus.add_listener(move |noise: &Noise| {
            counter.fetch_add(noise.0 as usize, Ordering::SeqCst);
            Ok(())
        });

        bus.send(&Noise(3)).unwrap();
        bus.send(&Alarm).unwrap();
        assert_eq!(heard.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failing_listener_does_not_starve_others() {
        let bus = EventBus::new();
        let heard = Arc::new(AtomicUsize::new(0));

        bus.add_listener(|_: &Alarm| anyhow::bail!("first listener broke"));
        let counter = heard.clone();
        bus.add_listener(move |_: &Alarm| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        bus.add_listener(|_: &Alarm| anyhow::bail!("third listener broke"));

        let error = bus.send(&Alarm).unwrap_err();
        let EventError::Listeners { errors, .. } = error;
        assert_eq!(errors.len(), 2);
        assert_eq!(heard.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscriptions_made_during_dispatch_apply_afterwards() {
        let bus = EventBus::new();
        let late_calls = Arc::new(AtomicUsize::new(0));

        let inner_bus = bus.clone();
        let counter = late_calls.clone();
        bus.add_listener(move |_: &Alarm| {
            let counter = counter.clone();
            inner_bus.add_listener(move |_: &Alarm| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        });

        bus.send(&Alarm).unwrap();
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        assert_eq!(bus.listener_count::<Alarm>(), 2);

        bus.send(&Alarm).unwrap();
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removal_during_dispatch_is_deferred() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let victim = bus.add_listener(move |_: &Noise| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let inner_bus = bus.clone();
        bus.add_listener(move |_: &Noise| {
            inner_bus.remove_listener(victim);
            Ok(())
        });

        bus.send(&Noise(0)).unwrap();
        bus.send(&Noise(0)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!bus.remove_listener(victim));
    }
}
