use std::{
    any::Any,
    marker::PhantomData,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{event::ListenerId, owner::Owner};

use super::Condition;

type Filter<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// True once an event of type `E` was sent to the owner since the condition
/// was enabled. Disabling detaches the listener and forgets the event.
pub struct EventCondition<E> {
    filter: Option<Filter<E>>,
    seen: Arc<AtomicBool>,
    listener: Option<ListenerId>,
    _event: PhantomData<fn(&E)>,
}

impl<E: Any> Default for EventCondition<E> {
    fn default() -> Self {
        Self {
            filter: None,
            seen: Arc::new(AtomicBool::new(false)),
            listener: None,
            _event: PhantomData,
        }
    }
}

impl<E: Any> EventCondition<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only events accepted by `filter` count.
    pub fn matching(filter: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self {
            filter: Some(Arc::new(filter)),
            ..Self::default()
        }
    }
}

impl<E: Any> Condition for EventCondition<E> {
    fn on_enable(&mut self, owner: &Owner) {
        self.seen.store(false, Ordering::SeqCst);

        let seen = self.seen.clone();
        let filter = self.filter.clone();
        let id = owner.add_event_listener(move |event: &E| {
            if filter.as_ref().map_or(true, |filter| filter(event)) {
                seen.store(true, Ordering::SeqCst);
            }
            Ok(())
        });
        self.listener = Some(id);
    }

    fn on_disable(&mut self, owner: &Owner) {
        if let Some(id) = self.listener.take() {
            owner.remove_event_listener(id);
        }
        self.seen.store(false, Ordering::SeqCst);
    }

    fn evaluate(&mut self, _owner: &Owner) -> bool {
        self.seen.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noise {
        volume: u32,
    }

    #[test]
    fn only_counts_events_inside_the_window() {
        let owner = Owner::new("guard");
        let mut heard = EventCondition::<Noise>::matching(|noise| noise.volume > 5);

        owner.send_event(&Noise { volume: 9 }).unwrap();
        heard.on_enable(&owner);
        assert!(!heard.evaluate(&owner));

        owner.send_event(&Noise { volume: 2 }).unwrap();
        assert!(!heard.evaluate(&owner));

        owner.send_event(&Noise { volume: 7 }).unwrap();
        assert!(heard.evaluate(&owner));

        heard.on_disable(&owner);
        assert!(!heard.evaluate(&owner));
        assert_eq!(owner.events().listener_count::<Noise>(), 0);
    }
}
