use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use parking_lot::RwLock;

use crate::{
    blackboard::Blackboard,
    error::{BehaviourError, EventError},
    event::{EventBus, ListenerId},
};

/// Shared, lockable component stored on an owner.
pub type Component<T> = Arc<RwLock<T>>;

struct OwnerData {
    name: String,
    blackboard: Blackboard,
    events: EventBus,
    components: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

/// The host entity a behaviour runs for.
///
/// Cheap to clone; every clone refers to the same blackboard, event bus and
/// component set. Behaviours keep a clone after `initialize`.
#[derive(Clone)]
pub struct Owner {
    data: Arc<OwnerData>,
}

impl std::fmt::Debug for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Owner")
            .field("name", &self.data.name)
            .field("blackboard", &self.data.blackboard.names())
            .finish()
    }
}

impl Owner {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_blackboard(name, Blackboard::create())
    }

    pub fn with_blackboard(name: impl Into<String>, blackboard: Blackboard) -> Self {
        Self {
            data: Arc::new(OwnerData {
                name: name.into(),
                blackboard,
                events: EventBus::new(),
                components: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.data.blackboard
    }

    pub fn events(&self) -> &EventBus {
        &self.data.events
    }

    /// Attaches `component`, replacing any component of the same type.
    pub fn add_component<T: Send + Sync + 'static>(&self, component: T) -> Component<T> {
        let shared = Arc::new(RwLock::new(component));
        self.insert_component(shared.clone());
        shared
    }

    pub fn insert_component<T: Send + Sync + 'static>(&self, component: Component<T>) {
        log::trace!("owner '{}': attached {}", self.data.name, type_name::<T>());
        self.data
            .components
            .write()
            .insert(TypeId::of::<T>(), component);
    }

    pub fn component<T: Send + Sync + 'static>(&self) -> Option<Component<T>> {
        let component = self.data.components.read().get(&TypeId::of::<T>())?.clone();
        component.downcast::<RwLock<T>>().ok()
    }

    pub fn has_component<T: Send + Sync + 'static>(&self) -> bool {
        self.data.components.read().contains_key(&TypeId::of::<T>())
    }

    pub fn remove_component<T: Send + Sync + 'static>(&self) -> Option<Component<T>> {
        let component = self.data.components.write().remove(&TypeId::of::<T>())?;
        component.downcast::<RwLock<T>>().ok()
    }

    /// Fills in a missing target from this owner's components. Returns `false`
    /// when `target` is still empty afterwards.
    pub fn resolve_target<T: Send + Sync + 'static>(&self, target: &mut Option<Component<T>>) -> bool {
        if target.is_none() {
            *target = self.component::<T>();
        }

        target.is_some()
    }

    /// Like [`Owner::resolve_target`], reporting a missing component as an error.
    pub fn require_target<T: Send + Sync + 'static>(&self) -> Result<Component<T>, BehaviourError> {
        self.component::<T>().ok_or_else(|| BehaviourError::MissingTarget {
            owner: self.data.name.clone(),
            type_name: type_name::<T>(),
        })
    }

    pub fn add_event_listener<E, F>(&self, listener: F) -> ListenerId
    where
        E: Any,
        F: FnMut(&E) -> anyhow::Result<()> + Send + 'static,
    {
        self.data.events.add_listener(listener)
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.data.events.remove_listener(id)
    }

    pub fn send_event<E: Any>(&self, event: &E) -> Result<(), EventError> {
        self.data.events.send(event)
    }

    pub fn same_as(&self, other: &Owner) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u32);

    #[test]
    fn components_resolve_by_type() {
        let owner = Owner::new("guard");
        owner.add_component(Health(10));

        let mut target = None;
        assert!(owner.resolve_target::<Health>(&mut target));
        target.as_ref().unwrap().write().0 -= 4;

        assert_eq!(*owner.component::<Health>().unwrap().read(), Health(6));
    }

    #[test]
    fn missing_target_stays_empty() {
        let owner = Owner::new("crate");
        let mut target: Option<Component<Health>> = None;

        assert!(!owner.resolve_target(&mut target));
        assert!(matches!(
            owner.require_target::<Health>(),
            Err(BehaviourError::MissingTarget { .. })
        ));
    }

    #[test]
    fn explicit_target_is_kept() {
        let owner = Owner::new("guard");
        owner.add_component(Health(1));

        let mut target = Some(Arc::new(RwLock::new(Health(99))));
        assert!(owner.resolve_target(&mut target));
        assert_eq!(target.unwrap().read().0, 99);
    }
}
