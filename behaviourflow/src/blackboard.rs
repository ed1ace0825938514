//! Typed key-value store shared by every node of one behaviour instance.
//!
//! Variables are addressed by a stable [`VariableId`] with a fallback lookup by
//! name, so references survive renames and can still be wired by name when no
//! id is known yet. A [`Blackboard`] is a cheap handle; clones share storage.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::{Display, Formatter},
    marker::PhantomData,
    sync::Arc,
};

use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    error::BlackboardError,
    value::{FromValue, Value},
};

/// 128-bit identity of a blackboard variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableId(Uuid);

impl VariableId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn as_u128(self) -> u128 {
        self.0.as_u128()
    }
}

impl Default for VariableId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for VariableId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug)]
struct Variable {
    name: String,
    value: Value,
}

#[derive(Debug, Default)]
struct Storage {
    variables: BTreeMap<VariableId, Variable>,
    by_name: HashMap<String, VariableId>,
}

impl Storage {
    fn find(&self, id: Option<VariableId>, name: &str) -> Option<VariableId> {
        id.filter(|id| self.variables.contains_key(id))
            .or_else(|| self.by_name.get(name).copied())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Blackboard {
    storage: Arc<RwLock<Storage>>,
}

impl Blackboard {
    pub fn create() -> Self {
        Self::default()
    }

    /// Declares a variable under a fresh id. Redeclaring an existing name
    /// replaces its value and keeps its id.
    pub fn declare(&self, name: impl Into<String>, value: impl Into<Value>) -> VariableId {
        let name = name.into();
        let mut storage = self.storage.write();

        if let Some(id) = storage.by_name.get(&name).copied() {
            if let Some(variable) = storage.variables.get_mut(&id) {
                variable.value = value.into();
            }
            return id;
        }

        let id = VariableId::new();
        Self::insert(&mut storage, id, name, value.into());
        id
    }

    /// Declares a variable with a caller-provided id.
    pub fn declare_with_id(&self, id: VariableId, name: impl Into<String>, value: impl Into<Value>) {
        let mut storage = self.storage.write();
        Self::insert(&mut storage, id, name.into(), value.into());
    }

    fn insert(storage: &mut Storage, id: VariableId, name: String, value: Value) {
        if let Some(previous) = storage.variables.get(&id) {
            let previous = previous.name.clone();
            storage.by_name.remove(&previous);
        }
        if let Some(shadowed) = storage.by_name.insert(name.clone(), id) {
            if shadowed != id {
                storage.variables.remove(&shadowed);
            }
        }

        log::trace!("blackboard: declared '{name}' ({id})");
        storage.variables.insert(id, Variable { name, value });
    }

    /// Resolves a variable by id first, then by name.
    pub fn find(&self, id: Option<VariableId>, name: &str) -> Option<VariableId> {
        self.storage.read().find(id, name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.storage.read().by_name.contains_key(name)
    }

    pub fn contains_id(&self, id: VariableId) -> bool {
        self.storage.read().variables.contains_key(&id)
    }

    pub fn name_of(&self, id: VariableId) -> Option<String> {
        self.storage
            .read()
            .variables
            .get(&id)
            .map(|variable| variable.name.clone())
    }

    /// Names of all declared variables, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.storage.read().by_name.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.storage.read().variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self, id: VariableId) -> Option<Value> {
        self.storage
            .read()
            .variables
            .get(&id)
            .map(|variable| variable.value.clone())
    }

    pub fn value_by_name(&self, name: &str) -> Option<Value> {
        let storage = self.storage.read();
        let id = storage.by_name.get(name)?;
        storage.variables.get(id).map(|variable| variable.value.clone())
    }

    pub fn get<T: FromValue>(&self, id: VariableId) -> Result<T, BlackboardError> {
        let storage = self.storage.read();
        let variable = storage
            .variables
            .get(&id)
            .ok_or_else(|| BlackboardError::NotFound(id.to_string()))?;

        Self::extract(variable)
    }

    pub fn get_by_name<T: FromValue>(&self, name: &str) -> Result<T, BlackboardError> {
        let storage = self.storage.read();
        let variable = storage
            .by_name
            .get(name)
            .and_then(|id| storage.variables.get(id))
            .ok_or_else(|| BlackboardError::NotFound(name.to_owned()))?;

        Self::extract(variable)
    }

    fn extract<T: FromValue>(variable: &Variable) -> Result<T, BlackboardError> {
        T::from_value(&variable.value).ok_or_else(|| BlackboardError::TypeMismatch {
            name: variable.name.clone(),
            expected: T::expected_kind(),
            found: variable.value.kind(),
        })
    }

    /// Overwrites an existing variable. The new value must have the same kind.
    pub fn set(&self, id: VariableId, value: impl Into<Value>) -> Result<(), BlackboardError> {
        let mut storage = self.storage.write();
        let variable = storage
            .variables
            .get_mut(&id)
            .ok_or_else(|| BlackboardError::NotFound(id.to_string()))?;

        Self::assign(variable, value.into())
    }

    /// Overwrites a variable by name, declaring it when missing.
    pub fn set_by_name(&self, name: &str, value: impl Into<Value>) -> Result<(), BlackboardError> {
        let value = value.into();
        let mut storage = self.storage.write();

        match storage.by_name.get(name).copied() {
            Some(id) => match storage.variables.get_mut(&id) {
                Some(variable) => Self::assign(variable, value),
                None => Err(BlackboardError::NotFound(name.to_owned())),
            },
            None => {
                Self::insert(&mut storage, VariableId::new(), name.to_owned(), value);
                Ok(())
            }
        }
    }

    fn assign(variable: &mut Variable, value: Value) -> Result<(), BlackboardError> {
        if !variable.value.same_kind(&value) {
            return Err(BlackboardError::TypeMismatch {
                name: variable.name.clone(),
                expected: variable.value.kind(),
                found: value.kind(),
            });
        }

        variable.value = value;
        Ok(())
    }

    /// Copies every variable of `other` whose name is not declared here yet,
    /// keeping the ids `other` uses. Returns how many variables were added.
    pub fn merge(&self, other: &Blackboard) -> usize {
        if Arc::ptr_eq(&self.storage, &other.storage) {
            return 0;
        }

        let incoming: Vec<(VariableId, Variable)> = other
            .storage
            .read()
            .variables
            .iter()
            .map(|(id, variable)| (*id, variable.clone()))
            .collect();

        let mut storage = self.storage.write();
        let mut added = 0;
        for (id, variable) in incoming {
            if storage.by_name.contains_key(&variable.name) || storage.variables.contains_key(&id) {
                continue;
            }
            Self::insert(&mut storage, id, variable.name, variable.value);
            added += 1;
        }

        added
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        let mut storage = self.storage.write();
        let id = storage.by_name.remove(name)?;
        storage.variables.remove(&id).map(|variable| variable.value)
    }

    pub fn clear(&self) {
        let mut storage = self.storage.write();
        storage.variables.clear();
        storage.by_name.clear();
    }
}

/// Typed handle onto a blackboard variable.
///
/// Created with a name (and optionally an id) when a node is built, then bound
/// once when its tree initializes so later lookups go straight through the id.
#[derive(Debug)]
pub struct BlackboardRef<T> {
    name: String,
    id: Option<VariableId>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for BlackboardRef<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            id: self.id,
            _marker: PhantomData,
        }
    }
}

impl<T> BlackboardRef<T>
where
    T: FromValue + Into<Value>,
{
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            _marker: PhantomData,
        }
    }

    pub fn with_id(id: VariableId, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: Some(id),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Option<VariableId> {
        self.id
    }

    pub fn is_bound(&self) -> bool {
        self.id.is_some()
    }

    /// Resolves the id against `blackboard`. Returns `false` when the
    /// variable is missing; the reference then keeps falling back to its name.
    pub fn bind(&mut self, blackboard: &Blackboard) -> bool {
        match blackboard.find(self.id, &self.name) {
            Some(id) => {
                self.id = Some(id);
                true
            }
            None => false,
        }
    }

    fn resolve(&self, blackboard: &Blackboard) -> Result<VariableId, BlackboardError> {
        blackboard
            .find(self.id, &self.name)
            .ok_or_else(|| BlackboardError::NotFound(self.name.clone()))
    }

    pub fn get(&self, blackboard: &Blackboard) -> Result<T, BlackboardError> {
        let id = self.resolve(blackboard)?;
        blackboard.get(id)
    }

    pub fn set(&self, blackboard: &Blackboard, value: T) -> Result<(), BlackboardError> {
        match self.resolve(blackboard) {
            Ok(id) => blackboard.set(id, value),
            Err(_) => blackboard.set_by_name(&self.name, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_to_name() {
        let blackboard = Blackboard::create();
        let id = blackboard.declare("health", 100);

        assert_eq!(blackboard.find(None, "health"), Some(id));
        assert_eq!(blackboard.find(Some(VariableId::new()), "health"), Some(id));
        assert_eq!(blackboard.find(Some(id), "renamed"), Some(id));
        assert_eq!(blackboard.find(None, "mana"), None);
    }

    #[test]
    fn set_keeps_variable_kind() {
        let blackboard = Blackboard::create();
        let id = blackboard.declare("alert", false);

        assert!(blackboard.set(id, true).is_ok());
        assert!(matches!(
            blackboard.set(id, 3),
            Err(BlackboardError::TypeMismatch { .. })
        ));
        assert!(blackboard.get::<bool>(id).unwrap());
    }

    #[test]
    fn clones_share_storage() {
        let blackboard = Blackboard::create();
        let shared = blackboard.clone();

        shared.set_by_name("ammo", 12).unwrap();
        assert_eq!(blackboard.get_by_name::<i32>("ammo").unwrap(), 12);
    }

    #[test]
    fn merge_only_adds_missing_names() {
        let owner = Blackboard::create();
        owner.declare("speed", 2.5);

        let defaults = Blackboard::create();
        defaults.declare("speed", 1.0);
        let target = defaults.declare("target", "none");

        assert_eq!(owner.merge(&defaults), 1);
        assert_eq!(owner.get_by_name::<f64>("speed").unwrap(), 2.5);
        assert_eq!(owner.get::<String>(target).unwrap(), "none");
    }

    #[test]
    fn reference_binds_once_and_survives_rename_lookups() {
        let blackboard = Blackboard::create();
        let id = blackboard.declare("score", 0);

        let mut score: BlackboardRef<i64> = BlackboardRef::named("score");
        assert!(score.bind(&blackboard));
        assert_eq!(score.id(), Some(id));

        score.set(&blackboard, 42).unwrap();
        assert_eq!(score.get(&blackboard).unwrap(), 42);
    }

    #[test]
    fn unbound_reference_declares_on_set() {
        let blackboard = Blackboard::create();
        let mut flag: BlackboardRef<bool> = BlackboardRef::named("seen");

        assert!(!flag.bind(&blackboard));
        flag.set(&blackboard, true).unwrap();
        assert!(flag.get(&blackboard).unwrap());
    }
}
