//! Boolean conditions guarding checks and state transitions.
//!
//! A [`ConditionGroup`] brackets its conditions with `enable`/`disable`.
//! Stateful conditions (for example "event seen since enable") only carry
//! meaning inside that window and forget everything on `disable`.

mod event;
mod expression;

pub use event::EventCondition;
pub use expression::ExpressionCondition;

use crate::owner::Owner;

pub trait Condition {
    fn on_enable(&mut self, _owner: &Owner) {}

    fn on_disable(&mut self, _owner: &Owner) {}

    fn evaluate(&mut self, owner: &Owner) -> bool;
}

/// Condition backed by a closure.
pub struct FnCondition<F> {
    predicate: F,
}

impl<F> FnCondition<F>
where
    F: FnMut(&Owner) -> bool,
{
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> Condition for FnCondition<F>
where
    F: FnMut(&Owner) -> bool,
{
    fn evaluate(&mut self, owner: &Owner) -> bool {
        (self.predicate)(owner)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConditionPolicy {
    #[default]
    AllTrue,
    AnyTrue,
}

#[derive(Default)]
pub struct ConditionGroup {
    conditions: Vec<Box<dyn Condition>>,
    policy: ConditionPolicy,
    invert: bool,
    enabled: bool,
}

impl std::fmt::Debug for ConditionGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionGroup")
            .field("conditions", &self.conditions.len())
            .field("policy", &self.policy)
            .field("invert", &self.invert)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl ConditionGroup {
    pub fn new(policy: ConditionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self::new(ConditionPolicy::AllTrue)
    }

    pub fn any() -> Self {
        Self::new(ConditionPolicy::AnyTrue)
    }

    pub fn with(mut self, condition: impl Condition + 'static) -> Self {
        self.push(condition);
        self
    }

    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    pub fn push(&mut self, condition: impl Condition + 'static) {
        self.conditions.push(Box::new(condition));
    }

    pub fn policy(&self) -> ConditionPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ConditionPolicy) {
        self.policy = policy;
    }

    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    pub fn set_invert(&mut self, invert: bool) {
        self.invert = invert;
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self, owner: &Owner) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        for condition in &mut self.conditions {
            condition.on_enable(owner);
        }
    }

    pub fn disable(&mut self, owner: &Owner) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        for condition in &mut self.conditions {
            condition.on_disable(owner);
        }
    }

    /// An empty group is always `true`, regardless of `invert`.
    pub fn evaluate(&mut self, owner: &Owner) -> bool {
        if self.conditions.is_empty() {
            return true;
        }

        let outcome = match self.policy {
            ConditionPolicy::AllTrue => self
                .conditions
                .iter_mut()
                .all(|condition| condition.evaluate(owner)),
            ConditionPolicy::AnyTrue => self
                .conditions
                .iter_mut()
                .any(|condition| condition.evaluate(owner)),
        };

        outcome != self.invert
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use rstest::rstest;

    use super::*;

    fn constant(value: bool) -> FnCondition<impl FnMut(&Owner) -> bool> {
        FnCondition::new(move |_: &Owner| value)
    }

    fn group(policy: ConditionPolicy, values: &[bool], invert: bool) -> ConditionGroup {
        let mut group = ConditionGroup::new(policy);
        group.set_invert(invert);
        for value in values {
            group.push(constant(*value));
        }
        group
    }

    #[rstest]
    #[case::all_mixed(ConditionPolicy::AllTrue, &[true, false], false, false)]
    #[case::all_true(ConditionPolicy::AllTrue, &[true, true], false, true)]
    #[case::any_mixed(ConditionPolicy::AnyTrue, &[false, true], false, true)]
    #[case::any_false(ConditionPolicy::AnyTrue, &[false, false], false, false)]
    #[case::all_inverted(ConditionPolicy::AllTrue, &[true, false], true, true)]
    #[case::any_inverted(ConditionPolicy::AnyTrue, &[false, true], true, false)]
    #[case::empty_all(ConditionPolicy::AllTrue, &[], false, true)]
    #[case::empty_any_inverted(ConditionPolicy::AnyTrue, &[], true, true)]
    fn policies(
        #[case] policy: ConditionPolicy,
        #[case] values: &[bool],
        #[case] invert: bool,
        #[case] expected: bool,
    ) {
        let owner = Owner::new("test");
        assert_eq!(group(policy, values, invert).evaluate(&owner), expected);
    }

    #[test]
    fn evaluation_short_circuits() {
        let owner = Owner::new("test");
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let mut group = ConditionGroup::all()
            .with(constant(false))
            .with(FnCondition::new(move |_: &Owner| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }));

        assert!(!group.evaluate(&owner));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    struct Window {
        enabled: Arc<AtomicUsize>,
    }

    impl Condition for Window {
        fn on_enable(&mut self, _owner: &Owner) {
            self.enabled.fetch_add(1, Ordering::SeqCst);
        }

        fn on_disable(&mut self, _owner: &Owner) {
            self.enabled.fetch_sub(1, Ordering::SeqCst);
        }

        fn evaluate(&mut self, _owner: &Owner) -> bool {
            self.enabled.load(Ordering::SeqCst) > 0
        }
    }

    #[test]
    fn enable_and_disable_are_idempotent() {
        let owner = Owner::new("test");
        let enabled = Arc::new(AtomicUsize::new(0));
        let mut group = ConditionGroup::all().with(Window {
            enabled: enabled.clone(),
        });

        group.enable(&owner);
        group.enable(&owner);
        assert_eq!(enabled.load(Ordering::SeqCst), 1);
        assert!(group.evaluate(&owner));

        group.disable(&owner);
        group.disable(&owner);
        assert_eq!(enabled.load(Ordering::SeqCst), 0);
        assert!(!group.evaluate(&owner));
    }
}
