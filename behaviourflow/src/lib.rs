//! Frame-driven behaviour trees and hierarchical state machines.
//!
//! A host owns one top-level [`Behaviour`] per game object and calls
//! [`Behaviour::tick`] once per frame, directly or through a
//! [`BehaviourRunner`](runner::BehaviourRunner). Trees and state machines
//! nest each other through [`NestedBehaviour`](nodes::NestedBehaviour) actions
//! and state factories.
//!
//! ```
//! use behaviourflow::prelude::*;
//!
//! let mut tree = BehaviourTree::new("patrol");
//! let root = tree.add_action("root", Sequence);
//! tree.add_child(root, "walk", Wait::frames(2));
//! tree.add_child(root, "arrived", SetVariable::new("arrived", true));
//!
//! let owner = Owner::new("guard");
//! tree.initialize(&owner).unwrap();
//!
//! assert_eq!(tree.start(), ExecutionStatus::Running);
//! assert_eq!(tree.tick(), ExecutionStatus::Running);
//! assert_eq!(tree.tick(), ExecutionStatus::Success);
//! assert_eq!(owner.blackboard().get_by_name::<bool>("arrived").unwrap(), true);
//! ```

pub mod basic_types;
pub mod behaviour;
pub mod blackboard;
pub mod conditions;
pub mod error;
pub mod event;
pub mod fsm;
pub mod nodes;
pub mod owner;
pub mod runner;
pub mod tree;
pub mod value;

pub use basic_types::{ActionResult, ActionStatus, ExecutionStatus, NodeId, StateId};
pub use behaviour::Behaviour;
pub use blackboard::{Blackboard, BlackboardRef, VariableId};
pub use error::{BehaviourError, BlackboardError, EventError};
pub use owner::Owner;

pub mod prelude {
    pub use crate::{
        basic_types::{ActionResult, ActionStatus, ExecutionStatus, NodeId, StateId},
        behaviour::Behaviour,
        blackboard::{Blackboard, BlackboardRef, VariableId},
        conditions::{
            Condition, ConditionGroup, ConditionPolicy, EventCondition, ExpressionCondition,
            FnCondition,
        },
        error::{BehaviourError, BlackboardError, EventError},
        fsm::{StateMachine, StateTransition, TransitionMode},
        nodes::{
            Action, AlwaysFailure, AlwaysSuccess, CheckCondition, Inverter, NestedBehaviour,
            Parallel, ParallelPolicy, Repeat, Selector, Sequence, SetVariable, Targeted,
            TargetedAction, Wait,
        },
        owner::{Component, Owner},
        runner::{BehaviourRunner, RepeatMode, RunnerConfig},
        tree::{ActionContext, BehaviourTree, InitContext},
        value::{BlackboardValue, Value},
    };
}
