use crate::{
    basic_types::{ActionStatus, ExecutionStatus, NodeId},
    blackboard::{Blackboard, BlackboardRef},
    owner::Owner,
    value::{FromValue, Value},
};

use super::BehaviourTree;

/// Handed to an [`Action`](crate::nodes::Action) hook. Gives access to the
/// action's place in the tree and to the structural operations composites
/// need to drive their children.
pub struct ActionContext<'a> {
    pub(super) tree: &'a mut BehaviourTree,
    pub(super) owner: Owner,
    pub(super) node: NodeId,
}

impl ActionContext<'_> {
    pub fn id(&self) -> NodeId {
        self.node
    }

    pub fn name(&self) -> &str {
        &self.tree.nodes[self.node.0].name
    }

    pub fn tree_name(&self) -> &str {
        &self.tree.name
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn blackboard(&self) -> &Blackboard {
        self.owner.blackboard()
    }

    pub fn status(&self) -> ActionStatus {
        self.tree.nodes[self.node.0].status
    }

    pub fn index(&self) -> usize {
        self.tree.nodes[self.node.0].index
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.tree.nodes[self.node.0].parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.tree.nodes[self.node.0].children
    }

    pub fn child(&self, position: usize) -> Option<NodeId> {
        self.children().get(position).copied()
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Position of `child` among this action's children.
    pub fn position_of(&self, child: NodeId) -> Option<usize> {
        self.children().iter().position(|id| *id == child)
    }

    pub fn status_of(&self, id: NodeId) -> ActionStatus {
        self.tree.status_of(id)
    }

    fn check_child(&self, child: NodeId, operation: &str) -> bool {
        if self.children().contains(&child) {
            return true;
        }

        log::error!(
            "behaviour tree '{}': '{}' cannot {operation} {child}, it is not a child",
            self.tree.name,
            self.name()
        );
        false
    }

    /// Enters one of this action's children. A child that finishes on enter
    /// has already exited when this returns.
    pub fn enter(&mut self, child: NodeId) -> ExecutionStatus {
        if !self.check_child(child, "enter") {
            return ExecutionStatus::Failure;
        }

        self.tree
            .enter_sequence(child)
            .unwrap_or_else(|| self.tree.current(child))
    }

    /// Interrupts a running child and everything running below it.
    pub fn interrupt(&mut self, child: NodeId) {
        if self.check_child(child, "interrupt") {
            self.tree.interrupt(child);
        }
    }

    /// Interrupts every running child.
    pub fn interrupt_children(&mut self) {
        let children = self.children().to_vec();
        for child in children {
            self.tree.interrupt(child);
        }
    }

    /// Returns a child subtree to `Inactive`.
    pub fn reset(&mut self, child: NodeId) {
        if self.check_child(child, "reset") {
            self.tree.reset(child);
        }
    }

    /// Registers this action for ticking.
    ///
    /// # Panics
    /// In debug builds, if the action is already registered.
    pub fn enable_ticking(&mut self) {
        self.tree.enable_ticking(self.node);
    }

    pub fn disable_ticking(&mut self) {
        self.tree.disable_ticking(self.node);
    }

    pub fn is_ticking(&self) -> bool {
        self.tree.nodes[self.node.0].is_ticking
    }

    /// Drops the ticking registration of any action of this tree.
    pub fn disable_ticking_of(&mut self, id: NodeId) {
        if self.tree.contains(id) {
            self.tree.disable_ticking(id);
        }
    }
}

/// Handed to [`Action::on_initialize`](crate::nodes::Action::on_initialize).
pub struct InitContext<'a> {
    pub(super) owner: &'a Owner,
    pub(super) tree: &'a str,
    pub(super) action: &'a str,
}

impl InitContext<'_> {
    pub fn owner(&self) -> &Owner {
        self.owner
    }

    pub fn blackboard(&self) -> &Blackboard {
        self.owner.blackboard()
    }

    pub fn name(&self) -> &str {
        self.action
    }

    pub fn tree_name(&self) -> &str {
        self.tree
    }

    /// Binds `reference` to the owner's blackboard, warning when the
    /// variable does not exist there.
    pub fn bind<T: FromValue + Into<Value>>(&self, reference: &mut BlackboardRef<T>) -> bool {
        let bound = reference.bind(self.owner.blackboard());
        if !bound {
            log::warn!(
                "behaviour tree '{}': '{}' references unknown variable '{}'",
                self.tree,
                self.action,
                reference.name()
            );
        }
        bound
    }
}
