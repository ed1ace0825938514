//! Behaviour tree executor.
//!
//! Actions live in an arena owned by the tree and refer to each other through
//! [`NodeId`]s. `initialize` numbers the actions reachable from the entry in
//! pre-order; that index orders the ticking list, so within one frame earlier
//! (shallower, further left) actions always tick before later ones.
//!
//! Only actions that registered through `enable_ticking` are visited by
//! [`BehaviourTree::tick`]. Registrations made while a pass is running are
//! staged and merged once the pass ends; removals take effect immediately and
//! move the pass cursor so no action is skipped or visited twice.

mod context;

pub use context::{ActionContext, InitContext};

use crate::{
    basic_types::{ActionStatus, ExecutionStatus, NodeId},
    behaviour::Behaviour,
    blackboard::{Blackboard, VariableId},
    error::BehaviourError,
    nodes::Action,
    owner::Owner,
    value::Value,
};

struct ActionNode {
    name: String,
    /// Taken out while one of its hooks runs.
    action: Option<Box<dyn Action>>,
    status: ActionStatus,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    index: usize,
    is_ticking: bool,
    breakpoint: bool,
}

pub struct BehaviourTree {
    name: String,
    nodes: Vec<ActionNode>,
    entry: Option<NodeId>,
    status: ActionStatus,
    /// Ordered by ascending pre-order index.
    ticking: Vec<NodeId>,
    pending_ticking: Vec<NodeId>,
    in_traversal: bool,
    /// Position of the next ticking action to visit in the current pass.
    tick_index: usize,
    owner: Option<Owner>,
    defaults: Blackboard,
    breakpoint_hit: Option<NodeId>,
}

impl std::fmt::Debug for BehaviourTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviourTree")
            .field("name", &self.name)
            .field("actions", &self.nodes.len())
            .field("status", &self.status)
            .field("ticking", &self.ticking)
            .finish()
    }
}

impl BehaviourTree {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            entry: None,
            status: ActionStatus::Inactive,
            ticking: Vec::new(),
            pending_ticking: Vec::new(),
            in_traversal: false,
            tick_index: 0,
            owner: None,
            defaults: Blackboard::create(),
            breakpoint_hit: None,
        }
    }

    /// Adds a detached action. The first action added becomes the entry.
    pub fn add_action(&mut self, name: impl Into<String>, action: impl Action + 'static) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ActionNode {
            name: name.into(),
            action: Some(Box::new(action)),
            status: ActionStatus::Inactive,
            parent: None,
            children: Vec::new(),
            index: usize::MAX,
            is_ticking: false,
            breakpoint: false,
        });

        if self.entry.is_none() {
            self.entry = Some(id);
        }

        id
    }

    /// Adds an action as the last child of `parent`.
    ///
    /// # Panics
    /// If `parent` does not belong to this tree.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        action: impl Action + 'static,
    ) -> NodeId {
        assert!(
            parent.0 < self.nodes.len(),
            "action {parent} does not belong to '{}'",
            self.name
        );

        let id = self.add_action(name, action);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn set_entry(&mut self, entry: NodeId) {
        self.entry = Some(entry);
    }

    pub fn clear_entry(&mut self) {
        self.entry = None;
    }

    pub fn set_breakpoint(&mut self, id: NodeId, enabled: bool) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.breakpoint = enabled;
        }
    }

    /// Declares a default blackboard variable, merged into the owner's
    /// blackboard on `initialize` unless the owner already has that name.
    pub fn declare_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) -> VariableId {
        self.defaults.declare(name, value)
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.declare_variable(name, value);
        self
    }

    pub fn entry(&self) -> Option<NodeId> {
        self.entry
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeId)
    }

    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.0).map(|node| node.name.as_str())
    }

    pub fn status_of(&self, id: NodeId) -> ActionStatus {
        self.nodes
            .get(id.0)
            .map(|node| node.status)
            .unwrap_or_default()
    }

    /// Pre-order index assigned by `initialize`.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes
            .get(id.0)
            .map(|node| node.index)
            .filter(|index| *index != usize::MAX)
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Actions reachable from the entry, in pre-order.
    pub fn visit_actions(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = self.entry.filter(|id| self.contains(*id)).into_iter().collect();

        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut visited[id.0], true) {
                continue;
            }
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }

        order
    }

    pub fn is_ticking(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|node| node.is_ticking)
    }

    /// Actions visited by the next pass, in visiting order.
    pub fn ticking_actions(&self) -> &[NodeId] {
        &self.ticking
    }

    /// Registrations staged during the current pass.
    pub fn pending_ticking_actions(&self) -> &[NodeId] {
        &self.pending_ticking
    }

    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    /// Returns and clears the last action whose breakpoint was hit.
    pub fn take_breakpoint(&mut self) -> Option<NodeId> {
        self.breakpoint_hit.take()
    }

    fn number_actions(&mut self, entry: NodeId) -> Result<(), BehaviourError> {
        for node in &mut self.nodes {
            node.parent = None;
            node.index = usize::MAX;
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![(entry, None)];
        let mut index = 0;

        while let Some((id, parent)) = stack.pop() {
            if visited[id.0] {
                let reason = format!("action '{}' is reachable more than once", self.nodes[id.0].name);
                log::error!("behaviour tree '{}': {reason}", self.name);
                return Err(BehaviourError::InvalidGraph {
                    behaviour: self.name.clone(),
                    reason,
                });
            }
            visited[id.0] = true;

            let node = &mut self.nodes[id.0];
            node.parent = parent;
            node.index = index;
            index += 1;

            for &child in node.children.iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        for (slot, node) in self.nodes.iter_mut().enumerate() {
            if !visited[slot] {
                log::warn!(
                    "behaviour tree '{}': action '{}' is not reachable from the entry",
                    self.name,
                    node.name
                );
                node.index = index;
                index += 1;
            }
        }

        Ok(())
    }

    /// Runs one hook of `id` with the action temporarily taken out of the arena.
    fn with_action<R>(
        &mut self,
        id: NodeId,
        hook: impl FnOnce(&mut Box<dyn Action>, &mut ActionContext<'_>) -> R,
    ) -> Option<R> {
        let Some(owner) = self.owner.clone() else {
            log::error!("behaviour tree '{}' was used before initialize", self.name);
            return None;
        };
        let Some(mut action) = self.nodes[id.0].action.take() else {
            log::error!(
                "behaviour tree '{}': action '{}' re-entered its own lifecycle",
                self.name,
                self.nodes[id.0].name
            );
            return None;
        };

        let result = {
            let mut ctx = ActionContext {
                tree: &mut *self,
                owner,
                node: id,
            };
            hook(&mut action, &mut ctx)
        };

        self.nodes[id.0].action = Some(action);
        Some(result)
    }

    /// Stores the status a hook returned. Returns `None` when the action was
    /// concluded (interrupted or reset) from inside that hook.
    fn settle(&mut self, id: NodeId, status: ExecutionStatus) -> Option<ExecutionStatus> {
        let node = &mut self.nodes[id.0];
        if node.status != ActionStatus::Running {
            log::debug!(
                "behaviour tree '{}': action '{}' concluded inside its own callback",
                self.name,
                node.name
            );
            return None;
        }

        node.status = status.into();
        Some(status)
    }

    fn current(&self, id: NodeId) -> ExecutionStatus {
        self.nodes[id.0]
            .status
            .execution()
            .unwrap_or(ExecutionStatus::Failure)
    }

    fn enter(&mut self, id: NodeId) -> Option<ExecutionStatus> {
        let node = &mut self.nodes[id.0];
        if node.breakpoint {
            log::warn!("behaviour tree '{}': breakpoint on '{}'", self.name, node.name);
            self.breakpoint_hit = Some(id);
        }

        let node = &mut self.nodes[id.0];
        log::trace!("behaviour tree '{}': enter '{}'", self.name, node.name);
        node.status = ActionStatus::Running;

        let status = self
            .with_action(id, |action, ctx| action.on_enter(ctx))
            .unwrap_or(ExecutionStatus::Failure);
        self.settle(id, status)
    }

    /// Enters `id`; an action that finishes on enter is concluded right away
    /// and never ticked.
    fn enter_sequence(&mut self, id: NodeId) -> Option<ExecutionStatus> {
        match self.nodes[id.0].status {
            ActionStatus::Running => {
                log::warn!(
                    "behaviour tree '{}': '{}' is already running",
                    self.name,
                    self.nodes[id.0].name
                );
                return Some(ExecutionStatus::Running);
            }
            ActionStatus::Success | ActionStatus::Failure => self.reset(id),
            ActionStatus::Inactive => {}
        }

        let status = self.enter(id)?;
        if status.is_finished() {
            self.result(id);
        }
        Some(status)
    }

    fn tick_action(&mut self, id: NodeId) -> Option<ExecutionStatus> {
        if let Some(result) = self.nodes[id.0].status.result() {
            return Some(result.into());
        }

        log::trace!(
            "behaviour tree '{}': tick '{}'",
            self.name,
            self.nodes[id.0].name
        );
        let status = self
            .with_action(id, |action, ctx| action.on_tick(ctx))
            .unwrap_or(ExecutionStatus::Failure);
        self.settle(id, status)
    }

    fn tick_sequence(&mut self, id: NodeId) -> Option<ExecutionStatus> {
        let status = self.tick_action(id)?;
        if status.is_finished() {
            self.result(id);
        }
        Some(status)
    }

    fn traversal_sequence(&mut self, parent: NodeId, child: NodeId) -> Option<ExecutionStatus> {
        log::trace!(
            "behaviour tree '{}': '{}' finished below '{}'",
            self.name,
            self.nodes[child.0].name,
            self.nodes[parent.0].name
        );
        let status = self
            .with_action(parent, |action, ctx| action.on_traversal(ctx, child))
            .unwrap_or(ExecutionStatus::Failure);
        let status = self.settle(parent, status)?;
        if status.is_finished() {
            self.result(parent);
        }
        Some(status)
    }

    fn result(&mut self, id: NodeId) {
        let Some(result) = self.nodes[id.0].status.result() else {
            return;
        };

        self.with_action(id, |action, ctx| action.on_result(ctx, result));
        self.exit(id);
    }

    fn exit(&mut self, id: NodeId) {
        log::trace!(
            "behaviour tree '{}': exit '{}' with {}",
            self.name,
            self.nodes[id.0].name,
            self.nodes[id.0].status
        );
        self.with_action(id, |action, ctx| action.on_exit(ctx));
        if self.nodes[id.0].is_ticking {
            self.disable_ticking(id);
        }
    }

    /// Forces a running action and its running descendants to `Failure`.
    /// Children exit before their parent. Descendants left running below a
    /// finished action are interrupted too.
    fn interrupt(&mut self, id: NodeId) {
        let children = self.nodes[id.0].children.clone();
        for child in children {
            self.interrupt(child);
        }

        if self.nodes[id.0].status != ActionStatus::Running {
            return;
        }

        log::trace!(
            "behaviour tree '{}': interrupt '{}'",
            self.name,
            self.nodes[id.0].name
        );
        self.nodes[id.0].status = ActionStatus::Failure;
        self.with_action(id, |action, ctx| action.on_interrupt(ctx));
        self.exit(id);
    }

    fn reset(&mut self, id: NodeId) {
        let children = self.nodes[id.0].children.clone();
        for child in children {
            self.reset(child);
        }

        if self.nodes[id.0].is_ticking {
            self.disable_ticking(id);
        }

        let node = &mut self.nodes[id.0];
        if let Some(action) = node.action.as_mut() {
            action.on_reset();
        }
        node.status = ActionStatus::Inactive;
    }

    fn enable_ticking(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        debug_assert!(
            !node.is_ticking,
            "action '{}' is already ticking",
            node.name
        );
        if node.is_ticking {
            log::error!(
                "behaviour tree '{}': action '{}' is already ticking",
                self.name,
                node.name
            );
            return;
        }
        node.is_ticking = true;

        if self.in_traversal {
            log::trace!(
                "behaviour tree '{}': staging '{}' for ticking",
                self.name,
                self.nodes[id.0].name
            );
            self.pending_ticking.push(id);
        } else {
            self.insert_ticking(id);
        }
    }

    fn disable_ticking(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        if !node.is_ticking {
            return;
        }
        node.is_ticking = false;

        if let Some(position) = self.pending_ticking.iter().position(|other| *other == id) {
            self.pending_ticking.remove(position);
            return;
        }

        if let Some(position) = self.ticking.iter().position(|other| *other == id) {
            self.ticking.remove(position);
            if self.in_traversal && position < self.tick_index {
                self.tick_index -= 1;
            }
        }
    }

    fn insert_ticking(&mut self, id: NodeId) {
        let index = self.nodes[id.0].index;
        let position = self
            .ticking
            .iter()
            .position(|other| self.nodes[other.0].index > index)
            .unwrap_or(self.ticking.len());

        log::debug!(
            "behaviour tree '{}': '{}' ticks at position {position}",
            self.name,
            self.nodes[id.0].name
        );
        self.ticking.insert(position, id);
    }

    fn flush_pending(&mut self) {
        for id in std::mem::take(&mut self.pending_ticking) {
            self.insert_ticking(id);
        }
    }

    /// Climbs from a finished action while each ancestor finishes as well.
    /// Returns the tree's final status once the entry itself finished.
    fn propagate(&mut self, from: NodeId, status: ExecutionStatus) -> Option<ExecutionStatus> {
        let mut child = from;
        let mut status = status;

        loop {
            let Some(parent) = self.nodes[child.0].parent else {
                return Some(status);
            };
            if self.nodes[parent.0].status != ActionStatus::Running {
                return None;
            }

            status = self.traversal_sequence(parent, child)?;
            if !status.is_finished() {
                return None;
            }
            child = parent;
        }
    }
}

impl Behaviour for BehaviourTree {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, owner: &Owner) -> Result<(), BehaviourError> {
        if self.status != ActionStatus::Inactive {
            self.stop();
        }
        self.owner = None;

        let Some(entry) = self.entry else {
            log::error!("behaviour tree '{}' has no entry action", self.name);
            return Err(BehaviourError::MissingEntry(self.name.clone()));
        };
        if entry.0 >= self.nodes.len() {
            log::error!("behaviour tree '{}' has an invalid entry {entry}", self.name);
            return Err(BehaviourError::MissingEntry(self.name.clone()));
        }

        self.number_actions(entry)?;

        let merged = owner.blackboard().merge(&self.defaults);
        if merged > 0 {
            log::debug!(
                "behaviour tree '{}': merged {merged} variable(s) into '{}'",
                self.name,
                owner.name()
            );
        }

        for node in &mut self.nodes {
            if let Some(action) = node.action.as_mut() {
                let ctx = InitContext {
                    owner,
                    tree: &self.name,
                    action: &node.name,
                };
                action.on_initialize(&ctx);
            }
        }

        self.owner = Some(owner.clone());
        log::debug!(
            "behaviour tree '{}' initialized for '{}' with {} action(s)",
            self.name,
            owner.name(),
            self.nodes.len()
        );
        Ok(())
    }

    fn start(&mut self) -> ExecutionStatus {
        if self.owner.is_none() {
            log::error!("behaviour tree '{}' cannot start before initialize", self.name);
            return ExecutionStatus::Failure;
        }
        if let Some(status) = self.status.execution() {
            return status;
        }
        let Some(entry) = self.entry else {
            return ExecutionStatus::Failure;
        };

        log::debug!("behaviour tree '{}': start", self.name);
        self.in_traversal = true;
        let status = self
            .enter_sequence(entry)
            .unwrap_or_else(|| self.current(entry));
        self.in_traversal = false;
        self.flush_pending();

        self.status = status.into();
        status
    }

    fn tick(&mut self) -> ExecutionStatus {
        if self.owner.is_none() {
            log::error!("behaviour tree '{}' cannot tick before initialize", self.name);
            return ExecutionStatus::Failure;
        }
        match self.status {
            ActionStatus::Inactive => return self.start(),
            ActionStatus::Success => return ExecutionStatus::Success,
            ActionStatus::Failure => return ExecutionStatus::Failure,
            ActionStatus::Running => {}
        }

        self.in_traversal = true;
        self.tick_index = 0;

        while self.tick_index < self.ticking.len() {
            let id = self.ticking[self.tick_index];
            self.tick_index += 1;

            if self.nodes[id.0].status != ActionStatus::Running {
                log::warn!(
                    "behaviour tree '{}': dropping stale ticking action '{}'",
                    self.name,
                    self.nodes[id.0].name
                );
                self.disable_ticking(id);
                continue;
            }

            let Some(status) = self.tick_sequence(id) else {
                continue;
            };
            if !status.is_finished() {
                continue;
            }

            if let Some(done) = self.propagate(id, status) {
                self.in_traversal = false;
                self.status = done.into();
                log::debug!("behaviour tree '{}' finished with {done}", self.name);
                return done;
            }
        }

        self.flush_pending();
        self.in_traversal = false;
        ExecutionStatus::Running
    }

    fn stop(&mut self) {
        if self.owner.is_some() {
            if let Some(entry) = self.entry {
                self.interrupt(entry);
                self.reset(entry);
            }
        }

        self.ticking.clear();
        self.pending_ticking.clear();
        for node in &mut self.nodes {
            node.is_ticking = false;
        }
        self.in_traversal = false;
        self.tick_index = 0;

        if self.status != ActionStatus::Inactive {
            log::debug!("behaviour tree '{}': stop", self.name);
        }
        self.status = ActionStatus::Inactive;
    }

    fn status(&self) -> ActionStatus {
        self.status
    }

    fn is_initialized(&self) -> bool {
        self.owner.is_some()
    }
}
