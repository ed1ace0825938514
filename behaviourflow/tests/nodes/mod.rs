#![allow(dead_code)]

use std::sync::Arc;

use behaviourflow::prelude::*;
use parking_lot::Mutex;

/// Shared record of lifecycle calls, in call order.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == entry)
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }
}

type Hook = Box<dyn FnMut(&mut ActionContext<'_>)>;

/// Scriptable action that records every lifecycle call as `name.hook`.
pub struct Probe {
    name: String,
    log: CallLog,
    enter: ExecutionStatus,
    ticks: Vec<ExecutionStatus>,
    tick_count: usize,
    traversal: ExecutionStatus,
    register: bool,
    enter_children: bool,
    tick_hook: Option<Hook>,
}

impl Probe {
    /// Running on enter, registered for ticking, running on every tick.
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_owned(),
            log: log.clone(),
            enter: ExecutionStatus::Running,
            ticks: Vec::new(),
            tick_count: 0,
            traversal: ExecutionStatus::Success,
            register: true,
            enter_children: false,
            tick_hook: None,
        }
    }

    pub fn enters(mut self, status: ExecutionStatus) -> Self {
        self.enter = status;
        self
    }

    /// Statuses returned by successive ticks; the last one repeats.
    pub fn ticks(mut self, script: impl IntoIterator<Item = ExecutionStatus>) -> Self {
        self.ticks = script.into_iter().collect();
        self
    }

    pub fn traversal(mut self, status: ExecutionStatus) -> Self {
        self.traversal = status;
        self
    }

    /// Running on enter without registering for ticking.
    pub fn passive(mut self) -> Self {
        self.register = false;
        self
    }

    /// Enters every child on enter, like a parallel composite.
    pub fn enter_children(mut self) -> Self {
        self.enter_children = true;
        self.register = false;
        self
    }

    pub fn on_tick(mut self, hook: impl FnMut(&mut ActionContext<'_>) + 'static) -> Self {
        self.tick_hook = Some(Box::new(hook));
        self
    }

    fn record(&self, hook: &str) {
        self.log.push(format!("{}.{hook}", self.name));
    }
}

impl Action for Probe {
    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        self.record("enter");
        self.tick_count = 0;

        if self.enter_children {
            for child in ctx.children().to_vec() {
                ctx.enter(child);
            }
        }
        if self.enter == ExecutionStatus::Running && self.register {
            ctx.enable_ticking();
        }
        self.enter
    }

    fn on_tick(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        self.record("tick");
        if let Some(hook) = self.tick_hook.as_mut() {
            hook(ctx);
        }

        let status = self
            .ticks
            .get(self.tick_count)
            .or(self.ticks.last())
            .copied()
            .unwrap_or(ExecutionStatus::Running);
        self.tick_count += 1;
        status
    }

    fn on_traversal(&mut self, _ctx: &mut ActionContext<'_>, _child: NodeId) -> ExecutionStatus {
        self.record("traversal");
        self.traversal
    }

    fn on_interrupt(&mut self, _ctx: &mut ActionContext<'_>) {
        self.record("interrupt");
    }

    fn on_result(&mut self, _ctx: &mut ActionContext<'_>, result: ActionResult) {
        self.record(&format!("result:{result}"));
    }

    fn on_exit(&mut self, _ctx: &mut ActionContext<'_>) {
        self.record("exit");
    }

    fn on_reset(&mut self) {
        self.record("reset");
    }
}

/// Adds one to the integer blackboard variable `name` and succeeds.
pub struct Increment(pub &'static str);

impl Action for Increment {
    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        let blackboard = ctx.blackboard();
        let current = blackboard.get_by_name::<i64>(self.0).unwrap_or(0);
        match blackboard.set_by_name(self.0, current + 1) {
            Ok(()) => ExecutionStatus::Success,
            Err(_) => ExecutionStatus::Failure,
        }
    }
}

pub fn owner() -> Owner {
    let _ = pretty_env_logger::try_init();
    Owner::new("test-owner")
}

/// Tree with a single leaf entry.
pub fn leaf_tree(name: &str, action: impl Action + 'static) -> BehaviourTree {
    let mut tree = BehaviourTree::new(name);
    tree.add_action(name, action);
    tree
}
