use crate::{basic_types::ExecutionStatus, nodes::Action, tree::ActionContext};

/// Stays running for a number of ticks, then succeeds.
#[derive(Clone, Copy, Debug)]
pub struct Wait {
    frames: u32,
    remaining: u32,
}

impl Wait {
    pub fn frames(frames: u32) -> Self {
        Self {
            frames,
            remaining: frames,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Action for Wait {
    fn on_enter(&mut self, ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        self.remaining = self.frames;
        if self.remaining == 0 {
            return ExecutionStatus::Success;
        }

        ctx.enable_ticking();
        ExecutionStatus::Running
    }

    fn on_tick(&mut self, _ctx: &mut ActionContext<'_>) -> ExecutionStatus {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Running
        }
    }

    fn on_reset(&mut self) {
        self.remaining = self.frames;
    }
}
