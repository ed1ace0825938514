//! Host-side pump driving one behaviour per owner.

use crate::{
    basic_types::{ActionResult, ExecutionStatus},
    behaviour::Behaviour,
    error::BehaviourError,
    owner::Owner,
};

/// What the runner does once its behaviour finished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RepeatMode {
    /// Keep the first result.
    #[default]
    Once,
    /// Restart after every result.
    Forever,
    /// Restart after failures.
    UntilSuccess,
    /// Restart after successes.
    UntilFailure,
}

impl RepeatMode {
    fn repeats_after(self, result: ActionResult) -> bool {
        match self {
            RepeatMode::Once => false,
            RepeatMode::Forever => true,
            RepeatMode::UntilSuccess => result == ActionResult::Failure,
            RepeatMode::UntilFailure => result == ActionResult::Success,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RunnerConfig {
    pub repeat: RepeatMode,
    /// Whether a runner stopped with [`BehaviourRunner::stop`] starts its
    /// behaviour again on the next tick.
    pub restart_on_stop: bool,
}

/// Initializes a behaviour for an owner and ticks it once per frame,
/// restarting it according to [`RepeatMode`].
///
/// A restarted behaviour re-enters its entry on the following tick.
#[derive(Debug)]
pub struct BehaviourRunner<B> {
    behaviour: B,
    owner: Owner,
    config: RunnerConfig,
    frames: u64,
    runs: u32,
    last: Option<ExecutionStatus>,
    done: bool,
    halted: bool,
}

impl<B: Behaviour> BehaviourRunner<B> {
    pub fn new(mut behaviour: B, owner: Owner, config: RunnerConfig) -> Result<Self, BehaviourError> {
        behaviour.initialize(&owner)?;

        Ok(Self {
            behaviour,
            owner,
            config,
            frames: 0,
            runs: 0,
            last: None,
            done: false,
            halted: false,
        })
    }

    pub fn behaviour(&self) -> &B {
        &self.behaviour
    }

    pub fn behaviour_mut(&mut self) -> &mut B {
        &mut self.behaviour
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Completed runs of the behaviour.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn last_status(&self) -> Option<ExecutionStatus> {
        self.last
    }

    /// Whether the repeat policy is exhausted.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Ticks the behaviour once. A done or halted runner reports its last
    /// status without ticking.
    pub fn tick(&mut self) -> ExecutionStatus {
        if self.done || self.halted {
            return self.last.unwrap_or(ExecutionStatus::Failure);
        }

        self.frames += 1;
        let status = self.behaviour.tick();
        self.last = Some(status);

        if let Some(result) = status.result() {
            self.runs += 1;
            if self.config.repeat.repeats_after(result) {
                log::debug!(
                    "runner '{}': '{}' finished run {} with {result}, restarting",
                    self.owner.name(),
                    self.behaviour.name(),
                    self.runs
                );
                self.behaviour.stop();
            } else {
                log::debug!(
                    "runner '{}': '{}' done with {result}",
                    self.owner.name(),
                    self.behaviour.name()
                );
                self.done = true;
            }
        }

        status
    }

    /// Ticks until the runner is done or `frames` ticks were made.
    pub fn run_frames(&mut self, frames: u64) -> ExecutionStatus {
        let mut status = self.last.unwrap_or(ExecutionStatus::Running);
        for _ in 0..frames {
            if self.done || self.halted {
                break;
            }
            status = self.tick();
        }
        status
    }

    /// Stops the behaviour. Unless `restart_on_stop` is set, the runner
    /// stays halted until [`BehaviourRunner::resume`].
    pub fn stop(&mut self) {
        self.behaviour.stop();
        self.done = false;
        self.halted = !self.config.restart_on_stop;
        log::debug!(
            "runner '{}': stopped '{}'",
            self.owner.name(),
            self.behaviour.name()
        );
    }

    pub fn resume(&mut self) {
        self.halted = false;
    }
}
