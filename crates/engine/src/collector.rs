// GDBC - GDB Variable Collector
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! The breakpoint-synchronous sampling loop.
//!
//! A [`Collector`] owns the variable registry and drives a [`Debugger`]:
//!
//! 1. **Arm**: register every breakpoint location
//! 2. **Start**: run the inferior (`Idle` → `Running`)
//! 3. **Loop**: at every stop, sample all variables, then continue
//! 4. **Stop**: a process-exit notification ends the loop (`Running` → `Stopped`)
//!
//! Process exit is the only way the loop ends normally; there is no iteration
//! limit, timeout or cancellation. Any error aborts the run and leaves the
//! collector `Stopped`.

use gdbc_common::{BreakpointLocation, CollectionPlan};
use tracing::{debug, info, warn};

use crate::{CollectError, Debugger, DebuggerError, DebuggerEvent, VariableRegistry};

/// Lifecycle of a [`Collector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CollectorState {
    /// Not started yet.
    #[display("idle")]
    Idle,
    /// The inferior has been started and has not exited.
    #[display("running")]
    Running,
    /// The inferior exited or the run was aborted.
    #[display("stopped")]
    Stopped,
}

/// Samples a [`VariableRegistry`] at every breakpoint stop until the inferior exits.
#[derive(Debug)]
pub struct Collector<D> {
    debugger: D,
    registry: VariableRegistry,
    breakpoints: Vec<BreakpointLocation>,
    armed: bool,
    state: CollectorState,
    rounds: usize,
}

impl<D: Debugger> Collector<D> {
    /// Creates an idle collector.
    pub fn new(debugger: D, registry: VariableRegistry) -> Self {
        Self {
            debugger,
            registry,
            breakpoints: Vec::new(),
            armed: false,
            state: CollectorState::Idle,
            rounds: 0,
        }
    }

    /// Creates an idle collector for a plan, building its registry.
    pub fn from_plan(debugger: D, plan: &CollectionPlan) -> Result<Self, CollectError> {
        let registry = VariableRegistry::from_declarations(&plan.variables)?;
        Ok(Self::new(debugger, registry).with_breakpoint(plan.breakpoint.clone()))
    }

    /// Adds a breakpoint location.
    pub fn with_breakpoint(mut self, location: impl Into<BreakpointLocation>) -> Self {
        self.breakpoints.push(location.into());
        self
    }

    /// Current state.
    pub fn state(&self) -> CollectorState {
        self.state
    }

    /// Completed sampling rounds.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// The variables and their samples so far.
    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// The debugger collaborator.
    pub fn debugger(&self) -> &D {
        &self.debugger
    }

    /// Gives back the registry, discarding the debugger.
    pub fn into_registry(self) -> VariableRegistry {
        self.registry
    }

    fn expect_state(&self, expected: CollectorState) -> Result<(), CollectError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CollectError::InvalidState { expected, actual: self.state })
        }
    }

    /// Registers every breakpoint location with the debugger.
    pub fn arm(&mut self) -> Result<(), CollectError> {
        self.expect_state(CollectorState::Idle)?;
        if self.breakpoints.is_empty() {
            return Err(CollectError::MissingBreakpoint);
        }

        for location in &self.breakpoints {
            self.debugger.register_breakpoint(location)?;
            debug!(%location, "Breakpoint set");
        }
        self.armed = true;
        Ok(())
    }

    /// Starts the inferior and blocks until it first stops or exits.
    pub fn start(&mut self) -> Result<(), CollectError> {
        self.expect_state(CollectorState::Idle)?;
        if self.registry.is_empty() {
            return Err(CollectError::EmptyRegistry);
        }
        if !self.armed {
            return Err(CollectError::MissingBreakpoint);
        }

        info!(variables = self.registry.len(), "Starting inferior");
        self.state = CollectorState::Running;
        let resumed = self.debugger.resume();
        self.settle(resumed)
    }

    /// Samples and continues until the inferior exits.
    ///
    /// Requires a started collector whose inferior has not exited yet. Returns
    /// the total number of sampling rounds.
    pub fn run(&mut self) -> Result<usize, CollectError> {
        self.expect_state(CollectorState::Running)?;

        while self.state == CollectorState::Running {
            if let Err(err) = self.registry.sample_all(&mut self.debugger) {
                self.state = CollectorState::Stopped;
                return Err(err);
            }
            self.rounds += 1;
            debug!(round = self.rounds, "Sampled all variables");

            let continued = self.debugger.cont();
            self.settle(continued)?;
        }

        info!(rounds = self.rounds, "Inferior exited");
        Ok(self.rounds)
    }

    /// Arms, starts and runs to completion, then logs every variable's data.
    pub fn collect(&mut self) -> Result<usize, CollectError> {
        self.arm()?;
        self.start()?;
        let rounds = match self.state {
            CollectorState::Running => self.run()?,
            _ => {
                info!("Inferior exited before reaching a breakpoint");
                self.rounds
            }
        };

        for variable in &self.registry {
            info!(samples = variable.len(), "{variable}");
        }
        Ok(rounds)
    }

    /// Handles the outcome of a resume/continue: propagate failures, and stop
    /// once an exit notification shows up. Other events are ignored.
    fn settle(&mut self, outcome: Result<(), DebuggerError>) -> Result<(), CollectError> {
        if let Err(err) = outcome {
            self.state = CollectorState::Stopped;
            return Err(err.into());
        }

        for event in self.debugger.take_events() {
            if event.is_exit() {
                debug!(?event, "Exit notification");
                self.state = CollectorState::Stopped;
            } else if let DebuggerEvent::SignalReceived { .. } | DebuggerEvent::Stopped { .. } = event {
                warn!(?event, "Inferior stopped for a reason other than a breakpoint");
            } else {
                debug!(?event, "Ignoring debugger event");
            }
        }
        Ok(())
    }
}
