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

//! Debugger collaborator abstraction.
//!
//! The collector never talks to a debugger directly. It drives an implementation
//! of [`Debugger`], which supplies process control (breakpoints, run, continue),
//! expression evaluation in the paused inferior, and a queue of notifications.
//!
//! # Backends
//!
//! - [`GdbMi`] - a `gdb --interpreter=mi2` child process
//! - [`ReplayDebugger`] - a scripted sequence of recorded stops
//!
//! All calls are blocking. [`Debugger::resume`] and [`Debugger::cont`] return once
//! the inferior is paused again or has exited; what happened is reported through
//! [`Debugger::take_events`].

mod gdb;
mod replay;

pub use gdb::{mi, GdbConfig, GdbMi};
pub use replay::{ReplayDebugger, ReplayScript};

use auto_impl::auto_impl;
use gdbc_common::{BreakpointLocation, Expression};
use thiserror::Error;

/// A value exactly as the debugger printed it, before any conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::From, derive_more::Display)]
pub struct RawValue(pub String);

impl RawValue {
    /// The raw text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Notifications emitted by a debugger backend while the inferior runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebuggerEvent {
    /// The inferior stopped at a registered breakpoint.
    BreakpointHit {
        /// Debugger-assigned breakpoint number, when known.
        number: Option<u32>,
    },
    /// The inferior stopped because it received a signal.
    SignalReceived {
        /// Signal name, e.g. `SIGSEGV`.
        signal: String,
    },
    /// The inferior stopped for another reason (end of stepping range, ...).
    Stopped {
        /// Reason as reported by the backend.
        reason: String,
    },
    /// The inferior process exited.
    Exited {
        /// Exit code, `None` when it was killed by a signal.
        code: Option<i32>,
    },
    /// Anything else the backend wants to surface.
    Other(String),
}

impl DebuggerEvent {
    /// Whether this event reports the end of the inferior process.
    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Exited { .. })
    }
}

/// Errors raised by a debugger backend.
#[derive(Debug, Error)]
pub enum DebuggerError {
    /// An expression could not be evaluated in the current program state.
    #[error("failed to evaluate `{expression}`: {message}")]
    Evaluation {
        /// The expression as sent to the debugger.
        expression: String,
        /// The debugger's explanation.
        message: String,
    },

    /// A process-control command was rejected.
    #[error("debugger command `{command}` failed: {message}")]
    Command {
        /// The rejected command.
        command: String,
        /// The debugger's explanation.
        message: String,
    },

    /// The debugger produced output that could not be understood.
    #[error("malformed debugger output: {0}")]
    Protocol(String),

    /// The debugger itself went away.
    #[error("the debugger terminated unexpectedly")]
    Terminated,

    /// Communication with the debugger failed.
    #[error("debugger I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Evaluates expressions in the paused inferior.
///
/// Evaluation must be read-only with respect to the inferior's state.
#[auto_impl(&mut, Box)]
pub trait Evaluator {
    /// Evaluate an expression and return its raw textual value.
    fn evaluate(&mut self, expression: &Expression) -> Result<RawValue, DebuggerError>;
}

/// Process control on top of [`Evaluator`].
#[auto_impl(&mut, Box)]
pub trait Debugger: Evaluator {
    /// Register a breakpoint. Must be called before [`Debugger::resume`].
    fn register_breakpoint(&mut self, location: &BreakpointLocation) -> Result<(), DebuggerError>;

    /// Start the inferior and block until it stops or exits.
    fn resume(&mut self) -> Result<(), DebuggerError>;

    /// Continue the paused inferior and block until it stops again or exits.
    fn cont(&mut self) -> Result<(), DebuggerError>;

    /// Drain the notifications received since the last call.
    fn take_events(&mut self) -> Vec<DebuggerEvent>;
}
