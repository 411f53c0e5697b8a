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

//! Scripted debugger backend.
//!
//! Replays a recorded sequence of breakpoint stops. Each stop maps canonical
//! expressions (`i`, `res[1]`) to the raw text the debugger printed for them.
//! After the last stop the next continue reports a process exit.

use std::collections::BTreeMap;

use gdbc_common::{BreakpointLocation, Expression};
use serde::{Deserialize, Serialize};

use crate::{Debugger, DebuggerError, DebuggerEvent, Evaluator, RawValue};

/// Recorded stops, loadable from JSON:
///
/// ```json
/// { "stops": [ { "i": "0", "res[1]": "10", "res[2]": "20" }, { "i": "1" } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayScript {
    /// One map of expression to raw value per breakpoint stop.
    pub stops: Vec<BTreeMap<String, String>>,
}

impl ReplayScript {
    /// Parse a script from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Append a stop.
    pub fn with_stop<K, V>(mut self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.stops.push(values.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inferior {
    NotStarted,
    Paused(usize),
    Exited,
}

/// A [`Debugger`] that replays a [`ReplayScript`].
#[derive(Debug, Clone)]
pub struct ReplayDebugger {
    script: ReplayScript,
    inferior: Inferior,
    breakpoints: Vec<BreakpointLocation>,
    extra_events: Vec<DebuggerEvent>,
    events: Vec<DebuggerEvent>,
    evaluations: usize,
}

impl ReplayDebugger {
    /// Create a debugger replaying the given script.
    pub fn new(script: ReplayScript) -> Self {
        Self {
            script,
            inferior: Inferior::NotStarted,
            breakpoints: Vec::new(),
            extra_events: Vec::new(),
            events: Vec::new(),
            evaluations: 0,
        }
    }

    /// Emit these events in addition to every stop or exit notification.
    pub fn with_extra_events(mut self, events: impl IntoIterator<Item = DebuggerEvent>) -> Self {
        self.extra_events = events.into_iter().collect();
        self
    }

    /// Breakpoints registered so far.
    pub fn breakpoints(&self) -> &[BreakpointLocation] {
        &self.breakpoints
    }

    /// Number of evaluation requests served, failed ones included.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Whether the replayed inferior has exited.
    pub fn has_exited(&self) -> bool {
        self.inferior == Inferior::Exited
    }

    fn advance(&mut self, next: usize) {
        // Without a breakpoint the inferior never pauses.
        let event = if next < self.script.stops.len() && !self.breakpoints.is_empty() {
            self.inferior = Inferior::Paused(next);
            DebuggerEvent::BreakpointHit { number: Some(1) }
        } else {
            self.inferior = Inferior::Exited;
            DebuggerEvent::Exited { code: Some(0) }
        };
        self.events.extend(self.extra_events.iter().cloned());
        self.events.push(event);
    }
}

impl Evaluator for ReplayDebugger {
    fn evaluate(&mut self, expression: &Expression) -> Result<RawValue, DebuggerError> {
        self.evaluations += 1;
        let key = expression.to_string();

        let Inferior::Paused(stop) = self.inferior else {
            return Err(DebuggerError::Evaluation {
                expression: key,
                message: "No frame selected.".to_string(),
            });
        };

        let symbol = match expression {
            Expression::Name(name) | Expression::Element { name, .. } => name,
        };
        self.script.stops[stop].get(&key).map(|raw| RawValue::from(raw.as_str())).ok_or_else(
            || DebuggerError::Evaluation {
                expression: key.clone(),
                message: format!("No symbol \"{symbol}\" in current context."),
            },
        )
    }
}

impl Debugger for ReplayDebugger {
    fn register_breakpoint(&mut self, location: &BreakpointLocation) -> Result<(), DebuggerError> {
        self.breakpoints.push(location.clone());
        Ok(())
    }

    fn resume(&mut self) -> Result<(), DebuggerError> {
        if self.inferior != Inferior::NotStarted {
            return Err(DebuggerError::Command {
                command: "run".to_string(),
                message: "The program being debugged has been started already.".to_string(),
            });
        }
        self.advance(0);
        Ok(())
    }

    fn cont(&mut self) -> Result<(), DebuggerError> {
        let Inferior::Paused(stop) = self.inferior else {
            return Err(DebuggerError::Command {
                command: "continue".to_string(),
                message: "The program is not being run.".to_string(),
            });
        };
        self.advance(stop + 1);
        Ok(())
    }

    fn take_events(&mut self) -> Vec<DebuggerEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> ReplayScript {
        ReplayScript::default().with_stop([("i", "0")]).with_stop([("i", "1")])
    }

    #[test]
    fn test_replay_sequence() {
        let mut debugger = ReplayDebugger::new(script());
        debugger.register_breakpoint(&BreakpointLocation::Line(10)).unwrap();

        debugger.resume().unwrap();
        assert_eq!(debugger.take_events(), vec![DebuggerEvent::BreakpointHit { number: Some(1) }]);
        assert_eq!(debugger.evaluate(&Expression::name("i")).unwrap(), RawValue::from("0"));

        debugger.cont().unwrap();
        assert_eq!(debugger.evaluate(&Expression::name("i")).unwrap(), RawValue::from("1"));

        debugger.cont().unwrap();
        assert_eq!(
            debugger.take_events(),
            vec![
                DebuggerEvent::BreakpointHit { number: Some(1) },
                DebuggerEvent::Exited { code: Some(0) }
            ]
        );
        assert!(debugger.has_exited());
        assert!(debugger.cont().is_err());
    }

    #[test]
    fn test_replay_without_breakpoint_exits() {
        let mut debugger = ReplayDebugger::new(script());
        debugger.resume().unwrap();
        assert_eq!(debugger.take_events(), vec![DebuggerEvent::Exited { code: Some(0) }]);
    }

    #[test]
    fn test_replay_unknown_symbol() {
        let mut debugger = ReplayDebugger::new(script());
        debugger.register_breakpoint(&BreakpointLocation::Line(10)).unwrap();
        debugger.resume().unwrap();

        let err = debugger.evaluate(&Expression::element("res", 1)).unwrap_err();
        match err {
            DebuggerError::Evaluation { expression, message } => {
                assert_eq!(expression, "res[1]");
                assert_eq!(message, "No symbol \"res\" in current context.");
            }
            other => panic!("Expected an evaluation error, got {other:?}"),
        }
        assert_eq!(debugger.evaluations(), 1);
    }

    #[test]
    fn test_replay_evaluate_before_start() {
        let mut debugger = ReplayDebugger::new(script());
        assert!(matches!(
            debugger.evaluate(&Expression::name("i")),
            Err(DebuggerError::Evaluation { .. })
        ));
    }

    #[test]
    fn test_replay_resume_twice() {
        let mut debugger = ReplayDebugger::new(script());
        debugger.resume().unwrap();
        assert!(matches!(debugger.resume(), Err(DebuggerError::Command { .. })));
    }

    #[test]
    fn test_replay_extra_events() {
        let noise = DebuggerEvent::Other("thread-group-started".to_string());
        let mut debugger = ReplayDebugger::new(script()).with_extra_events([noise.clone()]);
        debugger.register_breakpoint(&BreakpointLocation::Line(10)).unwrap();
        debugger.resume().unwrap();
        assert_eq!(
            debugger.take_events(),
            vec![noise, DebuggerEvent::BreakpointHit { number: Some(1) }]
        );
    }

    #[test]
    fn test_script_from_json() {
        let json = r#"{ "stops": [ { "i": "0", "res[1]": "10" }, {} ] }"#;
        let script = ReplayScript::from_json(json).unwrap();
        assert_eq!(script.stops.len(), 2);
        assert_eq!(script.stops[0]["res[1]"], "10");
        assert!(script.stops[1].is_empty());
    }
}
