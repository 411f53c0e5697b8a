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

//! GDB backend speaking the machine interface over a child process.

pub mod mi;

use std::{
    env,
    io::{BufRead, BufReader, Write},
    path::PathBuf,
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
};

use gdbc_common::{BreakpointLocation, Expression, IndexStyle, GDBC_GDB};
use tracing::{debug, trace, warn};

use self::mi::{AsyncKind, AsyncRecord, Record, ResultClass, ResultRecord};
use crate::{Debugger, DebuggerError, DebuggerEvent, Evaluator, RawValue};

/// How to launch GDB and the inferior.
#[derive(Debug, Clone)]
pub struct GdbConfig {
    /// GDB executable
    pub gdb_path: PathBuf,
    /// Program to debug
    pub program: PathBuf,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Subscript syntax used for array elements
    pub index_style: IndexStyle,
    /// CLI commands executed once GDB is up, before any breakpoint is set
    pub init_commands: Vec<String>,
}

impl GdbConfig {
    /// Configuration for debugging `program` with the default GDB.
    ///
    /// The GDB executable is taken from [`GDBC_GDB`] when set.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let gdb_path = env::var_os(GDBC_GDB).map(PathBuf::from).unwrap_or_else(|| "gdb".into());
        Self {
            gdb_path,
            program: program.into(),
            args: Vec::new(),
            index_style: IndexStyle::default(),
            init_commands: Vec::new(),
        }
    }

    /// Use a specific GDB executable
    pub fn with_gdb_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.gdb_path = path.into();
        self
    }

    /// Set the program arguments
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the array subscript syntax
    pub fn with_index_style(mut self, style: IndexStyle) -> Self {
        self.index_style = style;
        self
    }

    /// Add a CLI command to run at startup
    pub fn with_init_command(mut self, command: impl Into<String>) -> Self {
        self.init_commands.push(command.into());
        self
    }
}

/// A running `gdb --interpreter=mi2` session.
///
/// Commands are tokenized so that each answer can be matched to its request;
/// out-of-band records seen in between are turned into [`DebuggerEvent`]s.
/// Reads block without a timeout: an inferior that never stops and never
/// exits blocks the caller forever.
pub struct GdbMi {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    index_style: IndexStyle,
    next_token: u64,
    events: Vec<DebuggerEvent>,
    /// A `*stopped` record was seen since the last execution command was sent.
    pending_stop: bool,
}

impl GdbMi {
    /// Spawn GDB on the configured program and wait for its first prompt.
    pub fn launch(config: &GdbConfig) -> Result<Self, DebuggerError> {
        debug!(gdb = %config.gdb_path.display(), program = %config.program.display(), "Launching GDB");

        let mut child = Command::new(&config.gdb_path)
            .args(["--interpreter=mi2", "--quiet", "--nx", "--args"])
            .arg(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take().ok_or(DebuggerError::Terminated)?;
        let stdout = child.stdout.take().ok_or(DebuggerError::Terminated)?;

        let mut gdb = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            index_style: config.index_style,
            next_token: 1,
            events: Vec::new(),
            pending_stop: false,
        };

        gdb.wait_for_prompt()?;
        gdb.command("-gdb-set confirm off")?;
        gdb.command("-gdb-set width 0")?;
        for command in &config.init_commands {
            gdb.command(&format!("-interpreter-exec console {}", mi::quote(command)))?;
        }

        Ok(gdb)
    }

    fn read_record(&mut self) -> Result<Record, DebuggerError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(DebuggerError::Terminated);
        }
        trace!(line = line.trim_end(), "gdb");
        mi::parse_line(&line)
    }

    fn wait_for_prompt(&mut self) -> Result<(), DebuggerError> {
        loop {
            match self.read_record()? {
                Record::Prompt => return Ok(()),
                Record::Async(record) => self.on_async(record),
                _ => {}
            }
        }
    }

    /// Send a command and return its result record, whatever its class.
    fn send(&mut self, command: &str) -> Result<ResultRecord, DebuggerError> {
        let token = self.next_token;
        self.next_token += 1;

        trace!(token, command, "gdb <-");
        writeln!(self.stdin, "{token}{command}")?;
        self.stdin.flush()?;

        loop {
            match self.read_record()? {
                Record::Result(record) if record.token == Some(token) => return Ok(record),
                Record::Result(record) => {
                    warn!(?record, "Ignoring result record for another command");
                }
                Record::Async(record) => self.on_async(record),
                Record::Raw(output) => debug!(%output, "Inferior output"),
                Record::Stream(..) | Record::Prompt => {}
            }
        }
    }

    /// Send a command that must succeed.
    fn command(&mut self, command: &str) -> Result<ResultRecord, DebuggerError> {
        let record = self.send(command)?;
        match record.class {
            ResultClass::Error => Err(DebuggerError::Command {
                command: command.to_string(),
                message: record.error_message().unwrap_or("unknown error").to_string(),
            }),
            _ => Ok(record),
        }
    }

    /// Send an execution command and block until the inferior stops or exits.
    fn execute(&mut self, command: &str) -> Result<(), DebuggerError> {
        self.pending_stop = false;
        let record = self.command(command)?;
        if record.class != ResultClass::Running {
            return Err(DebuggerError::Protocol(format!(
                "expected ^running after `{command}`, got ^{}",
                record.class
            )));
        }

        while !self.pending_stop {
            match self.read_record()? {
                Record::Async(record) => self.on_async(record),
                Record::Raw(output) => debug!(%output, "Inferior output"),
                _ => {}
            }
        }
        self.pending_stop = false;
        Ok(())
    }

    fn on_async(&mut self, record: AsyncRecord) {
        let event = match (record.kind, record.class.as_str()) {
            (AsyncKind::Exec, "stopped") => {
                self.pending_stop = true;
                stop_event(&record)
            }
            (AsyncKind::Exec, "running") | (AsyncKind::Status, _) => return,
            (_, class) => DebuggerEvent::Other(class.to_string()),
        };
        debug!(?event, "Debugger event");
        self.events.push(event);
    }
}

/// Translate a `*stopped` record.
fn stop_event(record: &AsyncRecord) -> DebuggerEvent {
    let reason = mi::find_str(&record.results, "reason").unwrap_or("unknown");
    match reason {
        "breakpoint-hit" => DebuggerEvent::BreakpointHit {
            number: mi::find_str(&record.results, "bkptno").and_then(|n| n.parse().ok()),
        },
        "exited-normally" => DebuggerEvent::Exited { code: Some(0) },
        // GDB prints the exit code in octal.
        "exited" => DebuggerEvent::Exited {
            code: mi::find_str(&record.results, "exit-code")
                .and_then(|code| i32::from_str_radix(code, 8).ok()),
        },
        "exited-signalled" => DebuggerEvent::Exited { code: None },
        "signal-received" => DebuggerEvent::SignalReceived {
            signal: mi::find_str(&record.results, "signal-name").unwrap_or("unknown").to_string(),
        },
        other => DebuggerEvent::Stopped { reason: other.to_string() },
    }
}

impl Evaluator for GdbMi {
    fn evaluate(&mut self, expression: &Expression) -> Result<RawValue, DebuggerError> {
        let rendered = expression.render(self.index_style);
        let record = self.send(&format!("-data-evaluate-expression {}", mi::quote(&rendered)))?;

        match record.class {
            ResultClass::Done => mi::find_str(&record.results, "value")
                .map(RawValue::from)
                .ok_or_else(|| DebuggerError::Protocol(format!("no value for `{rendered}`"))),
            _ => Err(DebuggerError::Evaluation {
                expression: rendered,
                message: record.error_message().unwrap_or("unknown error").to_string(),
            }),
        }
    }
}

impl Debugger for GdbMi {
    fn register_breakpoint(&mut self, location: &BreakpointLocation) -> Result<(), DebuggerError> {
        let record = self.command(&format!("-break-insert {}", mi::quote(&location.to_string())))?;
        let number = mi::find(&record.results, "bkpt")
            .and_then(|bkpt| bkpt.get("number"))
            .and_then(mi::MiValue::as_str);
        debug!(%location, ?number, "Breakpoint registered");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), DebuggerError> {
        self.execute("-exec-run")
    }

    fn cont(&mut self) -> Result<(), DebuggerError> {
        self.execute("-exec-continue")
    }

    fn take_events(&mut self) -> Vec<DebuggerEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Drop for GdbMi {
    fn drop(&mut self) {
        let _ = writeln!(self.stdin, "-gdb-exit");
        let _ = self.stdin.flush();
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stopped(line: &str) -> AsyncRecord {
        match mi::parse_line(line).unwrap() {
            Record::Async(record) => record,
            other => panic!("Expected an async record, got {other:?}"),
        }
    }

    #[test]
    fn test_stop_event_breakpoint() {
        let record = stopped(r#"*stopped,reason="breakpoint-hit",disp="keep",bkptno="2""#);
        assert_eq!(stop_event(&record), DebuggerEvent::BreakpointHit { number: Some(2) });
    }

    #[test]
    fn test_stop_event_exit() {
        let record = stopped(r#"*stopped,reason="exited-normally""#);
        assert_eq!(stop_event(&record), DebuggerEvent::Exited { code: Some(0) });

        let record = stopped(r#"*stopped,reason="exited",exit-code="012""#);
        assert_eq!(stop_event(&record), DebuggerEvent::Exited { code: Some(10) });

        let record = stopped(r#"*stopped,reason="exited-signalled",signal-name="SIGKILL""#);
        assert_eq!(stop_event(&record), DebuggerEvent::Exited { code: None });
    }

    #[test]
    fn test_stop_event_other() {
        let record = stopped(r#"*stopped,reason="signal-received",signal-name="SIGSEGV""#);
        assert_eq!(
            stop_event(&record),
            DebuggerEvent::SignalReceived { signal: "SIGSEGV".to_string() }
        );

        let record = stopped(r#"*stopped,reason="end-stepping-range""#);
        assert_eq!(
            stop_event(&record),
            DebuggerEvent::Stopped { reason: "end-stepping-range".to_string() }
        );
    }

    #[test]
    fn test_config_builder() {
        let config = GdbConfig::new("./a.out")
            .with_gdb_path("/usr/bin/gdb")
            .with_args(["--steps", "3"])
            .with_index_style(IndexStyle::C)
            .with_init_command("set print elements 0");

        assert_eq!(config.gdb_path, PathBuf::from("/usr/bin/gdb"));
        assert_eq!(config.program, PathBuf::from("./a.out"));
        assert_eq!(config.args, vec!["--steps".to_string(), "3".to_string()]);
        assert_eq!(config.index_style, IndexStyle::C);
        assert_eq!(config.init_commands, vec!["set print elements 0".to_string()]);
    }
}
