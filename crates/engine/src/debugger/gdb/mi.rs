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

//! GDB/MI output records.
//!
//! Parses one line of `--interpreter=mi2` output at a time:
//!
//! ```text
//! 3^done,value="42"
//! *stopped,reason="breakpoint-hit",bkptno="1",frame={func="MAIN__",line="10"}
//! =thread-group-exited,id="i1",exit-code="0"
//! ~"Breakpoint 1 at 0x1189: file main.f90, line 10.\n"
//! (gdb)
//! ```
//!
//! Lines that carry none of the MI prefixes, or carry one but do not parse,
//! are inferior output that shares the debugger's stdout and come back as
//! [`Record::Raw`].

use std::fmt::Write as _;

use crate::DebuggerError;
use tracing::trace;

/// A `name=value` pair.
pub type MiResult = (String, MiValue);

/// Values in MI results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiValue {
    /// A C string.
    Const(String),
    /// `{name=value,...}`
    Tuple(Vec<MiResult>),
    /// `[value,...]` or `[name=value,...]`; named entries become one-entry tuples.
    List(Vec<MiValue>),
}

impl MiValue {
    /// The string of a [`MiValue::Const`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Const(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a field of a [`MiValue::Tuple`].
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Tuple(results) => find(results, key),
            _ => None,
        }
    }
}

/// Look up a result by name.
pub fn find<'a>(results: &'a [MiResult], key: &str) -> Option<&'a MiValue> {
    results.iter().find(|(name, _)| name == key).map(|(_, value)| value)
}

/// Look up a string result by name.
pub fn find_str<'a>(results: &'a [MiResult], key: &str) -> Option<&'a str> {
    find(results, key).and_then(MiValue::as_str)
}

/// Class of a result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ResultClass {
    /// `^done`
    #[display("done")]
    Done,
    /// `^running`
    #[display("running")]
    Running,
    /// `^connected`
    #[display("connected")]
    Connected,
    /// `^error`
    #[display("error")]
    Error,
    /// `^exit`
    #[display("exit")]
    Exit,
}

/// The synchronous answer to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    /// Token echoed from the command, if one was sent.
    pub token: Option<u64>,
    /// Result class.
    pub class: ResultClass,
    /// Attached results.
    pub results: Vec<MiResult>,
}

impl ResultRecord {
    /// The `msg` field of an `^error` record.
    pub fn error_message(&self) -> Option<&str> {
        match self.class {
            ResultClass::Error => find_str(&self.results, "msg"),
            _ => None,
        }
    }
}

/// Kind of an out-of-band record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncKind {
    /// `*` - execution state changes.
    Exec,
    /// `+` - progress of slow operations.
    Status,
    /// `=` - supplementary notifications.
    Notify,
}

/// An out-of-band record such as `*stopped` or `=thread-group-exited`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncRecord {
    /// Token of the command that caused it, if any.
    pub token: Option<u64>,
    /// Record kind.
    pub kind: AsyncKind,
    /// Async class, e.g. `stopped`.
    pub class: String,
    /// Attached results.
    pub results: Vec<MiResult>,
}

/// Kind of a stream record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// `~` - console output.
    Console,
    /// `@` - target output.
    Target,
    /// `&` - debugger log output.
    Log,
}

/// One line of debugger output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// `^...`
    Result(ResultRecord),
    /// `*...`, `+...` or `=...`
    Async(AsyncRecord),
    /// `~"..."`, `@"..."` or `&"..."`
    Stream(StreamKind, String),
    /// The `(gdb)` prompt that ends every batch of output.
    Prompt,
    /// Anything else, usually the inferior writing to its stdout.
    Raw(String),
}

/// Parse one line of MI output.
///
/// The inferior shares GDB's stdout, so an untokened line that looks like a
/// record but does not parse as one (`=== step 1 ===`) is returned as
/// [`Record::Raw`]. Only tokened lines, which always come from GDB, are
/// reported as protocol errors.
pub fn parse_line(line: &str) -> Result<Record, DebuggerError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim_end() == "(gdb)" {
        return Ok(Record::Prompt);
    }

    let mut parser = Parser::new(line);
    let token = parser.token();
    match parse_record(&mut parser, token, line) {
        Err(err) if token.is_none() => {
            trace!(%err, line, "Treating unparsable line as inferior output");
            Ok(Record::Raw(line.to_string()))
        }
        outcome => outcome,
    }
}

fn parse_record(
    parser: &mut Parser<'_>,
    token: Option<u64>,
    line: &str,
) -> Result<Record, DebuggerError> {
    let record = match parser.peek() {
        Some(b'^') => {
            parser.bump();
            let class = match parser.word() {
                "done" => ResultClass::Done,
                "running" => ResultClass::Running,
                "connected" => ResultClass::Connected,
                "error" => ResultClass::Error,
                "exit" => ResultClass::Exit,
                other => return Err(protocol(format!("unknown result class `{other}` in `{line}`"))),
            };
            let results = parser.results()?;
            Record::Result(ResultRecord { token, class, results })
        }
        Some(marker @ (b'*' | b'+' | b'=')) => {
            parser.bump();
            let kind = match marker {
                b'*' => AsyncKind::Exec,
                b'+' => AsyncKind::Status,
                _ => AsyncKind::Notify,
            };
            let class = parser.word().to_string();
            let results = parser.results()?;
            Record::Async(AsyncRecord { token, kind, class, results })
        }
        Some(marker @ (b'~' | b'@' | b'&')) if token.is_none() => {
            parser.bump();
            let kind = match marker {
                b'~' => StreamKind::Console,
                b'@' => StreamKind::Target,
                _ => StreamKind::Log,
            };
            let text = parser.c_string()?;
            parser.expect_end()?;
            Record::Stream(kind, text)
        }
        _ => Record::Raw(line.to_string()),
    };

    Ok(record)
}

/// Quote a string as an MI C-string argument.
pub fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\{:03o}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn protocol(message: String) -> DebuggerError {
    DebuggerError::Protocol(message)
}

struct Parser<'a> {
    line: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(line: &'a str) -> Self {
        Self { line, bytes: line.as_bytes(), pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn error(&self, what: &str) -> DebuggerError {
        protocol(format!("{what} at column {} in `{}`", self.pos, self.line))
    }

    fn expect(&mut self, expected: u8) -> Result<(), DebuggerError> {
        if self.bump() == Some(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{}`", expected as char)))
        }
    }

    fn expect_end(&self) -> Result<(), DebuggerError> {
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(self.error("trailing characters"))
        }
    }

    fn token(&mut self) -> Option<u64> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        self.line[start..self.pos].parse().ok()
    }

    /// A class or variable name: everything up to `,`, `=` or end of line.
    fn word(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|b| b != b',' && b != b'=') {
            self.pos += 1;
        }
        &self.line[start..self.pos]
    }

    fn results(&mut self) -> Result<Vec<MiResult>, DebuggerError> {
        let mut results = Vec::new();
        while self.peek() == Some(b',') {
            self.bump();
            results.push(self.result()?);
        }
        self.expect_end()?;
        Ok(results)
    }

    fn result(&mut self) -> Result<MiResult, DebuggerError> {
        let name = self.word().to_string();
        if name.is_empty() {
            return Err(self.error("expected a result name"));
        }
        self.expect(b'=')?;
        Ok((name, self.value()?))
    }

    fn value(&mut self) -> Result<MiValue, DebuggerError> {
        match self.peek() {
            Some(b'"') => Ok(MiValue::Const(self.c_string()?)),
            Some(b'{') => {
                self.bump();
                let mut fields = Vec::new();
                if self.peek() != Some(b'}') {
                    loop {
                        fields.push(self.result_in_container()?);
                        if self.peek() == Some(b',') {
                            self.bump();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(b'}')?;
                Ok(MiValue::Tuple(fields))
            }
            Some(b'[') => {
                self.bump();
                let mut items = Vec::new();
                if self.peek() != Some(b']') {
                    loop {
                        let item = match self.peek() {
                            Some(b'"' | b'{' | b'[') => self.value()?,
                            _ => MiValue::Tuple(vec![self.result_in_container()?]),
                        };
                        items.push(item);
                        if self.peek() == Some(b',') {
                            self.bump();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(b']')?;
                Ok(MiValue::List(items))
            }
            _ => Err(self.error("expected a value")),
        }
    }

    /// Like [`Self::result`], but names also stop at closing brackets.
    fn result_in_container(&mut self) -> Result<MiResult, DebuggerError> {
        let start = self.pos;
        while self.peek().is_some_and(|b| !matches!(b, b',' | b'=' | b'}' | b']')) {
            self.pos += 1;
        }
        let name = self.line[start..self.pos].to_string();
        if name.is_empty() {
            return Err(self.error("expected a result name"));
        }
        self.expect(b'=')?;
        Ok((name, self.value()?))
    }

    fn c_string(&mut self) -> Result<String, DebuggerError> {
        self.expect(b'"')?;
        let mut bytes = Vec::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(b'"') => break,
                Some(b'\\') => {
                    let escaped = self.bump().ok_or_else(|| self.error("dangling escape"))?;
                    match escaped {
                        b'n' => bytes.push(b'\n'),
                        b't' => bytes.push(b'\t'),
                        b'r' => bytes.push(b'\r'),
                        b'a' => bytes.push(0x07),
                        b'b' => bytes.push(0x08),
                        b'f' => bytes.push(0x0c),
                        b'v' => bytes.push(0x0b),
                        b'e' => bytes.push(0x1b),
                        b'0'..=b'7' => {
                            let mut code = u32::from(escaped - b'0');
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        self.bump();
                                        code = code * 8 + u32::from(d - b'0');
                                    }
                                    _ => break,
                                }
                            }
                            bytes.push((code & 0xff) as u8);
                        }
                        other => bytes.push(other),
                    }
                }
                Some(b) => bytes.push(b),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt() {
        assert_eq!(parse_line("(gdb) ").unwrap(), Record::Prompt);
        assert_eq!(parse_line("(gdb)\r\n").unwrap(), Record::Prompt);
    }

    #[test]
    fn test_result_with_token() {
        let record = parse_line("12^done,value=\"42\"").unwrap();
        assert_eq!(
            record,
            Record::Result(ResultRecord {
                token: Some(12),
                class: ResultClass::Done,
                results: vec![("value".to_string(), MiValue::Const("42".to_string()))],
            })
        );
    }

    #[test]
    fn test_result_error_message() {
        let Record::Result(record) =
            parse_line(r#"3^error,msg="No symbol \"x\" in current context.""#).unwrap()
        else {
            panic!("Expected a result record");
        };
        assert_eq!(record.class, ResultClass::Error);
        assert_eq!(record.error_message(), Some("No symbol \"x\" in current context."));
    }

    #[test]
    fn test_stopped_record() {
        let line = r#"*stopped,reason="breakpoint-hit",disp="keep",bkptno="1",frame={addr="0x0000555555555189",func="MAIN__",args=[],file="main.f90",line="10"},thread-id="1",stopped-threads="all""#;
        let Record::Async(record) = parse_line(line).unwrap() else {
            panic!("Expected an async record");
        };
        assert_eq!(record.kind, AsyncKind::Exec);
        assert_eq!(record.class, "stopped");
        assert_eq!(find_str(&record.results, "reason"), Some("breakpoint-hit"));
        assert_eq!(find_str(&record.results, "bkptno"), Some("1"));

        let frame = find(&record.results, "frame").unwrap();
        assert_eq!(frame.get("line").and_then(MiValue::as_str), Some("10"));
        assert_eq!(frame.get("args"), Some(&MiValue::List(vec![])));
    }

    #[test]
    fn test_list_of_results() {
        let line = r#"^done,stack=[frame={level="0"},frame={level="1"}]"#;
        let Record::Result(record) = parse_line(line).unwrap() else {
            panic!("Expected a result record");
        };
        let MiValue::List(items) = find(&record.results, "stack").unwrap() else {
            panic!("Expected a list");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1].get("frame").and_then(|f| f.get("level")).and_then(MiValue::as_str),
            Some("1")
        );
    }

    #[test]
    fn test_list_of_values() {
        let line = r#"=library-loaded,ranges=[{from="0x1",to="0x2"}],names=["a","b"]"#;
        let Record::Async(record) = parse_line(line).unwrap() else {
            panic!("Expected an async record");
        };
        assert_eq!(record.kind, AsyncKind::Notify);
        assert_eq!(
            find(&record.results, "names"),
            Some(&MiValue::List(vec![
                MiValue::Const("a".to_string()),
                MiValue::Const("b".to_string())
            ]))
        );
    }

    #[test]
    fn test_stream_records() {
        assert_eq!(
            parse_line(r#"~"Breakpoint 1 at 0x1189\n""#).unwrap(),
            Record::Stream(StreamKind::Console, "Breakpoint 1 at 0x1189\n".to_string())
        );
        assert_eq!(
            parse_line(r#"&"warning: \303\251\n""#).unwrap(),
            Record::Stream(StreamKind::Log, "warning: é\n".to_string())
        );
    }

    #[test]
    fn test_raw_inferior_output() {
        assert_eq!(parse_line(" i =  3").unwrap(), Record::Raw(" i =  3".to_string()));
        assert_eq!(parse_line("").unwrap(), Record::Raw(String::new()));
    }

    #[test]
    fn test_malformed() {
        assert!(parse_line("3^bogus").is_err());
        assert!(parse_line(r#"3^done,value="unterminated"#).is_err());
        assert!(parse_line(r#"3^done,value={a="1""#).is_err());
        assert!(parse_line(r#"3^done,=1"#).is_err());
    }

    #[test]
    fn test_record_like_inferior_output() {
        for line in [
            "=== step 1 ===",
            "^ marker",
            "* note: x=1",
            "~ tilde",
            r#"^done,value="unterminated"#,
        ] {
            assert_eq!(parse_line(line).unwrap(), Record::Raw(line.to_string()), "{line}");
        }
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("res(1)"), "\"res(1)\"");
        assert_eq!(quote(r#"a "b" \c"#), r#""a \"b\" \\c""#);
        assert_eq!(quote("line\n"), "\"line\\n\"");
    }
}
