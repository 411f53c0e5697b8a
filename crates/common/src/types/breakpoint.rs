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

use std::{fmt::Display, path::PathBuf, str::FromStr};

use eyre::{bail, eyre, Error, Result};
use serde::{Deserialize, Serialize};

/// Specifies where the inferior should pause for sampling.
///
/// Serialized in its textual form, e.g. `"10"` or `"main.f90:10"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum BreakpointLocation {
    /// A line in the default source file (the one containing the entry point).
    Line(usize),
    /// A line in a specific source file.
    FileLine {
        /// Path to the source file, as the debugger knows it.
        file: PathBuf,
        /// Line number in the source file (1-based).
        line: usize,
    },
    /// The entry of a function or subroutine.
    Function(String),
}

impl FromStr for BreakpointLocation {
    type Err = Error;

    /// Parses a breakpoint location from a string in the format:
    /// - `<line>` for a line in the default file
    /// - `<path>:<line>` for a line in a given file
    /// - `<function>` for a function entry
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            bail!("Empty breakpoint location");
        }

        if let Some((path, line)) = trimmed.rsplit_once(':') {
            if path.is_empty() {
                bail!("Missing file in breakpoint location: {s}");
            }
            let line = line.parse::<usize>().map_err(|e| eyre!("Invalid line number: {e}"))?;
            if line == 0 {
                bail!("Line numbers are 1-based, got 0");
            }
            return Ok(Self::FileLine { file: PathBuf::from(path), line });
        }

        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            let line = trimmed.parse::<usize>().map_err(|e| eyre!("Invalid line number: {e}"))?;
            if line == 0 {
                bail!("Line numbers are 1-based, got 0");
            }
            return Ok(Self::Line(line));
        }

        if trimmed.chars().any(char::is_whitespace) {
            bail!("Invalid breakpoint location format. Expected <line>, <path>:<line> or <function>, got: {s}");
        }

        Ok(Self::Function(trimmed.to_string()))
    }
}

/// Renders the location in the form `break` and `-break-insert` accept.
impl Display for BreakpointLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Line(line) => write!(f, "{line}"),
            Self::FileLine { file, line } => write!(f, "{}:{line}", file.display()),
            Self::Function(name) => f.write_str(name),
        }
    }
}

impl TryFrom<String> for BreakpointLocation {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<BreakpointLocation> for String {
    fn from(loc: BreakpointLocation) -> Self {
        loc.to_string()
    }
}

impl From<usize> for BreakpointLocation {
    fn from(line: usize) -> Self {
        Self::Line(line)
    }
}
