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

//! Errors raised while building, sampling and exporting variables.

use std::{io, path::PathBuf};

use gdbc_common::{ConversionError, Shape, UnsupportedTypeError};
use thiserror::Error;

use crate::{CollectorState, DebuggerError};

/// Errors that can occur while building variables, collecting samples or exporting them.
///
/// None of them is recovered from: each one aborts the operation in progress.
#[derive(Debug, Error)]
pub enum CollectError {
    /// A declaration names a kind other than integer or real
    #[error(transparent)]
    UnsupportedType(#[from] UnsupportedTypeError),

    /// A variable's shape is neither scalar nor a one-dimensional vector
    #[error(
        "variable `{name}` has unsupported shape {shape}: only scalars and one-dimensional arrays are supported"
    )]
    UnsupportedShape {
        /// Variable name
        name: String,
        /// Offending shape
        shape: Shape,
    },

    /// A raw debugger value could not be converted
    #[error("variable `{name}`: {source}")]
    Conversion {
        /// Variable name
        name: String,
        /// Underlying conversion failure
        source: ConversionError,
    },

    /// The debugger collaborator failed, e.g. a symbol is not in scope
    #[error(transparent)]
    Debugger(#[from] DebuggerError),

    /// An operation was attempted in the wrong collector state
    #[error("collector is {actual}, expected {expected}")]
    InvalidState {
        /// State the operation requires
        expected: CollectorState,
        /// Current state
        actual: CollectorState,
    },

    /// Collection was started without any variable
    #[error("no variables registered")]
    EmptyRegistry,

    /// Two declarations share a name
    #[error("variable `{0}` is declared more than once")]
    DuplicateVariable(String),

    /// Collection was started without any breakpoint
    #[error("no breakpoint registered")]
    MissingBreakpoint,

    /// Writing an export file failed
    #[error("failed to write `{}`: {source}", .path.display())]
    Io {
        /// File being written
        path: PathBuf,
        /// Underlying I/O failure
        source: io::Error,
    },
}
