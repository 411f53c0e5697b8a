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

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// An expression the debugger is asked to evaluate in the paused inferior.
///
/// Only two forms are ever needed: a bare symbol, and one element of a
/// one-dimensional array addressed by the inferior's own (1-based) index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    /// A bare symbol name, e.g. `i`.
    Name(String),
    /// One array element, e.g. `res[1]`.
    Element {
        /// Array symbol name.
        name: String,
        /// Index in the inferior's address space.
        index: usize,
    },
}

impl Expression {
    /// Creates a bare-name expression.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Creates an element expression.
    pub fn element(name: impl Into<String>, index: usize) -> Self {
        Self::Element { name: name.into(), index }
    }

    /// Renders the expression using the given index syntax.
    pub fn render(&self, style: IndexStyle) -> String {
        match self {
            Self::Name(name) => name.clone(),
            Self::Element { name, index } => match style {
                IndexStyle::C => format!("{name}[{index}]"),
                IndexStyle::Fortran => format!("{name}({index})"),
            },
        }
    }
}

/// The canonical form always uses square brackets.
impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(IndexStyle::C))
    }
}

/// Array subscript syntax of the inferior's source language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStyle {
    /// `name[i]` - C, C++, Rust and GDB's Python value subscripts.
    C,
    /// `name(i)` - Fortran.
    #[default]
    Fortran,
}
