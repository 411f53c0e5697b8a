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

use serde::{Deserialize, Serialize};

use crate::{BreakpointLocation, Kind, Shape, UnsupportedTypeError};

/// One entry of the static declaration list.
///
/// The kind is kept as written so that an unsupported kind surfaces as an
/// [`UnsupportedTypeError`] when the variable is built, not when the plan is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    /// Symbol name as known to the debugger.
    pub name: String,
    /// Target type, e.g. `int` or `float`.
    #[serde(alias = "type")]
    pub kind: String,
    /// Declared shape.
    #[serde(default = "default_shape")]
    pub shape: Shape,
}

fn default_shape() -> Shape {
    Shape::Scalar
}

impl VariableDeclaration {
    /// Creates a declaration.
    pub fn new(name: impl Into<String>, kind: impl Into<String>, shape: Shape) -> Self {
        Self { name: name.into(), kind: kind.into(), shape }
    }

    /// Creates a declaration from a dimension list, see [`Shape::from_dimensions`].
    pub fn with_dimensions(
        name: impl Into<String>,
        kind: impl Into<String>,
        dimensions: &[usize],
    ) -> Self {
        Self::new(name, kind, Shape::from_dimensions(dimensions))
    }

    /// Resolves the declared kind.
    pub fn kind(&self) -> Result<Kind, UnsupportedTypeError> {
        self.kind.parse()
    }
}

/// The complete static input of one collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPlan {
    /// Where the inferior pauses for sampling.
    pub breakpoint: BreakpointLocation,
    /// Variables to sample at every stop, in sampling order.
    pub variables: Vec<VariableDeclaration>,
}

impl CollectionPlan {
    /// Creates an empty plan for the given breakpoint.
    pub fn new(breakpoint: impl Into<BreakpointLocation>) -> Self {
        Self { breakpoint: breakpoint.into(), variables: Vec::new() }
    }

    /// Adds a variable declaration.
    pub fn with_variable(mut self, declaration: VariableDeclaration) -> Self {
        self.variables.push(declaration);
        self
    }
}
