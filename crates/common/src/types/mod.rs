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

/// Breakpoint locations handed to the debugger before collection starts
pub mod breakpoint;
/// Static declaration input: variable declarations and the collection plan
pub mod declaration;
/// Variable kinds and the canonical values they convert to
pub mod kind;
/// Declared variable shapes
pub mod shape;

pub use breakpoint::*;
pub use declaration::*;
pub use kind::*;
pub use shape::*;
