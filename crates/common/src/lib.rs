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

// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
// SPDX-License-Identifier: AGPL-3.0
//! GDBC Common - Shared functionality for GDBC components
//!
//! This crate provides the declaration-side data model used by the collection
//! engine: variable kinds and values, shapes, breakpoint locations, debugger
//! expressions, plus environment and logging helpers.

/// Declaration types: kinds, values, shapes, breakpoints and collection plans
pub mod types;

/// Environment variable names recognized by GDBC components
pub mod env;
/// Debugger expressions and inferior-language index syntax
pub mod expression;
/// Logging setup and utilities for consistent logging across GDBC components
pub mod logging;

pub use env::*;
pub use expression::*;
pub use logging::*;
pub use types::*;
