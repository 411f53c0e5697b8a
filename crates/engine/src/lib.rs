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

//! GDBC Engine - breakpoint-driven variable collection
//!
//! The engine samples program variables every time a debugger stops at a
//! breakpoint, keeps one time series per variable and exports each series as
//! a CSV file once the inferior exits.
//!
//! # Key Components
//!
//! - [`TypedVariable`] - a named variable, its kind, shape and samples
//! - [`VariableRegistry`] - all variables of a run in declaration order
//! - [`Collector`] - the sampling loop
//! - [`Exporter`] - per-variable CSV export
//! - [`Debugger`] - the process-control collaborator, with the [`GdbMi`] and
//!   [`ReplayDebugger`] backends
//! - [`run_collection`] - the whole workflow in one call

pub mod collector;
pub use collector::*;

pub mod core;
pub use self::core::*;

pub mod debugger;
pub use debugger::*;

pub mod error;
pub use error::*;

pub mod export;
pub use export::{export_with, header, rows, write_variable, ExportConfig, Exporter, HEADER_LABEL};

pub mod registry;
pub use registry::*;

pub mod variable;
pub use variable::*;
