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

//! Environment variable name constants for GDBC configuration.
//!
//! These constants are the single source of truth for the environment variables
//! consulted when building default configurations.
//!
//! # Environment Variables
//!
//! - [`GDBC_GDB`] - Overrides the GDB executable used by the MI backend
//! - [`GDBC_OUTPUT_DIR`] - Default directory for exported CSV files

/// Environment variable for overriding the GDB executable.
///
/// Useful when the target toolchain ships its own debugger (for example the
/// Intel `gdb-oneapi`), which is then picked up without touching code.
///
/// # Default
///
/// When not set, `gdb` is resolved through `PATH`.
///
/// # Examples
///
/// ```bash
/// GDBC_GDB=/opt/intel/oneapi/debugger/latest/bin/gdb-oneapi cargo test -- --ignored
/// ```
pub const GDBC_GDB: &str = "GDBC_GDB";

/// Environment variable for the default export directory.
///
/// # Default
///
/// When not set, files are written to the current working directory.
pub const GDBC_OUTPUT_DIR: &str = "GDBC_OUTPUT_DIR";
