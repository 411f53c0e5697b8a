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

//! End-to-end collection workflow.
//!
//! # Workflow Overview
//!
//! 1. **Preparation**: Build the variable registry from a [`CollectionPlan`]
//! 2. **Collection**: Arm breakpoints, run the inferior and sample at every stop
//! 3. **Export**: Write one CSV file per variable
//!
//! [`run_collection`] works with any [`Debugger`]; [`collect_with_gdb`] launches
//! a GDB/MI child process for the program named in a [`GdbConfig`] first.

use std::path::PathBuf;

use gdbc_common::CollectionPlan;
use serde::Serialize;
use tracing::info;

use crate::{CollectError, Collector, Debugger, Exporter, GdbConfig, GdbMi, VariableRegistry};

/// Outcome of a completed collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionReport {
    /// Number of breakpoint stops that were sampled
    pub rounds: usize,
    /// Export files in registry order
    pub files: Vec<PathBuf>,
    /// The sampled variables
    pub registry: VariableRegistry,
}

/// Collects every variable of the plan until the inferior exits, then exports them.
///
/// Nothing is exported when collection fails.
pub fn run_collection<D: Debugger>(
    debugger: D,
    plan: &CollectionPlan,
    exporter: &Exporter,
) -> Result<CollectionReport, CollectError> {
    info!(breakpoint = %plan.breakpoint, variables = plan.variables.len(), "Starting collection");

    let mut collector = Collector::from_plan(debugger, plan)?;
    let rounds = collector.collect()?;

    let registry = collector.into_registry();
    let files = exporter.export(&registry)?;

    info!(rounds, files = files.len(), "Collection finished");
    Ok(CollectionReport { rounds, files, registry })
}

/// Launches GDB on the configured program and runs [`run_collection`] with it.
pub fn collect_with_gdb(
    config: &GdbConfig,
    plan: &CollectionPlan,
    exporter: &Exporter,
) -> Result<CollectionReport, CollectError> {
    info!(program = %config.program.display(), gdb = %config.gdb_path.display(), "Launching GDB");
    let debugger = GdbMi::launch(config)?;
    run_collection(debugger, plan, exporter)
}
