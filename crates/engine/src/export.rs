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

//! CSV export of recorded samples.
//!
//! One file per variable. The header row is `# breakpoint hit` followed by the
//! variable name (scalar) or `name[0]`, `name[1]`, ... (vector, labelled from 0
//! even though sampling used the inferior's 1-based indices). Each data row is
//! the 0-based sample index followed by the sample's values.
//!
//! ```text
//! # breakpoint hit,res[0],res[1]
//! 0,10,20
//! 1,11,21
//! ```

use std::{
    env,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use csv::{Terminator, WriterBuilder};
use gdbc_common::GDBC_OUTPUT_DIR;
use tracing::{debug, info};

use crate::{CollectError, TypedVariable, VariableRegistry};

/// Label of the first header column.
pub const HEADER_LABEL: &str = "# breakpoint hit";

/// Where and how export files are written.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory receiving the files
    pub output_dir: PathBuf,
    /// Appended to the variable name to form the file name
    pub suffix: String,
    /// Field delimiter
    pub delimiter: u8,
    /// Written after every row
    pub line_terminator: Terminator,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: env::var_os(GDBC_OUTPUT_DIR).map(PathBuf::from).unwrap_or_else(|| ".".into()),
            suffix: "_gdbc.csv".into(),
            delimiter: b',',
            line_terminator: Terminator::CRLF,
        }
    }
}

impl ExportConfig {
    /// Write files into the given directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the file name suffix
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the row terminator
    pub fn with_line_terminator(mut self, terminator: Terminator) -> Self {
        self.line_terminator = terminator;
        self
    }

    /// File path for a variable name
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}{}", self.suffix))
    }
}

/// Header row of a variable's export.
pub fn header(variable: &TypedVariable) -> Result<Vec<String>, CollectError> {
    let mut row = vec![HEADER_LABEL.to_string()];
    match variable.element_count()? {
        None => row.push(variable.name().to_string()),
        Some(n) => row.extend((0..n).map(|i| format!("{}[{i}]", variable.name()))),
    }
    Ok(row)
}

/// Data rows of a variable's export, one per sample in recording order.
pub fn rows(variable: &TypedVariable) -> Result<Vec<Vec<String>>, CollectError> {
    variable.element_count()?;
    Ok(variable
        .samples()
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            std::iter::once(index.to_string())
                .chain(sample.values().iter().map(ToString::to_string))
                .collect()
        })
        .collect())
}

/// Writes one file per variable, named by [`ExportConfig::path_for`].
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    /// Creates an exporter.
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// The export configuration.
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Exports every variable of the registry, returning the written paths in registry order.
    pub fn export(&self, registry: &VariableRegistry) -> Result<Vec<PathBuf>, CollectError> {
        export_with(registry, |name| self.config.path_for(name), &self.config)
    }
}

/// Exports every variable to the file `namer` picks for its name.
///
/// Variables are written one at a time. A variable with an unsupported shape
/// aborts the export before its file is created; files written earlier are kept.
pub fn export_with<F>(
    registry: &VariableRegistry,
    mut namer: F,
    config: &ExportConfig,
) -> Result<Vec<PathBuf>, CollectError>
where
    F: FnMut(&str) -> PathBuf,
{
    let mut written = Vec::with_capacity(registry.len());
    for variable in registry {
        let path = namer(variable.name());
        write_variable(variable, &path, config)?;
        written.push(path);
    }

    info!(files = written.len(), "Export complete");
    Ok(written)
}

/// Writes a single variable's export file.
///
/// Fields are quoted only when they contain the delimiter, a quote or a line break.
pub fn write_variable(
    variable: &TypedVariable,
    path: &Path,
    config: &ExportConfig,
) -> Result<(), CollectError> {
    let header = header(variable)?;
    let rows = rows(variable)?;

    let io_error = |source: io::Error| CollectError::Io { path: path.to_path_buf(), source };
    let mut writer = WriterBuilder::new()
        .delimiter(config.delimiter)
        .terminator(config.line_terminator)
        .from_writer(File::create(path).map_err(io_error)?);
    for row in std::iter::once(&header).chain(&rows) {
        writer.write_record(row).map_err(|e| io_error(e.into()))?;
    }
    writer.flush().map_err(io_error)?;

    debug!(variable = variable.name(), path = %path.display(), rows = rows.len(), "Exported");
    Ok(())
}
