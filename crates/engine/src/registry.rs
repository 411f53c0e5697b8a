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

//! The ordered set of variables sampled in one run.

use gdbc_common::VariableDeclaration;
use serde::Serialize;

use crate::{CollectError, Evaluator, TypedVariable};

/// The variables of one run, keyed by name.
///
/// Iteration follows declaration order, which is also the sampling and export order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VariableRegistry {
    variables: Vec<TypedVariable>,
}

impl VariableRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a declaration list.
    ///
    /// Fails on the first unsupported kind or duplicate name.
    pub fn from_declarations<'a>(
        declarations: impl IntoIterator<Item = &'a VariableDeclaration>,
    ) -> Result<Self, CollectError> {
        let mut registry = Self::new();
        for declaration in declarations {
            registry.insert(TypedVariable::from_declaration(declaration)?)?;
        }
        Ok(registry)
    }

    /// Adds a variable; names must be unique.
    pub fn insert(&mut self, variable: TypedVariable) -> Result<(), CollectError> {
        if self.get(variable.name()).is_some() {
            return Err(CollectError::DuplicateVariable(variable.name().to_string()));
        }
        self.variables.push(variable);
        Ok(())
    }

    /// Looks a variable up by name.
    pub fn get(&self, name: &str) -> Option<&TypedVariable> {
        self.variables.iter().find(|v| v.name() == name)
    }

    /// Iterates over the variables in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, TypedVariable> {
        self.variables.iter()
    }

    /// Variable names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(TypedVariable::name)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the registry has no variables.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Samples every variable once, stopping at the first failure.
    pub fn sample_all<E>(&mut self, evaluator: &mut E) -> Result<(), CollectError>
    where
        E: Evaluator + ?Sized,
    {
        self.variables.iter_mut().try_for_each(|variable| variable.sample(evaluator))
    }
}

impl<'a> IntoIterator for &'a VariableRegistry {
    type Item = &'a TypedVariable;
    type IntoIter = std::slice::Iter<'a, TypedVariable>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
