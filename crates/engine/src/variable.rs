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

//! Typed program variables and their recorded samples.
//!
//! A [`TypedVariable`] knows the symbol name, the [`Kind`] every raw value is
//! converted to and the declared [`Shape`]. Each call to
//! [`TypedVariable::sample`] evaluates the symbol (or each element of it) in the
//! paused inferior and appends one [`Sample`].
//!
//! Array elements are requested with the inferior's 1-based indices and stored
//! in the same order starting at position 0.

use std::fmt::Display;

use gdbc_common::{Expression, Kind, Shape, Value, VariableDeclaration};
use itertools::Itertools;
use serde::Serialize;
use tracing::trace;

use crate::{CollectError, Evaluator, RawValue};

/// One observation of a variable at one breakpoint stop.
#[derive(Debug, Clone, PartialEq, Serialize, derive_more::From)]
#[serde(untagged)]
pub enum Sample {
    /// Value of a scalar variable.
    Scalar(Value),
    /// Values of a vector variable, first element first.
    Vector(Vec<Value>),
}

impl Sample {
    /// The recorded values in stored order.
    pub fn values(&self) -> &[Value] {
        match self {
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::Vector(values) => values,
        }
    }
}

impl Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(value) => write!(f, "{value}"),
            Self::Vector(values) => write!(f, "[{}]", values.iter().join(", ")),
        }
    }
}

/// A named program variable and the time series recorded for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedVariable {
    name: String,
    kind: Kind,
    shape: Shape,
    samples: Vec<Sample>,
}

impl TypedVariable {
    /// Creates a variable with no samples.
    ///
    /// Any shape is accepted here; unsupported shapes fail when sampled or exported.
    pub fn new(name: impl Into<String>, kind: Kind, shape: Shape) -> Self {
        Self { name: name.into(), kind, shape, samples: Vec::new() }
    }

    /// Builds a variable from its declaration, failing on an unsupported kind.
    pub fn from_declaration(declaration: &VariableDeclaration) -> Result<Self, CollectError> {
        let kind = declaration.kind()?;
        Ok(Self::new(declaration.name.clone(), kind, declaration.shape.clone()))
    }

    /// Symbol name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target kind.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Declared shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Samples in recording order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Element count for a supported shape (`None` for scalars), or
    /// [`CollectError::UnsupportedShape`].
    pub fn element_count(&self) -> Result<Option<usize>, CollectError> {
        self.shape.supported_len().ok_or_else(|| CollectError::UnsupportedShape {
            name: self.name.clone(),
            shape: self.shape.clone(),
        })
    }

    /// Converts a raw debugger value to this variable's kind.
    pub fn convert(&self, raw: &RawValue) -> Result<Value, CollectError> {
        self.kind
            .convert(raw.as_str())
            .map_err(|source| CollectError::Conversion { name: self.name.clone(), source })
    }

    /// Reads the current value from the paused inferior and appends it.
    ///
    /// Nothing is appended unless every element was read and converted.
    pub fn sample<E>(&mut self, evaluator: &mut E) -> Result<(), CollectError>
    where
        E: Evaluator + ?Sized,
    {
        let sample = match self.element_count()? {
            None => {
                let raw = evaluator.evaluate(&Expression::name(&self.name))?;
                Sample::Scalar(self.convert(&raw)?)
            }
            Some(n) => {
                let values = (1..=n)
                    .map(|index| {
                        let raw = evaluator.evaluate(&Expression::element(&self.name, index))?;
                        self.convert(&raw)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Sample::Vector(values)
            }
        };

        trace!(variable = %self.name, %sample, "Sampled");
        self.samples.push(sample);
        Ok(())
    }
}

impl TryFrom<&VariableDeclaration> for TypedVariable {
    type Error = CollectError;

    fn try_from(declaration: &VariableDeclaration) -> Result<Self, Self::Error> {
        Self::from_declaration(declaration)
    }
}

/// `name [v0, v1, ...]`, the per-variable summary logged after collection.
impl Display for TypedVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.name, self.samples.iter().join(", "))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{ReplayDebugger, ReplayScript};
    use gdbc_common::BreakpointLocation;

    use crate::Debugger;

    /// A replay debugger paused at the first of the given stops.
    pub(crate) fn paused<K, V>(
        stops: impl IntoIterator<Item = Vec<(K, V)>>,
    ) -> ReplayDebugger
    where
        K: Into<String>,
        V: Into<String>,
    {
        let script = stops.into_iter().fold(ReplayScript::default(), |s, stop| s.with_stop(stop));
        let mut debugger = ReplayDebugger::new(script);
        debugger.register_breakpoint(&BreakpointLocation::Line(10)).unwrap();
        debugger.resume().unwrap();
        debugger.take_events();
        debugger
    }

    #[test]
    fn test_construction_supported() {
        for kind in ["int", "float"] {
            for shape in [Shape::Scalar, Shape::Vector(1), Shape::Vector(2), Shape::Vector(5)] {
                let decl = VariableDeclaration::new("x", kind, shape.clone());
                let var = TypedVariable::from_declaration(&decl).unwrap();
                assert_eq!(var.shape(), &shape);
                assert!(var.is_empty());
            }
        }
    }

    #[test]
    fn test_construction_unsupported_type() {
        for kind in ["str", "bool", "double precision", ""] {
            let decl = VariableDeclaration::new("x", kind, Shape::Scalar);
            assert!(matches!(
                TypedVariable::try_from(&decl),
                Err(CollectError::UnsupportedType(_))
            ));
        }
    }

    #[test]
    fn test_sample_scalar_integer() {
        let mut debugger = paused([vec![("i", "3")]]);
        let mut var = TypedVariable::new("i", Kind::Integer, Shape::Scalar);

        var.sample(&mut debugger).unwrap();
        assert_eq!(var.samples(), &[Sample::Scalar(Value::Integer(3))]);
    }

    #[test]
    fn test_sample_vector_keeps_source_order() {
        let mut debugger = paused([vec![("res[1]", "5"), ("res[2]", "7")]]);
        let mut var = TypedVariable::new("res", Kind::Integer, Shape::Vector(2));

        var.sample(&mut debugger).unwrap();
        assert_eq!(var.samples(), &[Sample::Vector(vec![Value::Integer(5), Value::Integer(7)])]);
        assert_eq!(debugger.evaluations(), 2);
    }

    #[test]
    fn test_sample_vector_of_one() {
        let mut debugger = paused([vec![("x[1]", "2.5")]]);
        let mut var = TypedVariable::new("x", Kind::Real, Shape::Vector(1));

        var.sample(&mut debugger).unwrap();
        assert_eq!(var.samples(), &[Sample::Vector(vec![Value::Real(2.5)])]);
    }

    #[test]
    fn test_sample_unsupported_shape() {
        let mut debugger = paused([vec![("m", "1")]]);
        let mut var = TypedVariable::new("m", Kind::Real, Shape::Array(vec![3, 2]));

        let err = var.sample(&mut debugger).unwrap_err();
        assert!(matches!(err, CollectError::UnsupportedShape { ref name, .. } if name == "m"));
        assert!(var.is_empty());
        assert_eq!(debugger.evaluations(), 0);
    }

    #[test]
    fn test_sample_missing_element_appends_nothing() {
        let mut debugger = paused([vec![("res[1]", "5")]]);
        let mut var = TypedVariable::new("res", Kind::Integer, Shape::Vector(2));

        let err = var.sample(&mut debugger).unwrap_err();
        assert!(matches!(err, CollectError::Debugger(_)));
        assert!(var.is_empty());
    }

    #[test]
    fn test_sample_conversion_failure() {
        let mut debugger = paused([vec![("i", "<optimized out>")]]);
        let mut var = TypedVariable::new("i", Kind::Integer, Shape::Scalar);

        let err = var.sample(&mut debugger).unwrap_err();
        assert!(matches!(err, CollectError::Conversion { ref name, .. } if name == "i"));
    }

    #[test]
    fn test_display_summary() {
        let mut debugger = paused([vec![("res[1]", "1"), ("res[2]", "2")]]);
        let mut var = TypedVariable::new("res", Kind::Integer, Shape::Vector(2));
        var.sample(&mut debugger).unwrap();
        assert_eq!(var.to_string(), "res [[1, 2]]");
    }
}
