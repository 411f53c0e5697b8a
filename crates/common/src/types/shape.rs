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

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The declared arity of a variable.
///
/// `Array` exists so that declarations the collector cannot handle are still
/// representable; they are rejected when sampled or exported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// A single value.
    Scalar,
    /// A fixed-length one-dimensional array.
    Vector(usize),
    /// Any other dimension list.
    Array(Vec<usize>),
}

impl Shape {
    /// Builds a shape from a dimension list.
    ///
    /// `[1]` is a scalar and `[n]` with `n > 1` is a vector. Everything else,
    /// including an empty list, a zero extent and multi-dimensional lists, maps
    /// to [`Shape::Array`].
    pub fn from_dimensions(dimensions: &[usize]) -> Self {
        match dimensions {
            [1] => Self::Scalar,
            [n] if *n > 1 => Self::Vector(*n),
            _ => Self::Array(dimensions.to_vec()),
        }
    }

    /// The element count of a supported shape: `Some(None)` for a scalar,
    /// `Some(Some(n))` for a vector, `None` when the shape is unsupported.
    pub fn supported_len(&self) -> Option<Option<usize>> {
        match self {
            Self::Scalar => Some(None),
            Self::Vector(n) if *n >= 1 => Some(Some(*n)),
            _ => None,
        }
    }

    /// Whether the collector can sample and export this shape.
    pub fn is_supported(&self) -> bool {
        self.supported_len().is_some()
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Vector(n) => write!(f, "vector({n})"),
            Self::Array(dims) => write!(f, "array({})", dims.iter().join("x")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dimensions() {
        assert_eq!(Shape::from_dimensions(&[1]), Shape::Scalar);
        assert_eq!(Shape::from_dimensions(&[2]), Shape::Vector(2));
        assert_eq!(Shape::from_dimensions(&[3, 2]), Shape::Array(vec![3, 2]));
        assert_eq!(Shape::from_dimensions(&[]), Shape::Array(vec![]));
        assert_eq!(Shape::from_dimensions(&[0]), Shape::Array(vec![0]));
    }

    #[test]
    fn test_supported() {
        assert_eq!(Shape::Scalar.supported_len(), Some(None));
        assert_eq!(Shape::Vector(1).supported_len(), Some(Some(1)));
        assert_eq!(Shape::Vector(5).supported_len(), Some(Some(5)));
        assert!(!Shape::Vector(0).is_supported());
        assert!(!Shape::Array(vec![3, 2]).is_supported());
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::Scalar.to_string(), "scalar");
        assert_eq!(Shape::Vector(3).to_string(), "vector(3)");
        assert_eq!(Shape::Array(vec![3, 2]).to_string(), "array(3x2)");
    }
}
