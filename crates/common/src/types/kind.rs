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

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The target type every raw debugger value of a variable is converted to.
///
/// This is a closed set: adding a kind means adding a variant here and a
/// conversion arm in [`Kind::convert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Integral values, stored as `i64`.
    #[display("integer")]
    Integer,
    /// Floating point values, stored as `f64`.
    #[display("real")]
    Real,
}

/// A declared kind outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported variable type `{0}`, expected one of: int, integer, float, real")]
pub struct UnsupportedTypeError(pub String);

impl FromStr for Kind {
    type Err = UnsupportedTypeError;

    /// Accepts `int`/`integer` and `float`/`real`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(Self::Integer),
            "float" | "real" => Ok(Self::Real),
            _ => Err(UnsupportedTypeError(s.to_string())),
        }
    }
}

/// A raw value text could not be converted to the requested kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert `{raw}` to {kind}")]
pub struct ConversionError {
    /// The raw text as reported by the debugger.
    pub raw: String,
    /// The requested kind.
    pub kind: Kind,
}

impl Kind {
    /// Converts a raw debugger value to this kind.
    ///
    /// Debuggers decorate some values (`97 'a'` for characters), so only the
    /// first whitespace-separated token is considered. Integers accept decimal,
    /// `0x` hexadecimal and floating point text, the latter truncated toward zero.
    /// Reals accept anything `f64` parses plus Fortran `d` exponents (`1.5d0`)
    /// and GDB's NaN payloads (`nan(0x8000000000000)`). Both kinds read logicals
    /// (`.TRUE.`, `false`) as one and zero.
    pub fn convert(self, raw: &str) -> Result<Value, ConversionError> {
        let error = || ConversionError { raw: raw.to_string(), kind: self };
        let token = raw.split_whitespace().next().ok_or_else(error)?;

        match self {
            Self::Integer => parse_integer(token).map(Value::Integer).ok_or_else(error),
            Self::Real => parse_real(token).map(Value::Real).ok_or_else(error),
        }
    }
}

fn parse_integer(token: &str) -> Option<i64> {
    if let Ok(value) = token.parse::<i64>() {
        return Some(value);
    }

    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        let value = i64::from_str_radix(hex, 16).ok()?;
        return Some(if negative { -value } else { value });
    }

    let real = parse_real(token)?;
    if real.is_finite() && real.trunc() >= i64::MIN as f64 && real.trunc() <= i64::MAX as f64 {
        Some(real.trunc() as i64)
    } else {
        None
    }
}

fn parse_real(token: &str) -> Option<f64> {
    if let Some(flag) = parse_logical(token) {
        return Some(if flag { 1.0 } else { 0.0 });
    }

    let token = strip_nan_payload(token);
    token.parse::<f64>().ok().or_else(|| token.replace(['d', 'D'], "e").parse::<f64>().ok())
}

fn parse_logical(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        ".true." | "true" => Some(true),
        ".false." | "false" => Some(false),
        _ => None,
    }
}

/// `nan(0x8000000000000)` -> `nan`
fn strip_nan_payload(token: &str) -> &str {
    match token.split_once('(') {
        Some((head, _)) if head.trim_start_matches(['-', '+']).eq_ignore_ascii_case("nan") => head,
        _ => token,
    }
}

/// One converted scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, derive_more::From)]
#[serde(untagged)]
pub enum Value {
    /// An integral value.
    Integer(i64),
    /// A floating point value.
    Real(f64),
}

impl Value {
    /// The kind this value belongs to.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Integer(_) => Kind::Integer,
            Self::Real(_) => Kind::Real,
        }
    }
}

/// Canonical, locale-independent text: plain decimal for integers, and the
/// shortest round-tripping form for reals with integral reals keeping `.0`.
/// NaN of any sign or payload prints as `nan`.
impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Real(value) if value.is_nan() => f.write_str("nan"),
            Self::Real(value) => write!(f, "{value:?}"),
        }
    }
}
