//! Column types and the token parsers behind type inference.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal token recognized as a null cell (besides the empty string).
pub const NULL_TOKEN: &str = "NULL";

/// Storage type of a reference table column.
///
/// Variants are listed in inference priority order: a column is resolved to
/// the first type every non-null cell parses as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// 64-bit signed integer
    Int64,
    /// 64-bit float, culture-invariant decimal notation
    Float64,
    /// Boolean from `true/false/1/0/yes/no/t/f`
    Bool,
    /// UTF-8 text stored in the shared blob
    #[serde(alias = "text")]
    Utf8Text,
}

impl ColumnType {
    /// All types in inference priority order.
    pub const INFERENCE_ORDER: [ColumnType; 4] = [
        ColumnType::Int64,
        ColumnType::Float64,
        ColumnType::Bool,
        ColumnType::Utf8Text,
    ];

    /// Whether a non-null token is representable as this type.
    pub fn accepts(self, token: &str) -> bool {
        match self {
            ColumnType::Int64 => parse_int(token).is_some(),
            ColumnType::Float64 => parse_float(token).is_some(),
            ColumnType::Bool => parse_bool(token).is_some(),
            ColumnType::Utf8Text => true,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::Bool => "bool",
            ColumnType::Utf8Text => "utf8_text",
        };
        f.write_str(name)
    }
}

/// Whether a raw cell denotes null: the empty string or the `NULL` literal.
#[inline]
pub fn is_null_token(token: &str) -> bool {
    token.is_empty() || token == NULL_TOKEN
}

/// Parse an integer cell.
#[inline]
pub fn parse_int(token: &str) -> Option<i64> {
    token.parse().ok()
}

/// Parse a decimal cell. `NaN` and infinities are not decimals.
#[inline]
pub fn parse_float(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a boolean cell, case-insensitively.
pub fn parse_bool(token: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["true", "1", "yes", "t"];
    const FALSE: [&str; 4] = ["false", "0", "no", "f"];

    if TRUE.iter().any(|t| t.eq_ignore_ascii_case(token)) {
        Some(true)
    } else if FALSE.iter().any(|t| t.eq_ignore_ascii_case(token)) {
        Some(false)
    } else {
        None
    }
}
