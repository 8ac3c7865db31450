//! Lenient JSON value helpers.
//!
//! Both weather services report numbers inconsistently: sometimes as JSON
//! numbers, sometimes as strings such as `"54"`, `"87%"` or `"NA"`.

use serde::Deserialize;

/// A number that may arrive as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Lenient {
    /// A JSON number.
    Number(f64),
    /// A string that may hold a number.
    Text(String),
}

impl Lenient {
    /// Returns the numeric value, if there is one.
    ///
    /// Strings are trimmed and a trailing `%` is dropped; anything that
    /// still fails to parse (`"NA"`, `"--"`, empty) yields `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(s) => s
                .trim()
                .trim_end_matches('%')
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
        }
    }

    /// Returns the value as a percentage in `0..=100`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn as_percent(&self) -> Option<u8> {
        self.as_f64().map(|v| v.round().clamp(0.0, 100.0) as u8)
    }
}

/// Reads an optional lenient value.
pub fn opt_f64(value: Option<&Lenient>) -> Option<f64> {
    value.and_then(Lenient::as_f64)
}

/// A field that holds either a single object or an array of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A lone object.
    One(T),
    /// An array.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flattens into a vector.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}
