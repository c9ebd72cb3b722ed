//! Macro Value System
//!
//! Live macro assignments handed to the shader library when a variant is
//! requested.
//!
//! # Architecture
//!
//! - [`MacroValue`] is a closed tagged union (`Bool`, `Int`, `Float`,
//!   `String`). Define mappers match on it exhaustively.
//! - [`MacroRecord`] stores `(Symbol, MacroValue)` pairs ordered by symbol,
//!   so lookups are binary searches over interned integers and two records
//!   built in different insertion orders compare equal.
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_shader::resources::MacroRecord;
//!
//! let mut macros = MacroRecord::new();
//! macros.set("USE_FOG", true);
//! macros.set("LIGHT_COUNT", 4);
//! macros.set("TONE_MAPPING", "aces");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::interner::{self, Symbol};

/// A single macro value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MacroValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl MacroValue {
    /// Whether the value enables a feature guarded by this macro.
    ///
    /// `false`, `0`, `0.0`, `""` and `"0"` are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty() && s != "0",
        }
    }

    /// Numeric view used by range defines.
    ///
    /// Floats are truncated toward zero and strings are parsed; anything
    /// unparsable reads as `0`.
    #[must_use]
    pub fn as_number(&self) -> i64 {
        match self {
            Self::Bool(b) => i64::from(*b),
            Self::Int(i) => *i,
            Self::Float(f) => f.trunc() as i64,
            Self::String(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64))
                .unwrap_or(0),
        }
    }
}

/// Booleans print as `1` / `0`, matching their preprocessor spelling.
impl fmt::Display for MacroValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", u8::from(*b)),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for MacroValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for MacroValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for MacroValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for MacroValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f32> for MacroValue {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for MacroValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for MacroValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for MacroValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// A set of live macro assignments.
///
/// Internally an ordered `Vec<(Symbol, MacroValue)>`; insertion and lookup
/// are O(log n).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroRecord {
    macros: Vec<(Symbol, MacroValue)>,
}

impl MacroRecord {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { macros: Vec::new() }
    }

    /// Set a macro, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<MacroValue>) {
        self.set_symbol(interner::intern(name), value.into());
    }

    #[inline]
    pub fn set_symbol(&mut self, name: Symbol, value: MacroValue) {
        match self.macros.binary_search_by_key(&name, |(k, _)| *k) {
            Ok(idx) => self.macros[idx].1 = value,
            Err(idx) => self.macros.insert(idx, (name, value)),
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<MacroValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<MacroValue> {
        let sym = interner::get(name)?;
        let idx = self.macros.binary_search_by_key(&sym, |(k, _)| *k).ok()?;
        Some(self.macros.remove(idx).1)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MacroValue> {
        interner::get(name).and_then(|sym| self.get_symbol(sym))
    }

    #[inline]
    #[must_use]
    pub fn get_symbol(&self, name: Symbol) -> Option<&MacroValue> {
        self.macros
            .binary_search_by_key(&name, |(k, _)| *k)
            .ok()
            .map(|idx| &self.macros[idx].1)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether the macro is present and truthy.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(MacroValue::is_truthy)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.macros.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Iterate as `(name, value)`, in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &MacroValue)> + '_ {
        self.macros
            .iter()
            .map(|(k, v)| (interner::resolve(*k), v))
    }

    /// Merge another record into this one; `other` wins on conflicts.
    pub fn merge(&mut self, other: &MacroRecord) {
        for (key, value) in &other.macros {
            self.set_symbol(*key, value.clone());
        }
    }

    #[must_use]
    pub fn merged_with(&self, other: &MacroRecord) -> MacroRecord {
        let mut result = self.clone();
        result.merge(other);
        result
    }
}

impl<K: AsRef<str>, V: Into<MacroValue>> FromIterator<(K, V)> for MacroRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = MacroRecord::new();
        for (k, v) in iter {
            record.set(k.as_ref(), v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut macros = MacroRecord::new();
        macros.set("USE_MAP", true);
        macros.set("LIGHT_COUNT", 4);

        assert!(macros.contains("USE_MAP"));
        assert!(!macros.contains("USE_AO_MAP"));
        assert_eq!(macros.get("LIGHT_COUNT"), Some(&MacroValue::Int(4)));
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = MacroRecord::new().with("B", 1).with("A", true);
        let b = MacroRecord::new().with("A", true).with("B", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = MacroRecord::new().with("A", 1).with("B", 2);
        let overrides = MacroRecord::new().with("B", 3).with("C", 4);
        base.merge(&overrides);

        assert_eq!(base.get("A"), Some(&MacroValue::Int(1)));
        assert_eq!(base.get("B"), Some(&MacroValue::Int(3)));
        assert_eq!(base.get("C"), Some(&MacroValue::Int(4)));
    }

    #[test]
    fn test_truthiness() {
        assert!(MacroValue::Bool(true).is_truthy());
        assert!(!MacroValue::Int(0).is_truthy());
        assert!(!MacroValue::from("0").is_truthy());
        assert!(!MacroValue::from("").is_truthy());
        assert!(MacroValue::from("aces").is_truthy());
    }

    #[test]
    fn test_display_and_numbers() {
        assert_eq!(MacroValue::Bool(true).to_string(), "1");
        assert_eq!(MacroValue::Bool(false).to_string(), "0");
        assert_eq!(MacroValue::Float(2.9).as_number(), 2);
        assert_eq!(MacroValue::from("3").as_number(), 3);
        assert_eq!(MacroValue::from("linear").as_number(), 0);
    }

    #[test]
    fn test_remove() {
        let mut macros = MacroRecord::new().with("USE_FOG", true);
        assert_eq!(macros.remove("USE_FOG"), Some(MacroValue::Bool(true)));
        assert!(macros.is_empty());
        assert_eq!(macros.remove("USE_FOG"), None);
    }
}
