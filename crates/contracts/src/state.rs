//! Loosely-typed contract state values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A value in a contract's string-keyed state map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum StateValue {
    Text(String),
    Flag(bool),
    Number(f64),
    Timestamp(DateTime<Utc>),
}

impl StateValue {
    /// Get the inner string, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StateValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the inner bool, if this is a flag value.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            StateValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the inner number, if this is a numeric value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            StateValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the inner timestamp, if this is a timestamp value.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            StateValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Text(s) => write!(f, "{}", s),
            StateValue::Flag(b) => write!(f, "{}", b),
            StateValue::Number(n) => write!(f, "{}", n),
            StateValue::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::Text(s.to_string())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue::Text(s)
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        StateValue::Flag(b)
    }
}

impl From<f64> for StateValue {
    fn from(n: f64) -> Self {
        StateValue::Number(n)
    }
}

impl From<DateTime<Utc>> for StateValue {
    fn from(t: DateTime<Utc>) -> Self {
        StateValue::Timestamp(t)
    }
}

/// A contract's persistent string-keyed state map.
pub type ContractState = HashMap<String, StateValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(StateValue::from("Verified").as_text(), Some("Verified"));
        assert_eq!(StateValue::from(true).as_flag(), Some(true));
        assert_eq!(StateValue::from(2.0).as_number(), Some(2.0));
        assert!(StateValue::from("x").as_flag().is_none());

        let now = Utc::now();
        assert_eq!(StateValue::from(now).as_timestamp(), Some(now));
    }

    #[test]
    fn test_serde_roundtrip() {
        let value = StateValue::Timestamp(Utc::now());
        let json = serde_json::to_string(&value).unwrap();
        let back: StateValue = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);
    }
}
