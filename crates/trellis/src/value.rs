use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A dynamic value passed through events, entity attributes and component
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// The absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// An ordered list of values.
    Array(Vec<Value>),
    /// A keyed map of values.
    Map(Attributes),
}

/// A keyed attribute map, used for entity attributes, event payloads and
/// request parameters.
pub type Attributes = BTreeMap<String, Value>;

/// Request parameters for collection fetches.
pub type Params = Attributes;

impl Value {
    /// Interpret the value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Interpret the value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Interpret the value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as an attribute map, if it is one.
    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Parse a value from a JSON document, the usual transport format for
    /// entity attributes and fetch responses.
    pub fn from_json(json: &str) -> Result<Value> {
        serde_json::from_str(json).map_err(|e| Error::Invalid(e.to_string()))
    }

    /// Serialize the value as a JSON document.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Internal(e.to_string()))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Attributes> for Value {
    fn from(v: Attributes) -> Self {
        Value::Map(v)
    }
}

/// Merge two attribute maps, with entries in `over` taking precedence over
/// entries in `base`.
pub fn merged(base: &Attributes, over: &Attributes) -> Attributes {
    let mut out = base.clone();
    for (k, v) in over {
        out.insert(k.clone(), v.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_accessors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(3).as_int(), Some(3));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::Null.as_bool(), None);
        assert_eq!(Value::Null.as_int(), None);
    }

    #[test]
    fn json_parses_into_the_natural_variants() {
        let v = Value::from_json(r#"{"id": 7, "name": "ada", "tags": ["x"], "gone": null}"#)
            .unwrap();
        let map = v.as_map().unwrap();
        assert_eq!(map.get("id"), Some(&Value::Int(7)));
        assert_eq!(map.get("name"), Some(&Value::from("ada")));
        assert_eq!(map.get("tags"), Some(&Value::Array(vec![Value::from("x")])));
        assert_eq!(map.get("gone"), Some(&Value::Null));
        assert!(Value::from_json("{nope").is_err());
    }

    #[test]
    fn merged_overrides_base() {
        let base = Attributes::from([
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Int(2)),
        ]);
        let over = Attributes::from([("b".to_string(), Value::Int(9))]);
        let out = merged(&base, &over);
        assert_eq!(out.get("a"), Some(&Value::Int(1)));
        assert_eq!(out.get("b"), Some(&Value::Int(9)));
    }
}
