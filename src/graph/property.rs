//! Property values carried by nodes and edges

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Property value stored on a node or edge.
///
/// Dates are kept as ISO `YYYY-MM-DD` strings so that they sort and compare
/// the same way in the embedded store and in a remote Cypher database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Null,
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of integers and floats
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Equality as a Cypher property filter sees it: `1 = 1.0` holds.
    pub fn matches(&self, other: &PropertyValue) -> bool {
        match (self, other) {
            (PropertyValue::Integer(_), PropertyValue::Float(_))
            | (PropertyValue::Float(_), PropertyValue::Integer(_)) => {
                self.as_float() == other.as_float()
            }
            _ => self == other,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::String(s) => serde_json::Value::String(s.clone()),
            PropertyValue::Integer(i) => serde_json::Value::from(*i),
            PropertyValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropertyValue::Boolean(b) => serde_json::Value::Bool(*b),
            PropertyValue::Null => serde_json::Value::Null,
        }
    }

    /// Convert a JSON scalar returned by a remote store. Lists and maps
    /// have no property representation here and become `Null`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => PropertyValue::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => PropertyValue::Integer(i),
                None => n.as_f64().map(PropertyValue::Float).unwrap_or(PropertyValue::Null),
            },
            serde_json::Value::String(s) => PropertyValue::String(s.clone()),
            _ => PropertyValue::Null,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{}", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{}", fl),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Null => write!(f, "null"),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

/// Property map for nodes and edges
pub type PropertyMap = HashMap<String, PropertyValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        let s: PropertyValue = "555-847-2931".into();
        assert_eq!(s.as_string(), Some("555-847-2931"));
        assert_eq!(PropertyValue::from(47i64).as_integer(), Some(47));
        assert_eq!(PropertyValue::from(true).as_boolean(), Some(true));
        assert_eq!(PropertyValue::from(12).as_float(), Some(12.0));
        assert!(PropertyValue::Null.is_null());
    }

    #[test]
    fn test_numeric_matching_crosses_int_and_float() {
        assert!(PropertyValue::Integer(32000).matches(&PropertyValue::Float(32000.0)));
        assert!(!PropertyValue::Integer(1).matches(&PropertyValue::String("1".into())));
        assert!(PropertyValue::Boolean(false).matches(&PropertyValue::Boolean(false)));
    }

    #[test]
    fn test_json_round_trip_of_scalars() {
        let value = serde_json::json!(28500.5);
        assert_eq!(PropertyValue::from_json(&value), PropertyValue::Float(28500.5));
        assert_eq!(PropertyValue::from_json(&serde_json::json!(7)), PropertyValue::Integer(7));
        assert_eq!(PropertyValue::from_json(&serde_json::json!([1, 2])), PropertyValue::Null);
        assert_eq!(PropertyValue::Boolean(true).to_json(), serde_json::json!(true));
    }

    #[test]
    fn test_untagged_yaml_scalars() {
        let v: PropertyValue = serde_yaml::from_str("false").unwrap();
        assert_eq!(v, PropertyValue::Boolean(false));
        let v: PropertyValue = serde_yaml::from_str("\"PROV_S3_SUNRISE\"").unwrap();
        assert_eq!(v.as_string(), Some("PROV_S3_SUNRISE"));
    }
}
