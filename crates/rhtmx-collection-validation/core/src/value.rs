// File: src/value.rs
// Purpose: Tagged values read off collection elements and carried to the client

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Values a property accessor can produce
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(HashMap<String, Value>),
    #[default]
    Null,
}

/// Type tag of a primitive value, serialized next to the value so the client
/// picks its comparison branch from the tag instead of sniffing the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Boolean,
    Number,
    String,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim() {
            "boolean" => Some(ValueKind::Boolean),
            "number" => Some(ValueKind::Number),
            "string" => Some(ValueKind::String),
            _ => None,
        }
    }

    /// Best guess for a token that arrived without a tag
    pub fn infer(token: &str) -> Self {
        if token == "true" || token == "false" {
            ValueKind::Boolean
        } else {
            ValueKind::String
        }
    }
}

impl Value {
    /// Tag for primitive values, `None` for arrays, objects and null
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Bool(_) => Some(ValueKind::Boolean),
            Value::Number(_) => Some(ValueKind::Number),
            Value::String(_) => Some(ValueKind::String),
            _ => None,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the variant, used in configuration error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Null => "null",
        }
    }

    /// Look up a key on an object value
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Read a raw control value as a value of the given kind.
    ///
    /// Booleans accept `true`/`false` in any case, which covers both the
    /// lowercase attribute token and the `True`/`False` some binders emit.
    pub fn parse_as(kind: ValueKind, text: &str) -> Option<Value> {
        match kind {
            ValueKind::Boolean => {
                let text = text.trim();
                if text.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            ValueKind::Number => text.trim().parse::<f64>().ok().map(Value::Number),
            ValueKind::String => Some(Value::String(text.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                // Format number nicely (remove .0 for integers inside i64 range)
                if n.fract() == 0.0 && n.is_finite() && n.abs() < i64::MAX as f64 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => f.write_str(s),
            Value::Array(arr) => {
                let items: Vec<String> = arr.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Object(_) => f.write_str("[Object]"),
            Value::Null => Ok(()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(obj: HashMap<String, Value>) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < i64::MAX as f64 {
                    serde_json::Value::from(n as i64)
                } else {
                    serde_json::Number::from_f64(n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_drops_trailing_zero() {
        assert_eq!(Value::from(2).to_string(), "2");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_display_large_whole_numbers_are_not_clamped() {
        assert_eq!(Value::from(1e20).to_string(), "100000000000000000000");
        assert_eq!(Value::from(-1e20).to_string(), "-100000000000000000000");
        assert_eq!(
            Value::parse_as(ValueKind::Number, &Value::from(1e20).to_string()),
            Some(Value::Number(1e20))
        );
    }

    #[test]
    fn test_kind_tags_primitives_only() {
        assert_eq!(Value::from("Admin").kind(), Some(ValueKind::String));
        assert_eq!(Value::from(false).kind(), Some(ValueKind::Boolean));
        assert_eq!(Value::from(3).kind(), Some(ValueKind::Number));
        assert_eq!(Value::Array(vec![]).kind(), None);
        assert_eq!(Value::Null.kind(), None);
    }

    #[test]
    fn test_parse_as() {
        assert_eq!(Value::parse_as(ValueKind::Boolean, "True"), Some(Value::Bool(true)));
        assert_eq!(Value::parse_as(ValueKind::Boolean, "false"), Some(Value::Bool(false)));
        assert_eq!(Value::parse_as(ValueKind::Boolean, "on"), None);
        assert_eq!(Value::parse_as(ValueKind::Number, " 4 "), Some(Value::Number(4.0)));
        assert_eq!(Value::parse_as(ValueKind::Number, "four"), None);
        assert_eq!(
            Value::parse_as(ValueKind::String, "Admin"),
            Some(Value::String("Admin".to_string()))
        );
    }

    #[test]
    fn test_infer_kind_from_token() {
        assert_eq!(ValueKind::infer("true"), ValueKind::Boolean);
        assert_eq!(ValueKind::infer("True"), ValueKind::String);
        assert_eq!(ValueKind::infer("3"), ValueKind::String);
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"Email": "a@b.c", "IsSelected": true, "Rank": 2});
        let value = Value::from(json);
        assert_eq!(value.get("Email"), Some(&Value::from("a@b.c")));
        assert_eq!(value.get("IsSelected"), Some(&Value::Bool(true)));
        assert_eq!(value.get("Rank"), Some(&Value::Number(2.0)));
        assert_eq!(value.get("Missing"), None);
    }

    #[test]
    fn test_json_round_trip_keeps_integers() {
        let json = serde_json::Value::from(Value::from(3));
        assert_eq!(json, serde_json::json!(3));
    }
}
