//! Client metadata for collection rules.
//!
//! Every rule is exported as a flat set of `data-col-*` attributes on the
//! field's message element. The client engine reads the same keys back.
//!
//! | key | value |
//! |---|---|
//! | `data-col-message-for` | fully-qualified name of the collection field |
//! | `data-col-require` | formatted error message |
//! | `data-col-require-property` | element property name |
//! | `data-col-require-value` | required value (`true`/`false` for booleans) |
//! | `data-col-require-type` | `boolean`, `number` or `string` |
//! | `data-col-require-minimum` | minimum matches |
//! | `data-col-require-maximum` | maximum matches, omitted when unbounded |
//! | `data-col-unique` | formatted error message |
//! | `data-col-unique-property` | element property name |
//! | `data-col-valid-class` | class shown while every rule passes |
//! | `data-col-error-class` | class shown while a rule fails |

use crate::message::MessageTemplates;
use crate::rule::Rule;
use crate::value::Value;
use serde::{Serialize, Serializer};
use std::fmt::Write;

pub const PREFIX: &str = "data-col-";
pub const MESSAGE_FOR: &str = "data-col-message-for";
pub const REQUIRE: &str = "data-col-require";
pub const REQUIRE_PROPERTY: &str = "data-col-require-property";
pub const REQUIRE_VALUE: &str = "data-col-require-value";
pub const REQUIRE_TYPE: &str = "data-col-require-type";
pub const REQUIRE_MINIMUM: &str = "data-col-require-minimum";
pub const REQUIRE_MAXIMUM: &str = "data-col-require-maximum";
pub const UNIQUE: &str = "data-col-unique";
pub const UNIQUE_PROPERTY: &str = "data-col-unique-property";
pub const VALID_CLASS: &str = "data-col-valid-class";
pub const ERROR_CLASS: &str = "data-col-error-class";

/// Ordered `key → primitive` pairs for one message element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializedRuleAttributes {
    entries: Vec<(String, Value)>,
}

impl SerializedRuleAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`, keeping the original position on overwrite
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Append every entry of `other`; later keys overwrite earlier ones
    pub fn merge(&mut self, other: SerializedRuleAttributes) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Attribute text for `key` as it appears in the rendered element
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(Value::to_string)
    }

    /// Render as `key="value"` pairs, escaping values for HTML
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{}=\"", key);
            let _ = write!(maud::Escaper::new(&mut out), "{}", value);
            out.push('"');
        }
        out
    }

    /// JSON object with the same keys.
    ///
    /// `serde_json::Map` sorts its keys; serialize `self` directly (e.g. with
    /// `serde_json::to_string`) when insertion order matters.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(v.clone())))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Serialize for SerializedRuleAttributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a SerializedRuleAttributes {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Export `rule` for the client.
///
/// The message is produced by the same [`MessageTemplates`] call the
/// evaluator uses, so both sides show identical text.
pub fn serialize_rule<T>(
    rule: &Rule<T>,
    field_name: &str,
    templates: &MessageTemplates,
) -> SerializedRuleAttributes {
    let mut attributes = SerializedRuleAttributes::new();
    match rule {
        Rule::Require(rule) => {
            let value = rule.required_value();
            attributes.insert(REQUIRE, templates.require_message(rule, field_name));
            attributes.insert(REQUIRE_PROPERTY, rule.property().name());
            attributes.insert(REQUIRE_VALUE, value.clone());
            if let Some(kind) = value.kind() {
                attributes.insert(REQUIRE_TYPE, kind.as_str());
            }
            attributes.insert(REQUIRE_MINIMUM, rule.minimum());
            if let Some(maximum) = rule.maximum() {
                attributes.insert(REQUIRE_MAXIMUM, maximum);
            }
        }
        Rule::Unique(rule) => {
            attributes.insert(UNIQUE, templates.unique_message(rule, field_name));
            attributes.insert(UNIQUE_PROPERTY, rule.property().name());
        }
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::PropertyAccessor;
    use crate::rule::{RequireRule, UniqueRule};

    #[test]
    fn test_require_keys_in_order() {
        let rule: Rule<Value> = RequireRule::new(PropertyAccessor::field("IsSelected"), true).into();
        let attributes = serialize_rule(&rule, "Roles", &MessageTemplates::default());
        assert_eq!(
            attributes.keys().collect::<Vec<_>>(),
            vec![
                REQUIRE,
                REQUIRE_PROPERTY,
                REQUIRE_VALUE,
                REQUIRE_TYPE,
                REQUIRE_MINIMUM
            ]
        );
        assert_eq!(attributes.text(REQUIRE_VALUE).as_deref(), Some("true"));
        assert_eq!(attributes.text(REQUIRE_TYPE).as_deref(), Some("boolean"));
        assert_eq!(attributes.text(REQUIRE_MINIMUM).as_deref(), Some("1"));
        assert!(!attributes.contains_key(REQUIRE_MAXIMUM));
    }

    #[test]
    fn test_maximum_emitted_when_set() {
        let rule: Rule<Value> = RequireRule::new(PropertyAccessor::field("Role"), "Admin")
            .with_minimum(2)
            .and_then(|r| r.with_maximum(3))
            .unwrap()
            .into();
        let attributes = serialize_rule(&rule, "Users", &MessageTemplates::default());
        assert_eq!(attributes.get(REQUIRE_MAXIMUM), Some(&Value::Number(3.0)));
        assert_eq!(attributes.text(REQUIRE_TYPE).as_deref(), Some("string"));
    }

    #[test]
    fn test_unique_keys() {
        let rule: Rule<Value> = UniqueRule::new(PropertyAccessor::field("Email")).into();
        let attributes = serialize_rule(&rule, "Contacts", &MessageTemplates::default());
        assert_eq!(attributes.len(), 2);
        assert_eq!(
            attributes.text(UNIQUE).as_deref(),
            Some("The value of Email must be unique")
        );
        assert_eq!(attributes.text(UNIQUE_PROPERTY).as_deref(), Some("Email"));
    }

    #[test]
    fn test_render_escapes_values() {
        let mut attributes = SerializedRuleAttributes::new();
        attributes.insert(UNIQUE, "Say \"hi\" <b>");
        assert_eq!(
            attributes.render(),
            "data-col-unique=\"Say &quot;hi&quot; &lt;b&gt;\""
        );
    }

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut attributes = SerializedRuleAttributes::new();
        attributes.insert("a", 1);
        attributes.insert("b", 2);
        attributes.insert("a", 3);
        assert_eq!(attributes.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(attributes.get("a"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_to_json() {
        let rule: Rule<Value> = UniqueRule::new(PropertyAccessor::field("Email")).into();
        let attributes = serialize_rule(&rule, "Contacts", &MessageTemplates::default());
        assert_eq!(
            attributes.to_json(),
            serde_json::json!({
                "data-col-unique": "The value of Email must be unique",
                "data-col-unique-property": "Email"
            })
        );
    }

    #[test]
    fn test_serialize_keeps_insertion_order() {
        let rule: Rule<Value> = RequireRule::new(PropertyAccessor::field("Role"), "Admin")
            .with_maximum(2)
            .unwrap()
            .into();
        let attributes = serialize_rule(&rule, "Users", &MessageTemplates::default());

        let text = serde_json::to_string(&attributes).unwrap();
        let positions: Vec<usize> = attributes
            .keys()
            .map(|key| text.find(&format!("\"{}\"", key)).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);

        // the Map built by to_json orders keys alphabetically instead
        let json_keys: Vec<String> = match attributes.to_json() {
            serde_json::Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        let mut alphabetical = json_keys.clone();
        alphabetical.sort();
        assert_eq!(json_keys, alphabetical);
    }
}
