// File: src/message.rs
// Purpose: Error message templates shared by the evaluator and the serializer

use crate::rule::{RequireRule, UniqueRule};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

// Positional placeholders: {0} field, {1} property, {2} value, {3} minimum, {4} maximum
static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\d+)\}").unwrap());

/// Message templates for collection rules
///
/// Placeholders:
/// - `{0}` display name of the collection field
/// - `{1}` display name of the element property
/// - `{2}` required value
/// - `{3}` minimum
/// - `{4}` maximum (or `no_limit` when the rule has none)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTemplates {
    /// Boolean value, no maximum
    #[serde(default = "default_select_at_least")]
    pub select_at_least: String,

    /// Boolean value with a maximum
    #[serde(default = "default_select_between")]
    pub select_between: String,

    /// Non-boolean value, no maximum
    #[serde(default = "default_equal_at_least")]
    pub equal_at_least: String,

    /// Non-boolean value with a maximum
    #[serde(default = "default_equal_between")]
    pub equal_between: String,

    #[serde(default = "default_unique")]
    pub unique: String,

    /// Substituted for `{4}` when no maximum is set
    #[serde(default = "default_no_limit")]
    pub no_limit: String,
}

fn default_select_at_least() -> String {
    "Please select at least {3} item(s) in {0}".to_string()
}

fn default_select_between() -> String {
    "Please select between {3} and {4} item(s) in {0}".to_string()
}

fn default_equal_at_least() -> String {
    "At least {3} item(s) in {0} must have {1} equal to {2}".to_string()
}

fn default_equal_between() -> String {
    "Between {3} and {4} item(s) in {0} must have {1} equal to {2}".to_string()
}

fn default_unique() -> String {
    "The value of {1} must be unique".to_string()
}

fn default_no_limit() -> String {
    "no limit".to_string()
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            select_at_least: default_select_at_least(),
            select_between: default_select_between(),
            equal_at_least: default_equal_at_least(),
            equal_between: default_equal_between(),
            unique: default_unique(),
            no_limit: default_no_limit(),
        }
    }
}

impl MessageTemplates {
    /// Message for a require rule attached to the field `field_name`
    pub fn require_message<T>(&self, rule: &RequireRule<T>, field_name: &str) -> String {
        let template = rule.message().unwrap_or_else(|| {
            match (rule.required_value().is_bool(), rule.maximum().is_some()) {
                (true, false) => self.select_at_least.as_str(),
                (true, true) => self.select_between.as_str(),
                (false, false) => self.equal_at_least.as_str(),
                (false, true) => self.equal_between.as_str(),
            }
        });

        let maximum = rule
            .maximum()
            .map(|max| max.to_string())
            .unwrap_or_else(|| self.no_limit.clone());

        format_message(
            template,
            &[
                field_name,
                rule.property().display_name(),
                &rule.required_value().to_string(),
                &rule.minimum().to_string(),
                &maximum,
            ],
        )
    }

    /// Message for a unique rule attached to the field `field_name`
    pub fn unique_message<T>(&self, rule: &UniqueRule<T>, field_name: &str) -> String {
        let template = rule.message().unwrap_or(self.unique.as_str());
        format_message(template, &[field_name, rule.property().display_name()])
    }
}

/// Substitute `{n}` placeholders with `args[n]`.
///
/// Placeholders without a matching argument are left as written.
pub fn format_message(template: &str, args: &[&str]) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| args.get(index))
                .map(|arg| arg.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::PropertyAccessor;
    use crate::value::Value;

    #[test]
    fn test_format_message() {
        assert_eq!(format_message("{0} and {1}", &["a", "b"]), "a and b");
        assert_eq!(format_message("{1}{1}", &["a", "b"]), "bb");
        assert_eq!(format_message("{7} stays", &["a"]), "{7} stays");
        assert_eq!(format_message("no placeholders", &[]), "no placeholders");
    }

    #[test]
    fn test_boolean_value_uses_select_phrasing() {
        let templates = MessageTemplates::default();
        let rule = RequireRule::new(PropertyAccessor::<Value>::field("IsSelected"), true);
        assert_eq!(
            templates.require_message(&rule, "Roles"),
            "Please select at least 1 item(s) in Roles"
        );

        let rule = rule.with_maximum(2).unwrap();
        assert_eq!(
            templates.require_message(&rule, "Roles"),
            "Please select between 1 and 2 item(s) in Roles"
        );
    }

    #[test]
    fn test_other_values_use_equal_phrasing() {
        let templates = MessageTemplates::default();
        let rule = RequireRule::new(PropertyAccessor::<Value>::field("Role"), "Admin")
            .with_minimum(2)
            .unwrap();
        assert_eq!(
            templates.require_message(&rule, "Users"),
            "At least 2 item(s) in Users must have Role equal to Admin"
        );
    }

    #[test]
    fn test_missing_maximum_uses_no_limit_text() {
        let templates = MessageTemplates {
            no_limit: "unlimited".to_string(),
            ..MessageTemplates::default()
        };
        let rule = RequireRule::new(PropertyAccessor::<Value>::field("Role"), "Admin")
            .with_message("{3} to {4}");
        assert_eq!(templates.require_message(&rule, "Users"), "1 to unlimited");
    }

    #[test]
    fn test_unique_message_uses_display_name() {
        let templates = MessageTemplates::default();
        let rule = UniqueRule::new(
            PropertyAccessor::<Value>::field("Email").with_display_name("Email address"),
        );
        assert_eq!(
            templates.unique_message(&rule, "Contacts"),
            "The value of Email address must be unique"
        );
    }
}
