// File: src/rule.rs
// Purpose: Declarative collection rules (require N..M matches, unique values)

use crate::accessor::PropertyAccessor;
use crate::error::{Result, RuleError};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of rule that can be attached to a collection field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Require,
    Unique,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Require => "require",
            RuleKind::Unique => "unique",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requires between `minimum` and `maximum` elements whose property equals a value.
///
/// `minimum` defaults to 1 and `maximum` to no limit.
pub struct RequireRule<T> {
    property: PropertyAccessor<T>,
    required_value: Value,
    minimum: usize,
    maximum: Option<usize>,
    message: Option<String>,
}

impl<T> RequireRule<T> {
    pub fn new(property: PropertyAccessor<T>, required_value: impl Into<Value>) -> Self {
        Self {
            property,
            required_value: required_value.into(),
            minimum: 1,
            maximum: None,
            message: None,
        }
    }

    /// Set the minimum number of matching elements
    pub fn with_minimum(mut self, minimum: usize) -> Result<Self> {
        self.minimum = minimum;
        self.check()?;
        Ok(self)
    }

    /// Set the maximum number of matching elements
    pub fn with_maximum(mut self, maximum: usize) -> Result<Self> {
        self.maximum = Some(maximum);
        self.check()?;
        Ok(self)
    }

    /// Override the message template (placeholders `{0}`..`{4}`)
    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    pub fn property(&self) -> &PropertyAccessor<T> {
        &self.property
    }

    pub fn required_value(&self) -> &Value {
        &self.required_value
    }

    pub fn minimum(&self) -> usize {
        self.minimum
    }

    pub fn maximum(&self) -> Option<usize> {
        self.maximum
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Validate the rule parameters
    pub fn check(&self) -> Result<()> {
        check_property_name(self.property.name())?;
        check_bounds(self.minimum, self.maximum)?;
        if self.required_value.kind().is_none() {
            return Err(RuleError::InvalidRuleConfiguration(format!(
                "The required value must be a boolean, number or string (found {})",
                self.required_value.type_name()
            )));
        }
        Ok(())
    }
}

/// Requires the property to hold a distinct value on every element
pub struct UniqueRule<T> {
    property: PropertyAccessor<T>,
    message: Option<String>,
}

impl<T> UniqueRule<T> {
    pub fn new(property: PropertyAccessor<T>) -> Self {
        Self {
            property,
            message: None,
        }
    }

    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    pub fn property(&self) -> &PropertyAccessor<T> {
        &self.property
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn check(&self) -> Result<()> {
        check_property_name(self.property.name())
    }
}

/// A rule attached to a collection of `T`
pub enum Rule<T> {
    Require(RequireRule<T>),
    Unique(UniqueRule<T>),
}

impl<T> Rule<T> {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Require(_) => RuleKind::Require,
            Rule::Unique(_) => RuleKind::Unique,
        }
    }

    pub fn property(&self) -> &PropertyAccessor<T> {
        match self {
            Rule::Require(rule) => rule.property(),
            Rule::Unique(rule) => rule.property(),
        }
    }

    pub fn check(&self) -> Result<()> {
        match self {
            Rule::Require(rule) => rule.check(),
            Rule::Unique(rule) => rule.check(),
        }
    }
}

impl<T> From<RequireRule<T>> for Rule<T> {
    fn from(rule: RequireRule<T>) -> Self {
        Rule::Require(rule)
    }
}

impl<T> From<UniqueRule<T>> for Rule<T> {
    fn from(rule: UniqueRule<T>) -> Self {
        Rule::Unique(rule)
    }
}

// Manual impls: the accessor is shared, so `T` needs neither Clone nor Debug.
impl<T> Clone for RequireRule<T> {
    fn clone(&self) -> Self {
        Self {
            property: self.property.clone(),
            required_value: self.required_value.clone(),
            minimum: self.minimum,
            maximum: self.maximum,
            message: self.message.clone(),
        }
    }
}

impl<T> fmt::Debug for RequireRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequireRule")
            .field("property", &self.property)
            .field("required_value", &self.required_value)
            .field("minimum", &self.minimum)
            .field("maximum", &self.maximum)
            .field("message", &self.message)
            .finish()
    }
}

impl<T> Clone for UniqueRule<T> {
    fn clone(&self) -> Self {
        Self {
            property: self.property.clone(),
            message: self.message.clone(),
        }
    }
}

impl<T> fmt::Debug for UniqueRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueRule")
            .field("property", &self.property)
            .field("message", &self.message)
            .finish()
    }
}

impl<T> Clone for Rule<T> {
    fn clone(&self) -> Self {
        match self {
            Rule::Require(rule) => Rule::Require(rule.clone()),
            Rule::Unique(rule) => Rule::Unique(rule.clone()),
        }
    }
}

impl<T> fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Require(rule) => rule.fmt(f),
            Rule::Unique(rule) => rule.fmt(f),
        }
    }
}

fn check_property_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RuleError::InvalidRuleConfiguration(
            "The property name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Shared by the server rules and the client reconstruction
pub(crate) fn check_bounds(minimum: usize, maximum: Option<usize>) -> Result<()> {
    if minimum < 1 {
        return Err(RuleError::InvalidRuleConfiguration(
            "The minimum must be greater than 0".to_string(),
        ));
    }
    if let Some(maximum) = maximum {
        if maximum < minimum {
            return Err(RuleError::InvalidRuleConfiguration(format!(
                "The maximum must be greater than or equal to the minimum ('{}')",
                minimum
            )));
        }
    }
    Ok(())
}
