// File: src/error.rs
// Purpose: Configuration errors raised while evaluating or registering rules

use crate::rule::RuleKind;

/// A rule that cannot be evaluated because it was declared or attached wrongly.
///
/// These are programming errors, not user input failures: a collection that
/// fails a rule produces an invalid [`EvaluationResult`](crate::EvaluationResult)
/// instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("The field '{field}' the rule is applied to must be a collection (found {found})")]
    NotEnumerable { field: String, found: &'static str },

    #[error("Item {index} in the collection does not contain a property named '{property}'")]
    UnknownProperty { property: String, index: usize },

    #[error("Invalid rule configuration: {0}")]
    InvalidRuleConfiguration(String),

    #[error("The field '{field}' already has a {kind} rule")]
    DuplicateRule { field: String, kind: RuleKind },
}

pub type Result<T> = std::result::Result<T, RuleError>;
