// File: src/evaluator.rs
// Purpose: Server-side evaluation of collection rules

use crate::accessor::{AsCollection, CollectionView, PropertyAccessor};
use crate::error::{Result, RuleError};
use crate::matching::{try_first_duplicate, try_tally};
use crate::message::MessageTemplates;
use crate::rule::{RequireRule, Rule, UniqueRule};
use crate::value::Value;
use tracing::debug;

/// Why a collection failed a rule
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidReason {
    /// The field holds no collection at all
    MissingCollection,
    BelowMinimum { matches: usize },
    AboveMaximum { matches: usize },
    /// First element whose value repeats an earlier one
    Duplicate { index: usize, value: Value },
}

/// Verdict of one rule against one collection
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub is_valid: bool,
    /// Formatted error message, set when invalid
    pub message: Option<String>,
    pub reason: Option<InvalidReason>,
}

impl EvaluationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
            reason: None,
        }
    }

    pub fn invalid(reason: InvalidReason, message: String) -> Self {
        Self {
            is_valid: false,
            message: Some(message),
            reason: Some(reason),
        }
    }
}

/// Evaluates rules against concrete collections.
///
/// Holds only the message templates, so one evaluator can be shared by every
/// request.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    templates: MessageTemplates,
}

impl Evaluator {
    pub fn new(templates: MessageTemplates) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &MessageTemplates {
        &self.templates
    }

    /// Evaluate `rule` against the collection bound to `field_name`.
    ///
    /// `None` and empty-valued fields are reported as an invalid result;
    /// fields that are not collections, missing properties and bad rule
    /// parameters are errors.
    ///
    /// Elements are read only until the verdict is settled, so a missing
    /// property on a later element (or in an empty collection) is not
    /// reported.
    pub fn evaluate<T, C>(
        &self,
        rule: &Rule<T>,
        field_name: &str,
        collection: Option<&C>,
    ) -> Result<EvaluationResult>
    where
        C: AsCollection<T> + ?Sized,
    {
        rule.check()?;

        let view = collection.map_or(CollectionView::Missing, |c| c.view());
        let items = match view {
            CollectionView::Items(items) => items,
            CollectionView::Missing => {
                debug!(field = field_name, rule = %rule.kind(), "collection is missing");
                return Ok(EvaluationResult::invalid(
                    InvalidReason::MissingCollection,
                    self.message_for(rule, field_name),
                ));
            }
            CollectionView::NotEnumerable(found) => {
                return Err(RuleError::NotEnumerable {
                    field: field_name.to_string(),
                    found,
                });
            }
        };

        let result = match rule {
            Rule::Require(rule) => self.evaluate_require(rule, field_name, items)?,
            Rule::Unique(rule) => self.evaluate_unique(rule, field_name, items)?,
        };

        debug!(
            field = field_name,
            rule = %rule.kind(),
            property = rule.property().name(),
            items = items.len(),
            valid = result.is_valid,
            "evaluated collection rule"
        );
        Ok(result)
    }

    /// Formatted message for `rule`, the same text the serializer embeds
    pub fn message_for<T>(&self, rule: &Rule<T>, field_name: &str) -> String {
        match rule {
            Rule::Require(rule) => self.templates.require_message(rule, field_name),
            Rule::Unique(rule) => self.templates.unique_message(rule, field_name),
        }
    }

    fn evaluate_require<T>(
        &self,
        rule: &RequireRule<T>,
        field_name: &str,
        items: &[T],
    ) -> Result<EvaluationResult> {
        let required = rule.required_value();
        let matches = items
            .iter()
            .enumerate()
            .map(|(index, item)| read(rule.property(), item, index).map(|v| &v == required));

        let tally = try_tally(matches, rule.minimum(), rule.maximum())?;
        if tally.is_valid {
            return Ok(EvaluationResult::valid());
        }

        let reason = if tally.matches < rule.minimum() {
            InvalidReason::BelowMinimum {
                matches: tally.matches,
            }
        } else {
            InvalidReason::AboveMaximum {
                matches: tally.matches,
            }
        };
        Ok(EvaluationResult::invalid(
            reason,
            self.templates.require_message(rule, field_name),
        ))
    }

    fn evaluate_unique<T>(
        &self,
        rule: &UniqueRule<T>,
        field_name: &str,
        items: &[T],
    ) -> Result<EvaluationResult> {
        let values = items
            .iter()
            .enumerate()
            .map(|(index, item)| read(rule.property(), item, index));

        match try_first_duplicate(values)? {
            None => Ok(EvaluationResult::valid()),
            Some((index, value)) => Ok(EvaluationResult::invalid(
                InvalidReason::Duplicate { index, value },
                self.templates.unique_message(rule, field_name),
            )),
        }
    }
}

fn read<T>(property: &PropertyAccessor<T>, item: &T, index: usize) -> Result<Value> {
    property.read(item).ok_or_else(|| RuleError::UnknownProperty {
        property: property.name().to_string(),
        index,
    })
}
