// File: src/registry.rs
// Purpose: Explicit attachment of collection rules to model fields

use crate::accessor::AsCollection;
use crate::attributes::{serialize_rule, SerializedRuleAttributes};
use crate::error::{Result, RuleError};
use crate::evaluator::{EvaluationResult, Evaluator};
use crate::message::MessageTemplates;
use crate::rule::{Rule, RuleKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Result of validating every bound field of a model
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: HashMap<String, Vec<String>>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: HashMap::new(),
        }
    }

    /// Record an error message for a field
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.is_valid = false;
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get first error for a specific field
    pub fn get_error(&self, field: &str) -> Option<&String> {
        self.errors.get(field).and_then(|errors| errors.first())
    }

    /// Get all errors for a specific field
    pub fn get_errors(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    /// Convert to the `Validate` trait shape
    pub fn into_result(self) -> std::result::Result<(), HashMap<String, Vec<String>>> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Rules attached to one collection-valued field of `M`
pub struct CollectionBinding<M, T, C: ?Sized> {
    name: String,
    display_name: Option<String>,
    field: Arc<dyn for<'a> Fn(&'a M) -> Option<&'a C> + Send + Sync>,
    rules: Vec<Rule<T>>,
}

impl<M, T, C> CollectionBinding<M, T, C>
where
    C: AsCollection<T> + ?Sized,
{
    /// Bind the field `name`, read off the model by `field`
    ///
    /// # Example
    ///
    /// ```
    /// use rhtmx_collection_validation::{CollectionBinding, PropertyAccessor, RequireRule};
    ///
    /// struct RoleRow { is_selected: bool }
    /// struct UserForm { roles: Vec<RoleRow> }
    ///
    /// let binding = CollectionBinding::new("Roles", |form: &UserForm| Some(&form.roles))
    ///     .rule(RequireRule::new(
    ///         PropertyAccessor::new("IsSelected", |row: &RoleRow| Some(row.is_selected.into())),
    ///         true,
    ///     ));
    /// assert_eq!(binding.name(), "Roles");
    /// ```
    pub fn new<F>(name: impl Into<String>, field: F) -> Self
    where
        F: for<'a> Fn(&'a M) -> Option<&'a C> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            display_name: None,
            field: Arc::new(field),
            rules: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Attach a rule; checked when the binding is registered
    pub fn rule(mut self, rule: impl Into<Rule<T>>) -> Self {
        self.rules.push(rule.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    fn check(&self) -> Result<()> {
        let mut seen: Vec<RuleKind> = Vec::new();
        for rule in &self.rules {
            rule.check()?;
            if seen.contains(&rule.kind()) {
                return Err(RuleError::DuplicateRule {
                    field: self.name.clone(),
                    kind: rule.kind(),
                });
            }
            seen.push(rule.kind());
        }
        Ok(())
    }
}

/// Type-erased view of a binding, so one registry can hold fields with
/// different element types.
pub trait BoundField<M>: Send + Sync {
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    fn rule_kinds(&self) -> Vec<RuleKind>;

    /// Evaluate every rule against the model, in attachment order
    fn evaluate(&self, model: &M, evaluator: &Evaluator) -> Result<Vec<EvaluationResult>>;

    /// Client metadata for every rule, merged in attachment order
    fn client_attributes(&self, templates: &MessageTemplates) -> SerializedRuleAttributes;
}

impl<M, T, C> BoundField<M> for CollectionBinding<M, T, C>
where
    M: 'static,
    T: 'static,
    C: AsCollection<T> + ?Sized + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        CollectionBinding::display_name(self)
    }

    fn rule_kinds(&self) -> Vec<RuleKind> {
        self.rules.iter().map(Rule::kind).collect()
    }

    fn evaluate(&self, model: &M, evaluator: &Evaluator) -> Result<Vec<EvaluationResult>> {
        let collection = (self.field)(model);
        self.rules
            .iter()
            .map(|rule| evaluator.evaluate(rule, CollectionBinding::display_name(self), collection))
            .collect()
    }

    fn client_attributes(&self, templates: &MessageTemplates) -> SerializedRuleAttributes {
        let mut attributes = SerializedRuleAttributes::new();
        for rule in &self.rules {
            attributes.merge(serialize_rule(
                rule,
                CollectionBinding::display_name(self),
                templates,
            ));
        }
        attributes
    }
}

/// Registration table of collection bindings for a model type
pub struct RuleRegistry<M> {
    bindings: Vec<Box<dyn BoundField<M>>>,
}

impl<M: 'static> RuleRegistry<M> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Register a binding, rejecting misconfigured or duplicate rules
    pub fn register<T, C>(mut self, binding: CollectionBinding<M, T, C>) -> Result<Self>
    where
        T: 'static,
        C: AsCollection<T> + ?Sized + 'static,
    {
        binding.check()?;
        if self.binding(binding.name()).is_some() {
            return Err(RuleError::InvalidRuleConfiguration(format!(
                "The field '{}' is already registered",
                binding.name()
            )));
        }
        debug!(field = binding.name(), rules = binding.rules().len(), "registered collection binding");
        self.bindings.push(Box::new(binding));
        Ok(self)
    }

    pub fn binding(&self, field: &str) -> Option<&dyn BoundField<M>> {
        self.bindings
            .iter()
            .find(|binding| binding.name() == field)
            .map(|binding| binding.as_ref())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|binding| binding.name())
    }

    /// Rule kinds attached to `field`, empty when the field is unbound
    pub fn rules_for(&self, field: &str) -> Vec<RuleKind> {
        self.binding(field)
            .map(|binding| binding.rule_kinds())
            .unwrap_or_default()
    }

    /// Validate every bound field in registration order.
    ///
    /// Failing rules become field errors; a misconfigured rule aborts the
    /// whole validation.
    pub fn validate(&self, model: &M, evaluator: &Evaluator) -> Result<ValidationResult> {
        let mut result = ValidationResult::success();
        for binding in &self.bindings {
            for verdict in binding.evaluate(model, evaluator)? {
                if let Some(message) = verdict.message.filter(|_| !verdict.is_valid) {
                    result.add_error(binding.name(), message);
                }
            }
        }
        Ok(result)
    }

    /// Client metadata for `field`, `None` when the field is unbound
    pub fn client_attributes(
        &self,
        field: &str,
        templates: &MessageTemplates,
    ) -> Option<SerializedRuleAttributes> {
        self.binding(field)
            .map(|binding| binding.client_attributes(templates))
    }
}

impl<M: 'static> Default for RuleRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::PropertyAccessor;
    use crate::rule::{RequireRule, UniqueRule};

    struct Contact {
        email: String,
        is_primary: bool,
    }

    struct ContactsForm {
        contacts: Vec<Contact>,
    }

    fn contact(email: &str, is_primary: bool) -> Contact {
        Contact {
            email: email.to_string(),
            is_primary,
        }
    }

    fn registry() -> RuleRegistry<ContactsForm> {
        RuleRegistry::new()
            .register(
                CollectionBinding::new("Contacts", |form: &ContactsForm| Some(&form.contacts))
                    .rule(
                        RequireRule::new(
                            PropertyAccessor::new("IsPrimary", |c: &Contact| {
                                Some(c.is_primary.into())
                            }),
                            true,
                        )
                        .with_maximum(1)
                        .unwrap(),
                    )
                    .rule(UniqueRule::new(PropertyAccessor::new("Email", |c: &Contact| {
                        Some(c.email.as_str().into())
                    }))),
            )
            .unwrap()
    }

    #[test]
    fn test_valid_model() {
        let form = ContactsForm {
            contacts: vec![contact("a@x.io", true), contact("b@x.io", false)],
        };
        let result = registry().validate(&form, &Evaluator::default()).unwrap();
        assert!(result.is_valid);
        assert!(!result.has_errors());
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn test_errors_collected_per_field() {
        let form = ContactsForm {
            contacts: vec![contact("a@x.io", false), contact("a@x.io", false)],
        };
        let result = registry().validate(&form, &Evaluator::default()).unwrap();
        assert!(!result.is_valid);
        let errors = result.get_errors("Contacts").unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            result.get_error("Contacts").map(String::as_str),
            Some("Please select between 1 and 1 item(s) in Contacts")
        );
        assert_eq!(errors[1], "The value of Email must be unique");
    }

    #[test]
    fn test_duplicate_rule_kind_is_rejected() {
        let result = RuleRegistry::<ContactsForm>::new().register(
            CollectionBinding::new("Contacts", |form: &ContactsForm| Some(&form.contacts))
                .rule(UniqueRule::new(PropertyAccessor::new("Email", |c: &Contact| {
                    Some(c.email.as_str().into())
                })))
                .rule(UniqueRule::new(PropertyAccessor::new("Email", |c: &Contact| {
                    Some(c.email.as_str().into())
                }))),
        );
        assert!(matches!(
            result,
            Err(RuleError::DuplicateRule {
                kind: RuleKind::Unique,
                ..
            })
        ));
    }

    #[test]
    fn test_rules_for() {
        let registry = registry();
        assert_eq!(
            registry.rules_for("Contacts"),
            vec![RuleKind::Require, RuleKind::Unique]
        );
        assert!(registry.rules_for("Missing").is_empty());
        assert_eq!(registry.fields().collect::<Vec<_>>(), vec!["Contacts"]);
    }
}
