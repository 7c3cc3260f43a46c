// File: src/context.rs
// Purpose: Form state the message renderer reads from the templating layer

use crate::registry::ValidationResult;
use std::collections::HashMap;

/// What the renderer needs to know about the form being rendered
pub trait RenderContext {
    /// Fully-qualified bound name of `field` (e.g. `Order.Lines`)
    fn full_field_name(&self, field: &str) -> String;

    /// Server errors for a fully-qualified name, `None` when the field has no
    /// recorded state
    fn field_errors(&self, full_name: &str) -> Option<&[String]>;

    fn client_validation_enabled(&self) -> bool;
}

/// Context for forms that includes validation errors and the name prefix
#[derive(Debug, Clone)]
pub struct FormContext {
    /// Prefix for nested models, e.g. `Order`
    pub prefix: Option<String>,
    /// Fully-qualified field names to error messages
    pub errors: HashMap<String, Vec<String>>,
    pub client_validation: bool,
}

impl FormContext {
    /// Create empty form context
    pub fn empty() -> Self {
        Self {
            prefix: None,
            errors: HashMap::new(),
            client_validation: true,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_client_validation(mut self, enabled: bool) -> Self {
        self.client_validation = enabled;
        self
    }

    /// Record the outcome of a server validation run.
    ///
    /// Fields without errors still get an (empty) entry so the renderer knows
    /// they were validated.
    pub fn with_result<'a>(
        mut self,
        fields: impl IntoIterator<Item = &'a str>,
        result: &ValidationResult,
    ) -> Self {
        for field in fields {
            let full_name = self.full_field_name(field);
            let errors = result.get_errors(field).cloned().unwrap_or_default();
            self.errors.insert(full_name, errors);
        }
        self
    }

    /// Add an error message for a fully-qualified field name
    pub fn add_error(&mut self, full_name: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(full_name.into())
            .or_default()
            .push(message.into());
    }

    /// Check if field has an error
    pub fn has_error(&self, full_name: &str) -> bool {
        self.errors
            .get(full_name)
            .map(|errors| !errors.is_empty())
            .unwrap_or(false)
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.errors.values().any(|errors| !errors.is_empty())
    }
}

impl Default for FormContext {
    fn default() -> Self {
        Self::empty()
    }
}

impl RenderContext for FormContext {
    fn full_field_name(&self, field: &str) -> String {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, field),
            _ => field.to_string(),
        }
    }

    fn field_errors(&self, full_name: &str) -> Option<&[String]> {
        self.errors.get(full_name).map(Vec::as_slice)
    }

    fn client_validation_enabled(&self) -> bool {
        self.client_validation
    }
}
