// File: src/render.rs
// Purpose: Message element for a collection field (error text + client metadata)

use crate::attributes::{SerializedRuleAttributes, ERROR_CLASS, MESSAGE_FOR, VALID_CLASS};
use crate::config::CollectionValidationConfig;
use crate::context::RenderContext;
use crate::registry::RuleRegistry;
use maud::{Escaper, Markup, PreEscaped};
use std::fmt::Write;

/// Message element for one collection field, before it is turned into HTML
#[derive(Debug, Clone, PartialEq)]
pub struct MessageElement {
    /// First server error, shown as the element's text
    pub text: Option<String>,
    /// `class`, then (with client validation on) the rule metadata, the
    /// class names the client toggles, and `data-col-message-for`
    pub attributes: SerializedRuleAttributes,
}

impl MessageElement {
    pub fn render(&self, tag: &str) -> Markup {
        let tag = element_tag(tag);
        let mut html = String::new();
        let _ = write!(html, "<{} {}>", tag, self.attributes.render());
        if let Some(message) = &self.text {
            let _ = write!(Escaper::new(&mut html), "{}", message);
        }
        let _ = write!(html, "</{}>", tag);
        PreEscaped(html)
    }
}

/// Build the message element for the collection field `field`.
///
/// Returns `None` when there is nothing to show: the field has no server
/// state and client validation is off.
pub fn message_element<M: 'static>(
    registry: &RuleRegistry<M>,
    context: &impl RenderContext,
    field: &str,
    config: &CollectionValidationConfig,
) -> Option<MessageElement> {
    let client_enabled = context.client_validation_enabled() && config.render.client_validation;
    let full_name = context.full_field_name(field);
    let errors = context.field_errors(&full_name);

    if errors.is_none() && !client_enabled {
        return None;
    }

    let error = errors.and_then(|errors| {
        errors
            .iter()
            .find(|message| !message.is_empty())
            .or_else(|| errors.first())
    });

    if error.is_none() && !client_enabled {
        return None;
    }

    let mut attributes = SerializedRuleAttributes::new();
    attributes.insert(
        "class",
        match error {
            Some(_) => config.classes.error.as_str(),
            None => config.classes.valid.as_str(),
        },
    );
    if client_enabled {
        if let Some(rules) = registry.client_attributes(field, &config.messages) {
            attributes.merge(rules);
        }
        attributes.insert(VALID_CLASS, config.classes.valid.as_str());
        attributes.insert(ERROR_CLASS, config.classes.error.as_str());
        attributes.insert(MESSAGE_FOR, full_name);
    }

    Some(MessageElement {
        text: error.cloned(),
        attributes,
    })
}

/// Render the message element for the collection field `field`.
///
/// The element carries the valid/error class, the first server error as
/// text, and (with client validation on) the rule metadata plus
/// `data-col-message-for`.
///
/// # Example
///
/// ```ignore
/// html! {
///     @for (i, role) in form.roles.iter().enumerate() { /* rows */ }
///     (render_message_for(&REGISTRY, &context, "Roles", &config).unwrap_or_default())
/// }
/// ```
pub fn render_message_for<M: 'static>(
    registry: &RuleRegistry<M>,
    context: &impl RenderContext,
    field: &str,
    config: &CollectionValidationConfig,
) -> Option<Markup> {
    message_element(registry, context, field, config)
        .map(|element| element.render(&config.render.tag))
}

fn element_tag(tag: &str) -> &str {
    if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        tag
    } else {
        "span"
    }
}
