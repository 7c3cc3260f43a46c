// File: src/client/rule.rs
// Purpose: Rules rebuilt from data-col-* metadata and evaluated against controls

use super::{Control, ControlKind, MarkerElement};
use crate::attributes::{
    MESSAGE_FOR, REQUIRE, REQUIRE_MAXIMUM, REQUIRE_MINIMUM, REQUIRE_PROPERTY, REQUIRE_TYPE,
    REQUIRE_VALUE, UNIQUE, UNIQUE_PROPERTY,
};
use crate::matching::{first_duplicate, tally};
use crate::rule::check_bounds;
use crate::value::{Value, ValueKind};
use tracing::{debug, warn};

/// Parameters of a rebuilt rule
#[derive(Debug, Clone, PartialEq)]
pub enum ClientRuleKind {
    Require {
        value: Value,
        minimum: usize,
        maximum: Option<usize>,
    },
    Unique,
}

/// A rule bound to the controls named `<prefix>…<property>`
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRule {
    prefix: String,
    property: String,
    message: String,
    kind: ClientRuleKind,
}

impl ClientRule {
    /// Rebuild every rule a marker element declares.
    ///
    /// Rules with missing or unreadable metadata are skipped with a warning;
    /// this never fails.
    pub fn from_marker(marker: &impl MarkerElement) -> Vec<ClientRule> {
        let Some(prefix) = marker.attribute(MESSAGE_FOR) else {
            warn!("collection message element without {}", MESSAGE_FOR);
            return Vec::new();
        };

        let mut rules = Vec::new();
        if let Some(message) = marker.attribute(REQUIRE) {
            match require_from(marker) {
                Some(kind) => rules.push(ClientRule {
                    prefix: prefix.clone(),
                    property: marker.attribute(REQUIRE_PROPERTY).unwrap_or_default(),
                    message,
                    kind,
                }),
                None => warn!(field = %prefix, "skipping require rule with incomplete metadata"),
            }
        }
        if let Some(message) = marker.attribute(UNIQUE) {
            match marker.attribute(UNIQUE_PROPERTY).filter(|p| !p.is_empty()) {
                Some(property) => rules.push(ClientRule {
                    prefix: prefix.clone(),
                    property,
                    message,
                    kind: ClientRuleKind::Unique,
                }),
                None => warn!(field = %prefix, "skipping unique rule without {}", UNIQUE_PROPERTY),
            }
        }
        rules
    }

    /// Fully-qualified name of the collection field
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ClientRuleKind {
        &self.kind
    }

    /// Evaluate against the controls matched for this rule.
    ///
    /// When checkboxes are among the matches only the checkboxes count, which
    /// drops the hidden "unchecked" companions, and comparisons use the
    /// checked state instead of the control value.
    pub fn evaluate<C: Control>(&self, controls: &[C]) -> bool {
        let checkbox_mode = controls.iter().any(|c| c.kind() == ControlKind::Checkbox);
        let bound: Vec<&C> = controls
            .iter()
            .filter(|c| !checkbox_mode || c.kind() == ControlKind::Checkbox)
            .collect();

        let is_valid = match &self.kind {
            ClientRuleKind::Require {
                value,
                minimum,
                maximum,
            } => {
                let result = if checkbox_mode {
                    // `true` counts checked boxes, anything else counts unchecked ones
                    let want_checked = value.as_bool() == Some(true);
                    tally(
                        bound.iter().map(|c| c.is_checked() == want_checked),
                        *minimum,
                        *maximum,
                    )
                } else {
                    let kind = value.kind().unwrap_or(ValueKind::String);
                    tally(
                        bound
                            .iter()
                            .map(|c| Value::parse_as(kind, &c.value()).as_ref() == Some(value)),
                        *minimum,
                        *maximum,
                    )
                };
                result.is_valid
            }
            ClientRuleKind::Unique => {
                let values = bound.iter().map(|c| {
                    if checkbox_mode {
                        c.is_checked().to_string()
                    } else {
                        c.value()
                    }
                });
                first_duplicate(values).is_none()
            }
        };

        debug!(
            field = %self.prefix,
            property = %self.property,
            controls = bound.len(),
            checkbox_mode,
            valid = is_valid,
            "client collection rule evaluated"
        );
        is_valid
    }
}

fn require_from(marker: &impl MarkerElement) -> Option<ClientRuleKind> {
    marker.attribute(REQUIRE_PROPERTY).filter(|p| !p.is_empty())?;

    let token = marker.attribute(REQUIRE_VALUE)?;
    let kind = match marker.attribute(REQUIRE_TYPE) {
        Some(tag) => ValueKind::parse(&tag)?,
        None => ValueKind::infer(&token),
    };
    let value = Value::parse_as(kind, &token)?;

    let minimum = marker.attribute(REQUIRE_MINIMUM)?.trim().parse::<usize>().ok()?;
    let maximum = match marker.attribute(REQUIRE_MAXIMUM) {
        Some(text) => Some(text.trim().parse::<usize>().ok()?),
        None => None,
    };
    check_bounds(minimum, maximum).ok()?;

    Some(ClientRuleKind::Require {
        value,
        minimum,
        maximum,
    })
}
