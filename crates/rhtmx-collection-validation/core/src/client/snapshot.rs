//! In-memory form for running the client engine without a browser.
//!
//! Used by the tests and by the wasm `validateSnapshot` export, which receives
//! markers and controls as plain objects.

use super::{matches_binding, Control, ControlKind, FormHost, FormValidator, MarkerElement};
use crate::attributes::{SerializedRuleAttributes, MESSAGE_FOR};
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Current value of one form control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub kind: ControlKind,
    #[serde(default)]
    pub checked: bool,
}

impl ControlSnapshot {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind: ControlKind::Other,
            checked: false,
        }
    }

    pub fn checkbox(name: impl Into<String>, checked: bool) -> Self {
        Self {
            name: name.into(),
            value: "true".to_string(),
            kind: ControlKind::Checkbox,
            checked,
        }
    }

    pub fn hidden(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind: ControlKind::Hidden,
            checked: false,
        }
    }
}

impl Control for ControlSnapshot {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn value(&self) -> String {
        self.value.clone()
    }

    fn kind(&self) -> ControlKind {
        self.kind
    }

    fn is_checked(&self) -> bool {
        self.checked
    }
}

/// Visible state of a message element
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerState {
    pub classes: Vec<String>,
    pub text: String,
}

/// A message element; clones share their visible state like DOM handles do
#[derive(Debug, Clone, Default)]
pub struct MarkerSnapshot {
    attributes: Vec<(String, String)>,
    state: Rc<RefCell<MarkerState>>,
}

impl MarkerSnapshot {
    /// Classes start from the `class` attribute, as the server rendered them
    pub fn new(attributes: impl IntoIterator<Item = (String, String)>) -> Self {
        let attributes: Vec<(String, String)> = attributes.into_iter().collect();
        let classes: Vec<String> = attributes
            .iter()
            .find(|(k, _)| k == "class")
            .map(|(_, v)| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            attributes,
            state: Rc::new(RefCell::new(MarkerState {
                classes,
                text: String::new(),
            })),
        }
    }

    /// Marker as the renderer would emit it for `full_name`
    pub fn from_attributes(full_name: &str, attributes: &SerializedRuleAttributes) -> Self {
        let mut pairs: Vec<(String, String)> = attributes
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        pairs.push((MESSAGE_FOR.to_string(), full_name.to_string()));
        Self::new(pairs)
    }

    pub fn state(&self) -> MarkerState {
        self.state.borrow().clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.state.borrow().classes.iter().any(|c| c == class)
    }

    pub fn text(&self) -> String {
        self.state.borrow().text.clone()
    }
}

impl MarkerElement for MarkerSnapshot {
    fn attribute(&self, key: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn add_class(&self, class: &str) {
        let mut state = self.state.borrow_mut();
        if !state.classes.iter().any(|c| c == class) {
            state.classes.push(class.to_string());
        }
    }

    fn remove_class(&self, class: &str) {
        self.state.borrow_mut().classes.retain(|c| c != class);
    }

    fn set_text(&self, text: &str) {
        self.state.borrow_mut().text = text.to_string();
    }
}

impl<'de> Deserialize<'de> for MarkerSnapshot {
    /// Accepts `{ "data-col-...": value }`; non-string values are rendered the
    /// way they would appear in an attribute.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(Self::new(raw.into_iter().map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })))
    }
}

/// A form held entirely in memory
#[derive(Debug, Clone)]
pub struct SnapshotForm {
    pub markers: Vec<MarkerSnapshot>,
    pub controls: Vec<ControlSnapshot>,
    pub framework_valid: bool,
}

impl SnapshotForm {
    pub fn new(markers: Vec<MarkerSnapshot>) -> Self {
        Self {
            markers,
            controls: Vec::new(),
            framework_valid: true,
        }
    }

    pub fn with_controls(mut self, controls: impl IntoIterator<Item = ControlSnapshot>) -> Self {
        self.controls.extend(controls);
        self
    }

    pub fn push(&mut self, control: ControlSnapshot) {
        self.controls.push(control);
    }

    /// A checkbox followed by its hidden "unchecked" companion
    pub fn push_checkbox(&mut self, name: &str, checked: bool) {
        self.controls.push(ControlSnapshot::checkbox(name, checked));
        self.controls.push(ControlSnapshot::hidden(name, "false"));
    }

    pub fn set_checked(&mut self, name: &str, checked: bool) {
        for control in self
            .controls
            .iter_mut()
            .filter(|c| c.name == name && c.kind == ControlKind::Checkbox)
        {
            control.checked = checked;
        }
    }

    pub fn set_value(&mut self, name: &str, value: &str) {
        for control in self
            .controls
            .iter_mut()
            .filter(|c| c.name == name && c.kind != ControlKind::Hidden)
        {
            control.value = value.to_string();
        }
    }

    /// Drop every control named `name`, as when a row is deleted
    pub fn remove(&mut self, name: &str) {
        self.controls.retain(|c| c.name != name);
    }
}

impl FormHost for SnapshotForm {
    type Marker = MarkerSnapshot;
    type Control = ControlSnapshot;

    fn markers(&self) -> Vec<MarkerSnapshot> {
        self.markers
            .iter()
            .filter(|m| m.attribute(MESSAGE_FOR).is_some())
            .cloned()
            .collect()
    }

    fn controls(&self, prefix: &str, suffix: &str) -> Vec<ControlSnapshot> {
        self.controls
            .iter()
            .filter(|c| matches_binding(&c.name, prefix, suffix))
            .cloned()
            .collect()
    }

    fn framework_valid(&self) -> bool {
        self.framework_valid
    }
}

/// Outcome for one marker after a full validation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerReport {
    pub field: Option<String>,
    pub is_valid: bool,
    pub message: String,
}

/// Run every rule of the markers against the controls, once
pub fn validate_snapshot(
    markers: Vec<MarkerSnapshot>,
    controls: Vec<ControlSnapshot>,
) -> Vec<MarkerReport> {
    let form = SnapshotForm::new(markers).with_controls(controls);
    let mut engine = FormValidator::new(form);
    engine.validate_all();

    // same list the engine discovered, so indexes line up
    let markers = engine.host().markers();
    markers
        .iter()
        .enumerate()
        .map(|(index, marker)| MarkerReport {
            field: marker.attribute(MESSAGE_FOR),
            is_valid: engine.marker_valid(index),
            message: marker.text(),
        })
        .collect()
}
