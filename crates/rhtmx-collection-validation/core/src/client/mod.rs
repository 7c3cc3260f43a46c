//! Client-side mirror of the collection rules.
//!
//! The engine never touches a browser API directly. It talks to the page
//! through [`FormHost`], [`MarkerElement`] and [`Control`], which the wasm
//! crate implements over `web-sys` and [`snapshot`] implements in memory.

mod engine;
mod rule;
pub mod snapshot;

pub use engine::{EngineState, FormValidator, SubmitOutcome};
pub use rule::{ClientRule, ClientRuleKind};

use serde::{Deserialize, Serialize};

/// Input types the engine distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Checkbox,
    /// Hidden inputs, e.g. the "unchecked" companion rendered next to a checkbox
    Hidden,
    #[default]
    Other,
}

impl ControlKind {
    /// Classify an `<input type=...>` value
    pub fn from_input_type(input_type: &str) -> Self {
        match input_type.to_ascii_lowercase().as_str() {
            "checkbox" => ControlKind::Checkbox,
            "hidden" => ControlKind::Hidden,
            _ => ControlKind::Other,
        }
    }
}

/// A form control bound to one element property
pub trait Control {
    fn name(&self) -> String;
    fn value(&self) -> String;
    fn kind(&self) -> ControlKind;
    fn is_checked(&self) -> bool;
}

/// The element that displays a field's collection errors.
///
/// Handles behave like DOM references: mutations through any clone are
/// visible through every other.
pub trait MarkerElement {
    fn attribute(&self, key: &str) -> Option<String>;
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);
    fn set_text(&self, text: &str);
}

/// The form an engine instance validates
pub trait FormHost {
    type Marker: MarkerElement + Clone;
    type Control: Control;

    /// Elements carrying `data-col-message-for`, in document order
    fn markers(&self) -> Vec<Self::Marker>;

    /// Controls whose name starts with `prefix` and ends with `suffix`,
    /// queried fresh on every call
    fn controls(&self, prefix: &str, suffix: &str) -> Vec<Self::Control>;

    /// Validity reported by the framework's own field-level validation
    fn framework_valid(&self) -> bool;
}

/// Name match used to bind controls to a rule, independent of the row index
pub fn matches_binding(name: &str, prefix: &str, suffix: &str) -> bool {
    name.starts_with(prefix) && name.ends_with(suffix)
}
