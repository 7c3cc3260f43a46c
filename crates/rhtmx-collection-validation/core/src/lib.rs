//! RHTMX Collection Validation
//!
//! Declarative rules over a form's collection fields: "at least / between N
//! items must have property P equal to V" and "property P must be unique".
//! Rules are evaluated on the server, serialized to `data-col-*` attributes
//! on the field's message element, and re-evaluated in the browser by the
//! [`client`] engine (compiled to wasm by `rhtmx-collection-validation-wasm`).

pub mod accessor;
pub mod attributes;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod matching;
pub mod message;
pub mod registry;
pub mod render;
pub mod rule;
pub mod value;

pub use accessor::{AsCollection, CollectionView, PropertyAccessor};
pub use attributes::{serialize_rule, SerializedRuleAttributes};
pub use config::{CollectionValidationConfig, CssClasses, RenderConfig};
pub use context::{FormContext, RenderContext};
pub use error::{Result, RuleError};
pub use evaluator::{EvaluationResult, Evaluator, InvalidReason};
pub use message::{format_message, MessageTemplates};
pub use registry::{BoundField, CollectionBinding, RuleRegistry, ValidationResult};
pub use render::{message_element, render_message_for, MessageElement};
pub use rule::{RequireRule, Rule, RuleKind, UniqueRule};
pub use value::{Value, ValueKind};
