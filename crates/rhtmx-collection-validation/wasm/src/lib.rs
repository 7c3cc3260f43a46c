//! RHTMX Collection Validation WASM
//!
//! Browser bindings for the collection rule engine. Each form gets its own
//! engine, reading the `data-col-*` metadata the server rendered.

mod dom;

pub use dom::{binding_selector, DomControl, DomForm, DomMarker};

use rhtmx_collection_validation::client::snapshot::{
    validate_snapshot, ControlSnapshot, MarkerSnapshot,
};
use rhtmx_collection_validation::client::{EngineState, FormValidator};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{console, Element, Event, HtmlFormElement};

type SharedEngine = Rc<RefCell<FormValidator<DomForm>>>;

/// Set panic hook for better error messages in the browser
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Handle to the engine attached to one form
#[wasm_bindgen]
pub struct CollectionValidator {
    engine: SharedEngine,
}

#[wasm_bindgen]
impl CollectionValidator {
    #[wasm_bindgen(js_name = ruleCount)]
    pub fn rule_count(&self) -> usize {
        self.engine.borrow().rule_count()
    }

    #[wasm_bindgen(js_name = isArmed)]
    pub fn is_armed(&self) -> bool {
        self.engine.borrow().state() == EngineState::Armed
    }

    /// Run every rule now and refresh the message elements
    pub fn validate(&self) -> bool {
        match self.engine.try_borrow_mut() {
            Ok(mut engine) => engine.validate_all(),
            Err(_) => false,
        }
    }
}

/// Attach collection validation to a form.
///
/// Submits are cancelled while any collection rule fails. After the first
/// failed submit, changing a bound control re-runs its rules.
///
/// # Example (JavaScript)
/// ```javascript
/// const validator = attachCollectionValidation(document.querySelector('#account'));
/// console.log(validator.ruleCount());
/// ```
#[wasm_bindgen(js_name = attachCollectionValidation)]
pub fn attach_collection_validation(
    form: HtmlFormElement,
) -> Result<CollectionValidator, JsValue> {
    let engine: SharedEngine = Rc::new(RefCell::new(FormValidator::new(DomForm::new(
        form.clone(),
    ))));

    let handler_engine = Rc::clone(&engine);
    let handler_form = form.clone();
    let on_submit = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let outcome = match handler_engine.try_borrow_mut() {
            Ok(mut engine) => engine.submit(),
            Err(_) => return,
        };
        if outcome.armed_now {
            if let Err(err) = listen_for_changes(&handler_form, &handler_engine) {
                console::warn_2(
                    &JsValue::from_str("collection validation: cannot listen for changes"),
                    &err,
                );
            }
        }
        if !outcome.proceed {
            event.prevent_default();
        }
    });
    form.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())?;
    on_submit.forget();

    Ok(CollectionValidator { engine })
}

// One delegated listener covers rows added after arming.
fn listen_for_changes(form: &HtmlFormElement, engine: &SharedEngine) -> Result<(), JsValue> {
    let engine = Rc::clone(engine);
    let on_change = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let name = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .and_then(|element| element.get_attribute("name"));
        if let (Some(name), Ok(mut engine)) = (name, engine.try_borrow_mut()) {
            engine.control_changed(&name);
        }
    });
    form.add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())?;
    on_change.forget();
    Ok(())
}

/// Attach to every form on the page that declares collection rules.
///
/// Returns the number of forms attached.
#[wasm_bindgen(js_name = initCollectionValidation)]
pub fn init_collection_validation() -> Result<usize, JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("No document available"))?;

    let forms = document.query_selector_all("form")?;
    let mut attached = 0;
    for index in 0..forms.length() {
        let Some(form) = forms
            .item(index)
            .and_then(|node| node.dyn_into::<HtmlFormElement>().ok())
        else {
            continue;
        };
        let discovered = FormValidator::new(DomForm::new(form.clone()));
        if discovered.rule_count() == 0 {
            continue;
        }
        attach_collection_validation(form)?;
        attached += 1;
    }
    Ok(attached)
}

/// Evaluate plain marker/control objects without a DOM
///
/// # Example (JavaScript)
/// ```javascript
/// const reports = validateSnapshot(
///     [{ 'data-col-message-for': 'Contacts', 'data-col-unique': 'Duplicate', 'data-col-unique-property': 'Email' }],
///     [{ name: 'Contacts[0].Email', value: 'a' }, { name: 'Contacts[1].Email', value: 'a' }]
/// );
/// // [{ field: 'Contacts', isValid: false, message: 'Duplicate' }]
/// ```
#[wasm_bindgen(js_name = validateSnapshot)]
pub fn validate_snapshot_js(markers: JsValue, controls: JsValue) -> Result<JsValue, JsValue> {
    let markers: Vec<MarkerSnapshot> = serde_wasm_bindgen::from_value(markers)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse markers: {}", e)))?;
    let controls: Vec<ControlSnapshot> = serde_wasm_bindgen::from_value(controls)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse controls: {}", e)))?;

    let reports = validate_snapshot(markers, controls);
    Ok(serde_wasm_bindgen::to_value(&reports)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;
    use wasm_bindgen_test::*;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Report {
        field: Option<String>,
        is_valid: bool,
        message: String,
    }

    fn to_js<T: Serialize>(value: &T) -> JsValue {
        value
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .unwrap()
    }

    fn marker(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[wasm_bindgen_test]
    fn test_validate_snapshot_duplicate() {
        let markers = to_js(&vec![marker(&[
            ("data-col-message-for", "Contacts"),
            ("data-col-unique", "Duplicate"),
            ("data-col-unique-property", "Email"),
        ])]);
        let controls = to_js(&vec![
            ControlSnapshot::text("Contacts[0].Email", "a"),
            ControlSnapshot::text("Contacts[1].Email", "a"),
        ]);

        let reports: Vec<Report> =
            serde_wasm_bindgen::from_value(validate_snapshot_js(markers, controls).unwrap())
                .unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].field.as_deref(), Some("Contacts"));
        assert!(!reports[0].is_valid);
        assert_eq!(reports[0].message, "Duplicate");
    }

    #[wasm_bindgen_test]
    fn test_validate_snapshot_checkbox_mode() {
        let markers = to_js(&vec![marker(&[
            ("data-col-message-for", "Roles"),
            ("data-col-require", "Pick one"),
            ("data-col-require-property", "IsSelected"),
            ("data-col-require-value", "true"),
            ("data-col-require-type", "boolean"),
            ("data-col-require-minimum", "1"),
        ])]);
        let controls = to_js(&vec![
            ControlSnapshot::checkbox("Roles[0].IsSelected", false),
            ControlSnapshot::hidden("Roles[0].IsSelected", "false"),
            ControlSnapshot::checkbox("Roles[1].IsSelected", true),
            ControlSnapshot::hidden("Roles[1].IsSelected", "false"),
        ]);

        let reports: Vec<Report> =
            serde_wasm_bindgen::from_value(validate_snapshot_js(markers, controls).unwrap())
                .unwrap();

        assert!(reports[0].is_valid);
        assert_eq!(reports[0].message, "");
    }

    #[wasm_bindgen_test]
    fn test_validate_snapshot_rejects_bad_input() {
        let result = validate_snapshot_js(JsValue::from_str("nope"), JsValue::NULL);
        assert!(result.is_err());
    }
}
