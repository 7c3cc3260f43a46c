// File: src/dom.rs
// Purpose: web-sys implementations of the client engine's page traits

use rhtmx_collection_validation::attributes::MESSAGE_FOR;
use rhtmx_collection_validation::client::{Control, ControlKind, FormHost, MarkerElement};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    console, Element, HtmlFormElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
};

/// Message element carrying `data-col-*` metadata
#[derive(Debug, Clone)]
pub struct DomMarker(Element);

impl MarkerElement for DomMarker {
    fn attribute(&self, key: &str) -> Option<String> {
        self.0.get_attribute(key)
    }

    fn add_class(&self, class: &str) {
        if let Err(err) = self.0.class_list().add_1(class) {
            console::warn_2(&JsValue::from_str("collection validation: cannot add class"), &err);
        }
    }

    fn remove_class(&self, class: &str) {
        if let Err(err) = self.0.class_list().remove_1(class) {
            console::warn_2(&JsValue::from_str("collection validation: cannot remove class"), &err);
        }
    }

    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }
}

/// An `<input>`, `<select>` or `<textarea>`
#[derive(Debug, Clone)]
pub struct DomControl(Element);

impl Control for DomControl {
    fn name(&self) -> String {
        self.0.get_attribute("name").unwrap_or_default()
    }

    fn value(&self) -> String {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = self.0.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else if let Some(area) = self.0.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            self.0.get_attribute("value").unwrap_or_default()
        }
    }

    fn kind(&self) -> ControlKind {
        self.0
            .dyn_ref::<HtmlInputElement>()
            .map(|input| ControlKind::from_input_type(&input.type_()))
            .unwrap_or_default()
    }

    fn is_checked(&self) -> bool {
        self.0
            .dyn_ref::<HtmlInputElement>()
            .map(HtmlInputElement::checked)
            .unwrap_or(false)
    }
}

/// A live `<form>`; every query hits the current DOM
#[derive(Debug, Clone)]
pub struct DomForm(HtmlFormElement);

impl DomForm {
    pub fn new(form: HtmlFormElement) -> Self {
        Self(form)
    }

    pub fn element(&self) -> &HtmlFormElement {
        &self.0
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        match self.0.query_selector_all(selector) {
            Ok(list) => (0..list.length())
                .filter_map(|index| list.item(index))
                .filter_map(|node| node.dyn_into::<Element>().ok())
                .collect(),
            Err(err) => {
                console::warn_2(
                    &JsValue::from_str(&format!("collection validation: bad selector {}", selector)),
                    &err,
                );
                Vec::new()
            }
        }
    }
}

impl FormHost for DomForm {
    type Marker = DomMarker;
    type Control = DomControl;

    fn markers(&self) -> Vec<DomMarker> {
        self.query_all(&format!("[{}]", MESSAGE_FOR))
            .into_iter()
            .map(DomMarker)
            .collect()
    }

    fn controls(&self, prefix: &str, suffix: &str) -> Vec<DomControl> {
        self.query_all(&binding_selector(prefix, suffix))
            .into_iter()
            .map(DomControl)
            .collect()
    }

    fn framework_valid(&self) -> bool {
        self.0.check_validity()
    }
}

/// `[name^="prefix"][name$="suffix"]` with both values quoted for CSS
pub fn binding_selector(prefix: &str, suffix: &str) -> String {
    format!(
        "[name^=\"{}\"][name$=\"{}\"]",
        css_string(prefix),
        css_string(suffix)
    )
}

fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_binding_selector() {
        assert_eq!(
            binding_selector("Roles", "IsSelected"),
            "[name^=\"Roles\"][name$=\"IsSelected\"]"
        );
    }

    #[wasm_bindgen_test]
    fn test_binding_selector_escapes_quotes() {
        assert_eq!(
            binding_selector("Odd\"Name", "a\\b"),
            "[name^=\"Odd\\\"Name\"][name$=\"a\\\\b\"]"
        );
    }
}
