// File: src/client/engine.rs
// Purpose: Per-form client engine (submit gating and armed revalidation)

use super::rule::ClientRule;
use super::{matches_binding, FormHost, MarkerElement};
use crate::attributes::{ERROR_CLASS, VALID_CLASS};
use crate::config::CssClasses;
use tracing::debug;

/// Lifecycle of a form's engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No submit attempted yet
    Pristine,
    /// A submit failed; control changes now revalidate their rules
    Armed,
}

/// What the page should do with a submit event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// False when any collection rule failed; the submit must be cancelled
    pub proceed: bool,
    /// Collection rules and framework validation combined
    pub form_valid: bool,
    /// This submit moved the engine to [`EngineState::Armed`]; the caller
    /// starts forwarding control changes to [`FormValidator::control_changed`]
    pub armed_now: bool,
}

struct Registered {
    rule: ClientRule,
    marker: usize,
    verdict: Option<bool>,
}

/// Collection validation for one form.
///
/// Owned by the page-initialization code; there is no shared registry of
/// engines.
pub struct FormValidator<H: FormHost> {
    host: H,
    markers: Vec<H::Marker>,
    rules: Vec<Registered>,
    state: EngineState,
    classes: CssClasses,
}

impl<H: FormHost> FormValidator<H> {
    pub fn new(host: H) -> Self {
        Self::with_classes(host, CssClasses::default())
    }

    /// Discover rules from the host's marker elements, in document order.
    ///
    /// `classes` apply to markers that do not name their own classes through
    /// `data-col-valid-class` / `data-col-error-class`.
    pub fn with_classes(host: H, classes: CssClasses) -> Self {
        let markers = host.markers();
        let mut rules = Vec::new();
        for (index, marker) in markers.iter().enumerate() {
            rules.extend(ClientRule::from_marker(marker).into_iter().map(|rule| Registered {
                rule,
                marker: index,
                verdict: None,
            }));
        }
        debug!(markers = markers.len(), rules = rules.len(), "collection validator attached");

        Self {
            host,
            markers,
            rules,
            state: EngineState::Pristine,
            classes,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn rules(&self) -> impl Iterator<Item = &ClientRule> {
        self.rules.iter().map(|registered| &registered.rule)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Last verdict of every rule, `None` until it has run
    pub fn verdicts(&self) -> Vec<Option<bool>> {
        self.rules.iter().map(|registered| registered.verdict).collect()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// False while any rule hosted by the marker has failed its last run
    pub fn marker_valid(&self, marker_index: usize) -> bool {
        self.failing_rule(marker_index).is_none()
    }

    /// Handle a submit attempt.
    ///
    /// Every rule runs, in registration order. The first failing submit arms
    /// the engine.
    pub fn submit(&mut self) -> SubmitOutcome {
        let rules_valid = self.validate_all();
        let form_valid = rules_valid && self.host.framework_valid();

        let armed_now = !form_valid && self.state == EngineState::Pristine;
        if armed_now {
            self.state = EngineState::Armed;
        }

        debug!(rules_valid, form_valid, armed_now, "collection validation on submit");
        SubmitOutcome {
            proceed: rules_valid,
            form_valid,
            armed_now,
        }
    }

    /// Run every rule and refresh every marker; true when all pass
    pub fn validate_all(&mut self) -> bool {
        let mut all_valid = true;
        for index in 0..self.rules.len() {
            all_valid &= self.run(index);
        }
        all_valid
    }

    /// Re-run one rule, as a change listener does
    pub fn revalidate_rule(&mut self, index: usize) -> Option<bool> {
        if index >= self.rules.len() {
            return None;
        }
        Some(self.run(index))
    }

    /// Re-run the rules bound to a changed control.
    ///
    /// Does nothing until the engine is armed. Returns the indexes of the
    /// rules that ran.
    pub fn control_changed(&mut self, control_name: &str) -> Vec<usize> {
        if self.state != EngineState::Armed {
            return Vec::new();
        }
        let affected: Vec<usize> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, r)| matches_binding(control_name, r.rule.prefix(), r.rule.property()))
            .map(|(index, _)| index)
            .collect();
        for &index in &affected {
            self.run(index);
        }
        affected
    }

    /// Controls currently bound to each rule, for attaching change listeners
    pub fn bound_controls(&self) -> Vec<(usize, Vec<H::Control>)> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, r)| (index, self.host.controls(r.rule.prefix(), r.rule.property())))
            .collect()
    }

    fn run(&mut self, index: usize) -> bool {
        let registered = &self.rules[index];
        let controls = self
            .host
            .controls(registered.rule.prefix(), registered.rule.property());
        let is_valid = registered.rule.evaluate(&controls);

        self.rules[index].verdict = Some(is_valid);
        self.refresh_marker(self.rules[index].marker);
        is_valid
    }

    fn failing_rule(&self, marker_index: usize) -> Option<&Registered> {
        self.rules
            .iter()
            .filter(|r| r.marker == marker_index)
            .find(|r| r.verdict == Some(false))
    }

    // A marker shows the first failing rule it hosts, or the valid state.
    fn refresh_marker(&self, marker_index: usize) {
        let marker = &self.markers[marker_index];
        let valid_class = marker
            .attribute(VALID_CLASS)
            .unwrap_or_else(|| self.classes.valid.clone());
        let error_class = marker
            .attribute(ERROR_CLASS)
            .unwrap_or_else(|| self.classes.error.clone());

        match self.failing_rule(marker_index) {
            Some(registered) => {
                marker.add_class(&error_class);
                marker.remove_class(&valid_class);
                marker.set_text(registered.rule.message());
            }
            None => {
                marker.add_class(&valid_class);
                marker.remove_class(&error_class);
                marker.set_text("");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::*;
    use crate::client::snapshot::{ControlSnapshot, MarkerSnapshot, SnapshotForm};

    fn roles_marker() -> MarkerSnapshot {
        MarkerSnapshot::new(
            [
                (MESSAGE_FOR, "Roles"),
                (REQUIRE, "Please select a role"),
                (REQUIRE_PROPERTY, "IsSelected"),
                (REQUIRE_VALUE, "true"),
                (REQUIRE_TYPE, "boolean"),
                (REQUIRE_MINIMUM, "1"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    fn roles_form(checked: [bool; 2]) -> SnapshotForm {
        let mut form = SnapshotForm::new(vec![roles_marker()]);
        for (i, checked) in checked.iter().enumerate() {
            form.push_checkbox(&format!("Roles[{}].IsSelected", i), *checked);
        }
        form
    }

    #[test]
    fn test_first_failed_submit_arms() {
        let mut engine = FormValidator::new(roles_form([false, false]));
        assert_eq!(engine.state(), EngineState::Pristine);

        let outcome = engine.submit();
        assert!(!outcome.proceed);
        assert!(outcome.armed_now);
        assert_eq!(engine.state(), EngineState::Armed);

        let marker = &engine.host().markers[0];
        assert!(marker.has_class("field-validation-error"));
        assert!(!marker.has_class("field-validation-valid"));
        assert_eq!(marker.text(), "Please select a role");

        // a second failing submit does not arm again
        let outcome = engine.submit();
        assert!(!outcome.armed_now);
    }

    #[test]
    fn test_valid_submit_proceeds() {
        let mut engine = FormValidator::new(roles_form([false, true]));
        let outcome = engine.submit();
        assert!(outcome.proceed);
        assert!(outcome.form_valid);
        assert!(!outcome.armed_now);
        assert_eq!(engine.state(), EngineState::Pristine);
        assert_eq!(engine.host().markers[0].text(), "");
    }

    #[test]
    fn test_framework_invalid_arms_but_does_not_block() {
        let mut form = roles_form([true, false]);
        form.framework_valid = false;
        let mut engine = FormValidator::new(form);

        let outcome = engine.submit();
        assert!(outcome.proceed);
        assert!(!outcome.form_valid);
        assert!(outcome.armed_now);
    }

    #[test]
    fn test_changes_ignored_until_armed() {
        let mut engine = FormValidator::new(roles_form([false, false]));
        assert!(engine.control_changed("Roles[0].IsSelected").is_empty());
        assert_eq!(engine.verdicts(), vec![None]);
    }

    #[test]
    fn test_armed_change_revalidates_bound_rule() {
        let mut engine = FormValidator::new(roles_form([false, false]));
        engine.submit();

        engine.host_mut().set_checked("Roles[1].IsSelected", true);
        assert_eq!(engine.control_changed("Roles[1].IsSelected"), vec![0]);
        assert_eq!(engine.verdicts(), vec![Some(true)]);

        let marker = &engine.host().markers[0];
        assert!(marker.has_class("field-validation-valid"));
        assert_eq!(marker.text(), "");

        // unrelated controls do not trigger the rule
        assert!(engine.control_changed("Roles[1].Name").is_empty());
    }

    #[test]
    fn test_rows_added_after_arming_are_seen() {
        let mut engine = FormValidator::new(roles_form([false, false]));
        engine.submit();

        engine.host_mut().push_checkbox("Roles[2].IsSelected", true);
        assert_eq!(engine.revalidate_rule(0), Some(true));
        // three checkboxes plus their hidden companions
        assert_eq!(engine.bound_controls()[0].1.len(), 6);
        assert_eq!(engine.revalidate_rule(5), None);
    }

    #[test]
    fn test_marker_with_two_rules_shows_first_failure() {
        let marker = MarkerSnapshot::new(
            [
                (MESSAGE_FOR, "Contacts"),
                (REQUIRE, "Need a primary contact"),
                (REQUIRE_PROPERTY, "IsPrimary"),
                (REQUIRE_VALUE, "true"),
                (REQUIRE_TYPE, "boolean"),
                (REQUIRE_MINIMUM, "1"),
                (UNIQUE, "Emails must be unique"),
                (UNIQUE_PROPERTY, "Email"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        let mut form = SnapshotForm::new(vec![marker]);
        form.push_checkbox("Contacts[0].IsPrimary", true);
        form.push(ControlSnapshot::text("Contacts[0].Email", "a"));
        form.push(ControlSnapshot::text("Contacts[1].Email", "a"));

        let mut engine = FormValidator::new(form);
        assert_eq!(engine.rule_count(), 2);
        assert!(!engine.submit().proceed);
        assert_eq!(engine.verdicts(), vec![Some(true), Some(false)]);
        assert_eq!(engine.host().markers[0].text(), "Emails must be unique");

        engine.host_mut().set_value("Contacts[1].Email", "b");
        engine.control_changed("Contacts[1].Email");
        assert_eq!(engine.host().markers[0].text(), "");
    }

    #[test]
    fn test_marker_classes_override_engine_classes() {
        let marker = MarkerSnapshot::new(
            [
                ("class", "is-invalid"),
                (MESSAGE_FOR, "Roles"),
                (REQUIRE, "Please select a role"),
                (REQUIRE_PROPERTY, "IsSelected"),
                (REQUIRE_VALUE, "true"),
                (REQUIRE_TYPE, "boolean"),
                (REQUIRE_MINIMUM, "1"),
                (VALID_CLASS, "is-valid"),
                (ERROR_CLASS, "is-invalid"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        let mut form = SnapshotForm::new(vec![marker]);
        form.push_checkbox("Roles[0].IsSelected", false);

        let mut engine = FormValidator::new(form);
        engine.submit();
        assert!(!engine.marker_valid(0));

        engine.host_mut().set_checked("Roles[0].IsSelected", true);
        engine.control_changed("Roles[0].IsSelected");

        assert!(engine.marker_valid(0));
        let marker = &engine.host().markers[0];
        assert_eq!(marker.state().classes, vec!["is-valid".to_string()]);
        assert!(!marker.has_class("field-validation-valid"));
    }
}
