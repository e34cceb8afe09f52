//! Step validators: pure gates that decide whether the wizard may leave a
//! step.
//!
//! Two separate notions per step:
//! - `step_gate`: the completion predicate every step has.
//! - `validate_location`: field-level error codes, produced for the
//!   location/contact step only.
//!
//! Steps 2 and 3 refuse silently: their gate can fail without any field
//! error being recorded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ValidationRules;
use crate::models::{BookingDraft, Field};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// The four wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Location,
    Tests,
    Schedule,
    Confirm,
}

impl Step {
    /// 1-based step number.
    pub fn number(&self) -> u8 {
        match self {
            Self::Location => 1,
            Self::Tests => 2,
            Self::Schedule => 3,
            Self::Confirm => 4,
        }
    }

    /// Following step; saturates at `Confirm`.
    pub fn next(&self) -> Self {
        match self {
            Self::Location => Self::Tests,
            Self::Tests => Self::Schedule,
            Self::Schedule | Self::Confirm => Self::Confirm,
        }
    }

    /// Preceding step; saturates at `Location`.
    pub fn previous(&self) -> Self {
        match self {
            Self::Location | Self::Tests => Self::Location,
            Self::Schedule => Self::Tests,
            Self::Confirm => Self::Schedule,
        }
    }
}

/// Field-level error codes for the location/contact step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorCode {
    #[error("Name is required")]
    NameRequired,
    #[error("Phone number is required")]
    PhoneRequired,
    #[error("Phone number must be a local mobile number")]
    PhoneInvalidPrefix,
    #[error("Address is required")]
    AddressRequired,
}

impl FieldErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NameRequired => "name_required",
            Self::PhoneRequired => "phone_required",
            Self::PhoneInvalidPrefix => "phone_invalid_prefix",
            Self::AddressRequired => "address_required",
        }
    }
}

/// Field name → error code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(BTreeMap<Field, FieldErrorCode>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, code: FieldErrorCode) {
        self.0.insert(field, code);
    }

    pub fn get(&self, field: Field) -> Option<FieldErrorCode> {
        self.0.get(&field).copied()
    }

    /// Drop the entry for `field` only.
    pub fn clear_field(&mut self, field: Field) -> Option<FieldErrorCode> {
        self.0.remove(&field)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, FieldErrorCode)> + '_ {
        self.0.iter().map(|(f, c)| (*f, *c))
    }
}

/// Outcome of evaluating one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub passed: bool,
    pub errors: ValidationErrors,
}

// ═══════════════════════════════════════════════════════════
// Rules
// ═══════════════════════════════════════════════════════════

/// Field errors for the location/contact step. Empty when the step is valid.
pub fn validate_location(draft: &BookingDraft, rules: &ValidationRules) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if draft.contact_name.trim().is_empty() {
        errors.insert(Field::ContactName, FieldErrorCode::NameRequired);
    }

    if let Some(code) = check_phone(&draft.phone, rules) {
        errors.insert(Field::Phone, code);
    }

    if draft.address.trim().is_empty() {
        errors.insert(Field::Address, FieldErrorCode::AddressRequired);
    }

    errors
}

/// Phone must be non-empty and start with the local mobile prefix digit.
pub fn check_phone(phone: &str, rules: &ValidationRules) -> Option<FieldErrorCode> {
    let phone = phone.trim();
    if phone.is_empty() {
        Some(FieldErrorCode::PhoneRequired)
    } else if !phone.starts_with(rules.mobile_prefix) {
        Some(FieldErrorCode::PhoneInvalidPrefix)
    } else {
        None
    }
}

/// Completion predicate for `step`.
pub fn step_gate(step: Step, draft: &BookingDraft, rules: &ValidationRules) -> bool {
    match step {
        Step::Location => validate_location(draft, rules).is_empty(),
        Step::Tests => !draft.selected_tests.is_empty() || draft.has_prescription(),
        Step::Schedule => {
            !draft.visit_date.trim().is_empty() && !draft.visit_time_slot.trim().is_empty()
        }
        Step::Confirm => true,
    }
}

/// Gate plus field errors. Only the location step ever yields errors.
pub fn evaluate(step: Step, draft: &BookingDraft, rules: &ValidationRules) -> StepReport {
    match step {
        Step::Location => {
            let errors = validate_location(draft, rules);
            StepReport {
                passed: errors.is_empty(),
                errors,
            }
        }
        _ => StepReport {
            passed: step_gate(step, draft, rules),
            errors: ValidationErrors::new(),
        },
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrescriptionAttachment;

    fn rules() -> ValidationRules {
        ValidationRules::default()
    }

    fn contact(name: &str, phone: &str, address: &str) -> BookingDraft {
        BookingDraft {
            contact_name: name.into(),
            phone: phone.into(),
            address: address.into(),
            ..BookingDraft::default()
        }
    }

    #[test]
    fn empty_location_step_reports_all_three_fields() {
        let errors = validate_location(&BookingDraft::default(), &rules());
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get(Field::ContactName), Some(FieldErrorCode::NameRequired));
        assert_eq!(errors.get(Field::Phone), Some(FieldErrorCode::PhoneRequired));
        assert_eq!(errors.get(Field::Address), Some(FieldErrorCode::AddressRequired));
    }

    #[test]
    fn phone_with_wrong_prefix_is_rejected() {
        let draft = contact("Sami", "512345", "Main St");
        let report = evaluate(Step::Location, &draft, &rules());
        assert!(!report.passed);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            report.errors.get(Field::Phone),
            Some(FieldErrorCode::PhoneInvalidPrefix)
        );
    }

    #[test]
    fn phone_with_mobile_prefix_passes() {
        let draft = contact("Sami", "712345", "Main St");
        assert!(step_gate(Step::Location, &draft, &rules()));
        assert!(evaluate(Step::Location, &draft, &rules()).errors.is_empty());
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        let draft = contact("   ", " 712345 ", "\t");
        let errors = validate_location(&draft, &rules());
        assert!(errors.get(Field::ContactName).is_some());
        assert!(errors.get(Field::Phone).is_none());
        assert!(errors.get(Field::Address).is_some());
    }

    #[test]
    fn custom_prefix_is_honoured() {
        let rules = ValidationRules { mobile_prefix: '5' };
        assert_eq!(check_phone("512345", &rules), None);
        assert_eq!(
            check_phone("712345", &rules),
            Some(FieldErrorCode::PhoneInvalidPrefix)
        );
    }

    #[test]
    fn tests_step_needs_selection_or_prescription() {
        let mut draft = BookingDraft::default();
        let report = evaluate(Step::Tests, &draft, &rules());
        assert!(!report.passed);
        assert!(report.errors.is_empty(), "tests step refuses silently");

        draft.selected_tests.push("cbc".into());
        assert!(step_gate(Step::Tests, &draft, &rules()));

        draft.selected_tests.clear();
        draft.prescription = Some(PrescriptionAttachment {
            filename: "rx.pdf".into(),
            media_type: "application/pdf".into(),
            bytes: vec![0x25, 0x50, 0x44, 0x46],
        });
        assert!(step_gate(Step::Tests, &draft, &rules()));
    }

    #[test]
    fn schedule_step_needs_date_and_slot() {
        let mut draft = BookingDraft {
            visit_date: "2026-11-02".into(),
            ..BookingDraft::default()
        };
        let report = evaluate(Step::Schedule, &draft, &rules());
        assert!(!report.passed);
        assert!(report.errors.is_empty());

        draft.visit_time_slot = "morning".into();
        assert!(step_gate(Step::Schedule, &draft, &rules()));
    }

    #[test]
    fn confirm_step_has_no_gate() {
        assert!(step_gate(Step::Confirm, &BookingDraft::default(), &rules()));
    }

    #[test]
    fn clearing_one_field_keeps_others() {
        let mut errors = validate_location(&BookingDraft::default(), &rules());
        assert_eq!(errors.clear_field(Field::Phone), Some(FieldErrorCode::PhoneRequired));
        assert_eq!(errors.len(), 2);
        assert!(errors.get(Field::ContactName).is_some());
        assert!(errors.get(Field::Address).is_some());
    }

    #[test]
    fn step_navigation_saturates() {
        assert_eq!(Step::Confirm.next(), Step::Confirm);
        assert_eq!(Step::Location.previous(), Step::Location);
        assert_eq!(Step::Tests.next().number(), 3);
    }
}
