//! Booking wizard controller.
//!
//! One instance per booking session, owned by its caller. It holds the draft,
//! the current step, the field error map and the confirmation banner, and
//! runs the two suspension points of the flow: prescription compression and
//! submission. Both take `&mut self`, so nothing else can touch the draft
//! while either is in flight.
//!
//! ```text
//! Location → Tests → Schedule → Confirm → Submitting ─┬─ Completed
//!                                    ▲                 │
//!                                    └── banner ◄──────┘ (failure)
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::attachment::{AttachmentCompressor, AttachmentError, CompressionResult, SelectedFile};
use crate::catalog::{CategoryFilter, TestCatalogIndex};
use crate::config::{Settings, ValidationRules};
use crate::models::{BookingDraft, DraftUpdate, Field, LocationType, Locale};
use crate::submission::{BookingSubmitter, SubmissionOutcome};
use crate::validation::{self, Step, ValidationErrors};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Confirm is only available on the confirmation step (current: step {})", .0.number())]
    NotOnConfirmStep(Step),

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("Booking already completed; restart to book again")]
    SessionCompleted,

    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

/// Lifecycle phase on top of the step position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Editing,
    Submitting,
    Completed,
}

/// Last navigation direction. Only drives transition animation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

/// A catalog test as the tests step lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestView {
    pub id: String,
    pub code: String,
    pub label: String,
    pub selected: bool,
}

/// What the confirmation step shows as the requested work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestedItems {
    /// A prescription is attached; it takes priority over any selection.
    Prescription { filename: String },
    Tests { labels: Vec<String> },
    Nothing,
}

/// Read-only projection for the confirmation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationSummary {
    pub contact_name: String,
    pub phone: String,
    pub location_type: LocationType,
    pub address: String,
    pub visit_date: String,
    pub visit_time_slot: String,
    pub requested: RequestedItems,
}

// ═══════════════════════════════════════════════════════════
// WizardController
// ═══════════════════════════════════════════════════════════

pub struct WizardController {
    session_id: Uuid,
    rules: ValidationRules,
    catalog: TestCatalogIndex,
    compressor: AttachmentCompressor,
    submitter: BookingSubmitter,
    locale: Locale,

    draft: BookingDraft,
    encoded_prescription: Option<CompressionResult>,
    step: Step,
    direction: Direction,
    phase: Phase,
    errors: ValidationErrors,
    banner: Option<String>,
    last_outcome: Option<SubmissionOutcome>,
}

impl WizardController {
    pub fn new(catalog: TestCatalogIndex, submitter: BookingSubmitter, settings: &Settings) -> Self {
        let session_id = Uuid::new_v4();
        info!(session = %session_id, tests = catalog.tests().len(), "Booking session started");
        Self {
            session_id,
            rules: settings.validation.clone(),
            catalog,
            compressor: AttachmentCompressor::new(settings.compression.clone()),
            submitter,
            locale: Locale::default(),
            draft: BookingDraft::default(),
            encoded_prescription: None,
            step: Step::Location,
            direction: Direction::Forward,
            phase: Phase::Editing,
            errors: ValidationErrors::new(),
            banner: None,
            last_outcome: None,
        }
    }

    /// Pre-select the test a deep link points at (by id or code).
    /// Unknown hints are ignored.
    pub fn with_deep_link(mut self, hint: Option<&str>) -> Self {
        if let Some(hint) = hint {
            match self.catalog.resolve_deep_link(hint).map(str::to_string) {
                Some(id) => {
                    debug!(session = %self.session_id, test = %id, "Deep link pre-selected test");
                    if !self.draft.is_selected(&id) {
                        self.draft.toggle_test(&id);
                    }
                }
                None => {
                    debug!(session = %self.session_id, hint, "Deep link matched no test");
                }
            }
        }
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn current_step(&self) -> Step {
        self.step
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == Phase::Submitting
    }

    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Failure message shown on the confirmation step.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn catalog(&self) -> &TestCatalogIndex {
        &self.catalog
    }

    pub fn encoded_prescription(&self) -> Option<&CompressionResult> {
        self.encoded_prescription.as_ref()
    }

    /// Outcome of the most recent submission attempt.
    pub fn last_outcome(&self) -> Option<&SubmissionOutcome> {
        self.last_outcome.as_ref()
    }

    // ── Editing ─────────────────────────────────────────────

    /// Merge a partial update and drop the error entries of the touched
    /// fields. Other fields are not re-validated.
    pub fn update_field(&mut self, update: DraftUpdate) {
        if !self.is_editable() {
            return;
        }
        for field in self.draft.apply(update) {
            self.errors.clear_field(field);
        }
    }

    /// Select or deselect a test by catalog id. Returns whether the test is
    /// selected afterwards. Ids outside the catalog cannot be added.
    pub fn toggle_test(&mut self, test_id: &str) -> bool {
        if !self.is_editable() {
            return self.draft.is_selected(test_id);
        }
        if !self.draft.is_selected(test_id) && self.catalog.get(test_id).is_none() {
            warn!(session = %self.session_id, test = test_id, "Ignoring selection of unknown test");
            return false;
        }
        self.errors.clear_field(Field::SelectedTests);
        self.draft.toggle_test(test_id)
    }

    /// Compress and attach a prescription.
    ///
    /// On failure the draft, including any previously attached file, is left
    /// exactly as it was.
    pub async fn attach_prescription(&mut self, file: SelectedFile) -> Result<(), WizardError> {
        self.ensure_editable()?;

        let filename = file.filename.clone();
        let result = match self.compressor.compress(file.clone()).await {
            Ok(result) => result,
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "Prescription rejected");
                return Err(e.into());
            }
        };

        info!(
            session = %self.session_id,
            file = %filename,
            estimate = result.estimated_size_bytes,
            "Prescription attached"
        );
        self.draft.prescription = Some(file.into());
        self.encoded_prescription = Some(result);
        self.errors.clear_field(Field::Prescription);
        Ok(())
    }

    pub fn clear_prescription(&mut self) {
        if !self.is_editable() {
            return;
        }
        self.draft.prescription = None;
        self.encoded_prescription = None;
        self.errors.clear_field(Field::Prescription);
    }

    /// Switch display language. Selections are ids and survive unchanged.
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    // ── Navigation ──────────────────────────────────────────

    /// Advance if the current step's gate holds. Returns whether the step
    /// changed.
    ///
    /// The location step records field errors on refusal; the tests and
    /// schedule steps refuse silently. The confirmation step is the last
    /// one, so `next()` there never moves.
    pub fn next(&mut self) -> bool {
        if !self.is_editable() {
            return false;
        }

        let report = validation::evaluate(self.step, &self.draft, &self.rules);
        if self.step == Step::Location {
            self.errors = report.errors;
        }

        if !report.passed {
            debug!(
                session = %self.session_id,
                step = self.step.number(),
                errors = self.errors.len(),
                "Step gate refused"
            );
            return false;
        }

        let next = self.step.next();
        if next == self.step {
            return false;
        }

        debug!(session = %self.session_id, from = self.step.number(), to = next.number(), "Step advanced");
        self.step = next;
        self.direction = Direction::Forward;
        true
    }

    /// Go back one step. Clears no data. Returns whether the step changed.
    pub fn back(&mut self) -> bool {
        if !self.is_editable() || self.step == Step::Location {
            return false;
        }
        self.step = self.step.previous();
        self.direction = Direction::Backward;
        true
    }

    // ── Submission ──────────────────────────────────────────

    /// Submit the booking. Only valid on the confirmation step.
    ///
    /// Success completes the session and resets the draft. Failure returns
    /// to the confirmation step with the message in the banner; calling
    /// `confirm()` again is the retry.
    pub async fn confirm(&mut self) -> Result<SubmissionOutcome, WizardError> {
        match self.phase {
            Phase::Submitting => return Err(WizardError::SubmissionInProgress),
            Phase::Completed => return Err(WizardError::SessionCompleted),
            Phase::Editing => {}
        }
        if self.step != Step::Confirm {
            return Err(WizardError::NotOnConfirmStep(self.step));
        }

        self.phase = Phase::Submitting;
        self.banner = None;
        info!(
            session = %self.session_id,
            tests = self.draft.selected_tests.len(),
            prescription = self.draft.has_prescription(),
            "Submitting booking"
        );

        let labels = self.catalog.labels(&self.draft.selected_tests, self.locale);
        let outcome = self
            .submitter
            .submit(
                &self.draft,
                labels,
                self.encoded_prescription.as_ref(),
                self.locale,
            )
            .await;

        match &outcome {
            SubmissionOutcome::Success { .. } => {
                info!(session = %self.session_id, "Booking completed");
                self.phase = Phase::Completed;
                self.reset_draft();
            }
            SubmissionOutcome::Failure { kind, message } => {
                warn!(session = %self.session_id, ?kind, "Booking failed, back on confirmation step");
                self.phase = Phase::Editing;
                self.banner = Some(message.clone());
            }
        }

        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Full reset to a fresh session on the first step.
    pub fn restart(&mut self) {
        let previous = self.session_id;
        self.session_id = Uuid::new_v4();
        self.reset_draft();
        self.step = Step::Location;
        self.direction = Direction::Backward;
        self.phase = Phase::Editing;
        self.banner = None;
        self.last_outcome = None;
        info!(session = %self.session_id, previous = %previous, "Booking session restarted");
    }

    // ── Projections ─────────────────────────────────────────

    /// Tests listed on the tests step, labelled in the active locale.
    pub fn visible_tests(&self, filter: &CategoryFilter, query: &str) -> Vec<TestView> {
        self.catalog
            .filter(filter, query)
            .into_iter()
            .map(|t| TestView {
                id: t.id.clone(),
                code: t.code.clone(),
                label: self
                    .catalog
                    .label(&t.id, self.locale)
                    .unwrap_or_else(|| t.code.clone()),
                selected: self.draft.is_selected(&t.id),
            })
            .collect()
    }

    pub fn summary(&self) -> ConfirmationSummary {
        let requested = match &self.draft.prescription {
            Some(p) => RequestedItems::Prescription {
                filename: p.filename.clone(),
            },
            None if !self.draft.selected_tests.is_empty() => RequestedItems::Tests {
                labels: self.catalog.labels(&self.draft.selected_tests, self.locale),
            },
            None => RequestedItems::Nothing,
        };

        ConfirmationSummary {
            contact_name: self.draft.contact_name.clone(),
            phone: self.draft.phone.clone(),
            location_type: self.draft.location_type,
            address: self.draft.address.clone(),
            visit_date: self.draft.visit_date.clone(),
            visit_time_slot: self.draft.visit_time_slot.clone(),
            requested,
        }
    }

    // ── Internal ────────────────────────────────────────────

    fn is_editable(&self) -> bool {
        self.phase == Phase::Editing
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        match self.phase {
            Phase::Editing => Ok(()),
            Phase::Submitting => Err(WizardError::SubmissionInProgress),
            Phase::Completed => Err(WizardError::SessionCompleted),
        }
    }

    fn reset_draft(&mut self) {
        self.draft = BookingDraft::default();
        self.encoded_prescription = None;
        self.errors.clear();
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::messages::Messages;
    use crate::models::{CategoryEntry, LocalizedName, TestCatalogEntry};
    use crate::submission::{
        BookingPayload, BookingTransport, FailureKind, RawReply, SubmissionError,
    };
    use crate::validation::FieldErrorCode;

    type Script = Arc<Mutex<VecDeque<Result<RawReply, SubmissionError>>>>;
    type Sent = Arc<Mutex<Vec<BookingPayload>>>;

    /// Transport replaying scripted replies and recording every payload.
    struct Scripted {
        replies: Script,
        sent: Sent,
    }

    #[async_trait]
    impl BookingTransport for Scripted {
        async fn send(&self, payload: &BookingPayload) -> Result<RawReply, SubmissionError> {
            self.sent.lock().unwrap().push(payload.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SubmissionError::Transport("no scripted reply".into())))
        }
    }

    fn ok(body: &str) -> Result<RawReply, SubmissionError> {
        Ok(RawReply {
            status: 200,
            body: body.into(),
        })
    }

    fn catalog() -> TestCatalogIndex {
        TestCatalogIndex::new(
            vec![CategoryEntry {
                id: "blood".into(),
                name: LocalizedName::new("Blood", "الدم"),
            }],
            vec![
                TestCatalogEntry {
                    id: "cbc".into(),
                    code: "CBC01".into(),
                    category_id: "blood".into(),
                    name: LocalizedName::new("Complete Blood Count", "تعداد الدم الكامل"),
                },
                TestCatalogEntry {
                    id: "fer".into(),
                    code: "FER".into(),
                    category_id: "blood".into(),
                    name: LocalizedName::new("Ferritin", "الفيريتين"),
                },
            ],
        )
    }

    fn wizard(replies: Vec<Result<RawReply, SubmissionError>>) -> (WizardController, Sent) {
        let sent: Sent = Arc::default();
        let transport = Scripted {
            replies: Arc::new(Mutex::new(replies.into())),
            sent: sent.clone(),
        };
        let controller = WizardController::new(
            catalog(),
            BookingSubmitter::new(Box::new(transport)),
            &Settings::default(),
        );
        (controller, sent)
    }

    fn fill_contact(w: &mut WizardController) {
        w.update_field(DraftUpdate {
            contact_name: Some("Rania".into()),
            phone: Some("712345".into()),
            address: Some("3 Cedar Lane".into()),
            ..DraftUpdate::default()
        });
    }

    /// Drive a fresh wizard to the confirmation step with one test selected.
    fn to_confirm(w: &mut WizardController) {
        fill_contact(w);
        assert!(w.next());
        assert!(w.toggle_test("cbc"));
        assert!(w.next());
        w.update_field(DraftUpdate::schedule("2026-11-05", "morning"));
        assert!(w.next());
        assert_eq!(w.current_step(), Step::Confirm);
    }

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([240, 240, 240]));
        let mut cursor = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, image::ImageOutputFormat::Jpeg(90))
            .unwrap();
        cursor.into_inner()
    }

    // ── Step 1 ──

    #[test]
    fn starts_on_location_step() {
        let (w, _) = wizard(vec![]);
        assert_eq!(w.current_step(), Step::Location);
        assert_eq!(w.phase(), Phase::Editing);
        assert!(w.errors().is_empty());
        assert!(w.draft().selected_tests.is_empty());
    }

    #[test]
    fn empty_location_step_is_refused_with_errors() {
        let (mut w, _) = wizard(vec![]);
        assert!(!w.next());
        assert_eq!(w.current_step(), Step::Location);
        assert_eq!(w.errors().len(), 3);
    }

    #[test]
    fn phone_prefix_scenario() {
        let (mut w, _) = wizard(vec![]);
        w.update_field(DraftUpdate {
            contact_name: Some("Rania".into()),
            phone: Some("512345".into()),
            address: Some("3 Cedar Lane".into()),
            ..DraftUpdate::default()
        });
        assert!(!w.next());
        assert_eq!(w.current_step(), Step::Location);
        assert_eq!(
            w.errors().get(Field::Phone),
            Some(FieldErrorCode::PhoneInvalidPrefix)
        );

        w.update_field(DraftUpdate::phone("712345"));
        assert!(w.errors().is_empty());
        assert!(w.next());
        assert_eq!(w.current_step(), Step::Tests);
        assert_eq!(w.direction(), Direction::Forward);
    }

    #[test]
    fn editing_a_field_clears_only_its_error() {
        let (mut w, _) = wizard(vec![]);
        w.next();
        assert_eq!(w.errors().len(), 3);

        w.update_field(DraftUpdate::address("somewhere"));
        assert_eq!(w.errors().len(), 2);
        assert!(w.errors().get(Field::Address).is_none());
        assert!(w.errors().get(Field::ContactName).is_some());
        assert!(w.errors().get(Field::Phone).is_some());

        // A still-invalid value does not bring the error back until next().
        w.update_field(DraftUpdate::phone("123"));
        assert!(w.errors().get(Field::Phone).is_none());
        assert!(w.errors().get(Field::ContactName).is_some());
    }

    // ── Steps 2 and 3 ──

    #[test]
    fn tests_step_refuses_silently_when_empty() {
        let (mut w, _) = wizard(vec![]);
        fill_contact(&mut w);
        assert!(w.next());

        assert!(!w.next());
        assert_eq!(w.current_step(), Step::Tests);
        assert!(w.errors().is_empty());
        assert!(w.banner().is_none());
    }

    #[test]
    fn schedule_step_needs_both_values() {
        let (mut w, _) = wizard(vec![]);
        fill_contact(&mut w);
        w.next();
        w.toggle_test("fer");
        w.next();

        w.update_field(DraftUpdate {
            visit_date: Some("2026-11-05".into()),
            ..DraftUpdate::default()
        });
        assert!(!w.next());
        assert_eq!(w.current_step(), Step::Schedule);

        w.update_field(DraftUpdate {
            visit_time_slot: Some("evening".into()),
            ..DraftUpdate::default()
        });
        assert!(w.next());
        assert_eq!(w.current_step(), Step::Confirm);
    }

    #[test]
    fn next_on_confirm_step_does_not_move() {
        let (mut w, _) = wizard(vec![]);
        to_confirm(&mut w);
        assert!(!w.next());
        assert_eq!(w.current_step(), Step::Confirm);
    }

    #[test]
    fn unknown_test_cannot_be_selected() {
        let (mut w, _) = wizard(vec![]);
        assert!(!w.toggle_test("does-not-exist"));
        assert!(w.draft().selected_tests.is_empty());
    }

    #[test]
    fn back_keeps_data_and_stops_at_first_step() {
        let (mut w, _) = wizard(vec![]);
        to_confirm(&mut w);
        assert!(w.back());
        assert!(w.back());
        assert!(w.back());
        assert!(!w.back());
        assert_eq!(w.current_step(), Step::Location);
        assert_eq!(w.direction(), Direction::Backward);
        assert_eq!(w.draft().contact_name, "Rania");
        assert_eq!(w.draft().selected_tests, vec!["cbc"]);
        assert_eq!(w.draft().visit_time_slot, "morning");
    }

    // ── Deep link and locale ──

    #[test]
    fn deep_link_preselects_by_code() {
        let (w, _) = wizard(vec![]);
        let w = w.with_deep_link(Some("fer"));
        assert_eq!(w.draft().selected_tests, vec!["fer"]);

        let (w, _) = wizard(vec![]);
        let w = w.with_deep_link(Some("cbc01"));
        assert_eq!(w.draft().selected_tests, vec!["cbc"]);

        let (w, _) = wizard(vec![]);
        let w = w.with_deep_link(Some("nope"));
        assert!(w.draft().selected_tests.is_empty());
    }

    #[test]
    fn locale_switch_keeps_selection() {
        let (mut w, _) = wizard(vec![]);
        w.toggle_test("cbc");
        w.set_locale(Locale::Ar);

        let views = w.visible_tests(&CategoryFilter::All, "");
        let cbc = views.iter().find(|v| v.id == "cbc").unwrap();
        assert!(cbc.selected);
        assert_eq!(cbc.label, "تعداد الدم الكامل");

        // Deselecting from the Arabic list removes the same selection.
        assert!(!w.toggle_test("cbc"));
        assert!(w.draft().selected_tests.is_empty());
    }

    // ── Prescription ──

    #[tokio::test]
    async fn prescription_satisfies_tests_step() {
        let (mut w, _) = wizard(vec![]);
        fill_contact(&mut w);
        w.next();

        w.attach_prescription(SelectedFile::new("rx.jpg", "image/jpeg", jpeg(64, 48)))
            .await
            .unwrap();
        assert!(w.draft().has_prescription());
        assert!(w.encoded_prescription().is_some());
        assert!(w.next());
        assert_eq!(w.current_step(), Step::Schedule);
    }

    #[tokio::test]
    async fn failed_attachment_leaves_previous_one() {
        let (mut w, _) = wizard(vec![]);
        w.attach_prescription(SelectedFile::new("first.pdf", "application/pdf", b"%PDF".to_vec()))
            .await
            .unwrap();

        let err = w
            .attach_prescription(SelectedFile::new("broken.png", "image/png", b"junk".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WizardError::Attachment(AttachmentError::DecodeFailure(_))
        ));
        assert_eq!(w.draft().prescription.as_ref().unwrap().filename, "first.pdf");
        assert!(w
            .encoded_prescription()
            .unwrap()
            .encoded_payload
            .starts_with("data:application/pdf;base64,"));
    }

    #[tokio::test]
    async fn summary_prefers_prescription_over_tests() {
        let (mut w, _) = wizard(vec![]);
        to_confirm(&mut w);
        assert_eq!(
            w.summary().requested,
            RequestedItems::Tests {
                labels: vec!["Complete Blood Count".into()]
            }
        );

        w.attach_prescription(SelectedFile::new("rx.pdf", "application/pdf", b"%PDF".to_vec()))
            .await
            .unwrap();
        assert_eq!(
            w.summary().requested,
            RequestedItems::Prescription {
                filename: "rx.pdf".into()
            }
        );

        w.clear_prescription();
        assert!(matches!(w.summary().requested, RequestedItems::Tests { .. }));
    }

    // ── Confirm ──

    #[tokio::test]
    async fn confirm_outside_confirmation_step_is_rejected() {
        let (mut w, sent) = wizard(vec![ok(r#"{"status":"success"}"#)]);
        let err = w.confirm().await.unwrap_err();
        assert!(matches!(err, WizardError::NotOnConfirmStep(Step::Location)));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn network_failure_keeps_confirmation_step() {
        let (mut w, _) = wizard(vec![Err(SubmissionError::Connection(
            "http://localhost:3000/api/booking".into(),
        ))]);
        to_confirm(&mut w);

        let outcome = w.confirm().await.unwrap();
        assert!(matches!(
            outcome,
            SubmissionOutcome::Failure {
                kind: FailureKind::Transport,
                ..
            }
        ));
        assert_eq!(w.current_step(), Step::Confirm);
        assert!(!w.is_submitting());
        assert_eq!(w.banner(), Some(Messages::network_error(Locale::En)));
        assert_eq!(w.draft().selected_tests, vec!["cbc"]);

        w.dismiss_banner();
        assert!(w.banner().is_none());
    }

    #[tokio::test]
    async fn both_success_envelopes_complete_the_session() {
        for body in [r#"{"status":"success"}"#, r#"{"message":{"message":"success"}}"#] {
            let (mut w, sent) = wizard(vec![ok(body)]);
            to_confirm(&mut w);

            let outcome = w.confirm().await.unwrap();
            assert!(outcome.is_success(), "{body}");
            assert!(w.is_completed());
            assert_eq!(w.draft(), &BookingDraft::default());
            assert_eq!(sent.lock().unwrap().len(), 1);

            assert!(matches!(
                w.confirm().await.unwrap_err(),
                WizardError::SessionCompleted
            ));
            assert!(!w.next());
        }
    }

    #[tokio::test]
    async fn retry_after_rejection_sends_again() {
        let (mut w, sent) = wizard(vec![
            ok(r#"{"status":"error","message":"Slot unavailable"}"#),
            ok(r#"{"status":"success"}"#),
        ]);
        to_confirm(&mut w);

        let first = w.confirm().await.unwrap();
        assert_eq!(first.message(), "Slot unavailable");
        assert_eq!(w.banner(), Some("Slot unavailable"));

        let second = w.confirm().await.unwrap();
        assert!(second.is_success());
        assert!(w.banner().is_none());
        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn payload_is_a_snapshot_of_the_draft_at_confirm() {
        let (mut w, sent) = wizard(vec![
            Err(SubmissionError::Timeout(30)),
            ok(r#"{"status":"success"}"#),
        ]);
        to_confirm(&mut w);
        w.back();
        w.toggle_test("fer");
        w.next();
        let at_confirm = w.catalog().labels(&w.draft().selected_tests, w.locale());

        w.confirm().await.unwrap();
        assert_eq!(sent.lock().unwrap()[0].selected_tests, at_confirm);

        // Later edits do not touch what was sent.
        w.back();
        w.toggle_test("cbc");
        w.next();
        assert_eq!(
            sent.lock().unwrap()[0].selected_tests,
            vec!["Complete Blood Count".to_string(), "Ferritin".to_string()]
        );

        w.confirm().await.unwrap();
        assert_eq!(sent.lock().unwrap()[1].selected_tests, vec!["Ferritin".to_string()]);
    }

    #[tokio::test]
    async fn payload_labels_follow_active_locale() {
        let (mut w, sent) = wizard(vec![ok(r#"{"status":"success"}"#)]);
        to_confirm(&mut w);
        w.set_locale(Locale::Ar);
        w.confirm().await.unwrap();
        assert_eq!(
            sent.lock().unwrap()[0].selected_tests,
            vec!["تعداد الدم الكامل".to_string()]
        );
    }

    #[tokio::test]
    async fn payload_carries_compressed_prescription() {
        let (mut w, sent) = wizard(vec![ok(r#"{"status":"success"}"#)]);
        to_confirm(&mut w);
        w.attach_prescription(SelectedFile::new("rx.jpg", "image/jpeg", jpeg(32, 32)))
            .await
            .unwrap();
        let encoded = w.encoded_prescription().unwrap().encoded_payload.clone();

        w.confirm().await.unwrap();
        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].prescription_file.as_deref(), Some(encoded.as_str()));
        assert_eq!(sent[0].prescription_file_name.as_deref(), Some("rx.jpg"));
        assert_eq!(sent[0].selected_tests, vec!["Complete Blood Count".to_string()]);
    }

    #[tokio::test]
    async fn restart_returns_to_a_fresh_session() {
        let (mut w, _) = wizard(vec![ok(r#"{"status":"success"}"#)]);
        let first_session = w.session_id();
        to_confirm(&mut w);
        w.confirm().await.unwrap();

        w.restart();
        assert_ne!(w.session_id(), first_session);
        assert_eq!(w.current_step(), Step::Location);
        assert_eq!(w.phase(), Phase::Editing);
        assert!(w.last_outcome().is_none());
        assert_eq!(w.draft(), &BookingDraft::default());
    }

    #[test]
    fn restart_mid_session_discards_draft() {
        let (mut w, _) = wizard(vec![]);
        fill_contact(&mut w);
        w.next();
        w.toggle_test("cbc");
        w.restart();
        assert_eq!(w.current_step(), Step::Location);
        assert!(w.draft().selected_tests.is_empty());
        assert!(w.draft().contact_name.is_empty());
    }
}
