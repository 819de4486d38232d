// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Intake form state management.
//!
//! The controller owns the draft record, the chosen photo, the current
//! validation messages, and the last submission together with its QR
//! artifact. Encoding runs on a background thread; the UI calls
//! [`IntakeController::poll_encoding`] once per frame to collect the result.

use super::handoff::HandoffPayload;
use super::record::{Field, Record, ValidatedRecord};
use super::validation::{validate, ValidationErrors, ValidationRules};
use crate::config::AppConfig;
use crate::io::encoder::{Artifact, ArtifactEncoder, EncodingFailure, QrEncoder, RenderConfig};
use crate::io::media::{PhotoRef, PhotoResource};
use chrono::Datelike;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;

type EncodeResult = Result<Artifact, EncodingFailure>;

/// Where the controller is in the submit/encode cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Nothing submitted yet.
    Editing,
    /// A submission is being encoded.
    Encoding,
    /// The last submission has an artifact and can be handed off.
    Ready,
    /// Encoding the last submission failed.
    Failed(EncodingFailure),
}

/// A frozen record and the outcome of encoding it.
#[derive(Debug)]
struct Submission {
    record: ValidatedRecord,
    outcome: Option<EncodeResult>,
}

/// State of the intake form.
pub struct IntakeController {
    rules: ValidationRules,
    render: RenderConfig,
    encoder: Arc<dyn ArtifactEncoder>,
    current_year: i32,

    /// Record being edited
    draft: Record,

    /// Picked photo backing `draft.photo_url`, if any
    photo: Option<PhotoRef>,

    /// Messages from the last validation, cleared field by field on edit
    errors: ValidationErrors,

    /// Last successful validation
    submission: Option<Submission>,

    /// Receiver for the in-flight encode
    pending: Option<Receiver<EncodeResult>>,
}

impl IntakeController {
    /// Create a controller using the QR encoder and today's year.
    pub fn new(config: &AppConfig) -> Self {
        Self::with_encoder(
            config.validation.clone(),
            config.qr.clone(),
            Arc::new(QrEncoder),
            chrono::Local::now().year(),
        )
    }

    pub fn with_encoder(
        rules: ValidationRules,
        render: RenderConfig,
        encoder: Arc<dyn ArtifactEncoder>,
        current_year: i32,
    ) -> Self {
        Self {
            rules,
            render,
            encoder,
            current_year,
            draft: Record::new(),
            photo: None,
            errors: ValidationErrors::new(),
            submission: None,
            pending: None,
        }
    }

    pub fn draft(&self) -> &Record {
        &self.draft
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn photo(&self) -> Option<&PhotoRef> {
        self.photo.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.pending.is_some() {
            return Phase::Encoding;
        }
        match self.submission.as_ref().and_then(|s| s.outcome.as_ref()) {
            None => Phase::Editing,
            Some(Ok(_)) => Phase::Ready,
            Some(Err(e)) => Phase::Failed(e.clone()),
        }
    }

    /// Submitting is blocked while an encode is running.
    pub fn can_submit(&self) -> bool {
        self.pending.is_none()
    }

    /// Artifact of the last submission, once encoded.
    pub fn artifact(&self) -> Option<&Artifact> {
        match self.submission.as_ref()?.outcome.as_ref()? {
            Ok(artifact) => Some(artifact),
            Err(_) => None,
        }
    }

    /// The record frozen by the last successful submit.
    pub fn submitted(&self) -> Option<&ValidatedRecord> {
        self.submission.as_ref().map(|s| &s.record)
    }

    /// Whether the draft was edited after the last submission.
    pub fn draft_differs_from_submission(&self) -> bool {
        self.submitted()
            .map(|s| {
                Field::ALL
                    .iter()
                    .any(|&f| s.record().get(f) != self.draft.get(f))
            })
            .unwrap_or(false)
    }

    /// Change one field of the draft and clear its validation message.
    pub fn update_field(&mut self, field: Field, value: String) {
        if field == Field::Photo {
            let keeps_photo = self.photo.as_ref().map(|p| p.url() == value).unwrap_or(false);
            if !keeps_photo {
                self.release_photo();
            }
        }

        log::debug!("Updated {} field", field);
        self.draft.set(field, value);
        self.errors.clear(field);
    }

    /// Use a picked or dropped photo, releasing the previous one.
    pub fn select_photo(&mut self, resource: PhotoResource) {
        let photo = PhotoRef::from_resource(resource);
        log::info!("Selected photo {}", photo.url());

        self.draft.photo_url = photo.url().to_string();
        self.release_photo();
        self.photo = Some(photo);
        self.errors.clear(Field::Photo);
    }

    /// Report a photo that could not be used.
    pub fn reject_photo(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("Rejected photo: {}", message);
        self.errors.insert(Field::Photo, message);
    }

    /// Validate the draft and, if it passes, start encoding it.
    pub fn submit(&mut self) -> Result<ValidatedRecord, ValidationErrors> {
        if self.pending.is_some() {
            if let Some(submission) = &self.submission {
                log::warn!("Submit ignored, encoding still in progress");
                return Ok(submission.record.clone());
            }
        }

        match validate(&self.draft, &self.rules, self.current_year) {
            Ok(record) => {
                self.errors = ValidationErrors::new();
                log::info!("Submitted record for {:?}", record.record().name);
                self.start_encoding(record.clone());
                Ok(record)
            }
            Err(errors) => {
                log::info!("Submission rejected ({} field(s)): {}", errors.len(), errors);
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }

    /// Encode the current submission again after a failure.
    pub fn retry_encoding(&mut self) -> bool {
        if !matches!(self.phase(), Phase::Failed(_)) {
            return false;
        }
        match self.submission.as_ref() {
            Some(submission) => {
                let record = submission.record.clone();
                log::info!("Retrying encoding");
                self.start_encoding(record);
                true
            }
            None => false,
        }
    }

    /// Collect a finished encode. Returns true when the phase changed.
    pub fn poll_encoding(&mut self) -> bool {
        let result = match self.pending.as_ref().map(|rx| rx.try_recv()) {
            None | Some(Err(TryRecvError::Empty)) => return false,
            Some(Ok(result)) => result,
            Some(Err(TryRecvError::Disconnected)) => Err(EncodingFailure::Render(
                "encoder stopped unexpectedly".to_string(),
            )),
        };
        self.finish_encoding(result);
        true
    }

    /// Payload for the card view, once the submission is encoded.
    pub fn proceed_to_presentation(&self) -> Option<HandoffPayload> {
        let submission = self.submission.as_ref()?;
        if self.pending.is_some() {
            return None;
        }
        match submission.outcome.as_ref()? {
            Ok(artifact) => Some(HandoffPayload::new(&submission.record, artifact)),
            Err(_) => None,
        }
    }

    fn start_encoding(&mut self, record: ValidatedRecord) {
        let payload = record.payload();
        self.submission = Some(Submission {
            record,
            outcome: None,
        });
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                self.finish_encoding(Err(e.into()));
                return;
            }
        };

        let (sender, receiver) = channel();
        self.pending = Some(receiver);

        let encoder = Arc::clone(&self.encoder);
        let render = self.render.clone();
        std::thread::spawn(move || {
            let _ = sender.send(encoder.encode(&payload, &render));
        });
    }

    fn finish_encoding(&mut self, result: EncodeResult) {
        self.pending = None;
        match &result {
            Ok(artifact) => {
                let (w, h) = artifact.size();
                log::info!("QR code ready ({}x{})", w, h);
            }
            Err(e) => log::warn!("Encoding failed: {}", e),
        }
        if let Some(submission) = self.submission.as_mut() {
            submission.outcome = Some(result);
        }
    }

    fn release_photo(&mut self) {
        if let Some(old) = self.photo.take() {
            log::debug!("Released photo reference {}", old.url());
        }
    }
}

impl Drop for IntakeController {
    fn drop(&mut self) {
        self.release_photo();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::encoder::tests::decode_qr;
    use crate::io::encoder::png_from_data_url;
    use crate::io::media::tests::tiny_resource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Counts calls and fails the first `failures` of them.
    struct FlakyEncoder {
        calls: AtomicUsize,
        failures: usize,
        payloads: Mutex<Vec<String>>,
    }

    impl FlakyEncoder {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failures,
                payloads: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ArtifactEncoder for FlakyEncoder {
        fn encode(&self, payload: &str, config: &RenderConfig) -> Result<Artifact, EncodingFailure> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads.lock().unwrap().push(payload.to_string());
            if call < self.failures {
                return Err(EncodingFailure::Render("simulated".to_string()));
            }
            QrEncoder.encode(payload, config)
        }
    }

    fn controller(encoder: Arc<dyn ArtifactEncoder>) -> IntakeController {
        IntakeController::with_encoder(
            ValidationRules::default(),
            RenderConfig::default(),
            encoder,
            2026,
        )
    }

    fn fill_jane(c: &mut IntakeController) {
        c.update_field(Field::Name, "Jane Doe".to_string());
        c.update_field(Field::Batch, "2020".to_string());
        c.update_field(Field::Branch, "Computer Science and Engineering".to_string());
        c.select_photo(tiny_resource("jane.png"));
    }

    /// Block until the in-flight encode finishes.
    fn wait(c: &mut IntakeController) {
        let rx = c.pending.as_ref().expect("no encode in flight");
        let result = rx.recv_timeout(Duration::from_secs(10)).expect("encoder timed out");
        c.finish_encoding(result);
    }

    #[test]
    fn test_jane_doe_scenario() {
        let encoder = FlakyEncoder::new(0);
        let mut c = controller(encoder.clone());
        fill_jane(&mut c);

        let validated = c.submit().unwrap();
        assert_eq!(c.phase(), Phase::Encoding);
        assert!(c.proceed_to_presentation().is_none());
        wait(&mut c);
        assert_eq!(c.phase(), Phase::Ready);

        let photo_url = c.photo().unwrap().url().to_string();
        let expected = format!(
            r#"{{"name":"Jane Doe","batch":"2020","branch":"Computer Science and Engineering","photoUrl":"{}"}}"#,
            photo_url
        );
        assert_eq!(encoder.payloads.lock().unwrap().as_slice(), &[expected.clone()]);
        assert_eq!(validated.payload().unwrap(), expected);

        let handoff = c.proceed_to_presentation().unwrap();
        assert_eq!(handoff.name, "Jane Doe");
        assert_eq!(handoff.batch, "2020");
        assert_eq!(handoff.degree, "Computer Science and Engineering");
        assert_eq!(handoff.photo_url, photo_url);
        assert!(!handoff.qr_url.is_empty());

        let png = png_from_data_url(&handoff.qr_url).unwrap();
        assert_eq!(decode_qr(&png), expected);
    }

    #[test]
    fn test_handoff_keeps_exact_values() {
        let mut c = controller(FlakyEncoder::new(0));
        fill_jane(&mut c);
        c.update_field(Field::Name, "  Jane   Doe ".to_string());
        c.update_field(Field::Batch, " 2020".to_string());
        c.submit().unwrap();
        wait(&mut c);

        let handoff = c.proceed_to_presentation().unwrap();
        assert_eq!(handoff.name, "  Jane   Doe ");
        assert_eq!(handoff.batch, " 2020");

        let decoded: Record = serde_json::from_str(&decode_qr(&png_from_data_url(&handoff.qr_url).unwrap())).unwrap();
        assert_eq!(&decoded, c.draft());
    }

    #[test]
    fn test_blank_fields_block_encoding() {
        let encoder = FlakyEncoder::new(0);
        let mut c = controller(encoder.clone());
        fill_jane(&mut c);
        c.update_field(Field::Name, "   ".to_string());

        let errors = c.submit().unwrap_err();
        assert!(errors.contains(Field::Name));
        assert_eq!(c.errors(), &errors);
        assert_eq!(c.phase(), Phase::Editing);
        assert!(c.can_submit());
        assert_eq!(encoder.calls(), 0);
    }

    #[test]
    fn test_out_of_range_batch_is_rejected() {
        for batch in ["1800", "2076"] {
            let mut c = controller(FlakyEncoder::new(0));
            fill_jane(&mut c);
            c.update_field(Field::Batch, batch.to_string());
            assert!(c.submit().unwrap_err().contains(Field::Batch), "batch {}", batch);
        }
    }

    #[test]
    fn test_editing_clears_only_that_error() {
        let mut c = controller(FlakyEncoder::new(0));
        c.submit().unwrap_err();
        assert_eq!(c.errors().len(), 4);

        c.update_field(Field::Name, "J".to_string());
        assert!(!c.errors().contains(Field::Name));
        assert!(c.errors().contains(Field::Batch));

        c.select_photo(tiny_resource("j.png"));
        assert!(!c.errors().contains(Field::Photo));
        assert_eq!(c.errors().len(), 2);
    }

    #[test]
    fn test_submission_is_frozen() {
        let mut c = controller(FlakyEncoder::new(0));
        fill_jane(&mut c);
        c.submit().unwrap();
        wait(&mut c);

        c.update_field(Field::Name, "Someone Else".to_string());
        assert!(c.draft_differs_from_submission());
        assert_eq!(c.submitted().unwrap().record().name, "Jane Doe");
        assert_eq!(c.proceed_to_presentation().unwrap().name, "Jane Doe");
    }

    #[test]
    fn test_encoding_failure_then_retry() {
        let encoder = FlakyEncoder::new(1);
        let mut c = controller(encoder.clone());
        fill_jane(&mut c);
        c.submit().unwrap();
        wait(&mut c);

        assert!(matches!(c.phase(), Phase::Failed(_)));
        assert!(c.proceed_to_presentation().is_none());
        assert!(c.submitted().is_some());

        assert!(c.retry_encoding());
        wait(&mut c);
        assert_eq!(c.phase(), Phase::Ready);
        assert!(c.proceed_to_presentation().is_some());
        assert_eq!(encoder.calls(), 2);
        assert!(!c.retry_encoding());
    }

    #[test]
    fn test_oversized_record_reports_failure() {
        let mut c = controller(Arc::new(QrEncoder));
        fill_jane(&mut c);
        c.update_field(Field::Name, "N".repeat(4000));
        c.submit().unwrap();
        wait(&mut c);

        assert!(matches!(c.phase(), Phase::Failed(EncodingFailure::PayloadTooLarge(_))));
        assert!(c.artifact().is_none());
    }

    #[test]
    fn test_resubmit_while_encoding_is_ignored() {
        let encoder = FlakyEncoder::new(0);
        let mut c = controller(encoder.clone());
        fill_jane(&mut c);
        let first = c.submit().unwrap();
        assert!(!c.can_submit());

        c.update_field(Field::Name, "Changed".to_string());
        let second = c.submit().unwrap();
        assert_eq!(first, second);
        wait(&mut c);
        assert_eq!(encoder.calls(), 1);
    }

    #[test]
    fn test_identical_resubmission_gives_same_artifact() {
        let mut c = controller(FlakyEncoder::new(0));
        fill_jane(&mut c);
        c.submit().unwrap();
        wait(&mut c);
        let first = c.proceed_to_presentation().unwrap();

        c.submit().unwrap();
        wait(&mut c);
        assert_eq!(c.proceed_to_presentation().unwrap(), first);
    }

    #[test]
    fn test_poll_collects_result() {
        let mut c = controller(FlakyEncoder::new(0));
        fill_jane(&mut c);
        c.submit().unwrap();

        let mut changed = false;
        for _ in 0..500 {
            if c.poll_encoding() {
                changed = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(changed);
        assert_eq!(c.phase(), Phase::Ready);
        assert!(!c.poll_encoding());
    }

    #[test]
    fn test_superseded_photo_is_released() {
        let mut c = controller(FlakyEncoder::new(0));
        c.select_photo(tiny_resource("first.png"));
        let first = c.photo().unwrap().downgrade();

        c.select_photo(tiny_resource("second.png"));
        assert!(first.upgrade().is_none());
        assert!(c.draft().photo_url.ends_with("second.png"));

        let second = c.photo().unwrap().downgrade();
        c.update_field(Field::Photo, "https://example.com/me.png".to_string());
        assert!(second.upgrade().is_none());
        assert!(c.photo().is_none());
    }

    #[test]
    fn test_photo_released_on_teardown() {
        let mut c = controller(FlakyEncoder::new(0));
        c.select_photo(tiny_resource("me.png"));
        let weak = c.photo().unwrap().downgrade();
        drop(c);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_rejected_photo_sets_error() {
        let mut c = controller(FlakyEncoder::new(0));
        c.reject_photo("not an image");
        assert_eq!(c.errors().get(Field::Photo), Some("not an image"));
    }
}
