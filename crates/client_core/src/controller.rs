//! Upload/result lifecycle controller.
//!
//! Every user action is a method taking `&mut self`; the only suspension point
//! is the transport call inside [`PendingSubmission::send`]. Hosts that run
//! the request elsewhere (a background task, a test) can split
//! [`UploadController::submit`] into `begin_submit`, `send` and `complete`.

use std::sync::Arc;

use shared::{
    domain::{PreviewImage, SelectedFile},
    error::DetectError,
    protocol::PredictionResult,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    transport::{HttpPredictionTransport, PredictionTransport},
    validation::validate_upload,
};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleState {
    Idle,
    FileReady,
    Submitting,
    Success(PredictionResult),
    Error(DetectError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    ResultAvailable(PredictionResult),
    ErrorAvailable(DetectError),
    LoadingChanged(bool),
}

/// Outcome of [`UploadController::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The controller moved on (reset, new file, newer submission) before the
    /// response arrived.
    Discarded,
}

#[derive(Debug, Clone)]
struct Selection {
    file: Arc<SelectedFile>,
    preview: PreviewImage,
}

/// Ticket for the one request allowed in flight.
#[derive(Debug)]
pub struct PendingSubmission {
    generation: u64,
    file: Arc<SelectedFile>,
}

impl PendingSubmission {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    pub async fn send(self, transport: &dyn PredictionTransport) -> SubmissionOutcome {
        let result = transport.predict(&self.file).await;
        self.resolve(result)
    }

    pub fn resolve(self, result: Result<PredictionResult, DetectError>) -> SubmissionOutcome {
        SubmissionOutcome {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct SubmissionOutcome {
    generation: u64,
    result: Result<PredictionResult, DetectError>,
}

impl SubmissionOutcome {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn result(&self) -> &Result<PredictionResult, DetectError> {
        &self.result
    }
}

pub struct UploadController {
    transport: Arc<dyn PredictionTransport>,
    state: LifecycleState,
    selection: Option<Selection>,
    /// Last refused action (rejected intake, submit without a file). Does not
    /// change `state`.
    notice: Option<DetectError>,
    /// Bumped by every intake, reset and submission; responses carrying an
    /// older value are stale.
    generation: u64,
    events: broadcast::Sender<ControllerEvent>,
}

impl UploadController {
    pub fn new(transport: Arc<dyn PredictionTransport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            state: LifecycleState::Idle,
            selection: None,
            notice: None,
            generation: 0,
            events,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let transport = HttpPredictionTransport::new(settings)?;
        info!(url = transport.predict_url(), "detection endpoint configured");
        Ok(Self::new(Arc::new(transport)))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selection.as_ref().map(|selection| selection.file.as_ref())
    }

    pub fn preview(&self) -> Option<&PreviewImage> {
        self.selection.as_ref().map(|selection| &selection.preview)
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match &self.state {
            LifecycleState::Success(result) => Some(result),
            _ => None,
        }
    }

    /// The message the host should show: a refused action takes precedence
    /// over a failed submission.
    pub fn error(&self) -> Option<&DetectError> {
        match (&self.notice, &self.state) {
            (Some(notice), _) => Some(notice),
            (None, LifecycleState::Error(err)) => Some(err),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&DetectError> {
        self.notice.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LifecycleState::Submitting)
    }

    pub fn can_submit(&self) -> bool {
        self.selection.is_some() && !self.is_loading()
    }

    /// File intake from a picker or a drop. A rejected file leaves the state
    /// and any earlier selection untouched.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), DetectError> {
        if let Err(err) = validate_upload(&file) {
            warn!(
                name = %file.name,
                mime_type = %file.mime_type,
                size_bytes = file.size_bytes(),
                error = %err,
                "rejected file intake"
            );
            self.refuse(err.clone());
            return Err(err);
        }

        let was_loading = self.is_loading();
        let preview = PreviewImage::from_file(&file);
        debug!(name = %file.name, size_bytes = file.size_bytes(), "file ready");

        self.generation += 1;
        self.selection = Some(Selection {
            file: Arc::new(file),
            preview,
        });
        self.notice = None;
        self.state = LifecycleState::FileReady;
        if was_loading {
            self.emit(ControllerEvent::LoadingChanged(false));
        }
        Ok(())
    }

    pub fn begin_submit(&mut self) -> Result<PendingSubmission, DetectError> {
        if self.is_loading() {
            debug!("submit ignored; a request is already in flight");
            return Err(DetectError::SubmissionInFlight);
        }

        let Some(file) = self.selection.as_ref().map(|s| Arc::clone(&s.file)) else {
            self.refuse(DetectError::NoFileSelected);
            return Err(DetectError::NoFileSelected);
        };

        self.generation += 1;
        self.notice = None;
        self.state = LifecycleState::Submitting;
        self.emit(ControllerEvent::LoadingChanged(true));
        info!(
            name = %file.name,
            generation = self.generation,
            "submitting image for detection"
        );

        Ok(PendingSubmission {
            generation: self.generation,
            file,
        })
    }

    pub fn complete(&mut self, outcome: SubmissionOutcome) -> Completion {
        if !self.is_loading() || outcome.generation != self.generation {
            warn!(
                outcome_generation = outcome.generation,
                current_generation = self.generation,
                "discarding stale detection response"
            );
            return Completion::Discarded;
        }

        match outcome.result {
            Ok(result) => {
                info!(detections = result.detections.len(), "detection succeeded");
                self.state = LifecycleState::Success(result.clone());
                self.emit(ControllerEvent::ResultAvailable(result));
            }
            Err(err) => {
                warn!(error = %err, "detection failed");
                self.state = LifecycleState::Error(err.clone());
                self.emit(ControllerEvent::ErrorAvailable(err));
            }
        }
        self.emit(ControllerEvent::LoadingChanged(false));
        Completion::Applied
    }

    /// Runs one full submission. `Err` means the submit was refused and no
    /// request was sent; request failures land in [`LifecycleState::Error`].
    pub async fn submit(&mut self) -> Result<Completion, DetectError> {
        let pending = self.begin_submit()?;
        let transport = Arc::clone(&self.transport);
        let outcome = pending.send(transport.as_ref()).await;
        Ok(self.complete(outcome))
    }

    /// Back to `Idle` from any state. An in-flight request is not aborted but
    /// its response will be discarded.
    pub fn reset(&mut self) {
        let was_loading = self.is_loading();
        self.generation += 1;
        self.selection = None;
        self.notice = None;
        self.state = LifecycleState::Idle;
        if was_loading {
            self.emit(ControllerEvent::LoadingChanged(false));
        }
        debug!("controller reset");
    }

    fn refuse(&mut self, err: DetectError) {
        self.notice = Some(err.clone());
        self.emit(ControllerEvent::ErrorAvailable(err));
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
