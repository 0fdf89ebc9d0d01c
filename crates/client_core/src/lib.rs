//! Upload-and-result lifecycle for a remote object-detection API.

pub mod config;
pub mod controller;
pub mod transport;
pub mod validation;
pub mod view;

pub use config::{load_settings, Settings};
pub use controller::{
    Completion, ControllerEvent, LifecycleState, PendingSubmission, SubmissionOutcome,
    UploadController,
};
pub use transport::{HttpPredictionTransport, PredictionTransport};
