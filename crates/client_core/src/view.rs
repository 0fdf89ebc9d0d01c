//! Read-only projections of [`UploadController`] for a rendering surface.

use shared::{
    error::Locale,
    protocol::{Detection, PredictionResult},
};

use crate::controller::UploadController;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPanel {
    pub preview_uri: Option<String>,
    pub file_name: Option<String>,
    pub submit_enabled: bool,
    pub reset_visible: bool,
}

impl UploadPanel {
    pub fn project(controller: &UploadController) -> Self {
        Self {
            preview_uri: controller.preview().map(|preview| preview.data_uri.clone()),
            file_name: controller.selected_file().map(|file| file.name.clone()),
            submit_enabled: controller.can_submit(),
            reset_visible: controller.preview().is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionRow {
    /// 1-based, in response order.
    pub index: usize,
    pub label: String,
    pub confidence: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPanel {
    Loading,
    AwaitingUpload,
    /// A finished detection; `rows` may be empty.
    Detected {
        annotated_image_uri: String,
        rows: Vec<DetectionRow>,
    },
}

impl ResultPanel {
    pub fn project(controller: &UploadController) -> Self {
        if controller.is_loading() {
            return ResultPanel::Loading;
        }
        match controller.result() {
            Some(result) => Self::from_result(result),
            None => ResultPanel::AwaitingUpload,
        }
    }

    pub fn from_result(result: &PredictionResult) -> Self {
        ResultPanel::Detected {
            annotated_image_uri: result.annotated_image_uri(),
            rows: result
                .detections
                .iter()
                .enumerate()
                .map(|(i, detection)| DetectionRow::new(i + 1, detection))
                .collect(),
        }
    }
}

impl DetectionRow {
    fn new(index: usize, detection: &Detection) -> Self {
        Self {
            index,
            label: detection.class.clone(),
            confidence: detection.conf.map(format_confidence),
        }
    }
}

/// `0.873` → `"87.3%"`. Ties round up (`0.0625` → `"6.3%"`); `{:.1}` alone
/// would round them to even.
pub fn format_confidence(conf: f64) -> String {
    let tenths = (conf * 1000.0).round() / 10.0;
    format!("{tenths:.1}%")
}

pub fn error_banner(controller: &UploadController, locale: Locale) -> Option<String> {
    controller.error().map(|err| err.localized(locale))
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
