use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    #[serde(default)]
    pub conf: Option<f64>,
}

/// Body returned by `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub detections: Vec<Detection>,
    /// Base64 JPEG of the submitted image with detection boxes drawn on it.
    #[serde(rename = "imagedetect")]
    pub annotated_image: String,
}

impl PredictionResult {
    pub fn annotated_image_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.annotated_image)
    }

    pub fn annotated_image_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.annotated_image.trim())
    }
}
