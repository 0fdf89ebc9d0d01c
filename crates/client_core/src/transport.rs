//! The single outbound call: `POST {api_url}/predict` with the image as a
//! multipart `file` field.

use std::time::Instant;

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{domain::SelectedFile, error::DetectError, protocol::PredictionResult};
use tracing::{debug, warn};

use crate::config::Settings;

const FILE_FIELD: &str = "file";

#[async_trait]
pub trait PredictionTransport: Send + Sync {
    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResult, DetectError>;
}

pub struct HttpPredictionTransport {
    http: Client,
    predict_url: String,
}

impl HttpPredictionTransport {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        if settings.request_timeout_ms == 0 {
            bail!("request timeout must be greater than zero");
        }
        let predict_url = settings.predict_url()?.to_string();
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build detection HTTP client")?;
        Ok(Self { http, predict_url })
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }
}

#[async_trait]
impl PredictionTransport for HttpPredictionTransport {
    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResult, DetectError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|err| DetectError::UnknownClientError(err.to_string()))?;
        let form = Form::new().part(FILE_FIELD, part);

        let started = Instant::now();
        let response = self
            .http
            .post(&self.predict_url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                warn!(url = %self.predict_url, error = %err, "predict request failed");
                classify_request_error(&err)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.predict_url, status = status.as_u16(), "predict returned error status");
            return Err(DetectError::ServerError {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| classify_request_error(&err))?;
        let result = decode_prediction(&body)?;
        debug!(
            detections = result.detections.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "predict completed"
        );
        Ok(result)
    }
}

/// Maps a reqwest failure onto the user-facing taxonomy. A timeout counts as
/// "sent but no response", whether it fired while connecting or waiting.
pub fn classify_request_error(err: &reqwest::Error) -> DetectError {
    if err.is_timeout() {
        DetectError::NoResponse
    } else if err.is_connect() {
        DetectError::NetworkUnreachable
    } else if err.is_builder() {
        DetectError::UnknownClientError(err.to_string())
    } else if err.is_request() || err.is_body() || err.is_decode() {
        DetectError::NoResponse
    } else {
        DetectError::UnknownClientError(err.to_string())
    }
}

/// An empty or `null` body is an absent response; anything else that is not
/// a well-formed prediction is malformed.
pub fn decode_prediction(body: &[u8]) -> Result<PredictionResult, DetectError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(DetectError::NoResponse);
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|err| DetectError::MalformedResponse(err.to_string()))?;
    if value.is_null() {
        return Err(DetectError::NoResponse);
    }

    let result: PredictionResult = serde_json::from_value(value)
        .map_err(|err| DetectError::MalformedResponse(err.to_string()))?;
    check_prediction(&result)?;
    Ok(result)
}

/// Confidences must lie in `[0, 1]` and the annotated image must be base64.
fn check_prediction(result: &PredictionResult) -> Result<(), DetectError> {
    for (i, detection) in result.detections.iter().enumerate() {
        if let Some(conf) = detection.conf {
            if !(0.0..=1.0).contains(&conf) {
                return Err(DetectError::MalformedResponse(format!(
                    "detection {i} ({}) has confidence {conf} outside [0, 1]",
                    detection.class
                )));
            }
        }
    }

    result.annotated_image_bytes().map_err(|err| {
        DetectError::MalformedResponse(format!("annotated image is not base64: {err}"))
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
