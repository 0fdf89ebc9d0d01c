use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    English,
    Thai,
}

/// Everything that can end a file intake or a submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectError {
    #[error("only PNG, JPG or JPEG images can be uploaded (got {mime_type:?})")]
    InvalidFileType { mime_type: String },
    #[error("image is too large ({size_bytes} bytes, maximum 10MB)")]
    FileTooLarge { size_bytes: u64 },
    #[error("select an image first")]
    NoFileSelected,
    #[error("a detection request is already in progress")]
    SubmissionInFlight,
    #[error("cannot reach the detection API; check that the server is running")]
    NetworkUnreachable,
    #[error("detection server error: {status}")]
    ServerError { status: u16 },
    #[error("request was sent but no response arrived (possible cross-origin or connectivity issue)")]
    NoResponse,
    #[error("detection server returned an unreadable response: {0}")]
    MalformedResponse(String),
    #[error("request failed: {0}")]
    UnknownClientError(String),
}

impl DetectError {
    /// Raised by local validation, before any network activity.
    pub fn is_intake(&self) -> bool {
        matches!(
            self,
            DetectError::InvalidFileType { .. } | DetectError::FileTooLarge { .. }
        )
    }

    pub fn localized(&self, locale: Locale) -> String {
        match locale {
            Locale::English => self.to_string(),
            Locale::Thai => match self {
                DetectError::InvalidFileType { .. } => {
                    "กรุณาอัปโหลดไฟล์ภาพประเภท PNG, JPG หรือ JPEG เท่านั้น".to_string()
                }
                DetectError::FileTooLarge { .. } => {
                    "ไฟล์ภาพมีขนาดใหญ่เกินไป (สูงสุด 10MB)".to_string()
                }
                DetectError::NoFileSelected => "กรุณาเลือกไฟล์ภาพก่อน".to_string(),
                DetectError::SubmissionInFlight => "กำลังประมวลผล...".to_string(),
                DetectError::NetworkUnreachable => {
                    "ไม่สามารถเชื่อมต่อกับ Backend API ได้ กรุณาตรวจสอบว่า server ทำงานอยู่"
                        .to_string()
                }
                DetectError::ServerError { status } => {
                    format!("เกิดข้อผิดพลาดจาก Server: {status}")
                }
                DetectError::NoResponse => {
                    "ส่งคำขอไปยัง Server แต่ไม่ได้รับการตอบกลับ (อาจเป็น CORS Error)".to_string()
                }
                DetectError::MalformedResponse(detail) => {
                    format!("ข้อมูลตอบกลับจาก Server ไม่ถูกต้อง: {detail}")
                }
                DetectError::UnknownClientError(message) => {
                    format!("เกิดข้อผิดพลาด: {message}")
                }
            },
        }
    }
}
