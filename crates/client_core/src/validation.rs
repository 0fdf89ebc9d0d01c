use shared::{
    domain::{SelectedFile, UploadMime, MAX_UPLOAD_BYTES},
    error::DetectError,
};

/// Type check first, then size. Runs before a file may become the active
/// selection and before any preview is produced.
pub fn validate_upload(file: &SelectedFile) -> Result<UploadMime, DetectError> {
    let mime = UploadMime::parse(&file.mime_type).ok_or_else(|| DetectError::InvalidFileType {
        mime_type: file.mime_type.clone(),
    })?;

    let size_bytes = file.size_bytes();
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(DetectError::FileTooLarge { size_bytes });
    }

    Ok(mime)
}
