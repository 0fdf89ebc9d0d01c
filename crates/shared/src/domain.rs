use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Largest upload accepted before any network activity: 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UploadMime {
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/jpg")]
    Jpg,
}

impl UploadMime {
    pub const ALL: [UploadMime; 3] = [UploadMime::Png, UploadMime::Jpeg, UploadMime::Jpg];

    /// Exact match against the accepted content types; no case folding and
    /// no parameters.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mime| mime.as_str() == raw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadMime::Png => "image/png",
            UploadMime::Jpeg => "image/jpeg",
            UploadMime::Jpg => "image/jpg",
        }
    }
}

/// An image chosen by the user, before or after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub data_uri: String,
}

impl PreviewImage {
    pub fn from_file(file: &SelectedFile) -> Self {
        Self {
            data_uri: format!(
                "data:{};base64,{}",
                file.mime_type,
                STANDARD.encode(&file.bytes)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_exact_upload_mimes() {
        assert_eq!(UploadMime::parse("image/png"), Some(UploadMime::Png));
        assert_eq!(UploadMime::parse("image/jpg"), Some(UploadMime::Jpg));
        assert_eq!(UploadMime::parse("image/jpeg"), Some(UploadMime::Jpeg));
        assert_eq!(UploadMime::parse("image/PNG"), None);
        assert_eq!(UploadMime::parse("image/gif"), None);
        assert_eq!(UploadMime::parse(""), None);
    }

    #[test]
    fn preview_is_a_data_uri_of_the_file_bytes() {
        let file = SelectedFile::new("cat.png", "image/png", b"png-bytes".to_vec());
        let preview = PreviewImage::from_file(&file);
        assert_eq!(
            preview.data_uri,
            format!("data:image/png;base64,{}", STANDARD.encode(b"png-bytes"))
        );
    }
}
