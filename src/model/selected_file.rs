use mime_guess::{MimeGuess, mime};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tokio::fs;

use crate::error::UploadError;

pub const MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;
pub const MAX_IMAGES_PER_COMPLAINT: usize = 4;

/// An image handed over by the capture surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new<N: Into<String>>(name: N, last_modified: i64, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            last_modified,
            bytes,
        }
    }

    pub async fn read_from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = fs::read(path).await?;
        let last_modified = fs::metadata(path)
            .await?
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map_or(0, |since_epoch| since_epoch.as_millis() as i64);

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self::new(name, last_modified, bytes))
    }

    pub fn mime(&self) -> mime::Mime {
        MimeGuess::from_path(&self.name).first_or_octet_stream()
    }

    /// Only JPEG and PNG up to 5 MiB are accepted as evidence.
    pub fn check_upload(&self) -> Result<(), UploadError> {
        let mime = self.mime();
        if mime != mime::IMAGE_JPEG && mime != mime::IMAGE_PNG {
            return Err(UploadError::UnsupportedType(mime.to_string()));
        }

        if self.bytes.len() > MAX_UPLOAD_SIZE {
            return Err(UploadError::TooLarge {
                size: self.bytes.len(),
                max: MAX_UPLOAD_SIZE,
            });
        }

        Ok(())
    }
}

/// Checks a batch the way the upload form does: every file must pass and at most four are kept.
pub fn check_uploads(files: &[SelectedFile]) -> Result<(), UploadError> {
    if files.len() > MAX_IMAGES_PER_COMPLAINT {
        return Err(UploadError::TooMany(MAX_IMAGES_PER_COMPLAINT));
    }

    files.iter().try_for_each(SelectedFile::check_upload)
}
