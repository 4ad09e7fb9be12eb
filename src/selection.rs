use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, error};

use crate::model::selected_file::SelectedFile;
use crate::model::verification::ImageVerification;
use crate::verify::{ImageVerifier, MetadataExtractor};

struct ActiveSelection {
    generation: u64,
    file_name: String,
    /// Local copy of the image used for previews. Deleted on drop.
    preview: Option<NamedTempFile>,
    verification: Option<ImageVerification>,
}

/// Tracks the evidence photo currently selected on the complaint form.
///
/// Only the latest selection counts: a verdict that finishes after the user picked another file
/// is dropped, and the previous preview buffer is released as soon as the selection changes.
pub struct EvidenceSelection<E> {
    verifier: ImageVerifier<E>,
    generation: AtomicU64,
    current: Mutex<Option<ActiveSelection>>,
}

impl<E: MetadataExtractor + 'static> EvidenceSelection<E> {
    pub fn new(verifier: ImageVerifier<E>) -> Self {
        Self {
            verifier,
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    /// Replaces the current selection and verifies it. Returns `None` when a newer selection
    /// superseded this one before verification finished.
    pub async fn select(&self, file: SelectedFile) -> Option<ImageVerification> {
        // Generations are handed out under the lock, so the stored one is always the newest
        let generation = {
            let mut current = self.current.lock().await;
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *current = Some(ActiveSelection {
                generation,
                file_name: file.name.clone(),
                preview: None,
                verification: None,
            });
            generation
        };

        let (file, preview) = match task::spawn_blocking(move || {
            let preview = write_preview(&file)
                .inspect_err(|e| error!("Failed to create preview for {}: {e}", file.name))
                .ok();
            (file, preview)
        })
        .await
        {
            Ok(written) => written,
            Err(e) => {
                error!("Preview task failed: {e}");
                return None;
            }
        };

        match self.current.lock().await.as_mut() {
            Some(active) if self.is_latest(active.generation, generation) => {
                active.preview = preview;
            }
            _ => {
                debug!("Selection {generation} superseded while writing its preview");
                return None;
            }
        }

        let verification = self.verifier.verify(file).await;

        let mut current = self.current.lock().await;
        match current.as_mut() {
            Some(active) if self.is_latest(active.generation, generation) => {
                active.verification = Some(verification.clone());
                Some(verification)
            }
            _ => {
                debug!("Discarding verification for superseded selection {generation}");
                None
            }
        }
    }

    fn is_latest(&self, stored: u64, generation: u64) -> bool {
        stored == generation && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Drops the selection along with its preview buffer.
    pub async fn clear(&self) {
        let mut current = self.current.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        *current = None;
    }

    pub async fn current_verification(&self) -> Option<ImageVerification> {
        self.current
            .lock()
            .await
            .as_ref()
            .and_then(|active| active.verification.clone())
    }

    pub async fn current_file_name(&self) -> Option<String> {
        self.current
            .lock()
            .await
            .as_ref()
            .map(|active| active.file_name.clone())
    }

    pub async fn preview_path(&self) -> Option<PathBuf> {
        self.current
            .lock()
            .await
            .as_ref()
            .and_then(|active| active.preview.as_ref())
            .map(|preview| preview.path().to_path_buf())
    }
}

fn write_preview(file: &SelectedFile) -> std::io::Result<NamedTempFile> {
    let extension = std::path::Path::new(&file.name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let mut preview = tempfile::Builder::new()
        .prefix("evidence-preview-")
        .suffix(&extension)
        .tempfile()?;
    preview.write_all(&file.bytes)?;
    preview.flush()?;

    Ok(preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use crate::model::exif_field::ExifFields;
    use crate::model::verification::{GpsCoordinates, TrustLevel};
    use crate::verify::VerificationPolicy;
    use std::sync::Arc;
    use std::time::Duration;

    /// Blocks while parsing any file whose first byte is `b's'`.
    struct SlowExtractor;

    impl MetadataExtractor for SlowExtractor {
        fn parse_tags(&self, bytes: &[u8]) -> Result<Option<ExifFields>, MetadataError> {
            if bytes.first() == Some(&b's') {
                std::thread::sleep(Duration::from_millis(300));
            }
            Ok(None)
        }

        fn parse_gps(&self, _bytes: &[u8]) -> Result<Option<GpsCoordinates>, MetadataError> {
            Ok(None)
        }
    }

    fn selection() -> Arc<EvidenceSelection<SlowExtractor>> {
        Arc::new(EvidenceSelection::new(ImageVerifier::with_extractor(
            SlowExtractor,
            VerificationPolicy::default(),
        )))
    }

    #[tokio::test]
    async fn keeps_verdict_of_current_selection() {
        let selection = selection();

        let verification = selection
            .select(SelectedFile::new("IMG-20240101-WA0007.jpg", 0, b"fast".to_vec()))
            .await
            .unwrap();

        assert_eq!(verification.trust_level(), TrustLevel::Low);
        assert_eq!(selection.current_verification().await, Some(verification));
        assert_eq!(
            selection.current_file_name().await.as_deref(),
            Some("IMG-20240101-WA0007.jpg")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn superseded_selection_is_discarded() {
        let selection = selection();

        let slow = tokio::spawn({
            let selection = selection.clone();
            async move {
                selection
                    .select(SelectedFile::new("first.jpg", 0, b"slow".to_vec()))
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let latest = selection
            .select(SelectedFile::new("second.jpg", 0, b"fast".to_vec()))
            .await;

        assert!(latest.is_some());
        assert_eq!(slow.await.unwrap(), None);
        assert_eq!(selection.current_verification().await, latest);
        assert_eq!(selection.current_file_name().await.as_deref(), Some("second.jpg"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn large_earlier_preview_never_overtakes_later_selection() {
        for _ in 0..20 {
            let selection = selection();

            let first = tokio::spawn({
                let selection = selection.clone();
                async move {
                    selection
                        .select(SelectedFile::new("first.jpg", 0, vec![b'f'; 5 * 1024 * 1024]))
                        .await
                }
            });
            while selection.generation.load(Ordering::SeqCst) < 1 {
                tokio::task::yield_now().await;
            }

            let second = selection
                .select(SelectedFile::new("second.jpg", 0, b"x".to_vec()))
                .await;
            first.await.unwrap();

            assert!(second.is_some());
            assert_eq!(selection.current_file_name().await.as_deref(), Some("second.jpg"));
            assert_eq!(selection.current_verification().await, second);
            let preview = selection.preview_path().await.unwrap();
            assert_eq!(std::fs::read(preview).unwrap(), b"x");
        }
    }

    #[tokio::test]
    async fn preview_is_released_when_selection_changes() {
        let selection = selection();

        selection
            .select(SelectedFile::new("one.png", 0, b"first image".to_vec()))
            .await;
        let first_preview = selection.preview_path().await.unwrap();
        assert_eq!(std::fs::read(&first_preview).unwrap(), b"first image");
        assert!(first_preview.to_string_lossy().ends_with(".png"));

        selection
            .select(SelectedFile::new("two.jpg", 0, b"second image".to_vec()))
            .await;
        let second_preview = selection.preview_path().await.unwrap();

        assert!(!first_preview.exists());
        assert!(second_preview.exists());

        selection.clear().await;
        assert!(!second_preview.exists());
        assert!(selection.current_verification().await.is_none());
    }
}
