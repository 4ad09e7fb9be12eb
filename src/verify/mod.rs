mod extractor;
pub mod fingerprint;
pub mod policy;
pub mod timestamp_parsing;

pub use extractor::{ExifExtractor, MetadataExtractor};
pub use policy::VerificationPolicy;

use rayon::prelude::*;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

use crate::model::exif_field::ExifFields;
use crate::model::selected_file::SelectedFile;
use crate::model::verification::{ImageVerification, LocationSource, TrustLevel};

/// Decides how far an uploaded photo can be trusted as on-site evidence.
///
/// Verification never fails: unreadable or missing metadata only lowers the trust level and adds
/// a warning explaining why.
pub struct ImageVerifier<E = ExifExtractor> {
    extractor: Arc<E>,
    policy: Arc<VerificationPolicy>,
}

impl<E> Clone for ImageVerifier<E> {
    fn clone(&self) -> Self {
        Self {
            extractor: self.extractor.clone(),
            policy: self.policy.clone(),
        }
    }
}

impl ImageVerifier<ExifExtractor> {
    pub fn new(policy: VerificationPolicy) -> Self {
        Self::with_extractor(ExifExtractor, policy)
    }
}

impl Default for ImageVerifier<ExifExtractor> {
    fn default() -> Self {
        Self::new(VerificationPolicy::default())
    }
}

impl<E: MetadataExtractor + 'static> ImageVerifier<E> {
    pub fn with_extractor(extractor: E, policy: VerificationPolicy) -> Self {
        Self {
            extractor: Arc::new(extractor),
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    /// Verifies against the current wall-clock time, parsing on the blocking pool.
    pub async fn verify(&self, file: SelectedFile) -> ImageVerification {
        let now = OffsetDateTime::now_utc();
        let is_fresh_capture = self.is_fresh_capture(file.last_modified, now);
        let verifier = self.clone();

        match spawn_blocking(move || verifier.verify_at(&file, now)).await {
            Ok(verification) => verification,
            Err(e) => {
                warn!("Verification task failed: {e}");
                self.unreadable(is_fresh_capture)
            }
        }
    }

    /// Verifies a batch in parallel, all against the same instant. Output keeps input order.
    pub async fn verify_all(&self, files: Vec<SelectedFile>) -> Vec<ImageVerification> {
        let now = OffsetDateTime::now_utc();
        let freshness: Vec<bool> = files
            .iter()
            .map(|file| self.is_fresh_capture(file.last_modified, now))
            .collect();
        let verifier = self.clone();

        info!("Verifying {} images", files.len());

        let result = spawn_blocking(move || {
            files
                .par_iter()
                .map(|file| verifier.verify_at(file, now))
                .collect::<Vec<_>>()
        })
        .await;

        match result {
            Ok(verifications) => verifications,
            Err(e) => {
                warn!("Batch verification task failed: {e}");
                freshness
                    .into_iter()
                    .map(|is_fresh_capture| self.unreadable(is_fresh_capture))
                    .collect()
            }
        }
    }

    /// Deterministic for a given `now`.
    pub fn verify_at(&self, file: &SelectedFile, now: OffsetDateTime) -> ImageVerification {
        let is_fresh_capture = self.is_fresh_capture(file.last_modified, now);

        match self.extractor.parse_tags(&file.bytes) {
            Ok(Some(tags)) => self.with_metadata(file, tags, is_fresh_capture, now),
            Ok(None) => self.without_metadata(&file.name, is_fresh_capture),
            Err(e) => {
                warn!("Could not read metadata of {}: {e}", file.name);
                self.unreadable(is_fresh_capture)
            }
        }
    }

    /// Modified within the freshness window, i.e. most likely taken through the device camera.
    pub fn is_fresh_capture(&self, last_modified: i64, now: OffsetDateTime) -> bool {
        let now_ms = (now.unix_timestamp_nanos() / 1_000_000) as i64;

        now_ms
            .checked_sub(last_modified)
            .is_some_and(|age_ms| (0..self.policy.fresh_capture_window_ms).contains(&age_ms))
    }

    fn without_metadata(&self, file_name: &str, is_fresh_capture: bool) -> ImageVerification {
        let mut verification = blank(is_fresh_capture);

        let warning = if is_fresh_capture {
            "Image metadata was stripped by the browser during capture. Location will use device GPS."
                .to_string()
        } else if let Some(app) = self.policy.messaging_app(file_name) {
            debug!("{file_name} looks like a {app} download");
            format!(
                "This image appears to have been shared via {app}, which removes metadata. \
                 Please upload the original photo from your camera."
            )
        } else {
            "No metadata found. This image may have been downloaded from the internet or screenshotted."
                .to_string()
        };
        verification.warnings.push(warning);

        self.finish(verification)
    }

    fn unreadable(&self, is_fresh_capture: bool) -> ImageVerification {
        let mut verification = blank(is_fresh_capture);

        verification.warnings.push(if is_fresh_capture {
            "Could not read image metadata, but the photo was just captured.".to_string()
        } else {
            "Could not read image metadata. This image may have been downloaded.".to_string()
        });

        self.finish(verification)
    }

    fn with_metadata(
        &self,
        file: &SelectedFile,
        tags: ExifFields,
        is_fresh_capture: bool,
        now: OffsetDateTime,
    ) -> ImageVerification {
        let mut verification = blank(is_fresh_capture);
        verification.has_exif = true;

        match self.extractor.parse_gps(&file.bytes) {
            Ok(Some(gps)) => {
                verification.has_gps = true;
                verification.gps = Some(gps);
                verification.location_source = LocationSource::Exif;
            }
            Ok(None) => {}
            Err(e) => debug!("No usable GPS in {}: {e}", file.name),
        }

        if let Some(taken_at) = timestamp_parsing::capture_timestamp(&tags) {
            verification.has_timestamp = true;
            verification.taken_at = Some(taken_at);
            verification.age_in_hours = Some((now - taken_at).as_seconds_f64() / 3600.0);
        }

        verification.camera_make = tags.get("Make").map(str::to_string);
        verification.camera_model = tags.get("Model").map(str::to_string);

        if !verification.has_gps {
            verification.warnings.push(
                "Photo has no embedded GPS. Your current device location will be used instead."
                    .to_string(),
            );
        }

        if let Some(age) = verification.age_in_hours {
            if age > self.policy.max_fresh_hours {
                let days = (age / 24.0).floor() as i64;
                let elapsed = if days > 0 {
                    format!("{days} day(s)")
                } else {
                    format!("over {} hours", self.policy.max_fresh_hours)
                };
                verification.warnings.push(format!(
                    "Photo was taken {elapsed} ago. Recent photos are preferred."
                ));
            }
            if age < 0.0 {
                verification.warnings.push(
                    "Photo timestamp is in the future, the device clock may be incorrect."
                        .to_string(),
                );
            }
        }

        if !verification.has_timestamp && !is_fresh_capture {
            let warning = match self.policy.messaging_app(&file.name) {
                Some(app) => format!(
                    "No capture timestamp found. This image appears to have been shared via {app}; \
                     please upload the original photo."
                ),
                None => {
                    "No capture timestamp found. Cannot verify when this photo was taken.".to_string()
                }
            };
            verification.warnings.push(warning);
        }

        if let Some(software) = tags.get("Software")
            && self.policy.is_editor(software)
        {
            verification
                .warnings
                .push(format!("Photo appears edited with {software}."));
        }

        self.finish(verification)
    }

    fn finish(&self, mut verification: ImageVerification) -> ImageVerification {
        verification.trust_level =
            TrustLevel::decide(&verification.signals(), self.policy.max_fresh_hours);
        verification
    }
}

fn blank(is_fresh_capture: bool) -> ImageVerification {
    ImageVerification {
        has_exif: false,
        has_gps: false,
        gps: None,
        location_source: LocationSource::default(),
        has_timestamp: false,
        taken_at: None,
        age_in_hours: None,
        camera_make: None,
        camera_model: None,
        trust_level: TrustLevel::default(),
        warnings: Vec::new(),
        is_fresh_capture,
    }
}
