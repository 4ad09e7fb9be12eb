use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct GpsCoordinates {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawCoordinates {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoordinates> for GpsCoordinates {
    type Error = String;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lng)
            .ok_or_else(|| format!("coordinates out of range: {}, {}", raw.lat, raw.lng))
    }
}

impl GpsCoordinates {
    /// Returns `None` unless both values are finite and inside -90..90 / -180..180.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);

        valid.then_some(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Exif,
    Gps,
    #[default]
    Manual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// Everything the trust decision depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrustSignals {
    pub has_exif: bool,
    pub has_gps: bool,
    pub has_timestamp: bool,
    pub age_in_hours: Option<f64>,
    pub is_fresh_capture: bool,
}

impl TrustLevel {
    /// First matching rule wins:
    /// GPS + timestamp within `0..=max_fresh_hours` is high,
    /// a fresh capture is high with GPS and medium without,
    /// metadata with either GPS or a timestamp is medium,
    /// anything else is low.
    pub fn decide(signals: &TrustSignals, max_fresh_hours: f64) -> Self {
        let recent = signals
            .age_in_hours
            .is_some_and(|age| (0.0..=max_fresh_hours).contains(&age));

        if signals.has_gps && signals.has_timestamp && recent {
            TrustLevel::High
        } else if signals.is_fresh_capture {
            if signals.has_gps {
                TrustLevel::High
            } else {
                TrustLevel::Medium
            }
        } else if signals.has_exif && (signals.has_gps || signals.has_timestamp) {
            TrustLevel::Medium
        } else {
            TrustLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrustLevel::High => "High Trust",
            TrustLevel::Medium => "Medium Trust",
            TrustLevel::Low => "Low Trust",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TrustLevel::High => "Original verified photo",
            TrustLevel::Medium => "Partially verified",
            TrustLevel::Low => "Limited verification",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            TrustLevel::High => "Verified original photo",
            TrustLevel::Medium => "Partially verified",
            TrustLevel::Low => "Unverified image",
        }
    }
}

/// Verdict for one selected image. Only the verifier builds these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageVerification {
    pub(crate) has_exif: bool,
    pub(crate) has_gps: bool,
    pub(crate) gps: Option<GpsCoordinates>,
    pub(crate) location_source: LocationSource,
    pub(crate) has_timestamp: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub(crate) taken_at: Option<OffsetDateTime>,
    pub(crate) age_in_hours: Option<f64>,
    pub(crate) camera_make: Option<String>,
    pub(crate) camera_model: Option<String>,
    pub(crate) trust_level: TrustLevel,
    pub(crate) warnings: Vec<String>,
    pub(crate) is_fresh_capture: bool,
}

impl ImageVerification {
    pub fn has_exif(&self) -> bool {
        self.has_exif
    }

    pub fn has_gps(&self) -> bool {
        self.has_gps
    }

    pub fn gps(&self) -> Option<GpsCoordinates> {
        self.gps
    }

    pub fn location_source(&self) -> LocationSource {
        self.location_source
    }

    pub fn has_timestamp(&self) -> bool {
        self.has_timestamp
    }

    pub fn taken_at(&self) -> Option<OffsetDateTime> {
        self.taken_at
    }

    pub fn age_in_hours(&self) -> Option<f64> {
        self.age_in_hours
    }

    pub fn camera_make(&self) -> Option<&str> {
        self.camera_make.as_deref()
    }

    pub fn camera_model(&self) -> Option<&str> {
        self.camera_model.as_deref()
    }

    pub fn trust_level(&self) -> TrustLevel {
        self.trust_level
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_fresh_capture(&self) -> bool {
        self.is_fresh_capture
    }

    pub fn signals(&self) -> TrustSignals {
        TrustSignals {
            has_exif: self.has_exif,
            has_gps: self.has_gps,
            has_timestamp: self.has_timestamp,
            age_in_hours: self.age_in_hours,
            is_fresh_capture: self.is_fresh_capture,
        }
    }

    /// "Make Model", or whichever half is known.
    pub fn camera(&self) -> Option<String> {
        match (self.camera_make(), self.camera_model()) {
            (Some(make), Some(model)) => Some(format!("{make} {model}")),
            (Some(make), None) => Some(make.to_string()),
            (None, Some(model)) => Some(model.to_string()),
            (None, None) => None,
        }
    }

    /// Tags the verdict with the coordinate provenance the caller settled on.
    /// The trust level is left untouched.
    pub fn with_location_source(mut self, source: LocationSource) -> Self {
        self.location_source = source;
        self
    }
}
