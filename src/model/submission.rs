use serde::Serialize;

use crate::location::ResolvedLocation;
use crate::model::verification::ImageVerification;

/// Body of a complaint submission, minus the image part itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintSubmission {
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub image_verification: ImageVerification,
}

impl ComplaintSubmission {
    /// Combines the verdict with the resolved location. The verdict is re-tagged with the
    /// location's provenance.
    pub fn new(
        description: String,
        location: ResolvedLocation,
        verification: ImageVerification,
    ) -> Self {
        Self {
            description,
            latitude: location.coordinates.lat(),
            longitude: location.coordinates.lng(),
            address: location.address,
            image_verification: verification.with_location_source(location.source),
        }
    }

    /// Multipart text fields in submission order. The verdict travels as a JSON string and the
    /// address goes under `address_field`, whatever the backend expects it to be called.
    pub fn form_fields(&self, address_field: &str) -> serde_json::Result<Vec<(String, String)>> {
        let mut fields = vec![
            ("description".to_string(), self.description.clone()),
            ("latitude".to_string(), self.latitude.to_string()),
            ("longitude".to_string(), self.longitude.to_string()),
        ];

        if let Some(address) = &self.address
            && !address.trim().is_empty()
        {
            fields.push((address_field.to_string(), address.trim().to_string()));
        }

        fields.push((
            "imageVerification".to_string(),
            serde_json::to_string(&self.image_verification)?,
        ));

        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::verification::{GpsCoordinates, LocationSource, TrustLevel};

    fn verification() -> ImageVerification {
        ImageVerification {
            has_exif: false,
            has_gps: false,
            gps: None,
            location_source: LocationSource::Manual,
            has_timestamp: false,
            taken_at: None,
            age_in_hours: None,
            camera_make: None,
            camera_model: None,
            trust_level: TrustLevel::Medium,
            warnings: vec!["metadata stripped".to_string()],
            is_fresh_capture: true,
        }
    }

    fn location(address: Option<&str>) -> ResolvedLocation {
        ResolvedLocation {
            coordinates: GpsCoordinates::new(28.6139, 77.209).unwrap(),
            source: LocationSource::Gps,
            address: address.map(str::to_string),
        }
    }

    #[test]
    fn address_uses_configured_field_name() {
        let submission = ComplaintSubmission::new(
            "Pothole near the market".to_string(),
            location(Some(" Connaught Place ")),
            verification(),
        );

        let fields = submission.form_fields("adress").unwrap();
        let names: Vec<_> = fields.iter().map(|(name, _)| name.as_str()).collect();

        assert_eq!(
            names,
            ["description", "latitude", "longitude", "adress", "imageVerification"]
        );
        assert_eq!(fields[1].1, "28.6139");
        assert_eq!(fields[3].1, "Connaught Place");
    }

    #[test]
    fn verdict_is_tagged_with_location_source() {
        let submission =
            ComplaintSubmission::new("Broken light".to_string(), location(None), verification());

        let fields = submission.form_fields("address").unwrap();
        assert!(!fields.iter().any(|(name, _)| name == "address"));

        let (_, json) = fields.last().unwrap();
        let verdict: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(verdict["locationSource"], "gps");
        assert_eq!(verdict["trustLevel"], "medium");
    }
}
