use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::LocationError;
use crate::model::verification::{GpsCoordinates, ImageVerification, LocationSource};

pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// The device's live positioning capability.
pub trait DeviceLocator {
    fn current_position(&self) -> impl Future<Output = Result<GpsCoordinates, LocationError>> + Send;
}

/// For environments without positioning hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeviceLocator;

impl DeviceLocator for NoDeviceLocator {
    async fn current_position(&self) -> Result<GpsCoordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Coordinates typed in by the user, optionally with a street address.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualLocation {
    pub lat: f64,
    pub lng: f64,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub coordinates: GpsCoordinates,
    pub source: LocationSource,
    pub address: Option<String>,
}

/// Embedded GPS first, then the device position, then whatever was entered by hand.
pub async fn resolve_location<L: DeviceLocator>(
    verification: &ImageVerification,
    locator: &L,
    manual: Option<ManualLocation>,
    timeout: Duration,
) -> Result<ResolvedLocation, LocationError> {
    let address = manual.as_ref().and_then(|m| m.address.clone());

    if let Some(coordinates) = verification.gps() {
        debug!("Using coordinates embedded in the photo");
        return Ok(ResolvedLocation {
            coordinates,
            source: LocationSource::Exif,
            address,
        });
    }

    let device_error = match tokio::time::timeout(timeout, locator.current_position()).await {
        Ok(Ok(coordinates)) => {
            return Ok(ResolvedLocation {
                coordinates,
                source: LocationSource::Gps,
                address,
            });
        }
        Ok(Err(e)) => e,
        Err(_) => LocationError::Timeout(timeout),
    };
    warn!("Device location unavailable: {device_error}");

    let Some(manual) = manual else {
        return Err(match device_error {
            LocationError::Unsupported => LocationError::Missing,
            other => other,
        });
    };

    let coordinates = GpsCoordinates::new(manual.lat, manual.lng).ok_or(
        LocationError::OutOfRange {
            lat: manual.lat,
            lng: manual.lng,
        },
    )?;

    Ok(ResolvedLocation {
        coordinates,
        source: LocationSource::Manual,
        address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::selected_file::SelectedFile;
    use crate::verify::{ImageVerifier, MetadataExtractor, VerificationPolicy};
    use crate::error::MetadataError;
    use crate::model::exif_field::{ExifField, ExifFields};
    use time::macros::datetime;

    struct FixedLocator(GpsCoordinates);

    impl DeviceLocator for FixedLocator {
        async fn current_position(&self) -> Result<GpsCoordinates, LocationError> {
            Ok(self.0)
        }
    }

    struct HangingLocator;

    impl DeviceLocator for HangingLocator {
        async fn current_position(&self) -> Result<GpsCoordinates, LocationError> {
            std::future::pending().await
        }
    }

    struct GpsOnly(Option<GpsCoordinates>);

    impl MetadataExtractor for GpsOnly {
        fn parse_tags(&self, _bytes: &[u8]) -> Result<Option<ExifFields>, MetadataError> {
            Ok(Some([ExifField::new("Make", "Canon")].into_iter().collect()))
        }

        fn parse_gps(&self, _bytes: &[u8]) -> Result<Option<GpsCoordinates>, MetadataError> {
            Ok(self.0)
        }
    }

    fn verification(gps: Option<GpsCoordinates>) -> ImageVerification {
        ImageVerifier::with_extractor(GpsOnly(gps), VerificationPolicy::default()).verify_at(
            &SelectedFile::new("a.jpg", 0, vec![]),
            datetime!(2024-06-01 12:00:00 UTC),
        )
    }

    fn coordinates(lat: f64, lng: f64) -> GpsCoordinates {
        GpsCoordinates::new(lat, lng).unwrap()
    }

    fn manual() -> ManualLocation {
        ManualLocation {
            lat: 12.97,
            lng: 77.59,
            address: Some("MG Road".to_string()),
        }
    }

    #[tokio::test]
    async fn embedded_gps_wins() {
        let embedded = coordinates(28.6139, 77.209);

        let resolved = resolve_location(
            &verification(Some(embedded)),
            &FixedLocator(coordinates(1.0, 1.0)),
            Some(manual()),
            DEFAULT_GEOLOCATION_TIMEOUT,
        )
        .await
        .unwrap();

        assert_eq!(resolved.coordinates, embedded);
        assert_eq!(resolved.source, LocationSource::Exif);
        assert_eq!(resolved.address.as_deref(), Some("MG Road"));
    }

    #[tokio::test]
    async fn device_position_is_second() {
        let device = coordinates(19.07, 72.87);

        let resolved = resolve_location(
            &verification(None),
            &FixedLocator(device),
            None,
            DEFAULT_GEOLOCATION_TIMEOUT,
        )
        .await
        .unwrap();

        assert_eq!(resolved.coordinates, device);
        assert_eq!(resolved.source, LocationSource::Gps);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_device_falls_back_to_manual() {
        let resolved = resolve_location(
            &verification(None),
            &HangingLocator,
            Some(manual()),
            DEFAULT_GEOLOCATION_TIMEOUT,
        )
        .await
        .unwrap();

        assert_eq!(resolved.source, LocationSource::Manual);
        assert_eq!(resolved.coordinates, coordinates(12.97, 77.59));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_reported_without_manual_entry() {
        let result = resolve_location(
            &verification(None),
            &HangingLocator,
            None,
            Duration::from_secs(3),
        )
        .await;

        assert!(matches!(result, Err(LocationError::Timeout(d)) if d == Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn nothing_available_asks_for_manual_entry() {
        let result = resolve_location(
            &verification(None),
            &NoDeviceLocator,
            None,
            DEFAULT_GEOLOCATION_TIMEOUT,
        )
        .await;

        assert!(matches!(result, Err(LocationError::Missing)));
    }

    #[tokio::test]
    async fn manual_coordinates_are_range_checked() {
        let result = resolve_location(
            &verification(None),
            &NoDeviceLocator,
            Some(ManualLocation {
                lat: 123.0,
                lng: 0.0,
                address: None,
            }),
            DEFAULT_GEOLOCATION_TIMEOUT,
        )
        .await;

        assert!(matches!(result, Err(LocationError::OutOfRange { .. })));
    }
}
