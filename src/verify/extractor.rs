use crate::error::MetadataError;
use crate::model::exif_field::ExifFields;
use crate::model::verification::GpsCoordinates;
use crate::utils::exif::{read_exif_from_bytes, read_gps_from_bytes};

/// Reads embedded metadata from an image payload. Both calls fail independently.
pub trait MetadataExtractor: Send + Sync {
    /// `Ok(None)` when the image carries no metadata block.
    fn parse_tags(&self, bytes: &[u8]) -> Result<Option<ExifFields>, MetadataError>;

    fn parse_gps(&self, bytes: &[u8]) -> Result<Option<GpsCoordinates>, MetadataError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExifExtractor;

impl MetadataExtractor for ExifExtractor {
    fn parse_tags(&self, bytes: &[u8]) -> Result<Option<ExifFields>, MetadataError> {
        read_exif_from_bytes(bytes)
    }

    fn parse_gps(&self, bytes: &[u8]) -> Result<Option<GpsCoordinates>, MetadataError> {
        read_gps_from_bytes(bytes)
    }
}
