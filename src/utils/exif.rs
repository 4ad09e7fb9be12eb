use exif::{Exif, Field, In, Tag, Value};
use std::io::Cursor;
use tracing::debug;

use crate::error::MetadataError;
use crate::model::exif_field::{ExifField, ExifFields};
use crate::model::verification::GpsCoordinates;

/// `Ok(None)` when the container holds no Exif block, `Err` when the container itself is unreadable.
fn read_container(file_content: &[u8]) -> Result<Option<Exif>, MetadataError> {
    let mut cursor = Cursor::new(file_content);
    let result = exif::Reader::new()
        .continue_on_error(true)
        .read_from_container(&mut cursor);

    match result {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(container)) => {
            debug!("No Exif block in {container} container");
            Ok(None)
        }
        Err(exif::Error::PartialResult(partial)) => {
            let (exif, errors) = partial.into_inner();
            debug!("Ignored {} malformed Exif fields", errors.len());
            Ok(Some(exif))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn read_exif_from_bytes(file_content: &[u8]) -> Result<Option<ExifFields>, MetadataError> {
    let Some(exif) = read_container(file_content)? else {
        return Ok(None);
    };

    let fields: ExifFields = exif
        .fields()
        .filter(|field| field.ifd_num == In::PRIMARY)
        .map(|field| ExifField::new(field.tag.to_string(), field_text(field)))
        .collect();

    Ok((!fields.is_empty()).then_some(fields))
}

pub fn read_gps_from_bytes(file_content: &[u8]) -> Result<Option<GpsCoordinates>, MetadataError> {
    let Some(exif) = read_container(file_content)? else {
        return Ok(None);
    };

    let latitude = signed_degrees(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S');
    let longitude = signed_degrees(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W');

    Ok(match (latitude, longitude) {
        (Some(lat), Some(lng)) => GpsCoordinates::new(lat, lng),
        _ => None,
    })
}

fn signed_degrees(exif: &Exif, tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let degrees = match &field.value {
        Value::Rational(parts) if !parts.is_empty() => parts
            .iter()
            .take(3)
            .zip([1.0, 60.0, 3600.0])
            .map(|(part, divisor)| part.to_f64() / divisor)
            .sum::<f64>(),
        _ => return None,
    };

    let is_negative = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|field| match &field.value {
            Value::Ascii(values) => values.first().and_then(|value| value.first().copied()),
            _ => None,
        })
        .is_some_and(|reference| reference.eq_ignore_ascii_case(&negative_ref));

    Some(if is_negative { -degrees } else { degrees })
}

/// Ascii values as plain text, so timestamps keep their Exif layout. Everything else uses
/// kamadak's human-readable rendering.
fn field_text(field: &Field) -> String {
    match &field.value {
        Value::Ascii(lines) => lines
            .iter()
            .map(|line| String::from_utf8_lossy(line).trim_end_matches('\0').trim().to_string())
            .collect::<Vec<_>>()
            .join(" "),
        _ => field.display_value().to_string(),
    }
}
