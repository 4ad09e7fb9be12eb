use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::model::exif_field::ExifFields;

/// Capture-time tags in priority order, each with the tag holding its UTC offset.
const TIMESTAMP_TAGS: [(&str, &str); 5] = [
    ("DateTimeOriginal", "OffsetTimeOriginal"),
    ("CreateDate", "OffsetTime"),
    ("DateTimeDigitized", "OffsetTimeDigitized"),
    ("DateTime", "OffsetTime"),
    ("ModifyDate", "OffsetTime"),
];

/// First candidate tag that parses to a valid instant.
pub fn capture_timestamp(fields: &ExifFields) -> Option<OffsetDateTime> {
    TIMESTAMP_TAGS.iter().find_map(|(tag, offset_tag)| {
        let value = fields.get(tag)?;
        let offset = fields.get(offset_tag).and_then(parse_offset);
        parse_timestamp(value, offset)
    })
}

/// Accepts Exif `YYYY:MM:DD HH:MM:SS`, the same with dashes, and RFC 3339.
/// Naive values take `offset`, or UTC when it is unknown.
pub fn parse_timestamp(value: &str, offset: Option<UtcOffset>) -> Option<OffsetDateTime> {
    let value = value.trim();

    if let Ok(timestamp) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(timestamp);
    }

    let exif_format = format_description!("[year]:[month]:[day] [hour]:[minute]:[second]");
    let dashed_format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

    PrimitiveDateTime::parse(value, exif_format)
        .or_else(|_| PrimitiveDateTime::parse(value, dashed_format))
        .ok()
        .map(|naive| naive.assume_offset(offset.unwrap_or(UtcOffset::UTC)))
}

fn parse_offset(value: &str) -> Option<UtcOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") {
        return Some(UtcOffset::UTC);
    }

    UtcOffset::parse(
        value,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::exif_field::ExifField;
    use time::macros::datetime;

    fn fields(pairs: &[(&str, &str)]) -> ExifFields {
        pairs
            .iter()
            .map(|(tag, value)| ExifField::new(*tag, *value))
            .collect()
    }

    #[test]
    fn parses_exif_format_as_utc() {
        assert_eq!(
            parse_timestamp("2024:01:01 10:00:00", None),
            Some(datetime!(2024-01-01 10:00:00 UTC))
        );
    }

    #[test]
    fn applies_offset_tag() {
        let tags = fields(&[
            ("DateTimeOriginal", "2024:01:01 10:00:00"),
            ("OffsetTimeOriginal", "+05:30"),
        ]);

        assert_eq!(
            capture_timestamp(&tags),
            Some(datetime!(2024-01-01 10:00:00 +05:30))
        );
    }

    #[test]
    fn accepts_rfc3339_and_dashed_values() {
        assert_eq!(
            parse_timestamp("2024-01-01T10:00:00+02:00", None),
            Some(datetime!(2024-01-01 10:00:00 +02:00))
        );
        assert_eq!(
            parse_timestamp("2024-01-01 10:00:00", None),
            Some(datetime!(2024-01-01 10:00:00 UTC))
        );
    }

    #[test]
    fn zeroed_and_garbage_values_are_rejected() {
        assert_eq!(parse_timestamp("0000:00:00 00:00:00", None), None);
        assert_eq!(parse_timestamp("yesterday", None), None);
        assert_eq!(parse_timestamp("", None), None);
    }

    #[test]
    fn follows_tag_priority() {
        let tags = fields(&[
            ("DateTime", "2024:03:03 03:03:03"),
            ("DateTimeDigitized", "2024:02:02 02:02:02"),
            ("DateTimeOriginal", "2024:01:01 01:01:01"),
        ]);

        assert_eq!(
            capture_timestamp(&tags),
            Some(datetime!(2024-01-01 01:01:01 UTC))
        );
    }

    #[test]
    fn skips_unparseable_candidates() {
        let tags = fields(&[
            ("DateTimeOriginal", "0000:00:00 00:00:00"),
            ("ModifyDate", "2024:05:06 07:08:09"),
        ]);

        assert_eq!(
            capture_timestamp(&tags),
            Some(datetime!(2024-05-06 07:08:09 UTC))
        );
    }
}
