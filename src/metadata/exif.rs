//! EXIF field extraction.
//!
//! GPS coordinates arrive as three rationals (degrees, minutes, seconds) plus
//! a hemisphere reference tag; altitude as one rational plus a below-sea-level
//! flag. Each field parse reports a typed fault instead of panicking or
//! aborting the record, and the caller degrades faults to zero values.

use chrono::NaiveDateTime;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

use super::PhotoMetadata;

/// Capture-date pattern used by EXIF DateTimeOriginal.
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Why a single metadata field could not be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldFault {
    #[error("field is not present")]
    MissingField,
    #[error("rational value is malformed or incomplete")]
    MalformedRational,
    #[error("date string does not match YYYY:MM:DD HH:MM:SS")]
    UnparsableDate,
}

/// Read all EXIF-sourced fields into `meta`. Absent EXIF data is a valid
/// empty result; per-field faults are logged at debug and skipped.
pub fn apply(bytes: &[u8], meta: &mut PhotoMetadata) {
    let reader = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(reader) => reader,
        Err(_) => return,
    };

    meta.make = field_string(&reader, exif::Tag::Make);
    meta.model = field_string(&reader, exif::Tag::Model);
    meta.iso = field_string(&reader, exif::Tag::PhotographicSensitivity);
    meta.aperture = field_string(&reader, exif::Tag::FNumber);
    meta.exposure_time = field_string(&reader, exif::Tag::ExposureTime);

    match capture_date(&reader) {
        Ok(taken) => meta.captured_at = Some(taken),
        Err(FieldFault::MissingField) => {}
        Err(fault) => debug!("capture date unusable: {fault}"),
    }

    match coordinate(&reader, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef) {
        Ok(latitude) => meta.gps_latitude = latitude,
        Err(FieldFault::MissingField) => {}
        Err(fault) => debug!("GPS latitude unusable: {fault}"),
    }
    match coordinate(&reader, exif::Tag::GPSLongitude, exif::Tag::GPSLongitudeRef) {
        Ok(longitude) => meta.gps_longitude = longitude,
        Err(FieldFault::MissingField) => {}
        Err(fault) => debug!("GPS longitude unusable: {fault}"),
    }
    match altitude(&reader) {
        Ok(meters) => meta.gps_altitude = meters,
        Err(FieldFault::MissingField) => {}
        Err(fault) => debug!("GPS altitude unusable: {fault}"),
    }
}

fn field_string(exif: &exif::Exif, tag: exif::Tag) -> String {
    exif.get_field(tag, exif::In::PRIMARY)
        .map(|field| {
            field
                .display_value()
                .to_string()
                .trim_matches('"')
                .to_string()
        })
        .unwrap_or_default()
}

fn capture_date(exif: &exif::Exif) -> Result<NaiveDateTime, FieldFault> {
    let field = exif
        .get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY)
        .ok_or(FieldFault::MissingField)?;
    parse_exif_date(&field.display_value().to_string())
}

fn parse_exif_date(raw: &str) -> Result<NaiveDateTime, FieldFault> {
    NaiveDateTime::parse_from_str(raw.trim_matches('"').trim(), EXIF_DATE_FORMAT)
        .map_err(|_| FieldFault::UnparsableDate)
}

/// Convert one GPS axis to signed decimal degrees.
fn coordinate(
    exif: &exif::Exif,
    tag: exif::Tag,
    ref_tag: exif::Tag,
) -> Result<f64, FieldFault> {
    let field = exif
        .get_field(tag, exif::In::PRIMARY)
        .ok_or(FieldFault::MissingField)?;
    let exif::Value::Rational(parts) = &field.value else {
        return Err(FieldFault::MalformedRational);
    };
    if parts.len() < 3 {
        return Err(FieldFault::MalformedRational);
    }

    let decimal = dms_to_decimal(
        rational(&parts[0])?,
        rational(&parts[1])?,
        rational(&parts[2])?,
    );

    let reference = exif
        .get_field(ref_tag, exif::In::PRIMARY)
        .map(|field| field.display_value().to_string())
        .unwrap_or_default();

    Ok(apply_hemisphere(decimal, &reference))
}

/// Altitude from a single rational, negated when GPSAltitudeRef reads 1.
fn altitude(exif: &exif::Exif) -> Result<f64, FieldFault> {
    let field = exif
        .get_field(exif::Tag::GPSAltitude, exif::In::PRIMARY)
        .ok_or(FieldFault::MissingField)?;
    let exif::Value::Rational(parts) = &field.value else {
        return Err(FieldFault::MalformedRational);
    };
    let first = parts.first().ok_or(FieldFault::MalformedRational)?;
    let meters = rational(first)?;

    let reference = exif
        .get_field(exif::Tag::GPSAltitudeRef, exif::In::PRIMARY)
        .map(|field| &field.value);
    Ok(apply_altitude_ref(meters, reference))
}

/// GPSAltitudeRef byte 1 marks an altitude below sea level; any other value,
/// shape or an absent tag means above.
fn apply_altitude_ref(meters: f64, reference: Option<&exif::Value>) -> f64 {
    match reference {
        Some(exif::Value::Byte(values)) if values.first() == Some(&1) => -meters,
        _ => meters,
    }
}

fn rational(value: &exif::Rational) -> Result<f64, FieldFault> {
    if value.denom == 0 {
        return Err(FieldFault::MalformedRational);
    }
    Ok(value.num as f64 / value.denom as f64)
}

fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

/// Southern and western hemispheres carry negative decimal coordinates.
fn apply_hemisphere(decimal: f64, reference: &str) -> f64 {
    if reference.contains('S') || reference.contains('W') {
        -decimal
    } else {
        decimal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dms_conversion() {
        let decimal = dms_to_decimal(40.0, 26.0, 46.0);
        assert!((decimal - 40.446111).abs() < 1e-4);
    }

    #[test]
    fn test_southern_hemisphere_is_negative() {
        let decimal = apply_hemisphere(dms_to_decimal(40.0, 26.0, 46.0), "S");
        assert!((decimal + 40.446111).abs() < 1e-4);
    }

    #[test]
    fn test_western_hemisphere_is_negative() {
        assert_eq!(apply_hemisphere(2.35, "W"), -2.35);
        assert_eq!(apply_hemisphere(2.35, "E"), 2.35);
        assert_eq!(apply_hemisphere(2.35, "N"), 2.35);
    }

    #[test]
    fn test_below_sea_level_altitude_is_negative() {
        let below = exif::Value::Byte(vec![1]);
        assert_eq!(apply_altitude_ref(430.5, Some(&below)), -430.5);
    }

    #[test]
    fn test_altitude_defaults_to_above_sea_level() {
        let above = exif::Value::Byte(vec![0]);
        assert_eq!(apply_altitude_ref(430.5, Some(&above)), 430.5);
        assert_eq!(apply_altitude_ref(430.5, None), 430.5);
    }

    #[test]
    fn test_zero_denominator_is_malformed() {
        let bad = exif::Rational { num: 40, denom: 0 };
        assert_eq!(rational(&bad), Err(FieldFault::MalformedRational));
    }

    #[test]
    fn test_exif_date_parses_fixed_pattern() {
        let parsed = parse_exif_date("2023:06:01 12:00:00").unwrap();
        assert_eq!(parsed.to_string(), "2023-06-01 12:00:00");
    }

    #[test]
    fn test_exif_date_fault_is_typed() {
        assert_eq!(
            parse_exif_date("June 1st, 2023"),
            Err(FieldFault::UnparsableDate)
        );
        assert_eq!(
            parse_exif_date("2023-06-01 12:00:00"),
            Err(FieldFault::UnparsableDate)
        );
    }

    #[test]
    fn test_no_exif_leaves_record_untouched() {
        let mut meta = PhotoMetadata::default();
        apply(b"not an image at all", &mut meta);
        assert_eq!(meta, PhotoMetadata::default());
    }
}
