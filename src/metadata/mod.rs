//! Metadata extraction with a multi-standard fallback cascade.
//!
//! A file is read once; EXIF and IPTC fields are taken directly, XMP only
//! fills fields the other two standards left empty. Extraction never fails the
//! caller: an unreadable or metadata-free file yields a fully-constructed
//! zero-valued record, and a fault in one field never aborts the others.

mod exif;
mod iptc;
mod xmp;

pub use exif::FieldFault;

use chrono::NaiveDateTime;
use image::ImageReader;
use img_parts::jpeg::Jpeg;
use img_parts::Bytes;
use std::io::Cursor;
use std::path::Path;
use tracing::warn;

/// Normalized photo metadata. Every field defaults to empty/zero rather than
/// being absent, so the record is always fully constructed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoMetadata {
    pub width: u32,
    pub height: u32,

    pub make: String,
    pub model: String,
    pub iso: String,
    pub aperture: String,
    pub exposure_time: String,

    /// Decimal degrees; sign encodes hemisphere. 0.0 when absent.
    pub gps_latitude: f64,
    pub gps_longitude: f64,
    /// Meters; negative below sea level. 0.0 when absent.
    pub gps_altitude: f64,

    pub captured_at: Option<NaiveDateTime>,

    pub title: String,
    pub description: String,
    pub copyright: String,
    pub caption: String,

    pub country: String,
    pub country_code: String,
    pub province: String,
    pub city: String,

    /// Case-sensitive, insertion-ordered, deduplicated.
    pub keywords: Vec<String>,
}

impl PhotoMetadata {
    /// Split a raw keyword value on commas, trim each part and append the
    /// entries that are new to the set. `"Beijing, China, CHN"` becomes three
    /// keywords.
    pub fn add_keywords(&mut self, raw: &str) {
        for part in raw.split(',') {
            let clean = part.trim();
            if !clean.is_empty() && !self.keywords.iter().any(|k| k == clean) {
                self.keywords.push(clean.to_string());
            }
        }
    }
}

/// Extract everything we know how to read from the file at `path`.
///
/// Order matters: EXIF and IPTC populate fields first, XMP keywords are
/// merged, and XMP properties only fill fields still empty afterwards.
pub fn extract(path: &Path) -> PhotoMetadata {
    let mut meta = PhotoMetadata::default();

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("cannot read {}: {e}", path.display());
            return meta;
        }
    };

    if let Ok(reader) = ImageReader::new(Cursor::new(&bytes)).with_guessed_format() {
        if let Ok((width, height)) = reader.into_dimensions() {
            meta.width = width;
            meta.height = height;
        }
    }

    exif::apply(&bytes, &mut meta);

    // IPTC and XMP ride in JPEG application segments; other containers
    // simply have none, which is a valid empty result.
    if let Ok(jpeg) = Jpeg::from_bytes(Bytes::from(bytes)) {
        iptc::apply(&jpeg, &mut meta);
        xmp::apply(&jpeg, &mut meta);
    }

    meta
}
