//! IPTC-IIM extraction from the JPEG APP13 (Photoshop 3.0) segment.
//!
//! The segment holds a sequence of 8BIM resources; resource 0x0404 contains
//! the IIM datasets. Application record 2 carries the descriptive fields,
//! including any number of repeated Keywords datasets.

use img_parts::jpeg::Jpeg;

use super::PhotoMetadata;

const APP13: u8 = 0xED;
const PS_HEADER: &[u8] = b"Photoshop 3.0\0";
const RESOURCE_SIG: &[u8] = b"8BIM";
const IPTC_RESOURCE_ID: u16 = 0x0404;

const APPLICATION_RECORD: u8 = 2;
const DS_OBJECT_NAME: u8 = 5;
const DS_KEYWORDS: u8 = 25;
const DS_CITY: u8 = 90;
const DS_PROVINCE_STATE: u8 = 95;
const DS_COUNTRY_CODE: u8 = 100;
const DS_COUNTRY_NAME: u8 = 101;
const DS_COPYRIGHT: u8 = 116;
const DS_CAPTION: u8 = 120;

/// Read IPTC fields out of the JPEG, if it carries an APP13 segment.
pub fn apply(jpeg: &Jpeg, meta: &mut PhotoMetadata) {
    let Some(segment) = jpeg
        .segments()
        .iter()
        .find(|s| s.marker() == APP13 && s.contents().starts_with(PS_HEADER))
    else {
        return;
    };
    apply_from_segment(&segment.contents(), meta);
}

/// Parse the raw APP13 segment contents (header included) into `meta`.
///
/// First occurrence wins for single-valued fields; every Keywords dataset is
/// merged into the keyword set.
pub(crate) fn apply_from_segment(contents: &[u8], meta: &mut PhotoMetadata) {
    let Some(iim) = iptc_resource(contents) else {
        return;
    };
    for (dataset, value) in datasets(iim) {
        match dataset {
            DS_OBJECT_NAME if meta.title.is_empty() => meta.title = value,
            DS_CAPTION if meta.caption.is_empty() => meta.caption = value,
            DS_CITY if meta.city.is_empty() => meta.city = value,
            DS_PROVINCE_STATE if meta.province.is_empty() => meta.province = value,
            DS_COUNTRY_NAME if meta.country.is_empty() => meta.country = value,
            DS_COUNTRY_CODE if meta.country_code.is_empty() => meta.country_code = value,
            DS_COPYRIGHT if meta.copyright.is_empty() => meta.copyright = value,
            DS_KEYWORDS => meta.add_keywords(&value),
            _ => {}
        }
    }
}

/// Walk the 8BIM resource blocks and return the IPTC-IIM payload.
fn iptc_resource(contents: &[u8]) -> Option<&[u8]> {
    let data = contents.strip_prefix(PS_HEADER)?;
    let mut pos = 0;

    while pos + 6 <= data.len() {
        if &data[pos..pos + 4] != RESOURCE_SIG {
            break;
        }
        let id = u16::from_be_bytes([data[pos + 4], data[pos + 5]]);
        pos += 6;

        // Pascal-style resource name, padded to an even total length.
        let name_len = *data.get(pos)? as usize;
        pos += 1 + name_len;
        if (1 + name_len) % 2 == 1 {
            pos += 1;
        }

        if pos + 4 > data.len() {
            break;
        }
        let size = u32::from_be_bytes([
            data[pos],
            data[pos + 1],
            data[pos + 2],
            data[pos + 3],
        ]) as usize;
        pos += 4;
        if pos + size > data.len() {
            break;
        }

        if id == IPTC_RESOURCE_ID {
            return Some(&data[pos..pos + size]);
        }
        pos += size + size % 2;
    }
    None
}

/// Decode IIM datasets: 0x1C marker, record, dataset, big-endian length.
/// Only application record 2 is of interest; extended-length datasets are
/// rare in the wild and skipped.
fn datasets(data: &[u8]) -> Vec<(u8, String)> {
    let mut out = Vec::new();
    let mut pos = 0;

    while pos + 5 <= data.len() {
        if data[pos] != 0x1C {
            break;
        }
        let record = data[pos + 1];
        let dataset = data[pos + 2];
        let raw_len = u16::from_be_bytes([data[pos + 3], data[pos + 4]]);
        pos += 5;

        if raw_len & 0x8000 != 0 {
            break;
        }
        let len = raw_len as usize;
        if pos + len > data.len() {
            break;
        }

        if record == APPLICATION_RECORD {
            out.push((dataset, String::from_utf8_lossy(&data[pos..pos + len]).into_owned()));
        }
        pos += len;
    }
    out
}
