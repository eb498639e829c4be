//! XMP extraction from the JPEG APP1 packet.
//!
//! XMP is the gap-filler of the cascade: `dc:subject` entries always join the
//! keyword set, but the location and description properties only land in
//! fields that EXIF/IPTC left empty. XMP never overrides a non-empty value.

use img_parts::jpeg::Jpeg;

use super::PhotoMetadata;

const APP1: u8 = 0xE1;
const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

/// Ordered fallback table: which XMP property may fill which field.
const CITY: &str = "photoshop:City";
const STATE: &str = "photoshop:State";
const COUNTRY: &str = "photoshop:Country";
const COUNTRY_CODE: &str = "Iptc4xmpCore:CountryCode";
const TITLE: &str = "dc:title";
const DESCRIPTION: &str = "dc:description";
const RIGHTS: &str = "dc:rights";
const SUBJECT: &str = "dc:subject";

/// Read XMP data out of the JPEG, if it carries an XMP APP1 segment.
pub fn apply(jpeg: &Jpeg, meta: &mut PhotoMetadata) {
    let Some(segment) = jpeg
        .segments()
        .iter()
        .find(|s| s.marker() == APP1 && s.contents().starts_with(XMP_HEADER))
    else {
        return;
    };
    let packet = String::from_utf8_lossy(&segment.contents()[XMP_HEADER.len()..]).into_owned();
    apply_packet(&packet, meta);
}

/// Merge one XMP packet into the record.
pub(crate) fn apply_packet(packet: &str, meta: &mut PhotoMetadata) {
    for entry in bag_items(packet, SUBJECT) {
        meta.add_keywords(&entry);
    }

    fill_if_empty(&mut meta.city, simple_property(packet, CITY));
    fill_if_empty(&mut meta.province, simple_property(packet, STATE));
    fill_if_empty(&mut meta.country, simple_property(packet, COUNTRY));
    fill_if_empty(&mut meta.country_code, simple_property(packet, COUNTRY_CODE));
    fill_if_empty(&mut meta.title, alt_property(packet, TITLE));
    fill_if_empty(&mut meta.description, alt_property(packet, DESCRIPTION));
    fill_if_empty(&mut meta.copyright, alt_property(packet, RIGHTS));
}

fn fill_if_empty(slot: &mut String, value: Option<String>) {
    if slot.is_empty() {
        if let Some(value) = value {
            *slot = value;
        }
    }
}

/// A property serialized either as an element body or as an attribute of the
/// rdf:Description element.
fn simple_property(packet: &str, name: &str) -> Option<String> {
    if let Some(body) = element_body(packet, name) {
        let value = unescape(body.trim());
        if !value.is_empty() {
            return Some(value);
        }
    }
    attribute_value(packet, name)
}

/// A language-alternative property: the first `rdf:li` inside the named
/// element, or the bare element text when no Alt wrapper is present.
fn alt_property(packet: &str, name: &str) -> Option<String> {
    let body = element_body(packet, name)?;
    let text = match element_body(body, "rdf:li") {
        Some(li) => li,
        None => body,
    };
    let value = unescape(text.trim());
    (!value.is_empty()).then_some(value)
}

/// Every `rdf:li` entry inside the named element, in document order.
fn bag_items(packet: &str, name: &str) -> Vec<String> {
    element_body(packet, name).map(list_items).unwrap_or_default()
}

fn list_items(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut rest = body;
    loop {
        let Some(open) = rest.find("<rdf:li") else {
            break;
        };
        let tail = &rest[open + "<rdf:li".len()..];
        let Some(gt) = tail.find('>') else {
            break;
        };
        if tail[..gt].ends_with('/') {
            rest = &tail[gt + 1..];
            continue;
        }
        let after_open = &tail[gt + 1..];
        let Some(close) = after_open.find("</rdf:li>") else {
            break;
        };
        let value = unescape(after_open[..close].trim());
        if !value.is_empty() {
            items.push(value);
        }
        rest = &after_open[close + "</rdf:li>".len()..];
    }
    items
}

/// Body of the first non-self-closing element with the given qualified name.
/// Attribute lists are tolerated; a prefix match on the name is not.
fn element_body<'a>(packet: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let mut search = 0;

    while let Some(found) = packet[search..].find(&open) {
        let at = search + found + open.len();
        let rest = &packet[at..];
        search = at;

        let boundary = rest.chars().next()?;
        if boundary != '>' && !boundary.is_whitespace() {
            continue;
        }
        let gt = rest.find('>')?;
        if rest[..gt].ends_with('/') {
            continue;
        }
        let body_start = at + gt + 1;
        let end = packet[body_start..].find(&close)?;
        return Some(&packet[body_start..body_start + end]);
    }
    None
}

/// Shorthand attribute form, e.g. `photoshop:City="Paris"`.
fn attribute_value(packet: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=\"");
    let start = packet.find(&needle)? + needle.len();
    let end = packet[start..].find('"')?;
    let value = unescape(&packet[start..start + end]);
    (!value.is_empty()).then_some(value)
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKET: &str = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
<rdf:Description rdf:about=""
  xmlns:dc="http://purl.org/dc/elements/1.1/"
  xmlns:photoshop="http://ns.adobe.com/photoshop/1.0/"
  Iptc4xmpCore:CountryCode="FRA">
  <photoshop:City>Lyon</photoshop:City>
  <photoshop:Country>France</photoshop:Country>
  <dc:title><rdf:Alt><rdf:li xml:lang="x-default">Rooftops &amp; rain</rdf:li></rdf:Alt></dc:title>
  <dc:subject><rdf:Bag>
    <rdf:li>Lyon</rdf:li>
    <rdf:li>France, FRA</rdf:li>
  </rdf:Bag></dc:subject>
</rdf:Description>
</rdf:RDF>
</x:xmpmeta>"#;

    #[test]
    fn test_subject_bag_joins_keywords() {
        let mut meta = PhotoMetadata::default();
        apply_packet(PACKET, &mut meta);
        assert_eq!(meta.keywords, vec!["Lyon", "France", "FRA"]);
    }

    #[test]
    fn test_fallback_fills_empty_fields() {
        let mut meta = PhotoMetadata::default();
        apply_packet(PACKET, &mut meta);
        assert_eq!(meta.city, "Lyon");
        assert_eq!(meta.country, "France");
        assert_eq!(meta.country_code, "FRA");
        assert_eq!(meta.title, "Rooftops & rain");
    }

    #[test]
    fn test_fallback_never_overrides_existing_value() {
        let mut meta = PhotoMetadata {
            city: "Paris".to_string(),
            ..Default::default()
        };
        apply_packet(PACKET, &mut meta);
        assert_eq!(meta.city, "Paris");
    }

    #[test]
    fn test_attribute_form_is_read() {
        let packet = r#"<rdf:Description photoshop:City="Porto"/>"#;
        let mut meta = PhotoMetadata::default();
        apply_packet(packet, &mut meta);
        assert_eq!(meta.city, "Porto");
    }

    #[test]
    fn test_missing_properties_leave_record_empty() {
        let mut meta = PhotoMetadata::default();
        apply_packet("<x:xmpmeta></x:xmpmeta>", &mut meta);
        assert_eq!(meta, PhotoMetadata::default());
    }

    #[test]
    fn test_prefix_name_does_not_match() {
        // dc:subjectExtra must not be mistaken for dc:subject
        let packet = "<dc:subjectExtra><rdf:li>nope</rdf:li></dc:subjectExtra>";
        assert!(bag_items(packet, "dc:subject").is_empty());
    }
}
