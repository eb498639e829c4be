//! Filename identity parsing.
//!
//! Upload filenames follow the convention `{owner}___{anything}___{clean_name}`.
//! Files dropped without the marker belong to the default "system" owner and
//! keep their name as-is.

/// Owner recorded when the filename carries no ownership marker.
pub const DEFAULT_OWNER: &str = "system";

const SEPARATOR: &str = "___";

/// Ownership and display name recovered from a raw upload filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub owner: String,
    pub clean_name: String,
}

/// Split a raw filename into owner and clean name.
///
/// The owner is everything before the first `___`. The clean name is everything
/// after the second `___` when present, otherwise everything after the first.
/// Infallible: a filename without the marker yields the default owner and the
/// unchanged name.
pub fn parse(raw: &str) -> FileIdentity {
    let Some(first) = raw.find(SEPARATOR) else {
        return FileIdentity {
            owner: DEFAULT_OWNER.to_string(),
            clean_name: raw.to_string(),
        };
    };

    let owner = raw[..first].to_string();
    let after_first = &raw[first + SEPARATOR.len()..];
    let clean_name = match after_first.find(SEPARATOR) {
        Some(second) => after_first[second + SEPARATOR.len()..].to_string(),
        None => after_first.to_string(),
    };

    FileIdentity { owner, clean_name }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_marker_uses_default_owner() {
        let identity = parse("holiday.jpg");
        assert_eq!(identity.owner, DEFAULT_OWNER);
        assert_eq!(identity.clean_name, "holiday.jpg");
    }

    #[test]
    fn test_single_marker_splits_owner_and_name() {
        let identity = parse("alice___beach.jpg");
        assert_eq!(identity.owner, "alice");
        assert_eq!(identity.clean_name, "beach.jpg");
    }

    #[test]
    fn test_double_marker_takes_name_after_second() {
        let identity = parse("alice___batch1___2023-06-01_120000_trip.jpg");
        assert_eq!(identity.owner, "alice");
        assert_eq!(identity.clean_name, "2023-06-01_120000_trip.jpg");
    }

    #[test]
    fn test_extra_markers_stay_in_clean_name() {
        let identity = parse("bob___a___b___c.jpg");
        assert_eq!(identity.owner, "bob");
        assert_eq!(identity.clean_name, "b___c.jpg");
    }

    #[test]
    fn test_leading_marker_gives_empty_owner() {
        let identity = parse("___upload.jpg");
        assert_eq!(identity.owner, "");
        assert_eq!(identity.clean_name, "upload.jpg");
    }
}
