//! Deterministic UK address tokenizer. Pure text processing,
//! no I/O — the core only asks this for one thing: whether a pickup
//! looks like a bare street name missing a house number.

use std::sync::OnceLock;

use regex::Regex;
use taxi_domain::contracts::{AddressParser, ParsedAddress};

static HOUSE_NUMBER_RE: OnceLock<Regex> = OnceLock::new();
static FLAT_RE: OnceLock<Regex> = OnceLock::new();
static STREET_SUFFIX_RE: OnceLock<Regex> = OnceLock::new();

fn house_number_re() -> &'static Regex {
    HOUSE_NUMBER_RE.get_or_init(|| Regex::new(r"^\s*(\d+[a-zA-Z]?)\b").unwrap())
}

fn flat_re() -> &'static Regex {
    FLAT_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(flat|apartment|apt|unit)\s*([0-9a-z]+)\b").unwrap()
    })
}

fn street_suffix_re() -> &'static Regex {
    STREET_SUFFIX_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(street|st|road|rd|avenue|ave|lane|ln|drive|dr|close|way|court|ct|place|pl|square|sq|crescent|gardens|grove|hill|park)\b",
        )
        .unwrap()
    })
}

/// Regex-based UK address tokenizer. Intentionally shallow: it classifies
/// enough structure to drive the core's house-number reprompt, nothing
/// closer to a full postal address parser.
#[derive(Debug, Clone, Default)]
pub struct UkAddressParser;

impl AddressParser for UkAddressParser {
    fn parse(&self, text: &str) -> ParsedAddress {
        let trimmed = text.trim();

        let house_number = house_number_re()
            .captures(trimmed)
            .map(|c| c[1].to_string());

        let flat_or_unit = flat_re().captures(trimmed).map(|c| c[2].to_string());

        let is_street_type = street_suffix_re().is_match(trimmed);

        let street_name = if is_street_type {
            Some(
                house_number_re()
                    .replace(trimmed, "")
                    .trim()
                    .trim_start_matches(',')
                    .trim()
                    .to_string(),
            )
            .filter(|s| !s.is_empty())
        } else {
            None
        };

        // Town/area: the trailing comma-separated segment, when present.
        let town_or_area = trimmed
            .rsplit_once(',')
            .map(|(_, tail)| tail.trim().to_string())
            .filter(|s| !s.is_empty());

        ParsedAddress {
            has_house_number: house_number.is_some(),
            house_number,
            flat_or_unit,
            street_name,
            town_or_area,
            is_street_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn street_without_house_number_is_flagged() {
        let parsed = UkAddressParser.parse("High Street");
        assert!(parsed.is_street_type);
        assert!(!parsed.has_house_number);
    }

    #[test]
    fn street_with_house_number_is_not_flagged() {
        let parsed = UkAddressParser.parse("10 High Street");
        assert!(parsed.is_street_type);
        assert!(parsed.has_house_number);
        assert_eq!(parsed.house_number.as_deref(), Some("10"));
    }

    #[test]
    fn non_street_text_is_not_street_type() {
        let parsed = UkAddressParser.parse("Main Square");
        assert!(!parsed.is_street_type);
    }

    #[test]
    fn flat_prefix_extracted() {
        let parsed = UkAddressParser.parse("Flat 4, 12 Oak Avenue");
        assert_eq!(parsed.flat_or_unit.as_deref(), Some("4"));
        assert!(parsed.is_street_type);
    }

    #[test]
    fn town_or_area_is_trailing_segment() {
        let parsed = UkAddressParser.parse("10 High Street, Cambridge");
        assert_eq!(parsed.town_or_area.as_deref(), Some("Cambridge"));
    }
}
