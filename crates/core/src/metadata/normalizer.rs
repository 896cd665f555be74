//! FITS header to metadata record conversion.

use super::types::{KeywordEntry, MetadataRecord};
use crate::fits::Header;

/// Builds a string-only metadata record from a FITS header.
///
/// Every value is rendered as text and a missing comment becomes `""`.
pub fn normalize(header: &Header) -> MetadataRecord {
    let mut record = MetadataRecord::new();
    for card in header.cards() {
        record.push(
            card.keyword.clone(),
            KeywordEntry::new(
                card.value.to_string(),
                card.comment.clone().unwrap_or_default(),
            ),
        );
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::{HeaderCard, HeaderValue};

    #[test]
    fn test_values_are_stringified() {
        let header: Header = vec![
            HeaderCard::new("SIMPLE", HeaderValue::Logical(true), Some("standard".into())),
            HeaderCard::new("NAXIS", HeaderValue::Integer(2), None),
            HeaderCard::new("EXPTIME", HeaderValue::Real(60.0), Some("[s]".into())),
            HeaderCard::new("OBJECT", HeaderValue::Text("NGC 7000".into()), None),
            HeaderCard::new("FOCUS", HeaderValue::Undefined, None),
        ]
        .into_iter()
        .collect();

        let record = normalize(&header);
        assert_eq!(record.len(), 5);
        assert_eq!(record.get("SIMPLE").unwrap(), &[KeywordEntry::new("True", "standard")]);
        assert_eq!(record.get("NAXIS").unwrap(), &[KeywordEntry::new("2", "")]);
        assert_eq!(record.get("EXPTIME").unwrap(), &[KeywordEntry::new("60.0", "[s]")]);
        assert_eq!(record.get("OBJECT").unwrap(), &[KeywordEntry::new("NGC 7000", "")]);
        assert_eq!(record.get("FOCUS").unwrap(), &[KeywordEntry::new("", "")]);
    }

    #[test]
    fn test_commentary_cards_accumulate() {
        let header: Header = vec![
            HeaderCard::new("HISTORY", HeaderValue::Text("dark subtracted".into()), None),
            HeaderCard::new("HISTORY", HeaderValue::Text("flat fielded".into()), None),
        ]
        .into_iter()
        .collect();

        let record = normalize(&header);
        let history = record.get("HISTORY").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].value, "dark subtracted");
        assert_eq!(history[1].value, "flat fielded");
    }

    #[test]
    fn test_empty_header() {
        assert!(normalize(&Header::new()).is_empty());
    }
}
