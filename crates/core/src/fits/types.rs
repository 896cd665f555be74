//! Header types for the FITS module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed header value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum HeaderValue {
    /// `T` or `F`.
    Logical(bool),
    /// Integer literal.
    Integer(i64),
    /// Real literal (`E` or `D` exponent).
    Real(f64),
    /// Complex literal `(re, im)`.
    Complex(f64, f64),
    /// Quoted string, or the text of a commentary card.
    Text(String),
    /// Value field left blank.
    Undefined,
}

impl HeaderValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value as a float, accepting integers too.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_logical(&self) -> Option<bool> {
        match self {
            Self::Logical(v) => Some(*v),
            _ => None,
        }
    }
}

/// Renders values the way astronomers see them in header dumps:
/// `True`/`False`, `42`, `0.5`, `1e-05`, `(1.0+2.0j)`.
impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logical(true) => f.write_str("True"),
            Self::Logical(false) => f.write_str("False"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => f.write_str(&format_real(*v)),
            Self::Complex(re, im) => {
                let sign = if *im < 0.0 || (*im == 0.0 && im.is_sign_negative()) {
                    "-"
                } else {
                    "+"
                };
                write!(f, "({}{}{}j)", format_real(*re), sign, format_real(im.abs()))
            }
            Self::Text(s) => f.write_str(s),
            Self::Undefined => Ok(()),
        }
    }
}

/// Shortest round-trip float text, positional for moderate magnitudes and
/// `1.5e+16` style otherwise.
fn format_real(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = v.abs();
    if magnitude == 0.0 || (1e-4..1e16).contains(&magnitude) {
        let text = format!("{v}");
        if text.contains('.') {
            text
        } else {
            format!("{text}.0")
        }
    } else {
        let text = format!("{v:e}");
        match text.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => text,
        }
    }
}

/// One header card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderCard {
    /// Keyword, without the `HIERARCH` prefix for long keywords.
    pub keyword: String,
    pub value: HeaderValue,
    /// Text after the `/` separator, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl HeaderCard {
    pub fn new(keyword: impl Into<String>, value: HeaderValue, comment: Option<String>) -> Self {
        Self {
            keyword: keyword.into(),
            value,
            comment,
        }
    }
}

/// An ordered FITS header. Keywords may repeat (`COMMENT`, `HISTORY`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    cards: Vec<HeaderCard>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card: HeaderCard) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[HeaderCard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Value of the first card with this keyword.
    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        self.cards
            .iter()
            .find(|c| c.keyword == keyword)
            .map(|c| &c.value)
    }

    pub fn integer(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(HeaderValue::as_integer)
    }

    pub fn real(&self, keyword: &str) -> Option<f64> {
        self.get(keyword).and_then(HeaderValue::as_real)
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut HeaderCard> {
        self.cards.last_mut()
    }
}

impl FromIterator<HeaderCard> for Header {
    fn from_iter<I: IntoIterator<Item = HeaderCard>>(iter: I) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}
