//! Header card parsing.

use super::types::{HeaderCard, HeaderValue};
use super::CARD_SIZE;

/// What a single 80-byte card contributes to the header.
#[derive(Debug, PartialEq)]
pub(crate) enum ParsedCard {
    /// The END card.
    End,
    /// An entirely blank card.
    Blank,
    /// A `CONTINUE` card carrying the next piece of a long string.
    Continue {
        text: String,
        comment: Option<String>,
    },
    Card(HeaderCard),
}

const VALUE_INDICATOR: &[u8] = b"= ";
const COMMENTARY_KEYWORDS: [&str; 3] = ["COMMENT", "HISTORY", ""];

/// Parses one card. `raw` must be exactly one card long.
pub(crate) fn parse_card(raw: &[u8]) -> ParsedCard {
    debug_assert_eq!(raw.len(), CARD_SIZE);

    if raw.iter().all(|b| *b == b' ') {
        return ParsedCard::Blank;
    }

    let keyword = String::from_utf8_lossy(&raw[..8]).trim_end().to_string();
    match keyword.as_str() {
        "END" => return ParsedCard::End,
        "HIERARCH" => return parse_hierarch(&String::from_utf8_lossy(&raw[8..])),
        "CONTINUE" => {
            let (value, comment) = parse_value_field(&String::from_utf8_lossy(&raw[8..]));
            let text = match value {
                HeaderValue::Text(text) => text,
                other => other.to_string(),
            };
            return ParsedCard::Continue { text, comment };
        }
        _ => {}
    }

    let has_value = &raw[8..10] == VALUE_INDICATOR && !COMMENTARY_KEYWORDS.contains(&keyword.as_str());
    if !has_value {
        let text = String::from_utf8_lossy(&raw[8..]).trim_end().to_string();
        return ParsedCard::Card(HeaderCard::new(keyword, HeaderValue::Text(text), None));
    }

    let (value, comment) = parse_value_field(&String::from_utf8_lossy(&raw[10..]));
    ParsedCard::Card(HeaderCard::new(keyword, value, comment))
}

/// `HIERARCH ESO DET DIT = 10.0 / comment`
fn parse_hierarch(rest: &str) -> ParsedCard {
    match rest.split_once('=') {
        Some((key, field)) => {
            let (value, comment) = parse_value_field(field);
            ParsedCard::Card(HeaderCard::new(key.trim(), value, comment))
        }
        None => ParsedCard::Card(HeaderCard::new(
            "HIERARCH",
            HeaderValue::Text(rest.trim_end().to_string()),
            None,
        )),
    }
}

/// Splits a value field into value and comment.
fn parse_value_field(field: &str) -> (HeaderValue, Option<String>) {
    let trimmed = field.trim_start();
    if let Some(quoted) = trimmed.strip_prefix('\'') {
        let (text, remainder) = parse_quoted(quoted);
        let comment = remainder
            .split_once('/')
            .map(|(_, comment)| comment.trim().to_string());
        return (HeaderValue::Text(text), comment);
    }

    let (token, comment) = match trimmed.split_once('/') {
        Some((token, comment)) => (token.trim(), Some(comment.trim().to_string())),
        None => (trimmed.trim(), None),
    };
    (parse_literal(token), comment)
}

/// Reads a quoted string whose opening quote has been consumed.
/// Returns the text (trailing blanks removed) and what follows the closing quote.
fn parse_quoted(input: &str) -> (String, &str) {
    let mut text = String::new();
    let mut chars = input.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                text.push('\'');
                chars.next();
                continue;
            }
            return (text.trim_end().to_string(), &input[idx + 1..]);
        }
        text.push(ch);
    }
    // Unterminated string: keep what is there.
    (text.trim_end().to_string(), "")
}

fn parse_literal(token: &str) -> HeaderValue {
    match token {
        "" => return HeaderValue::Undefined,
        "T" => return HeaderValue::Logical(true),
        "F" => return HeaderValue::Logical(false),
        _ => {}
    }

    if let Ok(v) = token.parse::<i64>() {
        return HeaderValue::Integer(v);
    }
    if let Some(v) = parse_real(token) {
        return HeaderValue::Real(v);
    }
    if let Some(inner) = token.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        if let Some((re, im)) = inner.split_once(',') {
            if let (Some(re), Some(im)) = (parse_real(re.trim()), parse_real(im.trim())) {
                return HeaderValue::Complex(re, im);
            }
        }
    }
    HeaderValue::Text(token.to_string())
}

fn parse_real(token: &str) -> Option<f64> {
    if !token.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    token.replace(['D', 'd'], "E").parse::<f64>().ok()
}
