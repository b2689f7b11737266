//! One-way encoding of discrete grade levels into display symbols.
//!
//! Levels 1 through 9 map to Greek-letter symbol sequences written as inline
//! math markup. Anything else passes through untouched and is flagged so the
//! renderer knows it still needs escaping.

use std::borrow::Cow;

const SYMBOLS: [&str; 9] = [
    r"\alpha +",
    r"\alpha",
    r"\alpha \beta",
    r"\beta\alpha",
    r"\beta",
    r"\beta\gamma",
    r"\gamma\beta",
    r"\gamma",
    r"\gamma-",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawGrade<'a> {
    Integer(i64),
    Text(&'a str),
    Missing,
}

impl From<i64> for RawGrade<'_> {
    fn from(value: i64) -> Self {
        RawGrade::Integer(value)
    }
}

impl<'a> From<&'a str> for RawGrade<'a> {
    fn from(value: &'a str) -> Self {
        RawGrade::Text(value)
    }
}

impl<'a> From<Option<&'a str>> for RawGrade<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(RawGrade::Missing, RawGrade::Text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedGrade<'a> {
    pub display: Cow<'a, str>,
    /// `true` when `display` is already target markup and must not be escaped.
    pub pre_encoded: bool,
}

/// Symbol sequence for a grade level, if the level is in range.
pub fn symbol_for_level(level: i64) -> Option<&'static str> {
    usize::try_from(level)
        .ok()
        .and_then(|level| level.checked_sub(1))
        .and_then(|idx| SYMBOLS.get(idx).copied())
}

pub fn encode<'a>(raw: impl Into<RawGrade<'a>>) -> EncodedGrade<'a> {
    match raw.into() {
        RawGrade::Integer(value) => match symbol_for_level(value) {
            Some(symbol) => pre_encoded(symbol),
            None => EncodedGrade {
                display: Cow::Owned(value.to_string()),
                pre_encoded: false,
            },
        },
        RawGrade::Text(text) => match parse_level(text).and_then(symbol_for_level) {
            Some(symbol) => pre_encoded(symbol),
            None => EncodedGrade {
                display: Cow::Borrowed(text),
                pre_encoded: false,
            },
        },
        RawGrade::Missing => EncodedGrade {
            display: Cow::Borrowed(""),
            pre_encoded: false,
        },
    }
}

fn pre_encoded(symbol: &'static str) -> EncodedGrade<'static> {
    EncodedGrade {
        display: Cow::Owned(format!("${symbol}$")),
        pre_encoded: true,
    }
}

// Digits only; surrounding whitespace is tolerated, signs are not.
fn parse_level(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<i64>().ok()
}
