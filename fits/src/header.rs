// Copyright 2026 Peter Williams and collaborators
// Licensed under the MIT License.

//! FITS header cards, values, and ordered headers.
//!
//! Cards read from a file keep their original 80-byte records, so a header
//! that is read and then written back out reproduces the untouched cards
//! byte-for-byte. Only cards created through [`Card::new`] are formatted by
//! this module.

use std::fmt;

use crate::{FitsError, CARD_SIZE};

/// Keywords that never carry a value, even if bytes 8 and 9 read `= `.
const COMMENTARY_KEYWORDS: &[&str] = &["COMMENT", "HISTORY", ""];

/// A value attached to a FITS header keyword.
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderValue {
    /// A `T` or `F` logical value.
    Logical(bool),

    /// An integer value.
    Integer(i64),

    /// A floating-point value. FITS `D` exponents are accepted on input.
    Float(f64),

    /// A character string, with the quotes and trailing blanks removed.
    String(String),

    /// The keyword has a value indicator but a blank value.
    Undefined,

    /// Value text that we don't interpret, such as a complex number.
    Unparsed(String),
}

impl HeaderValue {
    /// A short name for the type of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            HeaderValue::Logical(_) => "logical",
            HeaderValue::Integer(_) => "integer",
            HeaderValue::Float(_) => "float",
            HeaderValue::String(_) => "string",
            HeaderValue::Undefined => "undefined",
            HeaderValue::Unparsed(_) => "unparsed",
        }
    }

    /// Get the value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            HeaderValue::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Get the value as a float. Integers are converted.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            HeaderValue::Integer(n) => Some(n as f64),
            HeaderValue::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Parse the value field of a card: bytes 10 through 79.
    ///
    /// Returns the value and the comment, if any.
    fn parse(field: &[u8]) -> (HeaderValue, Option<String>) {
        let text = String::from_utf8_lossy(field);
        let text = text.trim_start();

        if let Some(rest) = text.strip_prefix('\'') {
            return parse_string_value(rest);
        }

        let (value_text, comment) = match text.find('/') {
            Some(i) => (&text[..i], clean_comment(&text[i + 1..])),
            None => (text, None),
        };

        let value_text = value_text.trim();

        let value = if value_text.is_empty() {
            HeaderValue::Undefined
        } else if value_text == "T" {
            HeaderValue::Logical(true)
        } else if value_text == "F" {
            HeaderValue::Logical(false)
        } else if let Ok(n) = value_text.parse::<i64>() {
            HeaderValue::Integer(n)
        } else if let Ok(f) = value_text.replace('D', "E").replace('d', "e").parse::<f64>() {
            HeaderValue::Float(f)
        } else {
            HeaderValue::Unparsed(value_text.to_owned())
        };

        (value, comment)
    }

    /// Render the value in FITS fixed format, as it would appear starting at
    /// byte 10 of a card.
    fn to_fixed_format(&self) -> String {
        match self {
            HeaderValue::Logical(b) => format!("{:>20}", if *b { "T" } else { "F" }),
            HeaderValue::Integer(n) => format!("{n:>20}"),
            HeaderValue::Float(f) => format!("{:>20}", format_float(*f)),
            HeaderValue::String(s) => {
                let escaped = s.replace('\'', "''");
                format!("{:<20}", format!("'{escaped:<8}'"))
            }
            HeaderValue::Undefined => String::new(),
            HeaderValue::Unparsed(s) => format!("{s:>20}"),
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HeaderValue::Logical(b) => write!(f, "{}", if *b { "T" } else { "F" }),
            HeaderValue::Integer(n) => write!(f, "{n}"),
            HeaderValue::Float(x) => write!(f, "{x}"),
            HeaderValue::String(s) => write!(f, "{s}"),
            HeaderValue::Undefined => Ok(()),
            HeaderValue::Unparsed(s) => write!(f, "{s}"),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        return format!("{f:.1}");
    }

    let s = format!("{f:E}");

    if s.contains('.') {
        s
    } else {
        s.replacen('E', ".0E", 1)
    }
}

fn clean_comment(text: &str) -> Option<String> {
    let text = text.trim();

    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

/// Parse a string value; `text` starts just after the opening quote.
fn parse_string_value(text: &str) -> (HeaderValue, Option<String>) {
    let mut value = String::new();
    let mut chars = text.char_indices().peekable();
    let mut rest_start = text.len();

    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if let Some((_, '\'')) = chars.peek() {
                value.push('\'');
                chars.next();
            } else {
                rest_start = i + 1;
                break;
            }
        } else {
            value.push(c);
        }
    }

    let rest = &text[rest_start..];
    let comment = rest.find('/').and_then(|i| clean_comment(&rest[i + 1..]));
    let value = value.trim_end().to_owned();
    (HeaderValue::String(value), comment)
}

/// One 80-byte header record.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    record: [u8; CARD_SIZE],
    keyword: String,
    value: Option<HeaderValue>,
    comment: Option<String>,
}

impl Card {
    /// Create a new keyword card, formatted in FITS fixed format.
    ///
    /// The keyword is upper-cased. Long values and comments are truncated to
    /// fit in 80 bytes.
    pub fn new(keyword: &str, value: HeaderValue, comment: Option<&str>) -> Result<Card, FitsError> {
        let keyword = keyword.trim().to_uppercase();
        check_keyword(&keyword)?;

        let mut text = format!("{keyword:<8}= {}", value.to_fixed_format());

        if let Some(c) = comment {
            text.push_str(" / ");
            text.push_str(c);
        }

        let mut record = [b' '; CARD_SIZE];
        let bytes = text.as_bytes();
        let n = bytes.len().min(CARD_SIZE);
        record[..n].copy_from_slice(&bytes[..n]);

        // Re-parse so that truncation is reflected in the stored pieces.
        Ok(Card::from_record(&record))
    }

    /// Interpret a raw 80-byte record.
    ///
    /// This is lenient: anything that doesn't parse as a keyword/value pair is
    /// kept as commentary text so that it can be written back out unchanged.
    pub fn from_record(record: &[u8; CARD_SIZE]) -> Card {
        let keyword = String::from_utf8_lossy(&record[..8]).trim_end().to_owned();

        let (value, comment) =
            if &record[8..10] == b"= " && !COMMENTARY_KEYWORDS.contains(&keyword.as_ref()) {
                let (v, c) = HeaderValue::parse(&record[10..]);
                (Some(v), c)
            } else {
                let text = String::from_utf8_lossy(&record[8..]);
                (None, clean_comment(&text))
            };

        Card {
            record: *record,
            keyword,
            value,
            comment,
        }
    }

    /// The keyword, without trailing blanks.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// The value of this card, if it has one.
    pub fn value(&self) -> Option<&HeaderValue> {
        self.value.as_ref()
    }

    /// The comment of this card, or the text of a commentary card.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// The raw 80-byte record.
    pub fn record(&self) -> &[u8; CARD_SIZE] {
        &self.record
    }

    /// The record as text, without trailing blanks.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.record).trim_end().to_owned()
    }

    /// Whether this is the `END` card.
    pub fn is_end(&self) -> bool {
        self.keyword == "END" && self.record[3..].iter().all(|b| *b == b' ')
    }
}

fn check_keyword(keyword: &str) -> Result<(), FitsError> {
    if keyword.len() > 8 {
        return fitserr!("FITS keyword {:?} is longer than 8 characters", keyword);
    }

    for b in keyword.bytes() {
        match b {
            b'0'..=b'9' | b'A'..=b'Z' | b'_' | b'-' => {}
            other => {
                return fitserr!("illegal header keyword ASCII code {} in {:?}", other, keyword);
            }
        }
    }

    Ok(())
}

/// The ordered cards of one HDU header, not including `END`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    /// Create an empty header.
    pub fn new() -> Self {
        Header { cards: Vec::new() }
    }

    /// Parse a header from a sequence of 80-byte records, stopping at `END`.
    ///
    /// Trailing bytes that don't make up a whole record are ignored.
    pub fn from_records(data: &[u8]) -> Self {
        let mut cards = Vec::new();

        for chunk in data.chunks_exact(CARD_SIZE) {
            let mut record = [0u8; CARD_SIZE];
            record.copy_from_slice(chunk);
            let card = Card::from_record(&record);

            if card.is_end() {
                break;
            }

            cards.push(card);
        }

        Header { cards }
    }

    /// The cards in this header.
    pub fn cards(&self) -> &[Card] {
        &self.cards[..]
    }

    /// The number of cards, not counting `END`.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the header has no cards at all.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Find the position of the first card with the given keyword.
    pub fn position(&self, keyword: &str) -> Option<usize> {
        let keyword = keyword.to_uppercase();
        self.cards.iter().position(|c| c.keyword == keyword)
    }

    /// Get the first card with the given keyword.
    pub fn card(&self, keyword: &str) -> Option<&Card> {
        self.position(keyword).map(|i| &self.cards[i])
    }

    /// Get the value of the first card with the given keyword.
    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        self.card(keyword).and_then(|c| c.value())
    }

    /// Get the comment and the value type name of a keyword.
    pub fn value_comment(&self, keyword: &str) -> Option<(Option<&str>, &'static str)> {
        let card = self.card(keyword)?;
        let type_name = card.value().map(|v| v.type_name()).unwrap_or("commentary");
        Some((card.comment(), type_name))
    }

    /// Append a card.
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Insert a card at the given position.
    pub fn insert(&mut self, index: usize, card: Card) {
        self.cards.insert(index, card);
    }

    /// Replace the card at the given position.
    pub fn replace(&mut self, index: usize, card: Card) {
        self.cards[index] = card;
    }

    /// Remove every card with the given keyword, returning how many were
    /// removed.
    pub fn remove(&mut self, keyword: &str) -> usize {
        let keyword = keyword.to_uppercase();
        let before = self.cards.len();
        self.cards.retain(|c| c.keyword != keyword);
        before - self.cards.len()
    }

    /// Set a keyword, placing it directly after the `after` keyword.
    ///
    /// Any existing cards with this keyword are removed first. If `after`
    /// is `None` or isn't present, an existing card is replaced in place, or
    /// the new card is appended.
    pub fn set(
        &mut self,
        keyword: &str,
        value: HeaderValue,
        comment: Option<&str>,
        after: Option<&str>,
    ) -> Result<(), FitsError> {
        let card = Card::new(keyword, value, comment)?;
        let anchor = after.and_then(|a| self.position(a));

        if anchor.is_none() {
            if let Some(i) = self.position(keyword) {
                self.cards[i] = card;
                return Ok(());
            }

            self.cards.push(card);
            return Ok(());
        }

        self.remove(keyword);

        match after.and_then(|a| self.position(a)) {
            Some(i) => self.cards.insert(i + 1, card),
            None => self.cards.push(card),
        }

        Ok(())
    }

    /// Find the position of the last `NAXISn` card, or `NAXIS` if there are
    /// none.
    pub(crate) fn last_naxis_position(&self) -> Option<usize> {
        self.cards
            .iter()
            .rposition(|c| {
                c.keyword
                    .strip_prefix("NAXIS")
                    .map(|rest| rest.is_empty() || rest.bytes().all(|b| b.is_ascii_digit()))
                    .unwrap_or(false)
            })
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            write!(f, "{}", card.text())?;
        }

        Ok(())
    }
}
