// Copyright 2026 Peter Williams and collaborators
// Licensed under the MIT License.

//! The image header stored inside FITS-LDAC catalogs.
//!
//! An LDAC catalog keeps a copy of the header of the image it was extracted
//! from in a one-row binary table named `LDAC_IMHEAD`. The single cell of its
//! first column is a character array holding the 80-byte cards back to back.

use crate::header::{Card, Header, HeaderValue};
use crate::hdu::Hdu;
use crate::{FitsError, CARD_SIZE, END_MARKER};

/// The EXTNAME of the table holding the embedded image header.
pub const LDAC_IMHEAD: &str = "LDAC_IMHEAD";

/// Get the width of a character-array column from its `TFORMn` value.
fn char_column_width(tform: &str) -> Result<usize, FitsError> {
    let tform = tform.trim();

    let repeat = match tform.strip_suffix('A') {
        Some(r) => r,
        None => return fitserr!("{} column should be a character array but has TFORM {:?}", LDAC_IMHEAD, tform),
    };

    if repeat.is_empty() {
        return Ok(1);
    }

    match repeat.parse::<usize>() {
        Ok(n) => Ok(n),
        Err(_) => fitserr!("cannot parse TFORM {:?} of {} table", tform, LDAC_IMHEAD),
    }
}

/// Extract the embedded image header from an `LDAC_IMHEAD` table HDU.
pub fn imhead_header(hdu: &Hdu) -> Result<Header, FitsError> {
    if hdu.xtension() != Some("BINTABLE") {
        return fitserr!("{} HDU is not a binary table", LDAC_IMHEAD);
    }

    let header = hdu.header();

    let tform = match header.get("TFORM1").and_then(|v| v.as_str()) {
        Some(t) => t,
        None => return Err(FitsError::MissingKeyword("TFORM1".to_owned())),
    };

    let width = char_column_width(tform)?;
    let n_rows = header.get("NAXIS2").and_then(|v| v.as_int()).unwrap_or(0);

    if n_rows < 1 {
        return fitserr!("{} table has no rows", LDAC_IMHEAD);
    }

    let data = hdu.data();

    if data.len() < width {
        return fitserr!(
            "{} table data ({} bytes) are shorter than its first cell ({} bytes)",
            LDAC_IMHEAD,
            data.len(),
            width
        );
    }

    Ok(Header::from_records(&data[..width]))
}

/// Build an `LDAC_IMHEAD` table HDU holding the given header.
///
/// This is the inverse of [`imhead_header`], and is how LDAC catalog
/// writers embed the image header.
pub fn imhead_table(image_header: &Header) -> Result<Hdu, FitsError> {
    let mut cell = Vec::with_capacity((image_header.len() + 1) * CARD_SIZE);

    for card in image_header.cards() {
        cell.extend_from_slice(card.record());
    }

    cell.extend_from_slice(END_MARKER);
    let width = cell.len();
    let n_cards = width / CARD_SIZE;

    let mut h = Header::new();
    h.push(Card::new("XTENSION", HeaderValue::String("BINTABLE".to_owned()), Some("binary table extension"))?);
    h.push(Card::new("BITPIX", HeaderValue::Integer(8), Some("array data type"))?);
    h.push(Card::new("NAXIS", HeaderValue::Integer(2), Some("number of array dimensions"))?);
    h.push(Card::new("NAXIS1", HeaderValue::Integer(width as i64), Some("length of dimension 1"))?);
    h.push(Card::new("NAXIS2", HeaderValue::Integer(1), Some("length of dimension 2"))?);
    h.push(Card::new("PCOUNT", HeaderValue::Integer(0), Some("number of group parameters"))?);
    h.push(Card::new("GCOUNT", HeaderValue::Integer(1), Some("number of groups"))?);
    h.push(Card::new("TFIELDS", HeaderValue::Integer(1), Some("number of table fields"))?);
    h.push(Card::new("TTYPE1", HeaderValue::String("Field Header Card".to_owned()), None)?);
    h.push(Card::new("TFORM1", HeaderValue::String(format!("{width}A")), None)?);
    h.push(Card::new("TDIM1", HeaderValue::String(format!("(80, {n_cards})")), None)?);
    h.push(Card::new("EXTNAME", HeaderValue::String(LDAC_IMHEAD.to_owned()), None)?);

    Ok(Hdu::new(h, cell))
}
