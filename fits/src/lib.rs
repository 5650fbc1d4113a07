// Copyright 2018-2026 Peter Williams and collaborators
// Licensed under the MIT License.

//! Access to FITS-format files.
//!
//! This is deliberately not a general FITS implementation. It understands
//! enough of the format to separate a file into its HDUs, to read and edit
//! their headers, and to write lists of HDUs back out with their data
//! copied through untouched. That is all that the pipeline tools need: they
//! shuffle HDUs between files and look at header keywords, but never
//! interpret pixels or table cells (with the one exception of the LDAC
//! header table, see [`ldac`]).

#![deny(missing_docs)]

use std::io::prelude::*;
use std::io::SeekFrom;
use std::str;
use thiserror::Error;

// Must precede the submodules.
macro_rules! fitserr {
    ($( $fmt_args:expr ),*) => {
        Err($crate::FitsError::Format(format!($( $fmt_args ),*)))
    }
}

pub mod catalogs;
pub mod hdu;
pub mod header;
pub mod ldac;
pub mod mef;

pub use hdu::{read_hdu_list, read_header, write_hdu_list, FitsFile, Hdu, HduSelector};
pub use header::{Card, Header, HeaderValue};

impl FitsError {
    /// Attach the name of the input file that caused this error.
    pub fn for_input<P: AsRef<std::path::Path>>(self, path: P) -> FitsError {
        FitsError::Input {
            path: path.as_ref().display().to_string(),
            source: Box::new(self),
        }
    }
}

/// The size of a FITS logical record, in bytes.
pub const RECORD_SIZE: usize = 2880;

/// The size of a single header card, in bytes.
pub const CARD_SIZE: usize = 80;

/// An error type for FITS operations.
#[derive(Error, Debug)]
pub enum FitsError {
    /// The file is malformed, or an operation would create a malformed file.
    #[error("{0}")]
    Format(String),

    /// A requested HDU doesn't exist.
    #[error("no HDU matching `{0}` in FITS file")]
    NoSuchHdu(String),

    /// A keyword that was needed is missing from a header.
    #[error("header keyword `{0}` not found")]
    MissingKeyword(String),

    /// We refused to overwrite an existing file.
    #[error("output file `{0}` already exists")]
    OutputExists(String),

    /// Something went wrong with one particular input file.
    #[error("cannot read FITS input `{path}`")]
    Input {
        /// The input file.
        path: String,

        /// What went wrong.
        #[source]
        source: Box<FitsError>,
    },

    /// An underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The element types that a BITPIX value can name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(i8)]
pub enum Bitpix {
    /// Unsigned bytes, or table text.
    U8 = 8,

    /// 16-bit signed integers.
    I16 = 16,

    /// 32-bit signed integers.
    I32 = 32,

    /// 64-bit signed integers.
    I64 = 64,

    /// Single-precision floats.
    F32 = -32,

    /// Double-precision floats.
    F64 = -64,
}

impl Bitpix {
    /// Bytes per element.
    pub fn n_bytes(&self) -> usize {
        match *self {
            Bitpix::U8 => 1,
            Bitpix::I16 => 2,
            Bitpix::I32 => 4,
            Bitpix::I64 => 8,
            Bitpix::F32 => 4,
            Bitpix::F64 => 8,
        }
    }

    /// Map a header value onto a BITPIX setting.
    pub fn from_value(value: i64) -> Result<Bitpix, FitsError> {
        Ok(match value {
            8 => Bitpix::U8,
            16 => Bitpix::I16,
            32 => Bitpix::I32,
            64 => Bitpix::I64,
            -32 => Bitpix::F32,
            -64 => Bitpix::F64,
            other => {
                return fitserr!("BITPIX = {} is not a legal value", other);
            }
        })
    }
}

const FITS_MARKER: &[u8] = b"SIMPLE  =                    T";
const XTENSION_MARKER: &[u8] = b"XTENSION= ";
const BITPIX_MARKER: &[u8] = b"BITPIX  = ";
const NAXIS_MARKER: &[u8] = b"NAXIS   = ";
const END_MARKER: &[u8] =
    b"END                                                                             ";
const GROUPS_MARKER: &[u8] = b"GROUPS  =                    T";
const PCOUNT_MARKER: &[u8] = b"PCOUNT  = ";
const GCOUNT_MARKER: &[u8] = b"GCOUNT  = ";

/// A map of the HDUs in a seekable FITS stream.
///
/// Construction walks the whole stream once. Headers are kept in memory; data are
/// only read on request.
#[derive(Clone, Debug)]
pub struct FitsParser<R: Read + Seek> {
    inner: R,
    hdus: Vec<ParsedHdu>,
    special_record_size: u64,
}

/// What an HDU holds, as far as this crate cares.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HduKind {
    /// A primary HDU with an image array.
    PrimaryArray,

    /// A primary HDU in the old random-groups layout.
    PrimaryRandomGroups,

    /// A primary HDU with no data unit.
    PrimaryNoData,

    /// An IMAGE extension.
    ImageExtension,

    /// An ASCII TABLE extension.
    AsciiTableExtension,

    /// A BINTABLE extension, such as the tables of an LDAC catalog.
    BinaryTableExtension,

    /// Any other XTENSION type. The data unit is still copied through
    /// as raw bytes.
    OtherExtension(String),
}

impl HduKind {
    /// Whether this is one of the primary HDU kinds.
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            HduKind::PrimaryArray | HduKind::PrimaryRandomGroups | HduKind::PrimaryNoData
        )
    }
}

/// One HDU found by [`FitsParser`].
#[derive(Clone, Debug)]
pub struct ParsedHdu {
    kind: HduKind,
    name: String,
    header: header::Header,
    header_offset: u64,
    data_offset: u64,
    data_size: usize,
    bitpix: Bitpix,
    pcount: isize,
    gcount: usize,
    naxis: Vec<usize>,
}

impl<R: Read + Seek> FitsParser<R> {
    /// Scan a stream and record where its HDUs are.
    pub fn new(mut inner: R) -> Result<Self, FitsError> {
        let file_size = inner.seek(SeekFrom::End(0))?;

        if file_size == 0 {
            return fitserr!("FITS stream is empty");
        }

        if file_size % RECORD_SIZE as u64 != 0 {
            return fitserr!(
                "FITS stream is {} bytes long, not a whole number of records",
                file_size
            );
        }

        inner.seek(SeekFrom::Start(0))?;

        let mut hdus: Vec<ParsedHdu> = Vec::new();
        let mut buf = [0u8; RECORD_SIZE];
        let mut cur_offset = 0;
        let mut special_record_size = 0;

        loop {
            // We are at the beginning of an HDU. Slurp up header records
            // until we find the one containing END.

            let hdu_header_offset = cur_offset;
            let mut records = Vec::new();

            loop {
                if cur_offset == file_size {
                    return fitserr!("FITS header starting at byte {} has no END record", hdu_header_offset);
                }

                inner.read_exact(&mut buf)?;
                cur_offset += RECORD_SIZE as u64;

                if records.is_empty() && !hdus.is_empty() && &buf[..XTENSION_MARKER.len()] != XTENSION_MARKER {
                    // Trailing special records.
                    special_record_size = file_size - hdu_header_offset;
                    break;
                }

                records.extend_from_slice(&buf);

                if buf.chunks_exact(CARD_SIZE).any(|r| r == END_MARKER) {
                    break;
                }
            }

            if records.is_empty() {
                break;
            }

            let parsed = ParsedHdu::from_records(&records, hdus.is_empty(), hdu_header_offset, cur_offset)?;
            let next_offset = parsed
                .data_size
                .div_ceil(RECORD_SIZE)
                .checked_mul(RECORD_SIZE)
                .and_then(|n| cur_offset.checked_add(n as u64))
                .ok_or_else(size_overflow)?;
            hdus.push(parsed);

            if next_offset >= file_size {
                if next_offset > file_size {
                    return fitserr!(
                        "FITS file is truncated: HDU #{} needs {} bytes but the file has {}",
                        hdus.len() - 1,
                        next_offset,
                        file_size
                    );
                }

                break;
            }

            inner.seek(SeekFrom::Start(next_offset))?;
            cur_offset = next_offset;
        }

        Ok(Self {
            inner,
            hdus,
            special_record_size,
        })
    }

    /// The HDUs, in file order.
    pub fn hdus(&self) -> &[ParsedHdu] {
        &self.hdus[..]
    }

    /// The number of bytes of "special records" trailing the last HDU.
    pub fn special_record_size(&self) -> u64 {
        self.special_record_size
    }

    /// Read the data unit of the HDU at the given index, without padding.
    pub fn read_data(&mut self, index: usize) -> Result<Vec<u8>, FitsError> {
        let (offset, size) = match self.hdus.get(index) {
            Some(hdu) => (hdu.data_offset, hdu.data_size),
            None => return Err(FitsError::NoSuchHdu(index.to_string())),
        };

        let mut data = vec![0u8; size];
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(&mut data)?;
        Ok(data)
    }

    /// Give back the stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl ParsedHdu {
    /// Work out the structure of an HDU from its header records.
    ///
    /// `records` holds whole 2880-byte header blocks, the last of which
    /// contains the END record.
    fn from_records(
        records: &[u8],
        is_first: bool,
        header_offset: u64,
        data_offset: u64,
    ) -> Result<Self, FitsError> {
        let mut kind = HduKind::PrimaryArray;

        if is_first {
            if &records[..FITS_MARKER.len()] != FITS_MARKER {
                return fitserr!("stream does not start with `SIMPLE  =                    T`");
            }
        } else {
            kind = match parse_fixed_string(&records[..CARD_SIZE])?.as_ref() {
                "IMAGE" => HduKind::ImageExtension,
                "TABLE" => HduKind::AsciiTableExtension,
                "BINTABLE" => HduKind::BinaryTableExtension,
                other => HduKind::OtherExtension(other.to_owned()),
            };
        }

        // Next: BITPIX.

        let bitpix = {
            let record = &records[80..160];

            if &record[..BITPIX_MARKER.len()] != BITPIX_MARKER {
                return fitserr!("second header card is not BITPIX");
            }

            Bitpix::from_value(parse_fixed_int(record)? as i64)?
        };

        // Next: NAXIS

        let naxis_value = {
            let record = &records[160..240];

            if &record[..NAXIS_MARKER.len()] != NAXIS_MARKER {
                return fitserr!("third header card is not NAXIS");
            }

            parse_fixed_int(record)?
        };

        if !(0..=999).contains(&naxis_value) {
            return fitserr!("NAXIS = {} is out of range", naxis_value);
        }

        let mut naxis = Vec::with_capacity(naxis_value as usize);
        let mut seen_groups = !is_first; // non-primary HDUs all have PCOUNT and GCOUNT.
        let mut pcount = 0;
        let mut gcount = 1;

        for record in records.chunks_exact(CARD_SIZE).skip(3) {
            if record == END_MARKER {
                break;
            }

            if accumulate_naxis_value(record, &mut naxis)? {
                continue;
            }

            if &record[..GROUPS_MARKER.len()] == GROUPS_MARKER {
                seen_groups = true;
            } else if seen_groups && &record[..PCOUNT_MARKER.len()] == PCOUNT_MARKER {
                pcount = parse_fixed_int(record)?;
            } else if seen_groups && &record[..GCOUNT_MARKER.len()] == GCOUNT_MARKER {
                let n = parse_fixed_int(record)?;

                if n < 0 {
                    return fitserr!("GCOUNT is negative");
                }

                gcount = n as usize;
            }
        }

        if naxis.len() != naxis_value as usize {
            return fitserr!(
                "FITS header declares NAXIS = {} but has {} NAXISn records",
                naxis_value,
                naxis.len()
            );
        }

        let header = header::Header::from_records(records);
        let name = header
            .get("EXTNAME")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_owned();

        let mut size_axes = &naxis[..];

        if seen_groups && is_first && !naxis.is_empty() {
            size_axes = &naxis[1..]; // dummy 0 value when primary HDU is random-groups
        }

        if pcount < 0 {
            return fitserr!("HDU has a negative PCOUNT");
        }

        let axes = if naxis.is_empty() { None } else { Some(size_axes) };
        let data_size = data_unit_size(bitpix.n_bytes(), gcount, pcount as usize, axes)?;

        if is_first {
            kind = if data_size == 0 {
                HduKind::PrimaryNoData
            } else if seen_groups {
                HduKind::PrimaryRandomGroups
            } else {
                HduKind::PrimaryArray
            };
        }

        Ok(ParsedHdu {
            kind,
            name,
            header,
            header_offset,
            data_offset,
            data_size,
            bitpix,
            pcount,
            gcount,
            naxis,
        })
    }

    /// EXTNAME, or an empty string.
    pub fn extname(&self) -> &str {
        &self.name
    }

    /// The HDU's kind.
    pub fn kind(&self) -> HduKind {
        self.kind.clone()
    }

    /// The parsed header of this HDU.
    pub fn header(&self) -> &header::Header {
        &self.header
    }

    /// The byte offset of this HDU's header within the file.
    pub fn header_offset(&self) -> u64 {
        self.header_offset
    }

    /// The size of this HDU's data unit in bytes, without padding.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// The element type of the data unit.
    pub fn bitpix(&self) -> Bitpix {
        self.bitpix
    }

    /// GCOUNT, PCOUNT and the NAXISn values.
    pub fn shape(&self) -> (usize, isize, &[usize]) {
        (self.gcount, self.pcount, &self.naxis[..])
    }
}

fn size_overflow() -> FitsError {
    FitsError::Format("HDU data size overflows".to_owned())
}

/// The size in bytes of a data unit: `elem * GCOUNT * (PCOUNT + prod(axes))`.
///
/// With no axes at all the group is just the PCOUNT bytes.
pub(crate) fn data_unit_size(
    elem: usize,
    gcount: usize,
    pcount: usize,
    axes: Option<&[usize]>,
) -> Result<usize, FitsError> {
    let product = match axes {
        Some(axes) => axes
            .iter()
            .try_fold(1usize, |acc, n| acc.checked_mul(*n))
            .ok_or_else(size_overflow)?,
        None => 0,
    };

    product
        .checked_add(pcount)
        .and_then(|group| group.checked_mul(gcount))
        .and_then(|n| n.checked_mul(elem))
        .ok_or_else(size_overflow)
}

/// The keyword of a header card, for error messages.
fn card_keyword(card: &[u8]) -> String {
    String::from_utf8_lossy(&card[..8]).trim_end().to_owned()
}

/// Parse the integer of a fixed-format card, right-justified in columns
/// 11 to 30.
fn parse_fixed_int(card: &[u8]) -> Result<isize, FitsError> {
    if !matches!(card[30], b' ' | b'/') {
        return fitserr!(
            "value of `{}` runs past column 30 of a fixed-format card",
            card_keyword(card)
        );
    }

    let field = card[10..30].trim_ascii_start();

    let (negative, digits) = match field.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, field),
    };

    if digits.is_empty() {
        return fitserr!("fixed-format integer `{}` has no digits", card_keyword(card));
    }

    let mut value: isize = 0;

    for &c in digits {
        if !c.is_ascii_digit() {
            return fitserr!(
                "unexpected byte {:?} in fixed-format integer `{}`",
                c as char,
                card_keyword(card)
            );
        }

        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((c - b'0') as isize))
            .ok_or_else(|| FitsError::Format(format!("`{}` is too large", card_keyword(card))))?;
    }

    Ok(if negative { -value } else { value })
}

/// Parse the quoted string of a fixed-format card. Doubled quotes stand for
/// one quote, and trailing blanks are not significant.
fn parse_fixed_string(card: &[u8]) -> Result<String, FitsError> {
    let card = &card[..CARD_SIZE];

    if &card[8..11] != b"= '" {
        return fitserr!("`{}` does not hold a fixed-format string", card_keyword(card));
    }

    if let Some(c) = card.iter().find(|c| !(b' '..=b'~').contains(*c)) {
        return fitserr!("non-printable byte {} in `{}`", c, card_keyword(card));
    }

    let mut value = Vec::new();
    let mut i = 11;

    loop {
        match card.get(i) {
            None => return fitserr!("unterminated string in `{}`", card_keyword(card)),
            Some(b'\'') if card.get(i + 1) == Some(&b'\'') => {
                value.push(b'\'');
                i += 2;
            }
            Some(b'\'') => break,
            Some(&c) => {
                value.push(c);
                i += 1;
            }
        }
    }

    let tail = card[i + 1..].trim_ascii_start();

    if !tail.is_empty() && tail[0] != b'/' {
        return fitserr!("unexpected text after the string in `{}`", card_keyword(card));
    }

    Ok(String::from_utf8_lossy(&value).trim_end().to_owned())
}

/// Handle a card if it is the next `NAXISn` of the header.
///
/// Returns false for cards that are not `NAXISn` at all.
fn accumulate_naxis_value(card: &[u8], naxis: &mut Vec<usize>) -> Result<bool, FitsError> {
    let axis = match card[..8].strip_prefix(b"NAXIS") {
        Some(rest) if rest.first().is_some_and(u8::is_ascii_digit) => rest.trim_ascii_end(),
        _ => return Ok(false),
    };

    if &card[8..10] != b"= " {
        return fitserr!("malformed `{}` card", card_keyword(card));
    }

    let axis = str::from_utf8(axis)
        .ok()
        .filter(|a| a.bytes().all(|c| c.is_ascii_digit()))
        .and_then(|a| a.parse::<usize>().ok())
        .ok_or_else(|| FitsError::Format(format!("bad axis keyword `{}`", card_keyword(card))))?;

    if axis != naxis.len() + 1 {
        return fitserr!("expected NAXIS{} but found NAXIS{}", naxis.len() + 1, axis);
    }

    let n = parse_fixed_int(card)?;

    if n < 0 {
        return fitserr!("NAXIS{} is negative ({})", axis, n);
    }

    naxis.push(n as usize);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdu::tests::{image_hdu_bytes, table_hdu_bytes};
    use std::io::Cursor;

    fn card(text: &str) -> Vec<u8> {
        format!("{text:<80}").into_bytes()
    }

    #[test]
    fn oversized_axes_are_rejected() {
        let mut rec = Vec::new();

        for text in [
            "SIMPLE  =                    T",
            "BITPIX  =                    8",
            "NAXIS   =                    3",
            "NAXIS1  =           4000000000",
            "NAXIS2  =           4000000000",
            "NAXIS3  =           4000000000",
            "END",
        ] {
            rec.extend(card(text));
        }

        rec.resize(RECORD_SIZE, b' ');

        match FitsParser::new(Cursor::new(rec)) {
            Err(FitsError::Format(msg)) => assert_eq!(msg, "HDU data size overflows"),
            other => panic!("expected a format error, got {:?}", other.map(|p| p.hdus().len())),
        }
    }

    #[test]
    fn data_unit_sizes() {
        assert_eq!(data_unit_size(2, 1, 0, Some(&[4, 3])).unwrap(), 24);
        assert_eq!(data_unit_size(4, 2, 3, None).unwrap(), 24);
        assert_eq!(data_unit_size(4, 2, 3, Some(&[])).unwrap(), 32);
        assert!(data_unit_size(8, 1, 0, Some(&[usize::MAX, 2])).is_err());
        assert!(data_unit_size(8, 1, usize::MAX, Some(&[1])).is_err());
        assert!(data_unit_size(8, usize::MAX, 0, Some(&[2])).is_err());
    }

    #[test]
    fn fixed_ints() {
        assert_eq!(parse_fixed_int(&card("BITPIX  =                  -32 / IEEE single")).unwrap(), -32);
        assert_eq!(parse_fixed_int(&card("NAXIS1  =                 2048")).unwrap(), 2048);
        assert_eq!(parse_fixed_int(&card("GCOUNT  =                   +1/")).unwrap(), 1);
        assert_eq!(parse_fixed_int(&card("PCOUNT  = 00000000000000000007")).unwrap(), 7);
        assert!(parse_fixed_int(&card("NAXIS   =                    ")).is_err());
        assert!(parse_fixed_int(&card("NAXIS   =                    -")).is_err());
        assert!(parse_fixed_int(&card("NAXIS   =                  2.0")).is_err());
        assert!(parse_fixed_int(&card("NAXIS   =                    22")).is_err());
    }

    #[test]
    fn fixed_strings() {
        assert_eq!(parse_fixed_string(&card("XTENSION= 'BINTABLE'           / binary table")).unwrap(), "BINTABLE");
        assert_eq!(parse_fixed_string(&card("XTENSION= 'IMAGE   '")).unwrap(), "IMAGE");
        assert_eq!(parse_fixed_string(&card("XTENSION= 'O''Neil'")).unwrap(), "O'Neil");
        assert_eq!(parse_fixed_string(&card("XTENSION= ''")).unwrap(), "");
        assert!(parse_fixed_string(&card("XTENSION= IMAGE")).is_err());
        assert!(parse_fixed_string(&card("XTENSION= 'IMAGE' junk")).is_err());
        assert!(parse_fixed_string(&card("XTENSION= 'IMAGE")).is_err());
    }

    #[test]
    fn naxis_cards() {
        let mut naxis = Vec::new();
        assert!(!accumulate_naxis_value(&card("NAXIS   =                    2"), &mut naxis).unwrap());
        assert!(!accumulate_naxis_value(&card("EXTNAME = 'SCI'"), &mut naxis).unwrap());
        assert!(accumulate_naxis_value(&card("NAXIS1  =                 2048"), &mut naxis).unwrap());
        assert!(accumulate_naxis_value(&card("NAXIS2  =                 4096"), &mut naxis).unwrap());
        assert_eq!(naxis, vec![2048, 4096]);
        assert!(accumulate_naxis_value(&card("NAXIS4  =                    1"), &mut naxis).is_err());
        assert!(accumulate_naxis_value(&card("NAXIS3  =                   -1"), &mut naxis).is_err());
        assert!(accumulate_naxis_value(&card("NAXIS3A =                    1"), &mut naxis).is_err());
    }

    #[test]
    fn parse_structure() {
        let mut bytes = image_hdu_bytes(true, &[4, 3], 16, &[]);
        bytes.extend(table_hdu_bytes("LDAC_OBJECTS", 12, 5));

        let mut parser = FitsParser::new(Cursor::new(bytes)).unwrap();
        assert_eq!(parser.hdus().len(), 2);

        let primary = &parser.hdus()[0];
        assert_eq!(primary.kind(), HduKind::PrimaryArray);
        assert_eq!(primary.bitpix(), Bitpix::I16);
        assert_eq!(primary.shape(), (1, 0, &[4usize, 3][..]));
        assert_eq!(primary.data_size(), 24);
        assert_eq!(primary.extname(), "");

        let table = &parser.hdus()[1];
        assert_eq!(table.kind(), HduKind::BinaryTableExtension);
        assert_eq!(table.extname(), "LDAC_OBJECTS");
        assert_eq!(table.data_size(), 60);
        assert_eq!(table.header_offset(), 2 * RECORD_SIZE as u64);

        let data = parser.read_data(1).unwrap();
        assert_eq!(data.len(), 60);
        assert!(parser.read_data(2).is_err());
        assert_eq!(parser.special_record_size(), 0);
    }

    #[test]
    fn reject_bad_streams() {
        assert!(FitsParser::new(Cursor::new(Vec::<u8>::new())).is_err());
        assert!(FitsParser::new(Cursor::new(vec![b' '; 100])).is_err());
        assert!(FitsParser::new(Cursor::new(vec![b' '; RECORD_SIZE])).is_err());

        // Data unit cut off.
        let mut bytes = image_hdu_bytes(true, &[100, 100], 32, &[]);
        bytes.truncate(2 * RECORD_SIZE);
        assert!(FitsParser::new(Cursor::new(bytes)).is_err());
    }

    #[test]
    fn trailing_special_records() {
        let mut bytes = image_hdu_bytes(true, &[], 8, &[]);
        bytes.extend(vec![0u8; RECORD_SIZE]);

        let parser = FitsParser::new(Cursor::new(bytes)).unwrap();
        assert_eq!(parser.hdus().len(), 1);
        assert_eq!(parser.hdus()[0].kind(), HduKind::PrimaryNoData);
        assert_eq!(parser.special_record_size(), RECORD_SIZE as u64);
    }
}
