// Copyright 2026 Peter Williams and collaborators
// Licensed under the MIT License.

//! Whole HDUs, and reading and writing lists of them.
//!
//! An [`Hdu`] is a header plus the raw bytes of its data unit. The data are
//! never interpreted, only copied, so files can be taken apart and
//! reassembled without loss.

use fitsutils_core::io::AligningWriter;
use std::fmt;
use std::fs;
use std::io::{prelude::*, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::header::{Card, Header, HeaderValue};
use crate::ldac::{self, LDAC_IMHEAD};
use crate::{FitsError, FitsParser, ParsedHdu, CARD_SIZE, END_MARKER, RECORD_SIZE};

/// Which HDU of a file to look at.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HduSelector {
    /// The HDU at this zero-based position; 0 is the primary HDU.
    Index(usize),

    /// The HDU with this EXTNAME, compared case-insensitively. The name
    /// `PRIMARY` selects the primary HDU if no extension claims it, and the
    /// name `LDAC_IMHEAD` selects the image header embedded in an LDAC
    /// catalog.
    Name(String),
}

impl FromStr for HduSelector {
    type Err = FitsError;

    fn from_str(s: &str) -> Result<Self, FitsError> {
        let s = s.trim();

        if s.is_empty() {
            return fitserr!("empty HDU selector");
        }

        Ok(match s.parse::<usize>() {
            Ok(n) => HduSelector::Index(n),
            Err(_) => HduSelector::Name(s.to_uppercase()),
        })
    }
}

impl fmt::Display for HduSelector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HduSelector::Index(n) => write!(f, "{n}"),
            HduSelector::Name(s) => write!(f, "{s}"),
        }
    }
}

/// A header/data unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Hdu {
    header: Header,
    data: Vec<u8>,
}

impl Hdu {
    /// Create an HDU from its parts.
    ///
    /// The data length is checked against the header when the HDU is
    /// written.
    pub fn new(header: Header, data: Vec<u8>) -> Self {
        Hdu { header, data }
    }

    /// A primary HDU with no data.
    pub fn empty_primary() -> Result<Self, FitsError> {
        let mut header = Header::new();
        header.push(simple_card()?);
        header.push(Card::new("BITPIX", HeaderValue::Integer(8), Some("array data type"))?);
        header.push(Card::new("NAXIS", HeaderValue::Integer(0), Some("number of array dimensions"))?);
        Ok(Hdu::new(header, Vec::new()))
    }

    /// The header of this HDU.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Mutable access to the header of this HDU.
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// The data unit, without padding.
    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    /// Whether this HDU starts with `SIMPLE`, i.e. is laid out as a primary
    /// HDU.
    pub fn is_primary(&self) -> bool {
        self.header.cards().first().map(|c| c.keyword()) == Some("SIMPLE")
    }

    /// The extension type, if this is an extension HDU.
    pub fn xtension(&self) -> Option<&str> {
        match self.header.cards().first() {
            Some(c) if c.keyword() == "XTENSION" => c.value().and_then(|v| v.as_str()),
            _ => None,
        }
    }

    /// The value of the EXTNAME keyword, if present.
    pub fn extname(&self) -> Option<&str> {
        self.header.get("EXTNAME").and_then(|v| v.as_str())
    }

    /// Compute the size of the data unit that the header calls for.
    pub fn expected_data_size(&self) -> Result<usize, FitsError> {
        let bitpix = crate::Bitpix::from_value(self.int_keyword("BITPIX")?)?;
        let n_axes = self.int_keyword("NAXIS")?;

        if !(0..=999).contains(&n_axes) {
            return fitserr!("unsupported NAXIS value in FITS header: {}", n_axes);
        }

        let mut axes = Vec::with_capacity(n_axes as usize);

        for i in 1..=n_axes {
            let n = self.int_keyword(&format!("NAXIS{i}"))?;

            if n < 0 {
                return fitserr!("illegal negative NAXIS{} value {}", i, n);
            }

            axes.push(n as usize);
        }

        let groups = self.is_primary() && self.header.get("GROUPS") == Some(&HeaderValue::Logical(true));
        let has_counts = !self.is_primary() || groups;

        let pcount = if has_counts { self.opt_int_keyword("PCOUNT", 0) } else { 0 };
        let gcount = if has_counts { self.opt_int_keyword("GCOUNT", 1) } else { 1 };

        if pcount < 0 || gcount < 0 {
            return fitserr!("illegal negative PCOUNT or GCOUNT value");
        }

        let size_axes = match (axes.is_empty(), groups) {
            (true, _) => None,
            (false, true) => Some(&axes[1..]),
            (false, false) => Some(&axes[..]),
        };

        crate::data_unit_size(bitpix.n_bytes(), gcount as usize, pcount as usize, size_axes)
    }

    fn int_keyword(&self, keyword: &str) -> Result<i64, FitsError> {
        match self.header.get(keyword) {
            Some(v) => match v.as_int() {
                Some(n) => Ok(n),
                None => fitserr!("FITS keyword {} should be an integer but is {:?}", keyword, v),
            },
            None => Err(FitsError::MissingKeyword(keyword.to_owned())),
        }
    }

    fn opt_int_keyword(&self, keyword: &str, default: i64) -> i64 {
        self.header
            .get(keyword)
            .and_then(|v| v.as_int())
            .unwrap_or(default)
    }

    /// Convert a primary HDU into an IMAGE extension.
    ///
    /// Random-groups primaries have no extension equivalent and are rejected.
    pub fn into_extension(mut self) -> Result<Hdu, FitsError> {
        if !self.is_primary() {
            return Ok(self);
        }

        if self.header.get("GROUPS") == Some(&HeaderValue::Logical(true)) {
            return fitserr!("a random-groups primary HDU cannot become an extension");
        }

        self.header.replace(
            0,
            Card::new("XTENSION", HeaderValue::String("IMAGE".to_owned()), Some("Image extension"))?,
        );
        self.header.remove("EXTEND");
        self.header.remove("PCOUNT");
        self.header.remove("GCOUNT");

        let pos = self.header.last_naxis_position().map(|i| i + 1).unwrap_or(self.header.len());
        self.header.insert(pos, Card::new("GCOUNT", HeaderValue::Integer(1), Some("number of groups"))?);
        self.header.insert(pos, Card::new("PCOUNT", HeaderValue::Integer(0), Some("number of parameters"))?);
        Ok(self)
    }

    /// Convert an IMAGE extension into a primary HDU.
    pub fn into_primary(mut self) -> Result<Hdu, FitsError> {
        if self.is_primary() {
            return Ok(self);
        }

        if self.xtension() != Some("IMAGE") {
            return fitserr!(
                "a {} extension cannot become a primary HDU",
                self.xtension().unwrap_or("malformed")
            );
        }

        if self.opt_int_keyword("PCOUNT", 0) != 0 || self.opt_int_keyword("GCOUNT", 1) != 1 {
            return fitserr!("an image extension with parameters cannot become a primary HDU");
        }

        self.header.replace(0, simple_card()?);
        self.header.remove("PCOUNT");
        self.header.remove("GCOUNT");
        Ok(self)
    }

    /// Make sure that a primary HDU announces that extensions may follow.
    fn ensure_extend(&mut self) -> Result<(), FitsError> {
        if self.header.get("EXTEND") == Some(&HeaderValue::Logical(true)) {
            return Ok(());
        }

        self.header.remove("EXTEND");
        let pos = self.header.last_naxis_position().map(|i| i + 1).unwrap_or(self.header.len());
        self.header.insert(
            pos,
            Card::new("EXTEND", HeaderValue::Logical(true), Some("FITS dataset may contain extensions"))?,
        );
        Ok(())
    }
}

fn simple_card() -> Result<Card, FitsError> {
    Card::new("SIMPLE", HeaderValue::Logical(true), Some("conforms to FITS standard"))
}

/// An open FITS file whose structure has been parsed.
#[derive(Debug)]
pub struct FitsFile {
    path: PathBuf,
    parser: FitsParser<BufReader<fs::File>>,
}

impl FitsFile {
    /// Open and parse a FITS file.
    ///
    /// A missing file yields an `Io` error with kind `NotFound`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FitsError> {
        let path = path.as_ref().to_owned();
        let file = fs::File::open(&path)?;
        let parser = FitsParser::new(BufReader::new(file))?;
        Ok(FitsFile { path, parser })
    }

    /// The path this file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The HDUs of the file.
    pub fn hdus(&self) -> &[ParsedHdu] {
        self.parser.hdus()
    }

    /// Find the index of a selected HDU.
    ///
    /// Names match extensions first; the primary HDU matches by its own
    /// EXTNAME or by the name `PRIMARY`.
    pub fn find(&self, selector: &HduSelector) -> Result<usize, FitsError> {
        let hdus = self.parser.hdus();

        match selector {
            HduSelector::Index(n) => {
                if *n < hdus.len() {
                    Ok(*n)
                } else {
                    Err(FitsError::NoSuchHdu(selector.to_string()))
                }
            }

            HduSelector::Name(name) => {
                let hit = hdus
                    .iter()
                    .enumerate()
                    .skip(1)
                    .find(|(_, h)| h.extname().eq_ignore_ascii_case(name))
                    .map(|(i, _)| i);

                if let Some(i) = hit {
                    return Ok(i);
                }

                let primary_name = hdus[0].extname();

                if primary_name.eq_ignore_ascii_case(name)
                    || (primary_name.is_empty() && name.eq_ignore_ascii_case("PRIMARY"))
                {
                    return Ok(0);
                }

                Err(FitsError::NoSuchHdu(selector.to_string()))
            }
        }
    }

    /// Get the header of a selected HDU; `None` means the primary HDU.
    ///
    /// Selecting `LDAC_IMHEAD` by name returns the image header stored in
    /// that table, not the table's own header.
    pub fn header(&mut self, selector: Option<&HduSelector>) -> Result<Header, FitsError> {
        let selector = match selector {
            None => return Ok(self.parser.hdus()[0].header().clone()),
            Some(s) => s,
        };

        let index = self.find(selector)?;

        match selector {
            HduSelector::Name(name) if name.eq_ignore_ascii_case(LDAC_IMHEAD) => {
                let hdu = self.read_hdu(index)?;
                ldac::imhead_header(&hdu)
            }
            _ => Ok(self.parser.hdus()[index].header().clone()),
        }
    }

    /// Read one HDU, including its data.
    pub fn read_hdu(&mut self, index: usize) -> Result<Hdu, FitsError> {
        let data = self.parser.read_data(index)?;
        let header = self.parser.hdus()[index].header().clone();
        Ok(Hdu::new(header, data))
    }

    /// Read all of the HDUs.
    pub fn read_all(&mut self) -> Result<Vec<Hdu>, FitsError> {
        (0..self.parser.hdus().len())
            .map(|i| self.read_hdu(i))
            .collect()
    }
}

/// Read the header of one HDU of a file; `None` means the primary HDU.
pub fn read_header<P: AsRef<Path>>(path: P, selector: Option<&HduSelector>) -> Result<Header, FitsError> {
    FitsFile::open(path)?.header(selector)
}

/// Read every HDU of a file.
pub fn read_hdu_list<P: AsRef<Path>>(path: P) -> Result<Vec<Hdu>, FitsError> {
    FitsFile::open(path)?.read_all()
}

/// Fix up a list of HDUs so that it forms a valid file.
///
/// The first HDU must be a primary: an image extension is converted, and
/// anything else gets an empty primary placed in front of it. Later primary
/// HDUs are converted to image extensions. If there is more than one HDU the
/// primary gets `EXTEND = T`.
pub fn prepare_hdu_list(hdus: &[Hdu]) -> Result<Vec<Hdu>, FitsError> {
    if hdus.is_empty() {
        return fitserr!("cannot write a FITS file with no HDUs");
    }

    let mut out = Vec::with_capacity(hdus.len() + 1);

    for (i, hdu) in hdus.iter().enumerate() {
        let hdu = hdu.clone();

        if i == 0 {
            if hdu.is_primary() {
                out.push(hdu);
            } else if hdu.xtension() == Some("IMAGE") {
                out.push(hdu.into_primary()?);
            } else {
                out.push(Hdu::empty_primary()?);
                out.push(hdu);
            }
        } else {
            out.push(hdu.into_extension()?);
        }
    }

    if out.len() > 1 {
        out[0].ensure_extend()?;
    }

    Ok(out)
}

/// Write one HDU, padding its header and data out to whole records.
fn write_hdu<W: Write>(dest: &mut AligningWriter<W>, hdu: &Hdu) -> Result<(), FitsError> {
    let expected = hdu.expected_data_size()?;

    if expected != hdu.data.len() {
        return fitserr!(
            "HDU data are {} bytes long but the header calls for {}",
            hdu.data.len(),
            expected
        );
    }

    for card in hdu.header.cards() {
        dest.write_all(card.record())?;
    }

    dest.write_all(&END_MARKER[..CARD_SIZE])?;
    dest.pad_to(RECORD_SIZE, b' ')?;

    if !hdu.data.is_empty() {
        let fill = if hdu.xtension() == Some("TABLE") { b' ' } else { 0 };
        dest.write_all(&hdu.data)?;
        dest.pad_to(RECORD_SIZE, fill)?;
    }

    Ok(())
}

/// Write a list of HDUs to a stream, returning the stream.
///
/// See [`prepare_hdu_list`] for the adjustments made along the way.
pub fn write_hdus<W: Write>(dest: W, hdus: &[Hdu]) -> Result<W, FitsError> {
    let prepared = prepare_hdu_list(hdus)?;
    let mut dest = AligningWriter::new(dest);

    for hdu in &prepared {
        write_hdu(&mut dest, hdu)?;
    }

    dest.flush()?;
    Ok(dest.into_inner())
}

/// Write a list of HDUs to a new file.
///
/// An existing file is an error unless `clobber` is true, in which case it
/// is replaced.
pub fn write_hdu_list<P: AsRef<Path>>(path: P, hdus: &[Hdu], clobber: bool) -> Result<(), FitsError> {
    let path = path.as_ref();

    if !clobber && path.exists() {
        return Err(FitsError::OutputExists(path.display().to_string()));
    }

    let file = fs::File::create(path)?;
    write_hdus(BufWriter::new(file), hdus)?
        .into_inner()
        .map_err(|e| e.into_error())?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    fn card(keyword: &str, value: HeaderValue) -> Card {
        Card::new(keyword, value, None).unwrap()
    }

    pub(crate) fn image_hdu(primary: bool, naxes: &[usize], bitpix: i64, extra: &[(&str, HeaderValue)]) -> Hdu {
        let mut h = Header::new();

        if primary {
            h.push(simple_card().unwrap());
        } else {
            h.push(card("XTENSION", HeaderValue::String("IMAGE".to_owned())));
        }

        h.push(card("BITPIX", HeaderValue::Integer(bitpix)));
        h.push(card("NAXIS", HeaderValue::Integer(naxes.len() as i64)));

        for (i, n) in naxes.iter().enumerate() {
            h.push(card(&format!("NAXIS{}", i + 1), HeaderValue::Integer(*n as i64)));
        }

        if !primary {
            h.push(card("PCOUNT", HeaderValue::Integer(0)));
            h.push(card("GCOUNT", HeaderValue::Integer(1)));
        }

        for (k, v) in extra {
            h.push(card(k, v.clone()));
        }

        let n = if naxes.is_empty() {
            0
        } else {
            naxes.iter().product::<usize>() * (bitpix.unsigned_abs() as usize / 8)
        };

        Hdu::new(h, (0..n).map(|i| (i % 251) as u8).collect())
    }

    pub(crate) fn table_hdu(name: &str, width: usize, rows: usize, data: Option<Vec<u8>>) -> Hdu {
        let mut h = Header::new();
        h.push(card("XTENSION", HeaderValue::String("BINTABLE".to_owned())));
        h.push(card("BITPIX", HeaderValue::Integer(8)));
        h.push(card("NAXIS", HeaderValue::Integer(2)));
        h.push(card("NAXIS1", HeaderValue::Integer(width as i64)));
        h.push(card("NAXIS2", HeaderValue::Integer(rows as i64)));
        h.push(card("PCOUNT", HeaderValue::Integer(0)));
        h.push(card("GCOUNT", HeaderValue::Integer(1)));
        h.push(card("TFIELDS", HeaderValue::Integer(1)));
        h.push(card("TFORM1", HeaderValue::String(format!("{width}A"))));
        h.push(card("EXTNAME", HeaderValue::String(name.to_owned())));
        let data = data.unwrap_or_else(|| vec![b'x'; width * rows]);
        Hdu::new(h, data)
    }

    fn serialize(hdu: &Hdu) -> Vec<u8> {
        let mut w = AligningWriter::new(Vec::new());
        write_hdu(&mut w, hdu).unwrap();
        w.into_inner()
    }

    pub(crate) fn image_hdu_bytes(primary: bool, naxes: &[usize], bitpix: i64, extra: &[(&str, HeaderValue)]) -> Vec<u8> {
        serialize(&image_hdu(primary, naxes, bitpix, extra))
    }

    pub(crate) fn table_hdu_bytes(name: &str, width: usize, rows: usize) -> Vec<u8> {
        serialize(&table_hdu(name, width, rows, None))
    }

    #[test]
    fn selectors() {
        assert_eq!("2".parse::<HduSelector>().unwrap(), HduSelector::Index(2));
        assert_eq!(
            " ldac_imhead ".parse::<HduSelector>().unwrap(),
            HduSelector::Name("LDAC_IMHEAD".to_owned())
        );
        assert!("".parse::<HduSelector>().is_err());
        assert_eq!(HduSelector::Name("SCI".to_owned()).to_string(), "SCI");
    }

    #[test]
    fn data_sizes() {
        assert_eq!(image_hdu(true, &[10, 20], -32, &[]).expected_data_size().unwrap(), 800);
        assert_eq!(image_hdu(true, &[], 16, &[]).expected_data_size().unwrap(), 0);
        assert_eq!(table_hdu("T", 7, 3, None).expected_data_size().unwrap(), 21);

        let mut h = Hdu::empty_primary().unwrap();
        h.header_mut().remove("NAXIS");
        assert!(matches!(h.expected_data_size(), Err(FitsError::MissingKeyword(_))));
    }

    #[test]
    fn write_and_read_back() {
        let hdus = vec![
            image_hdu(true, &[3, 2], 16, &[("OBJECT", HeaderValue::String("first".to_owned()))]),
            table_hdu("LDAC_OBJECTS", 5, 4, None),
        ];

        let bytes = write_hdus(Vec::new(), &hdus).unwrap();
        assert_eq!(bytes.len() % RECORD_SIZE, 0);
        assert_eq!(bytes.len(), 4 * RECORD_SIZE);

        let mut parser = FitsParser::new(Cursor::new(bytes)).unwrap();
        assert_eq!(parser.hdus().len(), 2);
        let h0 = parser.hdus()[0].header().clone();
        assert_eq!(h0.get("EXTEND"), Some(&HeaderValue::Logical(true)));
        assert_eq!(h0.position("EXTEND"), Some(5));
        assert_eq!(h0.get("OBJECT").and_then(|v| v.as_str()), Some("first"));
        assert_eq!(parser.read_data(0).unwrap(), hdus[0].data());
        assert_eq!(parser.read_data(1).unwrap(), hdus[1].data());
    }

    #[test]
    fn later_primaries_become_extensions() {
        let hdus = vec![
            image_hdu(true, &[4], 8, &[]),
            image_hdu(true, &[2, 2], -64, &[("EXTEND", HeaderValue::Logical(true))]),
        ];

        let prepared = prepare_hdu_list(&hdus).unwrap();
        assert!(prepared[0].is_primary());
        assert_eq!(prepared[1].xtension(), Some("IMAGE"));
        assert_eq!(prepared[1].header().get("EXTEND"), None);
        assert_eq!(prepared[1].header().position("PCOUNT"), Some(5));
        assert_eq!(prepared[1].header().position("GCOUNT"), Some(6));
        assert_eq!(prepared[1].expected_data_size().unwrap(), 32);

        let bytes = write_hdus(Vec::new(), &hdus).unwrap();
        let parser = FitsParser::new(Cursor::new(bytes)).unwrap();
        assert_eq!(parser.hdus()[1].kind(), crate::HduKind::ImageExtension);
    }

    #[test]
    fn first_extension_handling() {
        let prepared = prepare_hdu_list(&[image_hdu(false, &[2], 8, &[])]).unwrap();
        assert_eq!(prepared.len(), 1);
        assert!(prepared[0].is_primary());
        assert_eq!(prepared[0].header().get("PCOUNT"), None);

        let prepared = prepare_hdu_list(&[table_hdu("T", 2, 2, None)]).unwrap();
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].expected_data_size().unwrap(), 0);
        assert_eq!(prepared[1].xtension(), Some("BINTABLE"));

        assert!(prepare_hdu_list(&[]).is_err());
    }

    #[test]
    fn data_length_is_checked() {
        let mut hdu = image_hdu(true, &[4], 8, &[]);
        hdu.data.pop();
        assert!(write_hdus(Vec::new(), &[hdu]).is_err());
    }

    #[test]
    fn files_and_clobbering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fits");
        let hdus = vec![
            image_hdu(true, &[], 8, &[]),
            image_hdu(false, &[8, 8], 32, &[("EXTNAME", HeaderValue::String("SCI".to_owned()))]),
        ];

        write_hdu_list(&path, &hdus, false).unwrap();
        assert!(matches!(
            write_hdu_list(&path, &hdus, false),
            Err(FitsError::OutputExists(_))
        ));
        write_hdu_list(&path, &hdus, true).unwrap();

        let back = read_hdu_list(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[1].extname(), Some("SCI"));
        assert_eq!(back[1].data(), hdus[1].data());

        let mut f = FitsFile::open(&path).unwrap();
        assert_eq!(f.find(&"sci".parse().unwrap()).unwrap(), 1);
        assert_eq!(f.find(&"PRIMARY".parse().unwrap()).unwrap(), 0);
        assert!(matches!(f.find(&"WGT".parse().unwrap()), Err(FitsError::NoSuchHdu(_))));
        assert!(f.find(&HduSelector::Index(2)).is_err());

        let h = f.header(Some(&HduSelector::Index(1))).unwrap();
        assert_eq!(h.get("NAXIS1"), Some(&HeaderValue::Integer(8)));
        let h = read_header(&path, None).unwrap();
        assert_eq!(h.get("EXTEND"), Some(&HeaderValue::Logical(true)));

        let missing = FitsFile::open(dir.path().join("nope.fits")).unwrap_err();
        assert!(matches!(missing, FitsError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }
}
