// Copyright 2026 Peter Williams and collaborators
// Licensed under the MIT License.

/*!
Special metadata derived from FITS headers.

The pipeline's file tracking needs a few values that aren't stored directly
in DECam headers but are easily derived from them: the filter band, the
observing night, the survey field, and so on. Each [`SpecialKey`] names one
of these, and [`compute`] works out its value for an open file.

*/

use fitsutils_fits::{FitsError, FitsFile, Header, HduSelector, HeaderValue};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub mod rules;

/// An error deriving a metadata value.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The file couldn't be read, or lacks a needed keyword or HDU.
    #[error(transparent)]
    Fits(#[from] FitsError),

    /// A keyword value couldn't be interpreted.
    #[error("cannot interpret value {value:?} of header keyword `{keyword}`")]
    BadValue {
        /// The keyword.
        keyword: &'static str,

        /// Its value, as text.
        value: String,
    },

    /// The FILTER keyword names a band we don't know.
    #[error("invalid band `{0}`")]
    InvalidBand(String),

    /// The OBJECT keyword doesn't have the usual ` hex FIELD` form.
    #[error("cannot parse field from OBJECT value {0:?}")]
    UnparseableField(String),

    /// Someone asked for metadata we don't know how to make.
    #[error("unknown special metadata key `{0}`")]
    UnknownKey(String),
}

/// A derived metadata value.
#[derive(Clone, Debug, PartialEq)]
pub enum MetadataValue {
    /// A text value.
    Text(String),

    /// A count.
    Integer(i64),

    /// An angle in degrees.
    Degrees(f64),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MetadataValue::Text(s) => write!(f, "{s}"),
            MetadataValue::Integer(n) => write!(f, "{n}"),
            MetadataValue::Degrees(d) => write!(f, "{d}"),
        }
    }
}

/// The special metadata values that can be derived.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SpecialKey {
    /// Filter band, from `FILTER`.
    Band,

    /// Camera symbol, from `INSTRUME`.
    Camsym,

    /// Observing night, from `DATE-OBS`.
    Nite,

    /// Number of catalog objects, from `NAXIS2`.
    Objects,

    /// Survey field, from `OBJECT`.
    Field,

    /// Right ascension in degrees, from `RA`.
    Radeg,

    /// Telescope right ascension in degrees, from `TELRA`. Pointing belongs
    /// to the exposure, so this is always read from the primary header.
    Tradeg,

    /// Declination in degrees, from `DEC`.
    Decdeg,

    /// Telescope declination in degrees, from `TELDEC`, always read from
    /// the primary header.
    Tdecdeg,
}

impl SpecialKey {
    /// Every key, in a stable order.
    pub const ALL: [SpecialKey; 9] = [
        SpecialKey::Band,
        SpecialKey::Camsym,
        SpecialKey::Nite,
        SpecialKey::Objects,
        SpecialKey::Field,
        SpecialKey::Radeg,
        SpecialKey::Tradeg,
        SpecialKey::Decdeg,
        SpecialKey::Tdecdeg,
    ];

    /// The lowercase name of this key.
    pub fn name(&self) -> &'static str {
        match self {
            SpecialKey::Band => "band",
            SpecialKey::Camsym => "camsym",
            SpecialKey::Nite => "nite",
            SpecialKey::Objects => "objects",
            SpecialKey::Field => "field",
            SpecialKey::Radeg => "radeg",
            SpecialKey::Tradeg => "tradeg",
            SpecialKey::Decdeg => "decdeg",
            SpecialKey::Tdecdeg => "tdecdeg",
        }
    }

    /// The header keyword this value is derived from.
    pub fn keyword(&self) -> &'static str {
        match self {
            SpecialKey::Band => "FILTER",
            SpecialKey::Camsym => "INSTRUME",
            SpecialKey::Nite => "DATE-OBS",
            SpecialKey::Objects => "NAXIS2",
            SpecialKey::Field => "OBJECT",
            SpecialKey::Radeg => "RA",
            SpecialKey::Tradeg => "TELRA",
            SpecialKey::Decdeg => "DEC",
            SpecialKey::Tdecdeg => "TELDEC",
        }
    }
}

impl FromStr for SpecialKey {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, MetadataError> {
        let lower = s.trim().to_lowercase();

        SpecialKey::ALL
            .iter()
            .find(|k| k.name() == lower)
            .copied()
            .ok_or_else(|| MetadataError::UnknownKey(s.to_owned()))
    }
}

impl fmt::Display for SpecialKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn value_of<'a>(header: &'a Header, keyword: &str) -> Result<&'a HeaderValue, MetadataError> {
    header
        .get(keyword)
        .ok_or_else(|| FitsError::MissingKeyword(keyword.to_owned()).into())
}

fn text_of<'a>(header: &'a Header, keyword: &'static str) -> Result<&'a str, MetadataError> {
    let value = value_of(header, keyword)?;

    value.as_str().ok_or_else(|| MetadataError::BadValue {
        keyword,
        value: value.to_string(),
    })
}

/// Get the header in which a field name should be looked for.
///
/// When the selected HDU has no OBJECT keyword, or doesn't exist, the
/// image header embedded in an LDAC catalog is tried instead.
fn field_header(file: &mut FitsFile, selector: Option<&HduSelector>) -> Result<Header, MetadataError> {
    match file.header(selector) {
        Ok(h) if h.get("OBJECT").is_some() => return Ok(h),
        Ok(_) | Err(FitsError::NoSuchHdu(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let imhead = HduSelector::Name(fitsutils_fits::ldac::LDAC_IMHEAD.to_owned());
    Ok(file.header(Some(&imhead))?)
}

/// Derive a metadata value from a file; `None` selects the primary HDU.
///
/// `tradeg` and `tdecdeg` ignore the selector and use the primary HDU.
pub fn compute(
    key: SpecialKey,
    file: &mut FitsFile,
    selector: Option<&HduSelector>,
) -> Result<MetadataValue, MetadataError> {
    let header = match key {
        SpecialKey::Field => field_header(file, selector)?,
        SpecialKey::Tradeg | SpecialKey::Tdecdeg => file.header(None)?,
        _ => file.header(selector)?,
    };

    let kw = key.keyword();

    Ok(match key {
        SpecialKey::Band => MetadataValue::Text(rules::band_from_filter(text_of(&header, kw)?)?),
        SpecialKey::Camsym => MetadataValue::Text(rules::camsym_from_instrume(text_of(&header, kw)?)?),
        SpecialKey::Nite => MetadataValue::Text(rules::nite_from_date_obs(text_of(&header, kw)?)?),
        SpecialKey::Field => MetadataValue::Text(rules::field_from_object(text_of(&header, kw)?)?),

        SpecialKey::Objects => {
            let value = value_of(&header, kw)?;

            match value.as_int() {
                Some(n) => MetadataValue::Integer(n),
                None => {
                    return Err(MetadataError::BadValue {
                        keyword: kw,
                        value: value.to_string(),
                    })
                }
            }
        }

        SpecialKey::Radeg | SpecialKey::Tradeg => {
            MetadataValue::Degrees(rules::ra_to_degrees(value_of(&header, kw)?, kw)?)
        }

        SpecialKey::Decdeg | SpecialKey::Tdecdeg => {
            MetadataValue::Degrees(rules::dec_to_degrees(value_of(&header, kw)?, kw)?)
        }
    })
}

/// Like [`compute`], opening the file by name.
///
/// A missing file is reported as an I/O error of kind `NotFound`.
pub fn compute_path<P: AsRef<Path>>(
    key: SpecialKey,
    path: P,
    selector: Option<&HduSelector>,
) -> Result<MetadataValue, MetadataError> {
    let mut file = FitsFile::open(path)?;
    compute(key, &mut file, selector)
}

macro_rules! text_accessor {
    ($name:ident, $key:expr, $doc:expr) => {
        #[doc = $doc]
        pub fn $name<P: AsRef<Path>>(path: P, selector: Option<&HduSelector>) -> Result<String, MetadataError> {
            match compute_path($key, path, selector)? {
                MetadataValue::Text(s) => Ok(s),
                other => Ok(other.to_string()),
            }
        }
    };
}

macro_rules! degrees_accessor {
    ($name:ident, $key:expr, $doc:expr) => {
        #[doc = $doc]
        pub fn $name<P: AsRef<Path>>(path: P, selector: Option<&HduSelector>) -> Result<f64, MetadataError> {
            match compute_path($key, path, selector)? {
                MetadataValue::Degrees(d) => Ok(d),
                other => Err(MetadataError::BadValue {
                    keyword: $key.keyword(),
                    value: other.to_string(),
                }),
            }
        }
    };
}

text_accessor!(band, SpecialKey::Band, "The filter band of a file.");
text_accessor!(camsym, SpecialKey::Camsym, "The camera symbol of a file.");
text_accessor!(nite, SpecialKey::Nite, "The observing night of a file, as `YYYYMMDD`.");
text_accessor!(field, SpecialKey::Field, "The survey field of a file.");
degrees_accessor!(radeg, SpecialKey::Radeg, "The RA of a file in degrees.");
degrees_accessor!(
    tradeg,
    SpecialKey::Tradeg,
    "The telescope RA of a file in degrees, from the primary header whatever the selector."
);
degrees_accessor!(decdeg, SpecialKey::Decdeg, "The declination of a file in degrees.");
degrees_accessor!(
    tdecdeg,
    SpecialKey::Tdecdeg,
    "The telescope declination of a file in degrees, from the primary header whatever the selector."
);

/// The number of objects in a catalog HDU.
pub fn objects<P: AsRef<Path>>(path: P, selector: Option<&HduSelector>) -> Result<i64, MetadataError> {
    match compute_path(SpecialKey::Objects, path, selector)? {
        MetadataValue::Integer(n) => Ok(n),
        other => Err(MetadataError::BadValue {
            keyword: "NAXIS2",
            value: other.to_string(),
        }),
    }
}
