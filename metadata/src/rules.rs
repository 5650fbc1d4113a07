// Copyright 2026 Peter Williams and collaborators
// Licensed under the MIT License.

//! The rules that turn raw header values into pipeline metadata.

use chrono::{Days, NaiveDate};
use fitsutils_fits::HeaderValue;

use crate::MetadataError;

/// The filter bands that the pipeline knows about.
pub const VALID_BANDS: &[&str] = &["u", "g", "r", "i", "z", "Y", "VR", "N964"];

/// Observations that start before this hour (UTC) belong to the previous
/// night.
pub const NITE_ROLLOVER_HOUR: u32 = 14;

/// The band is the first word of the FILTER value.
pub fn band_from_filter(filter: &str) -> Result<String, MetadataError> {
    let band = filter.split(' ').next().unwrap_or("");

    if VALID_BANDS.contains(&band) {
        Ok(band.to_owned())
    } else {
        Err(MetadataError::InvalidBand(band.to_owned()))
    }
}

/// The camera symbol is the first character of INSTRUME.
pub fn camsym_from_instrume(instrume: &str) -> Result<String, MetadataError> {
    match instrume.chars().next() {
        Some(c) => Ok(c.to_string()),
        None => Err(MetadataError::BadValue {
            keyword: "INSTRUME",
            value: instrume.to_owned(),
        }),
    }
}

/// Compute the observing night, `YYYYMMDD`, from a DATE-OBS value.
///
/// Only the date and hour are used.
pub fn nite_from_date_obs(date_obs: &str) -> Result<String, MetadataError> {
    let bad = || MetadataError::BadValue {
        keyword: "DATE-OBS",
        value: date_obs.to_owned(),
    };

    let (date, time) = date_obs.trim().split_once('T').ok_or_else(bad)?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| bad())?;

    let hour = time
        .split(':')
        .next()
        .and_then(|h| h.parse::<u32>().ok())
        .filter(|h| *h < 24)
        .ok_or_else(bad)?;

    let nite = if hour < NITE_ROLLOVER_HOUR {
        date.checked_sub_days(Days::new(1)).ok_or_else(bad)?
    } else {
        date
    };

    Ok(nite.format("%Y%m%d").to_string())
}

/// Pull the field name out of an OBJECT value such as
/// `DES supernova hex SN-X3 tiling 2`.
///
/// The field is the word after ` hex `, without any `SN-` prefix.
pub fn field_from_object(object: &str) -> Result<String, MetadataError> {
    let unparseable = || MetadataError::UnparseableField(object.to_owned());

    let (_, rest) = object.split_once(" hex ").ok_or_else(unparseable)?;
    let token = rest.split_whitespace().next().ok_or_else(unparseable)?;
    let field = token.strip_prefix("SN-").unwrap_or(token);

    if field.is_empty() {
        return Err(unparseable());
    }

    Ok(field.to_owned())
}

fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

/// Parse `a:b:c` into its magnitude `|a| + b/60 + c/3600` and whether it
/// was negative.
fn parse_sexagesimal(text: &str, keyword: &'static str) -> Result<(f64, bool), MetadataError> {
    let bad = || MetadataError::BadValue {
        keyword,
        value: text.to_owned(),
    };

    let text = text.trim();
    let negative = text.starts_with('-');
    let mut total = 0.;
    let mut scale = 1.;
    let mut n = 0;

    for piece in text.split(':') {
        n += 1;

        if n > 3 {
            return Err(bad());
        }

        let v = piece.trim().parse::<f64>().map_err(|_| bad())?;
        total += v.abs() / scale;
        scale *= 60.;
    }

    Ok((total, negative))
}

/// Convert an RA value to degrees, rounded to six decimal places.
///
/// Strings are sexagesimal hours; plain numbers are taken to be degrees
/// already.
pub fn ra_to_degrees(value: &HeaderValue, keyword: &'static str) -> Result<f64, MetadataError> {
    if let Some(x) = value.as_float() {
        return Ok(round6(x));
    }

    match value.as_str() {
        Some(s) => {
            let (hours, negative) = parse_sexagesimal(s, keyword)?;

            if negative {
                return Err(MetadataError::BadValue {
                    keyword,
                    value: s.to_owned(),
                });
            }

            Ok(round6(hours * 15.))
        }

        None => Err(MetadataError::BadValue {
            keyword,
            value: value.to_string(),
        }),
    }
}

/// Convert a declination value to degrees, rounded to six decimal places.
///
/// Strings are sexagesimal degrees whose sign comes from a leading `-`, so
/// that `-00:30:00` comes out negative.
pub fn dec_to_degrees(value: &HeaderValue, keyword: &'static str) -> Result<f64, MetadataError> {
    if let Some(x) = value.as_float() {
        return Ok(round6(x));
    }

    match value.as_str() {
        Some(s) => {
            let (degrees, negative) = parse_sexagesimal(s, keyword)?;
            let sign = if negative { -1. } else { 1. };
            Ok(round6(sign * degrees))
        }

        None => Err(MetadataError::BadValue {
            keyword,
            value: value.to_string(),
        }),
    }
}
