// Copyright 2026 Peter Williams and collaborators
// Licensed under the MIT License.

//! Assembling multi-extension FITS files from single-image files.
//!
//! The primary HDU of each input becomes one HDU of the output, in order.
//! The first stays the primary HDU and the rest become image extensions.
//! Optionally each is labeled with an `EXTNAME`, plus the matching DESDM
//! `DES_EXT` label for the standard science, weight, and mask planes.

use fitsutils_core::notify::NotificationBackend;
use fitsutils_core::{fu_debug, fu_warning};
use std::path::PathBuf;
use thiserror::Error;

use crate::hdu::{write_hdu_list, FitsFile, Hdu};
use crate::header::HeaderValue;
use crate::FitsError;

/// Errors specific to MEF assembly.
#[derive(Error, Debug)]
pub enum MefError {
    /// No input files were given.
    #[error("must provide input file names")]
    NoInputs,

    /// The extension names don't pair up with the input files.
    #[error("number of extension names ({extnames}) doesn't match number of input files ({filenames})")]
    ExtnameCountMismatch {
        /// How many extension names were given.
        extnames: usize,

        /// How many input files were given.
        filenames: usize,
    },

    /// A problem reading or writing FITS data.
    #[error(transparent)]
    Fits(#[from] FitsError),
}

/// Map an extension name onto its DESDM `DES_EXT` label, if it has one.
pub fn des_ext(extname: &str) -> Option<&'static str> {
    match extname {
        "SCI" => Some("IMAGE"),
        "WGT" => Some("WEIGHT"),
        "MSK" => Some("MASK"),
        _ => None,
    }
}

/// Label an HDU with an extension name.
///
/// `EXTNAME` goes after `NAXIS2`, and `DES_EXT` (when the name has a DESDM
/// label) right after `EXTNAME`.
pub fn label_hdu(hdu: &mut Hdu, extname: &str) -> Result<(), FitsError> {
    let header = hdu.header_mut();

    header.set(
        "EXTNAME",
        HeaderValue::String(extname.to_owned()),
        Some("Extension Name"),
        Some("NAXIS2"),
    )?;

    if let Some(label) = des_ext(extname) {
        header.set(
            "DES_EXT",
            HeaderValue::String(label.to_owned()),
            Some("DESDM Extension Name"),
            Some("EXTNAME"),
        )?;
    }

    Ok(())
}

/// Builder for a multi-extension FITS file.
#[derive(Clone, Debug)]
pub struct MefBuilder {
    filenames: Vec<PathBuf>,
    outname: PathBuf,
    extnames: Vec<String>,
    clobber: bool,
}

impl MefBuilder {
    /// Start building a MEF that will be written to `outname`.
    pub fn new<P: Into<PathBuf>>(outname: P) -> Self {
        MefBuilder {
            filenames: Vec::new(),
            outname: outname.into(),
            extnames: Vec::new(),
            clobber: false,
        }
    }

    /// Add an input file.
    pub fn input<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.filenames.push(path.into());
        self
    }

    /// Add several input files.
    pub fn inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.filenames.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Give an extension name for each input, in order. An empty list means
    /// no labeling.
    pub fn extnames<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extnames = names.into_iter().map(Into::into).collect();
        self
    }

    /// Whether to overwrite an existing output file.
    pub fn clobber(mut self, clobber: bool) -> Self {
        self.clobber = clobber;
        self
    }

    /// Read the inputs and write the MEF.
    ///
    /// Returns `Ok(false)`, after a warning, if the output already exists
    /// and clobbering is off; nothing is written in that case.
    pub fn write(&self, nb: &mut dyn NotificationBackend) -> Result<bool, MefError> {
        if self.filenames.is_empty() {
            return Err(MefError::NoInputs);
        }

        if self.outname.is_file() && !self.clobber {
            fu_warning!(
                nb,
                "output file `{}` exists, try the clobber option; no file was created",
                self.outname.display()
            );
            return Ok(false);
        }

        if !self.extnames.is_empty() && self.extnames.len() != self.filenames.len() {
            return Err(MefError::ExtnameCountMismatch {
                extnames: self.extnames.len(),
                filenames: self.filenames.len(),
            });
        }

        let mut hdus = Vec::with_capacity(self.filenames.len());

        for (i, path) in self.filenames.iter().enumerate() {
            fu_debug!(nb, "reading {} --> HDU {}", path.display(), i);
            let hdu = FitsFile::open(path)
                .and_then(|mut f| f.read_hdu(0))
                .map_err(|e| e.for_input(path))?;
            hdus.push(hdu);
        }

        for (i, (hdu, extname)) in hdus.iter_mut().zip(&self.extnames).enumerate() {
            fu_debug!(nb, "adding EXTNAME={} to HDU {}", extname, i);
            label_hdu(hdu, extname)?;
        }

        fu_debug!(nb, "writing to: {}", self.outname.display());
        write_hdu_list(&self.outname, &hdus, self.clobber)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdu::tests::image_hdu;
    use crate::hdu::read_hdu_list;
    use fitsutils_core::notify::{BufferingNotificationBackend, NotificationKind};
    use std::path::Path;

    fn setup(dir: &Path) -> Vec<PathBuf> {
        ["sci", "wgt", "msk"]
            .iter()
            .enumerate()
            .map(|(i, stem)| {
                let p = dir.join(format!("{stem}.fits"));
                let hdu = image_hdu(true, &[4, 2 + i], -32, &[("CCDNUM", HeaderValue::Integer(i as i64 + 1))]);
                write_hdu_list(&p, &[hdu], false).unwrap();
                p
            })
            .collect()
    }

    #[test]
    fn des_ext_labels() {
        assert_eq!(des_ext("SCI"), Some("IMAGE"));
        assert_eq!(des_ext("WGT"), Some("WEIGHT"));
        assert_eq!(des_ext("MSK"), Some("MASK"));
        assert_eq!(des_ext("sci"), None);
        assert_eq!(des_ext("BKG"), None);
    }

    #[test]
    fn label_positions() {
        let mut hdu = image_hdu(true, &[8, 8], 16, &[("OBJECT", HeaderValue::String("x".to_owned()))]);
        label_hdu(&mut hdu, "MSK").unwrap();
        let h = hdu.header();
        assert_eq!(h.position("EXTNAME"), Some(5));
        assert_eq!(h.position("DES_EXT"), Some(6));
        assert_eq!(h.position("OBJECT"), Some(7));
        assert_eq!(h.value_comment("EXTNAME").unwrap().0, Some("Extension Name"));

        label_hdu(&mut hdu, "SCI").unwrap();
        assert_eq!(hdu.header().len(), 8);
        assert_eq!(hdu.header().get("DES_EXT").and_then(|v| v.as_str()), Some("IMAGE"));
    }

    #[test]
    fn builds_labeled_mef() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = setup(dir.path());
        let out = dir.path().join("mef.fits");
        let mut nb = BufferingNotificationBackend::new();

        let wrote = MefBuilder::new(&out)
            .inputs(&inputs)
            .extnames(["SCI", "WGT", "MSK"])
            .write(&mut nb)
            .unwrap();
        assert!(wrote);

        let hdus = read_hdu_list(&out).unwrap();
        assert_eq!(hdus.len(), 3);
        assert!(hdus[0].is_primary());
        assert_eq!(hdus[1].xtension(), Some("IMAGE"));
        assert_eq!(hdus[2].xtension(), Some("IMAGE"));

        // EXTEND lands between NAXIS2 and EXTNAME when the list is written.
        let h = hdus[0].header();
        assert_eq!(h.position("EXTEND"), Some(h.position("NAXIS2").unwrap() + 1));
        assert_eq!(h.position("EXTNAME"), Some(h.position("EXTEND").unwrap() + 1));
        assert_eq!(h.position("DES_EXT"), Some(h.position("EXTNAME").unwrap() + 1));
        assert_eq!(h.get("DES_EXT").and_then(|v| v.as_str()), Some("IMAGE"));
        assert_eq!(h.value_comment("DES_EXT").unwrap().0, Some("DESDM Extension Name"));

        assert_eq!(hdus[1].extname(), Some("WGT"));
        assert_eq!(hdus[1].header().get("DES_EXT").and_then(|v| v.as_str()), Some("WEIGHT"));
        assert_eq!(hdus[2].header().get("CCDNUM"), Some(&HeaderValue::Integer(3)));
        assert_eq!(hdus[2].data().len(), 4 * 4 * 4);
    }

    #[test]
    fn unlabeled_and_unknown_names() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = setup(dir.path());
        let out = dir.path().join("mef.fits");
        let mut nb = BufferingNotificationBackend::new();

        MefBuilder::new(&out)
            .inputs(&inputs[..2])
            .extnames(["BKG", "SCI"])
            .write(&mut nb)
            .unwrap();

        let hdus = read_hdu_list(&out).unwrap();
        assert_eq!(hdus[0].extname(), Some("BKG"));
        assert_eq!(hdus[0].header().get("DES_EXT"), None);

        let out2 = dir.path().join("plain.fits");
        MefBuilder::new(&out2).inputs(&inputs).write(&mut nb).unwrap();
        assert!(read_hdu_list(&out2).unwrap().iter().all(|h| h.extname().is_none()));
    }

    #[test]
    fn existing_output_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = setup(dir.path());
        let out = dir.path().join("mef.fits");
        std::fs::write(&out, b"precious").unwrap();
        let mut nb = BufferingNotificationBackend::new();

        let wrote = MefBuilder::new(&out).inputs(&inputs).write(&mut nb).unwrap();
        assert!(!wrote);
        assert_eq!(std::fs::read(&out).unwrap(), b"precious");
        assert_eq!(nb.messages(NotificationKind::Warning).len(), 1);

        let wrote = MefBuilder::new(&out)
            .inputs(&inputs)
            .clobber(true)
            .write(&mut nb)
            .unwrap();
        assert!(wrote);
        assert_eq!(read_hdu_list(&out).unwrap().len(), 3);
    }

    #[test]
    fn bad_requests() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = setup(dir.path());
        let out = dir.path().join("mef.fits");
        let mut nb = BufferingNotificationBackend::new();

        assert!(matches!(
            MefBuilder::new(&out).write(&mut nb),
            Err(MefError::NoInputs)
        ));
        assert!(matches!(
            MefBuilder::new(&out).inputs(&inputs).extnames(["SCI"]).write(&mut nb),
            Err(MefError::ExtnameCountMismatch { extnames: 1, filenames: 3 })
        ));
        assert!(matches!(
            MefBuilder::new(&out).input(dir.path().join("missing.fits")).write(&mut nb),
            Err(MefError::Fits(FitsError::Input { .. }))
        ));
        assert!(!out.exists());
    }
}
