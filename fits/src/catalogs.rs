// Copyright 2026 Peter Williams and collaborators
// Licensed under the MIT License.

//! Combining FITS-LDAC catalogs into one file.
//!
//! Each input contributes its first three HDUs (the primary, `LDAC_IMHEAD`,
//! and `LDAC_OBJECTS`) to the output, in input order. This is the layout
//! SCAMP expects when it is given one catalog per exposure.

use fitsutils_core::notify::NotificationBackend;
use fitsutils_core::{fu_debug, fu_note};
use std::fs;
use std::path::Path;

use crate::hdu::{write_hdu_list, FitsFile};
use crate::FitsError;

/// The number of HDUs taken from each input catalog.
pub const HDUS_PER_CATALOG: usize = 3;

/// Combine LDAC catalogs into a single file, returning the number of HDUs
/// written.
///
/// A pre-existing output file is replaced.
pub fn combine_cats<P: AsRef<Path>>(
    incats: &[P],
    outcat: &Path,
    nb: &mut dyn NotificationBackend,
) -> Result<usize, FitsError> {
    if incats.is_empty() {
        return fitserr!("no input catalogs to combine");
    }

    let mut hdus = Vec::with_capacity(incats.len() * HDUS_PER_CATALOG);

    for incat in incats {
        let incat = incat.as_ref();
        fu_debug!(nb, "appending {} HDUs from cat --> {}", HDUS_PER_CATALOG, incat.display());

        let mut f = FitsFile::open(incat).map_err(|e| e.for_input(incat))?;

        if f.hdus().len() < HDUS_PER_CATALOG {
            return Err(FitsError::Format(format!(
                "catalog has {} HDUs but at least {} are needed",
                f.hdus().len(),
                HDUS_PER_CATALOG
            ))
            .for_input(incat));
        }

        for i in 0..HDUS_PER_CATALOG {
            hdus.push(f.read_hdu(i).map_err(|e| e.for_input(incat))?);
        }
    }

    if outcat.exists() {
        fs::remove_file(outcat)?;
        fu_note!(nb, "removing pre-existing version of fullcat {}", outcat.display());
    }

    fu_debug!(nb, "writing results to fullcat --> {}", outcat.display());
    write_hdu_list(outcat, &hdus, false)?;
    Ok(hdus.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdu::tests::{image_hdu, table_hdu};
    use crate::hdu::read_hdu_list;
    use crate::header::HeaderValue;
    use crate::ldac::{imhead_header, imhead_table};
    use fitsutils_core::notify::{BufferingNotificationBackend, NotificationKind};
    use std::path::PathBuf;

    fn make_catalog(dir: &Path, name: &str, n_objects: usize) -> PathBuf {
        let image = image_hdu(
            true,
            &[16, 16],
            -32,
            &[("OBJECT", HeaderValue::String(name.to_owned()))],
        );
        let hdus = vec![
            image_hdu(true, &[], 8, &[]),
            imhead_table(image.header()).unwrap(),
            table_hdu("LDAC_OBJECTS", 24, n_objects, None),
            table_hdu("EXTRA", 4, 1, None),
        ];

        let path = dir.join(format!("{name}.fits"));
        write_hdu_list(&path, &hdus, false).unwrap();
        path
    }

    #[test]
    fn combines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let cats = vec![
            make_catalog(dir.path(), "c1", 10),
            make_catalog(dir.path(), "c2", 20),
        ];
        let out = dir.path().join("full.fits");
        let mut nb = BufferingNotificationBackend::new();

        assert_eq!(combine_cats(&cats, &out, &mut nb).unwrap(), 6);

        let hdus = read_hdu_list(&out).unwrap();
        assert_eq!(hdus.len(), 6);
        assert!(hdus[0].is_primary());
        assert_eq!(hdus[3].xtension(), Some("IMAGE"));
        assert_eq!(hdus[1].extname(), Some("LDAC_IMHEAD"));
        assert_eq!(hdus[4].extname(), Some("LDAC_IMHEAD"));
        assert_eq!(hdus[2].header().get("NAXIS2"), Some(&HeaderValue::Integer(10)));
        assert_eq!(hdus[5].header().get("NAXIS2"), Some(&HeaderValue::Integer(20)));

        let h = imhead_header(&hdus[4]).unwrap();
        assert_eq!(h.get("OBJECT").and_then(|v| v.as_str()), Some("c2"));
        assert!(nb.messages(NotificationKind::Note).is_empty());
    }

    #[test]
    fn replaces_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let cats = vec![make_catalog(dir.path(), "c1", 3)];
        let out = dir.path().join("full.fits");
        fs::write(&out, b"stale").unwrap();
        let mut nb = BufferingNotificationBackend::new();

        assert_eq!(combine_cats(&cats, &out, &mut nb).unwrap(), 3);
        assert_eq!(read_hdu_list(&out).unwrap().len(), 3);
        assert_eq!(nb.messages(NotificationKind::Note).len(), 1);
    }

    #[test]
    fn short_catalogs_fail() {
        let dir = tempfile::tempdir().unwrap();
        let short = dir.path().join("short.fits");
        write_hdu_list(&short, &[image_hdu(true, &[], 8, &[]), table_hdu("LDAC_OBJECTS", 8, 2, None)], false)
            .unwrap();
        let out = dir.path().join("full.fits");
        let mut nb = BufferingNotificationBackend::new();

        assert!(matches!(
            combine_cats(&[&short], &out, &mut nb),
            Err(FitsError::Input { .. })
        ));
        assert!(combine_cats::<&Path>(&[], &out, &mut nb).is_err());
        assert!(!out.exists());
    }
}
