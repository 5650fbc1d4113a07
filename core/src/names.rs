// Copyright 2026 Peter Williams and collaborators
// Licensed under the MIT License.

/*!

Resolving lists of file names given on the command line.

Pipeline tools take their inputs or outputs either as a single
comma-separated argument or as a "list file" holding one name per line. The
order of the names is significant: callers pair them positionally with other
data.

 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where an ordered list of file names comes from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NameSource {
    /// An explicit comma-separated list.
    List(String),

    /// A text file with one name per line.
    File(PathBuf),
}

impl NameSource {
    /// Produce the ordered list of names.
    pub fn resolve(&self) -> io::Result<Vec<String>> {
        match self {
            NameSource::List(s) => Ok(split_name_list(s)),
            NameSource::File(p) => read_name_list(p),
        }
    }
}

/// Split a comma-separated list of names, ignoring whitespace around the
/// commas.
///
/// An empty (or all-blank) string yields an empty list.
pub fn split_name_list(s: &str) -> Vec<String> {
    let s = s.trim();

    if s.is_empty() {
        return Vec::new();
    }

    s.split(',').map(|item| item.trim().to_owned()).collect()
}

/// Read names from a list file, one per line. Lines are trimmed and blank
/// lines are skipped.
pub fn read_name_list<P: AsRef<Path>>(path: P) -> io::Result<Vec<String>> {
    let text = fs::read_to_string(path)?;

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect())
}
