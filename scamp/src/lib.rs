// Copyright 2026 Peter Williams and collaborators
// Licensed under the MIT License.

/*!
Splitting SCAMP ".head" output into one file per input catalog.

When SCAMP solves the astrometry of several catalogs at once it can write all
of the resulting header blocks into a single text file. Each block begins
with a `HISTORY   Astrometric solution by SCAMP` line and finishes with an
`END` line. The pipeline needs one head file per catalog, named in catalog
order, so this crate cuts the combined file back apart.

Lines are copied byte-for-byte, line terminators included; the input does
not need to be valid UTF-8. Anything before the first marker line belongs to
no block and is dropped.

*/

use fitsutils_core::notify::NotificationBackend;
use fitsutils_core::{fu_debug, fu_warning};
use std::fs::File;
use std::io::{self, prelude::*, BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// The prefix of the line that begins each header block.
pub const SCAMP_MARKER: &[u8] = b"HISTORY   Astrometric solution by SCAMP";

/// An error that stops a split.
///
/// Outputs written before the error are left in place.
#[derive(Error, Debug)]
pub enum SplitError {
    /// A block did not contain exactly one `END` line.
    #[error(
        "number of END lines ({terminators}) does not match number of HISTORY lines \
         ({markers}) when writing `{destination}`"
    )]
    UnterminatedBlock {
        /// The output that the bad block was written to.
        destination: String,

        /// `END` lines seen so far.
        terminators: usize,

        /// Marker lines seen so far.
        markers: usize,
    },

    /// The input holds more blocks than there are destinations.
    #[error("input holds more header blocks than the {expected} destination(s) given")]
    TooManyBlocks {
        /// The number of destinations.
        expected: usize,
    },

    /// The input holds fewer blocks than there are destinations.
    #[error("number of head files made ({actual}) does not match required number of head files ({expected})")]
    TooFewBlocks {
        /// The number of destinations.
        expected: usize,

        /// The number of blocks found.
        actual: usize,
    },

    /// The destination list is empty.
    #[error("no destination head files given")]
    NoDestinations,

    /// An output could not be created or written.
    #[error("cannot write head file `{destination}`")]
    Io {
        /// The output in question.
        destination: String,

        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The input could not be read.
    #[error("cannot read SCAMP head input")]
    Read(#[source] io::Error),
}

/// What a successful split did.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SplitSummary {
    /// The number of lines written to each destination, in order.
    pub block_lines: Vec<usize>,

    /// The number of lines before the first marker, which were not written
    /// anywhere.
    pub discarded_lines: usize,
}

impl SplitSummary {
    /// The number of blocks written.
    pub fn n_blocks(&self) -> usize {
        self.block_lines.len()
    }
}

fn is_marker(line: &[u8]) -> bool {
    line.starts_with(SCAMP_MARKER)
}

fn is_terminator(line: &[u8]) -> bool {
    line.trim_ascii_end() == b"END"
}

/// The block currently being written.
struct OpenBlock<'a, W: Write> {
    destination: &'a str,
    writer: W,
    lines: usize,
}

impl<W: Write> OpenBlock<'_, W> {
    fn write_line(&mut self, line: &[u8]) -> Result<(), SplitError> {
        self.writer.write_all(line).map_err(|source| SplitError::Io {
            destination: self.destination.to_owned(),
            source,
        })?;
        self.lines += 1;
        Ok(())
    }

    /// Flush and close this output, returning the number of lines written.
    fn close(mut self) -> Result<usize, SplitError> {
        self.writer.flush().map_err(|source| SplitError::Io {
            destination: self.destination.to_owned(),
            source,
        })?;
        Ok(self.lines)
    }
}

/// Scan state of a split in progress.
struct Splitter<'a, W: Write, F> {
    destinations: &'a [String],
    open: F,
    current: Option<OpenBlock<'a, W>>,
    markers: usize,
    terminators: usize,
    summary: SplitSummary,
}

impl<'a, W, F> Splitter<'a, W, F>
where
    W: Write,
    F: FnMut(&str) -> io::Result<W>,
{
    /// Close the current block, if any, checking that it was terminated.
    fn finish_block(&mut self, nb: &mut dyn NotificationBackend) -> Result<(), SplitError> {
        let block = match self.current.take() {
            Some(b) => b,
            None => return Ok(()),
        };

        let destination = block.destination;
        let lines = block.close()?;
        fu_debug!(nb, "closing .head file after writing {} lines", lines);
        self.summary.block_lines.push(lines);

        if self.terminators != self.markers {
            return Err(SplitError::UnterminatedBlock {
                destination: destination.to_owned(),
                terminators: self.terminators,
                markers: self.markers,
            });
        }

        Ok(())
    }

    fn start_block(&mut self, nb: &mut dyn NotificationBackend) -> Result<(), SplitError> {
        self.finish_block(nb)?;

        let destinations: &'a [String] = self.destinations;

        let destination = match destinations.get(self.markers) {
            Some(d) => d.as_str(),
            None => {
                return Err(SplitError::TooManyBlocks {
                    expected: destinations.len(),
                })
            }
        };

        fu_debug!(nb, "opening .head file {} --> {}", self.markers, destination);

        let writer = (self.open)(destination).map_err(|source| SplitError::Io {
            destination: destination.to_owned(),
            source,
        })?;

        self.current = Some(OpenBlock {
            destination,
            writer,
            lines: 0,
        });
        self.markers += 1;
        Ok(())
    }

    fn line(&mut self, line: &[u8], nb: &mut dyn NotificationBackend) -> Result<(), SplitError> {
        if is_marker(line) {
            self.start_block(nb)?;
        } else if is_terminator(line) {
            self.terminators += 1;
        }

        match self.current {
            Some(ref mut block) => block.write_line(line),
            None => {
                self.summary.discarded_lines += 1;
                Ok(())
            }
        }
    }

    /// Close the open output without reporting anything; used when bailing
    /// out because of some other error.
    fn abandon(&mut self) {
        if let Some(mut block) = self.current.take() {
            let _ = block.writer.flush();
        }
    }
}

/// Split SCAMP head text into blocks, opening each destination with `open`.
///
/// The n'th block is written to whatever `open` returns for
/// `destinations[n]`. At most one output is open at a time, and it is
/// flushed and dropped before this function returns, whether or not there
/// was an error.
pub fn split_head_with<R, W, F>(
    mut input: R,
    destinations: &[String],
    open: F,
    nb: &mut dyn NotificationBackend,
) -> Result<SplitSummary, SplitError>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> io::Result<W>,
{
    if destinations.is_empty() {
        return Err(SplitError::NoDestinations);
    }

    let mut state = Splitter {
        destinations,
        open,
        current: None,
        markers: 0,
        terminators: 0,
        summary: SplitSummary::default(),
    };

    let mut line = Vec::new();

    loop {
        line.clear();

        match input.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                state.abandon();
                return Err(SplitError::Read(e));
            }
        }

        if let Err(e) = state.line(&line, nb) {
            state.abandon();
            return Err(e);
        }
    }

    state.finish_block(nb)?;

    if state.summary.discarded_lines > 0 {
        fu_warning!(
            nb,
            "ignored {} line(s) before the first SCAMP header block",
            state.summary.discarded_lines
        );
    }

    if state.markers != destinations.len() {
        return Err(SplitError::TooFewBlocks {
            expected: destinations.len(),
            actual: state.markers,
        });
    }

    Ok(state.summary)
}

/// Split SCAMP head text into files, creating or overwriting each one.
pub fn split_head<R: BufRead>(
    input: R,
    destinations: &[String],
    nb: &mut dyn NotificationBackend,
) -> Result<SplitSummary, SplitError> {
    split_head_with(input, destinations, |p| File::create(p).map(BufWriter::new), nb)
}

/// Split a SCAMP head file into files.
pub fn split_head_file<P: AsRef<Path>>(
    path: P,
    destinations: &[String],
    nb: &mut dyn NotificationBackend,
) -> Result<SplitSummary, SplitError> {
    let f = File::open(path).map_err(SplitError::Read)?;
    split_head(BufReader::new(f), destinations, nb)
}
