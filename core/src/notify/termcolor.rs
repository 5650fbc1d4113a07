// Copyright 2017-2026 Peter Williams and collaborators
// Licensed under the MIT License.

/*!
A notification backend that sends colorized output to the terminal.

Notes and debugging output go to standard output; warnings and errors go to
standard error. Each message gets a colored prefix such as `warning:`.

*/

use anyhow::Error;
use std::backtrace::BacktraceStatus;
use std::fmt::Arguments;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use super::{ChatterLevel, NotificationBackend, NotificationKind};

fn color_spec(kind: NotificationKind) -> ColorSpec {
    let mut spec = ColorSpec::new();

    match kind {
        NotificationKind::Debug => spec.set_fg(Some(Color::Cyan)),
        NotificationKind::Note => spec.set_fg(Some(Color::Green)).set_bold(true),
        NotificationKind::Warning => spec.set_fg(Some(Color::Yellow)).set_bold(true),
        NotificationKind::Severe | NotificationKind::Fatal => {
            spec.set_fg(Some(Color::Red)).set_bold(true)
        }
    };

    spec
}

fn default_prefix(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Debug => "debug:",
        NotificationKind::Note => "note:",
        NotificationKind::Warning => "warning:",
        NotificationKind::Severe => "severe:",
        NotificationKind::Fatal => "fatal:",
    }
}

/// A notification backend that writes colorized output to the terminal.
///
/// The output streams are type parameters so that the formatting can be
/// exercised without a terminal; normal use goes through
/// [`TermcolorNotificationBackend::new`].
pub struct TermcolorNotificationBackend<O = StandardStream, E = StandardStream> {
    chatter: ChatterLevel,
    stdout: O,
    stderr: E,
}

impl TermcolorNotificationBackend {
    /// Create a new backend writing to the process's standard streams.
    pub fn new(chatter: ChatterLevel) -> TermcolorNotificationBackend {
        TermcolorNotificationBackend::with_streams(
            chatter,
            StandardStream::stdout(ColorChoice::Auto),
            StandardStream::stderr(ColorChoice::Auto),
        )
    }
}

impl<O: WriteColor, E: WriteColor> TermcolorNotificationBackend<O, E> {
    /// Create a backend writing to the given streams.
    pub fn with_streams(chatter: ChatterLevel, stdout: O, stderr: E) -> Self {
        TermcolorNotificationBackend {
            chatter,
            stdout,
            stderr,
        }
    }

    /// Give back the output streams.
    pub fn into_streams(self) -> (O, E) {
        (self.stdout, self.stderr)
    }

    fn is_muted(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::Debug => self.chatter < ChatterLevel::Verbose,
            NotificationKind::Note => self.chatter <= ChatterLevel::Minimal,
            _ => false,
        }
    }

    fn stream(&mut self, kind: NotificationKind) -> &mut dyn WriteColor {
        match kind {
            NotificationKind::Debug | NotificationKind::Note => &mut self.stdout,
            _ => &mut self.stderr,
        }
    }

    fn line(&mut self, kind: NotificationKind, prefix: &str, args: Arguments) -> io::Result<()> {
        let stream = self.stream(kind);
        stream.set_color(&color_spec(kind))?;
        write!(stream, "{prefix}")?;
        stream.reset()?;
        writeln!(stream, " {args}")
    }

    /// Write a message, then the causes and any captured backtrace of an
    /// error.
    fn report(
        &mut self,
        kind: NotificationKind,
        prefix: &str,
        args: Arguments,
        err: Option<&Error>,
    ) -> io::Result<()> {
        if self.is_muted(kind) {
            return Ok(());
        }

        self.line(kind, prefix, args)?;

        let err = match err {
            Some(e) => e,
            None => return Ok(()),
        };

        for cause in err.chain() {
            self.line(kind, "caused by:", format_args!("{cause}"))?;
        }

        let backtrace = err.backtrace();

        if backtrace.status() == BacktraceStatus::Captured {
            self.line(kind, "debugging:", format_args!("backtrace follows:"))?;
            writeln!(self.stream(kind), "{backtrace:?}")?;
        }

        Ok(())
    }

    /// Print the information contained in an Error object.
    ///
    /// This prints the error itself with an `error:` prefix, then its causes
    /// and backtrace as for any other notification.
    pub fn bare_error<X: Into<Error>>(&mut self, err: X) {
        let err = err.into();
        let mut causes = err.chain();

        let top = match causes.next() {
            Some(e) => e.to_string(),
            None => return,
        };

        let kind = NotificationKind::Severe;
        let mut result = self.line(kind, "error:", format_args!("{top}"));

        for cause in causes {
            if result.is_err() {
                break;
            }

            result = self.line(kind, "caused by:", format_args!("{cause}"));
        }

        let backtrace = err.backtrace();

        if result.is_ok() && backtrace.status() == BacktraceStatus::Captured {
            let _ = self.line(kind, "debugging:", format_args!("backtrace follows:"));
            let _ = writeln!(self.stream(kind), "{backtrace:?}");
        }
    }
}

impl<O: WriteColor, E: WriteColor> NotificationBackend for TermcolorNotificationBackend<O, E> {
    fn notify(&mut self, kind: NotificationKind, args: Arguments, err: Option<Error>) {
        // Nothing sensible can be done if the terminal itself is broken.
        let _ = self.report(kind, default_prefix(kind), args, err.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fu_debug, fu_note, fu_severe, fu_warning};
    use termcolor::NoColor;

    fn backend(chatter: ChatterLevel) -> TermcolorNotificationBackend<NoColor<Vec<u8>>, NoColor<Vec<u8>>> {
        TermcolorNotificationBackend::with_streams(chatter, NoColor::new(Vec::new()), NoColor::new(Vec::new()))
    }

    fn texts(b: TermcolorNotificationBackend<NoColor<Vec<u8>>, NoColor<Vec<u8>>>) -> (String, String) {
        let (o, e) = b.into_streams();
        (
            String::from_utf8(o.into_inner()).unwrap(),
            String::from_utf8(e.into_inner()).unwrap(),
        )
    }

    #[test]
    fn routing_and_muting() {
        let mut b = backend(ChatterLevel::Normal);
        fu_debug!(b, "hidden");
        fu_note!(b, "combining {} catalogs", 2);
        fu_warning!(b, "careful");
        let (out, err) = texts(b);
        assert_eq!(out, "note: combining 2 catalogs\n");
        assert_eq!(err, "warning: careful\n");

        let mut b = backend(ChatterLevel::Minimal);
        fu_note!(b, "hidden");
        fu_severe!(b, "shown");
        let (out, err) = texts(b);
        assert_eq!(out, "");
        assert_eq!(err, "severe: shown\n");

        let mut b = backend(ChatterLevel::Verbose);
        fu_debug!(b, "step {}", 1);
        assert_eq!(texts(b).0, "debug: step 1\n");
    }

    #[test]
    fn error_chains() {
        let inner = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let err = Error::new(inner).context("cannot open `x.fits`");

        let mut b = backend(ChatterLevel::Minimal);
        b.bare_error(err);
        let (_, text) = texts(b);
        assert!(text.starts_with("error: cannot open `x.fits`\ncaused by: no such file\n"));
    }
}
