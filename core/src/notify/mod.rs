// Copyright 2017-2026 Peter Williams and collaborators
// Licensed under the MIT License.

/*!
Reporting progress and problems to the user of a command-line tool.

Library code takes a `&mut dyn NotificationBackend` and reports through the
`fu_*!` macros; the CLI decides where the messages end up.

*/

pub mod termcolor;

use anyhow::Error;
use std::cmp;
use std::env;
use std::fmt::Arguments;
use std::result::Result as StdResult;

/// The environment variable holding the pipeline's numeric debug level.
pub const DEBUG_ENV_VAR: &str = "FITSUTILS_DEBUG";

/// Debug levels at or above this one turn on verbose chatter.
pub const VERBOSE_DEBUG_LEVEL: u32 = 3;

/// How chatty the notification system should be.
///
/// Levels are ordered from quietest to chattiest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum ChatterLevel {
    /// Only warnings and errors.
    Minimal,

    /// Informational messages too.
    Normal,

    /// Everything, including step-by-step debugging notes.
    Verbose,
}

impl ChatterLevel {
    /// Raise this level to `Verbose` if the given debug level asks for it.
    ///
    /// `debug_value` is the raw text of the debug environment variable, if
    /// it is set. Values that are not integers are ignored.
    pub fn with_debug_level(self, debug_value: Option<&str>) -> ChatterLevel {
        let level = debug_value.and_then(|v| v.trim().parse::<u32>().ok());

        match level {
            Some(n) if n >= VERBOSE_DEBUG_LEVEL => cmp::max(self, ChatterLevel::Verbose),
            _ => self,
        }
    }

    /// Like `with_debug_level`, reading the value from the environment.
    pub fn with_debug_env(self) -> ChatterLevel {
        let value = env::var(DEBUG_ENV_VAR).ok();
        self.with_debug_level(value.as_deref())
    }
}

/// How serious a notification is.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NotificationKind {
    /// Step-by-step progress, such as each head file opened. Only shown at
    /// verbose chatter.
    Debug,

    /// Something the user may like to know.
    Note,

    /// Something looks wrong, but the task should still succeed.
    Warning,

    /// The task will probably fail, but work continues for now.
    Severe,

    /// The task cannot go on.
    Fatal,
}

/// Somewhere to send notifications.
///
/// Library code takes a `&mut dyn NotificationBackend` and never decides
/// for itself how a message is shown.
pub trait NotificationBackend {
    /// Deliver one notification, with an optional error whose causes
    /// should be shown after the message.
    fn notify(&mut self, kind: NotificationKind, args: Arguments, err: Option<Error>);
}

/// Shared body of the `fu_*!` macros.
#[doc(hidden)]
#[macro_export]
macro_rules! fu_notify {
    ($kind:ident, $dest:expr, $( $fmt_args:expr ),*) => {
        $dest.notify($crate::notify::NotificationKind::$kind, format_args!($( $fmt_args ),*), None)
    };
    ($kind:ident, $dest:expr, $( $fmt_args:expr ),* ; $err:expr) => {
        $dest.notify($crate::notify::NotificationKind::$kind, format_args!($( $fmt_args ),*), Some($err))
    };
}

/// Emit a debugging message. See [`fu_note!`].
#[macro_export]
macro_rules! fu_debug {
    ($( $tokens:tt )*) => { $crate::fu_notify!(Debug, $( $tokens )*) };
}

/// Emit an informational message.
///
/// ```rust,ignore
/// fu_note!(nb, "combined {} catalogs", n_cats);
/// fu_warning!(nb, "could not remove {}", path.display(); err.into());
/// ```
///
/// The first argument is the backend; the rest are `format!` arguments. An
/// `anyhow::Error` may follow a semicolon. All of the `fu_*!` macros take
/// the same form.
#[macro_export]
macro_rules! fu_note {
    ($( $tokens:tt )*) => { $crate::fu_notify!(Note, $( $tokens )*) };
}

/// Emit a warning. See [`fu_note!`].
#[macro_export]
macro_rules! fu_warning {
    ($( $tokens:tt )*) => { $crate::fu_notify!(Warning, $( $tokens )*) };
}

/// Report a severe problem. See [`fu_note!`].
#[macro_export]
macro_rules! fu_severe {
    ($( $tokens:tt )*) => { $crate::fu_notify!(Severe, $( $tokens )*) };
}

/// Report a fatal problem. See [`fu_note!`].
#[macro_export]
macro_rules! fu_fatal {
    ($( $tokens:tt )*) => { $crate::fu_notify!(Fatal, $( $tokens )*) };
}

/// A backend that keeps every notification in memory.
///
/// Tests use it to check what a tool reported.
#[derive(Debug, Default)]
pub struct BufferingNotificationBackend {
    kept: Vec<(NotificationKind, String, Option<Error>)>,
}

impl BufferingNotificationBackend {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The texts of the kept notifications of one kind, oldest first.
    pub fn messages(&self, kind: NotificationKind) -> Vec<&str> {
        self.kept
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, text, _)| text.as_str())
            .collect()
    }

    /// Whether any kept notification carried an error.
    pub fn has_errors(&self) -> bool {
        self.kept.iter().any(|(_, _, err)| err.is_some())
    }
}

impl NotificationBackend for BufferingNotificationBackend {
    fn notify(&mut self, kind: NotificationKind, args: Arguments, err: Option<Error>) {
        self.kept.push((kind, args.to_string(), err));
    }
}

/// Adds the `--chatter` option to a clap `Command`.
pub trait ClapNotificationArgsExt {
    /// Add `-c/--chatter LEVEL`, global to all subcommands.
    fn fitsutils_notify_args(self) -> Self;
}

impl ClapNotificationArgsExt for clap::Command {
    fn fitsutils_notify_args(self) -> Self {
        self.arg(
            clap::Arg::new("chatter_level")
                .long("chatter")
                .short('c')
                .value_name("LEVEL")
                .help("How much to report: minimal, default or verbose")
                .value_parser(["default", "minimal", "verbose"])
                .default_value("default")
                .global(true),
        )
    }
}

/// Run the body of a command-line tool, printing notifications and any
/// returned error to the terminal.
///
/// Returns the process exit code: the body's own code, or 1 on error.
pub fn run_with_notifications<E, F>(matches: clap::ArgMatches, inner: F) -> i32
where
    E: Into<Error>,
    F: FnOnce(clap::ArgMatches, &mut dyn NotificationBackend) -> StdResult<i32, E>,
{
    let chatter = match matches.get_one::<String>("chatter_level").map(String::as_str) {
        Some("minimal") => ChatterLevel::Minimal,
        Some("verbose") => ChatterLevel::Verbose,
        _ => ChatterLevel::Normal,
    }
    .with_debug_env();

    let mut backend = termcolor::TermcolorNotificationBackend::new(chatter);

    inner(matches, &mut backend).unwrap_or_else(|e| {
        backend.bare_error(e);
        1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_level_raises_chatter() {
        let c = ChatterLevel::Normal;
        assert_eq!(c.with_debug_level(None), ChatterLevel::Normal);
        assert_eq!(c.with_debug_level(Some("1")), ChatterLevel::Normal);
        assert_eq!(c.with_debug_level(Some("3")), ChatterLevel::Verbose);
        assert_eq!(c.with_debug_level(Some(" 6 ")), ChatterLevel::Verbose);
        assert_eq!(c.with_debug_level(Some("lots")), ChatterLevel::Normal);
        assert_eq!(
            ChatterLevel::Minimal.with_debug_level(Some("3")),
            ChatterLevel::Verbose
        );
        assert!(ChatterLevel::Minimal < ChatterLevel::Verbose);
    }

    #[test]
    fn buffering_keeps_order() {
        let mut nb = BufferingNotificationBackend::new();
        fu_note!(nb, "first {}", 1);
        fu_warning!(nb, "careful");
        fu_note!(nb, "second");
        assert!(!nb.has_errors());

        assert_eq!(nb.messages(NotificationKind::Note), vec!["first 1", "second"]);
        assert_eq!(nb.messages(NotificationKind::Warning), vec!["careful"]);

        fu_severe!(nb, "giving up on {}", "x.fits"; anyhow::anyhow!("truncated"));
        assert!(nb.has_errors());
        assert_eq!(nb.messages(NotificationKind::Severe), vec!["giving up on x.fits"]);
    }
}
