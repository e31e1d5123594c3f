//! Forwarding of compiler diagnostics and operator status lines.
//!
//! The compiler reports through a C callback; the session turns every reported line
//! into one [`DiagnosticSink::emit`] call, in order of occurrence. Sinks never act on
//! what they receive, they only pass it on.

use log::Level;
use std::cell::RefCell;
use std::rc::Rc;

/// Consumer of diagnostic and status lines.
pub trait DiagnosticSink {
    fn emit(&self, level: Level, message: &str);
}

/// Sink shared between the pipeline and the compiler session.
pub type SharedSink = Rc<dyn DiagnosticSink>;

/// Forwards every line to the `log` facade under the `cjit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, level: Level, message: &str) {
        log::log!(target: "cjit", level, "{}", message);
    }
}

/// Keeps every line in memory. Useful for embedding the launcher and for tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: RefCell<Vec<(Level, String)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|(_, m)| m.clone()).collect()
    }

    /// Number of lines emitted at `level` or more severe.
    pub fn count_at_least(&self, level: Level) -> usize {
        self.entries.borrow().iter().filter(|(l, _)| *l <= level).count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.borrow().iter().any(|(_, m)| m.contains(needle))
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_owned()));
    }
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Rc<T> {
    fn emit(&self, level: Level, message: &str) {
        (**self).emit(level, message)
    }
}

/// Severity of one line of compiler output.
///
/// tcc prefixes its messages as `<file>:<line>: warning: ...` or
/// `<file>:<line>: error: ...`; anything not marked as a warning is an error.
pub fn classify(line: &str) -> Level {
    if line.starts_with("warning:") || line.contains(": warning:") {
        Level::Warn
    } else {
        Level::Error
    }
}
