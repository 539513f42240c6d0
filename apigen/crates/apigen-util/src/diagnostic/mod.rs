//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! This module provides the append-only diagnostic sink shared by every
//! pipeline stage. Stages format a message at the emission site, attach a
//! [`DiagnosticCode`] and a source position, and hand the record to the
//! [`Handler`]; nothing is printed until the driver renders the sink at
//! the end of the invocation.
//!
//! # Examples
//!
//! ```
//! use apigen_util::diagnostic::{DiagnosticCode, Handler};
//! use apigen_util::Span;
//!
//! let handler = Handler::new();
//! handler.emit_at(
//!     DiagnosticCode::DUPLICATE_SYMBOL,
//!     "demo.api",
//!     Span::point(3, 1),
//!     "duplicate symbol 'Foo'",
//! );
//!
//! assert!(handler.has_errors());
//! ```

mod codes;

pub use codes::DiagnosticCode;

use crate::Span;
use std::cell::RefCell;
use std::fmt;
use std::io;

/// Diagnostic severity level
///
/// # Examples
///
/// ```
/// use apigen_util::diagnostic::Level;
///
/// assert_eq!(format!("{}", Level::Error), "error");
/// assert_eq!(format!("{}", Level::Warning), "warning");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that fails the invocation
    Error,
    /// A warning that does not fail the invocation
    Warning,
    /// Additional information about a diagnostic
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// A recorded diagnostic
///
/// The severity is not stored; it is derived from the code's numeric
/// range (see [`DiagnosticCode::level`]).
///
/// # Examples
///
/// ```
/// use apigen_util::diagnostic::{Diagnostic, DiagnosticCode};
/// use apigen_util::Span;
///
/// let diag = Diagnostic::new(
///     DiagnosticCode::ENUM_EMPTY,
///     "lib.api",
///     Span::point(4, 10),
///     "enum has no items",
/// );
/// assert_eq!(format!("{}", diag), "lib.api:4:10: error(1012): enum has no items");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The catalog code
    pub code: DiagnosticCode,
    /// Name of the source file the diagnostic points into
    pub file_name: String,
    /// Line of the offending construct (1-based)
    pub line: u32,
    /// Column of the offending construct (1-based)
    pub column: u32,
    /// Fully formatted message
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic anchored at the start of `span`
    pub fn new(
        code: DiagnosticCode,
        file_name: impl Into<String>,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            file_name: file_name.into(),
            line: span.first_line,
            column: span.first_column,
            message: message.into(),
        }
    }

    /// Severity derived from the code range
    pub fn level(&self) -> Level {
        self.code.level()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}({}): {}",
            self.file_name,
            self.line,
            self.column,
            self.level(),
            self.code,
            self.message
        )
    }
}

/// Handler for collecting and reporting diagnostics
///
/// The handler is append-only during a pipeline run and uses interior
/// mutability so the parser, analyzer, and renderers can share one sink
/// by plain reference. [`Handler::remove_one`] exists for the driver's
/// test mode, which checks recorded codes off against an expectation
/// list.
///
/// # Examples
///
/// ```
/// use apigen_util::diagnostic::{DiagnosticCode, Handler};
/// use apigen_util::Span;
///
/// let handler = Handler::new();
/// handler.emit_at(DiagnosticCode::STRUCT_EMPTY, "a.api", Span::point(1, 1), "empty struct");
///
/// assert!(!handler.has_errors());
/// assert_eq!(handler.warning_count(), 1);
/// ```
pub struct Handler {
    /// Collected diagnostics, in emission order
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create a new, empty handler
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Record a pre-built diagnostic
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Record a diagnostic built from its parts
    pub fn emit_at(
        &self,
        code: DiagnosticCode,
        file_name: &str,
        span: Span,
        message: impl Into<String>,
    ) {
        self.emit(Diagnostic::new(code, file_name, span, message));
    }

    /// Check if any errors have been recorded
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level() == Level::Error)
    }

    /// Check if anything at all has been recorded
    pub fn has_any(&self) -> bool {
        !self.diagnostics.borrow().is_empty()
    }

    /// Get the number of recorded errors
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level() == Level::Error)
            .count()
    }

    /// Get the number of recorded warnings
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level() == Level::Warning)
            .count()
    }

    /// Get the number of diagnostics recorded with the given code
    pub fn count_of(&self, code: DiagnosticCode) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.code == code)
            .count()
    }

    /// Get a snapshot of all recorded diagnostics
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Remove one diagnostic with the given code
    ///
    /// Returns false if no diagnostic with that code is recorded. The
    /// driver's test mode calls this once per expected code and then
    /// checks that the sink is empty.
    pub fn remove_one(&self, code: DiagnosticCode) -> bool {
        let mut diags = self.diagnostics.borrow_mut();
        match diags.iter().position(|d| d.code == code) {
            Some(index) => {
                diags.remove(index);
                true
            }
            None => false,
        }
    }

    /// Render every recorded diagnostic, one per line
    pub fn render_to(&self, out: &mut dyn io::Write) -> io::Result<()> {
        for diag in self.diagnostics.borrow().iter() {
            writeln!(out, "{diag}")?;
        }
        Ok(())
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_diag(msg: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticCode::DUPLICATE_SYMBOL,
            "test.api",
            Span::point(1, 1),
            msg,
        )
    }

    #[test]
    fn test_level_display() {
        assert_eq!(format!("{}", Level::Error), "error");
        assert_eq!(format!("{}", Level::Warning), "warning");
        assert_eq!(format!("{}", Level::Note), "note");
    }

    #[test]
    fn test_diagnostic_level_from_code() {
        assert_eq!(error_diag("x").level(), Level::Error);
        let warn = Diagnostic::new(
            DiagnosticCode::STRUCT_EMPTY,
            "test.api",
            Span::point(1, 1),
            "empty",
        );
        assert_eq!(warn.level(), Level::Warning);
    }

    #[test]
    fn test_diagnostic_display_format() {
        let diag = Diagnostic::new(
            DiagnosticCode::SYNTAX_ERROR,
            "magic.api",
            Span::point(44, 3),
            "file not found",
        );
        assert_eq!(
            format!("{}", diag),
            "magic.api:44:3: error(1008): file not found"
        );
    }

    #[test]
    fn test_handler_starts_empty() {
        let handler = Handler::new();
        assert!(!handler.has_errors());
        assert!(!handler.has_any());
        assert_eq!(handler.error_count(), 0);
        assert_eq!(handler.warning_count(), 0);
    }

    #[test]
    fn test_handler_emit() {
        let handler = Handler::new();
        handler.emit(error_diag("dup"));
        assert!(handler.has_errors());
        assert!(handler.has_any());
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn test_handler_warning_does_not_fail() {
        let handler = Handler::new();
        handler.emit_at(
            DiagnosticCode::STRUCT_EMPTY,
            "test.api",
            Span::point(2, 1),
            "empty struct",
        );
        assert!(!handler.has_errors());
        assert_eq!(handler.warning_count(), 1);
    }

    #[test]
    fn test_handler_count_of() {
        let handler = Handler::new();
        handler.emit(error_diag("a"));
        handler.emit(error_diag("b"));
        assert_eq!(handler.count_of(DiagnosticCode::DUPLICATE_SYMBOL), 2);
        assert_eq!(handler.count_of(DiagnosticCode::ENUM_EMPTY), 0);
    }

    #[test]
    fn test_handler_remove_one() {
        let handler = Handler::new();
        handler.emit(error_diag("a"));
        handler.emit(error_diag("b"));

        assert!(handler.remove_one(DiagnosticCode::DUPLICATE_SYMBOL));
        assert_eq!(handler.count_of(DiagnosticCode::DUPLICATE_SYMBOL), 1);
        assert!(handler.remove_one(DiagnosticCode::DUPLICATE_SYMBOL));
        assert!(!handler.remove_one(DiagnosticCode::DUPLICATE_SYMBOL));
        assert!(!handler.has_any());
    }

    #[test]
    fn test_handler_render_to() {
        let handler = Handler::new();
        handler.emit(error_diag("first"));
        handler.emit(error_diag("second"));

        let mut buffer = Vec::new();
        handler.render_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("error(1007): first"));
        assert!(text.contains("error(1007): second"));
    }
}
