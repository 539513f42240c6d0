//! apigen-gen - Code generation backends
//!
//! Every backend implements the single-method [`Renderer`] trait: given a
//! well-formed [`Document`] it produces target source text, or reports
//! that the target is not implemented. Renderers never fail on input;
//! the only error sources are the output stream and unsupported targets.
//!
//! The C backend is the reference implementation: it is the only one that
//! needs declaration ordering and forward declarations, because C demands
//! every hard dependency be fully declared before use. Zig admits
//! out-of-order declarations, so its backend is a plain traversal. The
//! Rust and Go backends are stubs sharing the same contract.

pub mod c;
pub mod go;
pub mod rust;
pub mod zig;

pub use c::{CRenderer, CppRenderer};
pub use go::GoRenderer;
pub use rust::RustRenderer;
pub use zig::ZigRenderer;

use apigen_sem::Document;
use std::io::{self, Write};
use thiserror::Error;

/// Error type for rendering operations
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing to the output stream failed
    #[error("i/o error while writing output: {0}")]
    Io(#[from] io::Error),

    /// The requested backend is a stub
    #[error("the {0} backend is not implemented")]
    Unsupported(&'static str),
}

/// A code generation backend.
pub trait Renderer {
    /// Renders the document to the output stream.
    fn render(&self, document: &Document, out: &mut dyn Write) -> Result<(), RenderError>;
}

/// Target language selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
    C,
    Cpp,
    Zig,
    Rust,
    Go,
}

impl Language {
    /// Parses a language name as accepted on the command line.
    pub fn from_name(name: &str) -> Option<Language> {
        match name {
            "c" => Some(Language::C),
            "c++" => Some(Language::Cpp),
            "zig" => Some(Language::Zig),
            "rust" => Some(Language::Rust),
            "go" => Some(Language::Go),
            _ => None,
        }
    }

    /// The backend for this language.
    pub fn renderer(self) -> &'static dyn Renderer {
        match self {
            Language::C => &CRenderer,
            Language::Cpp => &CppRenderer,
            Language::Zig => &ZigRenderer,
            Language::Rust => &RustRenderer,
            Language::Go => &GoRenderer,
        }
    }
}

/// Writes a documentation string as `///` lines, one per input line.
pub(crate) fn write_docstring(
    out: &mut dyn Write,
    indent: usize,
    docstring: &str,
) -> io::Result<()> {
    for line in docstring.split('\n') {
        write_indent(out, indent)?;
        writeln!(out, "/// {line}")?;
    }
    Ok(())
}

/// Writes `indent` levels of four-space indentation.
pub(crate) fn write_indent(out: &mut dyn Write, indent: usize) -> io::Result<()> {
    for _ in 0..indent {
        write!(out, "    ")?;
    }
    Ok(())
}
