//! The Rust backend stub.
//!
//! The contract matches the C backend's; only the surface syntax differs
//! (raw-pointer spellings, `#[repr(C)]` records, raw identifiers for
//! reserved words). Not implemented in the current core.

use std::io::Write;

use apigen_sem::Document;

use crate::{RenderError, Renderer};

/// The Rust module backend (stub).
pub struct RustRenderer;

impl Renderer for RustRenderer {
    fn render(&self, _document: &Document, _out: &mut dyn Write) -> Result<(), RenderError> {
        Err(RenderError::Unsupported("rust"))
    }
}
