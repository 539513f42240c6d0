//! The Go backend stub.
//!
//! The contract matches the C backend's; only the surface syntax differs
//! (cgo type spellings, exported names). Not implemented in the current
//! core.

use std::io::Write;

use apigen_sem::Document;

use crate::{RenderError, Renderer};

/// The Go module backend (stub).
pub struct GoRenderer;

impl Renderer for GoRenderer {
    fn render(&self, _document: &Document, _out: &mut dyn Write) -> Result<(), RenderError> {
        Err(RenderError::Unsupported("go"))
    }
}
