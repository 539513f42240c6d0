//! apigen-util - Foundation types for the apigen pipeline
//!
//! This crate provides the small, dependency-light types that every other
//! apigen crate builds on:
//!
//! - [`Span`]: source locations as `(first_line, first_column, last_line,
//!   last_column)` ranges.
//! - [`Value`]: the tagged scalar used for constexpr initializers, enum
//!   item values, and pointer sentinels.
//! - [`Idx`] / [`IndexVec`]: typed indices for arena-style stores. The
//!   type pool hands out `u32` newtype indices instead of references, so
//!   "pointer equality" in the pipeline is plain index equality.
//! - [`Handler`] / [`Diagnostic`] / [`DiagnosticCode`]: the append-only
//!   diagnostic sink shared by the parser, the analyzer, and the code
//!   generators.
//!
//! Everything here is synchronous and single-threaded; the sink uses
//! interior mutability so it can be shared by reference through the whole
//! pipeline without locking.

pub mod diagnostic;
pub mod index_vec;
pub mod span;
pub mod value;

pub use diagnostic::{Diagnostic, DiagnosticCode, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::Span;
pub use value::Value;

// Re-export commonly used collections
pub use indexmap::IndexMap;
pub use rustc_hash::{FxHashMap, FxHashSet};
