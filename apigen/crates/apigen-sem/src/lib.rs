//! apigen-sem - Semantic analyzer and type pool
//!
//! This crate turns the parser's declaration list into a [`Document`]:
//! the fully resolved view of one ABI surface. It hosts the three pieces
//! the backends consume:
//!
//! - [`types`]: the resolved type representation. Types are referred to
//!   by [`types::TypeId`] indices into the pool, never by reference.
//! - [`pool`]: the owning store with builtin singletons, an
//!   insertion-ordered name index, and the structural intern cache.
//! - [`analysis`]: the nine-phase analyzer described on
//!   [`analysis::analyze`].
//!
//! Identity rules, in one place: unique kinds (enum, struct, union,
//! opaque) are identified by declaration site; primitives are singletons;
//! every other composite is canonicalized so structurally equal types
//! share one id.

pub mod analysis;
pub mod document;
pub mod pool;
pub mod types;

pub use analysis::{analyze, AnalysisFailed};
pub use document::{Constant, Document, Function, Global};
pub use pool::TypePool;
pub use types::{Type, TypeExtra, TypeId, TypeKind};
