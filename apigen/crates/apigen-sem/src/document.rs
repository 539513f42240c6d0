//! The analyzed document: everything a backend needs to render.

use apigen_util::Value;

use crate::pool::TypePool;
use crate::types::TypeId;

/// A `const`/`var` global.
#[derive(Clone, Debug)]
pub struct Global {
    pub documentation: Option<String>,
    pub name: String,
    pub ty: TypeId,
    pub is_const: bool,
}

/// A `constexpr` constant with its literal value.
#[derive(Clone, Debug)]
pub struct Constant {
    pub documentation: Option<String>,
    pub name: String,
    pub ty: TypeId,
    pub value: Value,
}

/// An `fn` prototype; `ty` always resolves to a function type.
#[derive(Clone, Debug)]
pub struct Function {
    pub documentation: Option<String>,
    pub name: String,
    pub ty: TypeId,
}

/// The analyzer's output.
///
/// `types` lists declared types in source order, followed by anonymous
/// types in the order their resolution completed. The pool is the owning
/// store for every [`TypeId`] in the document.
#[derive(Debug, Default)]
pub struct Document {
    pub pool: TypePool,
    pub types: Vec<TypeId>,
    pub variables: Vec<Global>,
    pub constants: Vec<Constant>,
    pub functions: Vec<Function>,
}
