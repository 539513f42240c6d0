//! apigen-par - AST node definitions
//!
//! The AST mirrors the surface syntax: a flat list of top-level
//! declarations, each carrying an unresolved [`TypeExpr`]. Type names are
//! plain strings at this stage; the analyzer resolves them against the
//! type pool later.

use apigen_util::{Span, Value};

/// Top-level declaration kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclarationKind {
    /// `const name : T;` - a read-only global
    Const,
    /// `var name : T;` - a mutable global
    Var,
    /// `constexpr name : T = value;` - a compile-time constant
    Constexpr,
    /// `fn name(...) T;` - a function prototype
    Fn,
    /// `type Name = T;` - a type declaration
    Type,
}

/// A top-level declaration
#[derive(Clone, Debug)]
pub struct Declaration {
    pub kind: DeclarationKind,
    /// Concatenated `///` lines preceding the declaration
    pub documentation: Option<String>,
    pub name: String,
    /// The declared type; for `fn` declarations this is a function type
    pub ty: TypeExpr,
    /// Initial value; `Value::Null` except for `constexpr`
    pub value: Value,
    pub span: Span,
}

/// An unresolved type expression
#[derive(Clone, Debug)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

/// The shape of a type expression
#[derive(Clone, Debug)]
pub enum TypeExprKind {
    /// A bare identifier naming a builtin or declared type
    Named(String),
    /// Any of the pointer forms `*T`, `[*]T`, `[*:N]T` with modifiers
    Pointer(PointerExpr),
    /// `[N]T`; the size literal is checked by the analyzer
    Array { size: Value, elem: Box<TypeExpr> },
    /// `fn (p: T, ...) R`
    Function {
        ret: Box<TypeExpr>,
        params: Vec<FieldExpr>,
    },
    /// `enum (T)? { items }`
    Enum {
        backing: Option<Box<TypeExpr>>,
        items: Vec<EnumItemExpr>,
    },
    /// `struct { fields }`
    Struct { fields: Vec<FieldExpr> },
    /// `union { fields }`
    Union { fields: Vec<FieldExpr> },
    /// `opaque {}`
    Opaque,
}

impl TypeExprKind {
    /// Unique kinds have identity by declaration site, not by shape.
    pub fn is_unique(&self) -> bool {
        matches!(
            self,
            TypeExprKind::Enum { .. }
                | TypeExprKind::Struct { .. }
                | TypeExprKind::Union { .. }
                | TypeExprKind::Opaque
        )
    }
}

/// How many elements a pointer addresses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerSize {
    /// `*T` - exactly one element
    One,
    /// `[*]T` - an unknown number of elements
    Many,
    /// `[*:N]T` - elements terminated by a sentinel
    SentinelledMany,
}

/// A pointer type expression
#[derive(Clone, Debug)]
pub struct PointerExpr {
    pub size: PointerSize,
    pub is_const: bool,
    pub is_optional: bool,
    /// Only present for [`PointerSize::SentinelledMany`]
    pub sentinel: Option<Value>,
    pub underlying: Box<TypeExpr>,
}

/// A named-and-typed slot: struct/union field or function parameter
#[derive(Clone, Debug)]
pub struct FieldExpr {
    pub documentation: Option<String>,
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

/// One enum item; `value` is `Value::Null` when no literal was given
#[derive(Clone, Debug)]
pub struct EnumItemExpr {
    pub documentation: Option<String>,
    pub name: String,
    pub value: Value,
    pub span: Span,
}
