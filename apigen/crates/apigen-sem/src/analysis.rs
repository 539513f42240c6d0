//! The semantic analyzer: AST to [`Document`] in nine ordered phases.
//!
//! 1. Count declarations and size the result arrays.
//! 2. Publish named unique types (enum/struct/union/opaque) into the pool
//!    with empty payloads, so later phases can refer to them by name.
//! 3. Resolve non-unique type declarations to a fixpoint. Missing names
//!    are retried on the next pass; when a pass makes no progress, one
//!    final pass runs with missing-symbol diagnostics enabled.
//! 4. Fill in the payloads of the named unique types.
//! 5. Commit the declared types to the document in source order.
//! 6. Resolve `const`/`var` globals.
//! 7. Resolve `fn` prototypes.
//! 8. Resolve `constexpr` constants and type-check their values.
//! 9. Drain the anonymous-type queue and append each synthesized type to
//!    the document. This must run last so the indices committed in
//!    phase 5 stay stable.
//!
//! Failure of a phase skips the remaining phases, but diagnostics emitted
//! earlier stand.

use std::collections::VecDeque;

use apigen_par::ast::{
    Declaration, DeclarationKind, EnumItemExpr, FieldExpr, PointerSize, TypeExpr, TypeExprKind,
};
use apigen_util::{DiagnosticCode, Handler, Span, Value};
use thiserror::Error;

use crate::document::{Constant, Document, Function, Global};
use crate::pool::TypePool;
use crate::types::{
    integer_range, ArrayType, EnumItem, EnumType, EnumValue, FunctionType, NamedValue,
    PointerType, RecordType, Type, TypeExtra, TypeId, TypeKind, ValueRange,
};

/// Marker error: details are in the diagnostic sink.
#[derive(Debug, Error)]
#[error("analysis failed")]
pub struct AnalysisFailed;

/// Why a single type resolution failed.
///
/// `MissingSymbol` may be transient during the phase-3 fixpoint; all
/// other failures are definitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ResolveError {
    MissingSymbol,
    Generic,
}

/// Analyzes a parsed declaration list into a [`Document`].
///
/// # Examples
///
/// ```
/// use apigen_par::{ParseOptions, Parser};
/// use apigen_sem::analyze;
/// use apigen_util::Handler;
///
/// let handler = Handler::new();
/// let parsed = Parser::new("type Id = u32;", &ParseOptions::default(), &handler).parse();
/// let document = analyze(&parsed.declarations, "demo.api", &handler).unwrap();
/// assert_eq!(document.types.len(), 1);
/// ```
pub fn analyze(
    declarations: &[Declaration],
    file_name: &str,
    handler: &Handler,
) -> Result<Document, AnalysisFailed> {
    Analyzer {
        declarations,
        file_name,
        handler,
        pool: TypePool::new(),
        queue: VecDeque::new(),
        associated: vec![None; declarations.len()],
    }
    .run()
}

struct Analyzer<'a> {
    declarations: &'a [Declaration],
    file_name: &'a str,
    handler: &'a Handler,
    pool: TypePool,
    /// Anonymous unique types found inline, waiting for phase 9
    queue: VecDeque<(TypeId, &'a TypeExpr)>,
    /// Resolved id per declaration slot; only type declarations use it
    associated: Vec<Option<TypeId>>,
}

impl<'a> Analyzer<'a> {
    fn run(mut self) -> Result<Document, AnalysisFailed> {
        // Phase 1: count declarations per kind.
        let mut type_count = 0;
        let mut variable_count = 0;
        let mut constant_count = 0;
        let mut function_count = 0;
        for decl in self.declarations {
            match decl.kind {
                DeclarationKind::Const | DeclarationKind::Var => variable_count += 1,
                DeclarationKind::Constexpr => constant_count += 1,
                DeclarationKind::Fn => function_count += 1,
                DeclarationKind::Type => type_count += 1,
            }
        }
        let mut types = Vec::with_capacity(type_count);
        let mut variables = Vec::with_capacity(variable_count);
        let mut constants = Vec::with_capacity(constant_count);
        let mut functions = Vec::with_capacity(function_count);

        self.publish_named_unique_types()?;
        self.resolve_global_types()?;
        self.resolve_named_unique_payloads()?;

        // Phase 5: commit declared types in source order.
        for (index, decl) in self.declarations.iter().enumerate() {
            if decl.kind == DeclarationKind::Type {
                let id = self.associated[index]
                    .unwrap_or_else(|| panic!("type '{}' survived phase 3 unresolved", decl.name));
                types.push(id);
            }
        }

        self.resolve_globals(&mut variables)?;
        self.resolve_functions(&mut functions)?;
        self.resolve_constants(&mut constants)?;
        self.drain_anonymous_types(&mut types)?;

        Ok(Document {
            pool: self.pool,
            types,
            variables,
            constants,
            functions,
        })
    }

    fn emit(&self, code: DiagnosticCode, span: Span, message: impl Into<String>) {
        self.handler.emit_at(code, self.file_name, span, message);
    }

    // =========================================================================
    // Phase 2: named unique types
    // =========================================================================

    fn publish_named_unique_types(&mut self) -> Result<(), AnalysisFailed> {
        let declarations = self.declarations;
        let mut ok = true;
        for (index, decl) in declarations.iter().enumerate() {
            if decl.kind != DeclarationKind::Type || !decl.ty.kind.is_unique() {
                continue;
            }
            let id = self.pool.alloc(Type {
                kind: unique_type_kind(&decl.ty.kind),
                name: Some(decl.name.clone()),
                is_anonymous: false,
                extra: TypeExtra::None,
            });
            if self.pool.register(id, None) {
                self.associated[index] = Some(id);
            } else {
                self.emit(
                    DiagnosticCode::DUPLICATE_SYMBOL,
                    decl.span,
                    format!("duplicate symbol '{}'", decl.name),
                );
                ok = false;
            }
        }
        if ok {
            Ok(())
        } else {
            Err(AnalysisFailed)
        }
    }

    // =========================================================================
    // Phase 3: non-unique type declarations, to a fixpoint
    // =========================================================================

    fn resolve_global_types(&mut self) -> Result<(), AnalysisFailed> {
        let declarations = self.declarations;
        let mut emit_resolve_errors = false;
        let mut resolve_failed_count;
        let mut non_resolve_error;

        loop {
            let mut resolved_count = 0;
            resolve_failed_count = 0;
            non_resolve_error = false;

            for (index, decl) in declarations.iter().enumerate() {
                if decl.kind != DeclarationKind::Type || self.associated[index].is_some() {
                    continue;
                }
                debug_assert!(!decl.ty.kind.is_unique());

                match self.resolve_type(emit_resolve_errors, &decl.name, &decl.ty) {
                    Ok(id) => {
                        let named = self.name_or_alias(id, &decl.name);
                        if self.pool.register(named, None) {
                            self.associated[index] = Some(named);
                            resolved_count += 1;
                        } else {
                            self.emit(
                                DiagnosticCode::DUPLICATE_SYMBOL,
                                decl.span,
                                format!("duplicate symbol '{}'", decl.name),
                            );
                            non_resolve_error = true;
                        }
                    }
                    Err(ResolveError::Generic) => {
                        resolve_failed_count += 1;
                        non_resolve_error = true;
                    }
                    Err(ResolveError::MissingSymbol) => {
                        resolve_failed_count += 1;
                    }
                }
            }

            if resolved_count == 0 {
                if emit_resolve_errors {
                    break;
                }
                emit_resolve_errors = true;
            }
            if non_resolve_error {
                break;
            }
        }

        if non_resolve_error {
            return Err(AnalysisFailed);
        }
        if resolve_failed_count > 0 {
            // Cycles and undeclared names are indistinguishable here.
            self.emit(
                DiagnosticCode::UNRESOLVED_SYMBOLS,
                Span::DUMMY,
                format!("{resolve_failed_count} cyclic dependencies or undeclared types remaining"),
            );
            return Err(AnalysisFailed);
        }
        Ok(())
    }

    /// Gives a freshly interned type its declared name, or mints an alias
    /// when the resolved type is a builtin or already carries a name.
    fn name_or_alias(&mut self, id: TypeId, name: &str) -> TypeId {
        let ty = self.pool.get(id);
        if ty.name.is_none() && !ty.kind.is_builtin() {
            self.pool.get_mut(id).name = Some(name.to_string());
            id
        } else {
            self.pool.alloc(Type {
                kind: TypeKind::Alias,
                name: Some(name.to_string()),
                is_anonymous: false,
                extra: TypeExtra::Alias(id),
            })
        }
    }

    // =========================================================================
    // Type resolution
    // =========================================================================

    /// Resolves one type expression against the pool.
    ///
    /// `prefix` seeds the display name of any inline unique type found
    /// underneath; nested field resolution passes `<parent>_<field>`.
    /// Missing-symbol diagnostics are gated on `emit_resolve_errors` so
    /// the phase-3 fixpoint can retry silently.
    fn resolve_type(
        &mut self,
        emit_resolve_errors: bool,
        prefix: &str,
        src: &'a TypeExpr,
    ) -> Result<TypeId, ResolveError> {
        match &src.kind {
            TypeExprKind::Named(name) => match self.pool.lookup(name) {
                Some(id) => Ok(id),
                None => {
                    if emit_resolve_errors {
                        self.emit(
                            DiagnosticCode::UNDECLARED_IDENTIFIER,
                            src.span,
                            format!("use of undeclared identifier '{name}'"),
                        );
                    }
                    Err(ResolveError::MissingSymbol)
                }
            },

            TypeExprKind::Pointer(ptr) => {
                let underlying = self.resolve_type(emit_resolve_errors, prefix, &ptr.underlying)?;
                let kind = pointer_type_kind(ptr.size, ptr.is_const, ptr.is_optional);
                let sentinel = ptr.sentinel.clone().unwrap_or(Value::Null);
                Ok(self.pool.intern(
                    kind,
                    TypeExtra::Pointer(PointerType {
                        underlying,
                        sentinel,
                    }),
                ))
            }

            TypeExprKind::Array { size, elem } => {
                let underlying = self.resolve_type(emit_resolve_errors, prefix, elem)?;
                let Some(size) = size.as_uint() else {
                    self.emit(
                        DiagnosticCode::ARRAY_SIZE_NOT_UINT,
                        src.span,
                        "array size must be an unsigned integer literal",
                    );
                    return Err(ResolveError::Generic);
                };
                Ok(self
                    .pool
                    .intern(TypeKind::Array, TypeExtra::Array(ArrayType { size, underlying })))
            }

            TypeExprKind::Function { ret, params } => {
                let return_type = self.resolve_type(emit_resolve_errors, prefix, ret)?;
                let mut parameters: Vec<NamedValue> = Vec::with_capacity(params.len());
                let mut duplicate_parameter = false;
                for param in params {
                    if parameters.iter().any(|p| p.name == param.name) {
                        self.emit(
                            DiagnosticCode::DUPLICATE_PARAMETER,
                            param.span,
                            format!("duplicate parameter '{}'", param.name),
                        );
                        duplicate_parameter = true;
                    }
                    let ty = self.resolve_type(emit_resolve_errors, prefix, &param.ty)?;
                    parameters.push(NamedValue {
                        documentation: param.documentation.clone(),
                        name: param.name.clone(),
                        ty,
                    });
                }
                if duplicate_parameter {
                    return Err(ResolveError::Generic);
                }
                Ok(self.pool.intern(
                    TypeKind::Function,
                    TypeExtra::Function(FunctionType {
                        return_type,
                        parameters,
                    }),
                ))
            }

            // An inline unique type: mint a synthetic name, queue it for
            // phase 9, and hand back the empty shell.
            other => {
                debug_assert!(other.is_unique());
                let name = format!("{}_{}", prefix, unique_type_suffix(other));
                let id = self.pool.alloc(Type {
                    kind: unique_type_kind(other),
                    name: Some(name),
                    is_anonymous: true,
                    extra: TypeExtra::None,
                });
                self.queue.push_back((id, src));
                Ok(id)
            }
        }
    }

    // =========================================================================
    // Phase 4 and phase 9: unique type payloads
    // =========================================================================

    fn resolve_named_unique_payloads(&mut self) -> Result<(), AnalysisFailed> {
        let declarations = self.declarations;
        let mut ok = true;
        for (index, decl) in declarations.iter().enumerate() {
            if decl.kind != DeclarationKind::Type || !decl.ty.kind.is_unique() {
                continue;
            }
            let id = self.associated[index]
                .unwrap_or_else(|| panic!("unique type '{}' was not published", decl.name));
            if !self.resolve_unique_type(id, &decl.ty) {
                ok = false;
            }
        }
        if ok {
            Ok(())
        } else {
            Err(AnalysisFailed)
        }
    }

    fn resolve_unique_type(&mut self, dst: TypeId, src: &'a TypeExpr) -> bool {
        match &src.kind {
            TypeExprKind::Struct { fields } | TypeExprKind::Union { fields } => {
                self.analyze_record(dst, fields, src.span)
            }
            TypeExprKind::Enum { backing, items } => {
                self.analyze_enum(dst, backing.as_deref(), items, src.span)
            }
            // Opaque types have no payload; they are complete already.
            TypeExprKind::Opaque => true,
            other => panic!("resolve_unique_type on non-unique {other:?}"),
        }
    }

    fn analyze_record(&mut self, dst: TypeId, src_fields: &'a [FieldExpr], span: Span) -> bool {
        let mut ok = true;
        let dst_name = self.pool.get(dst).name.clone().unwrap_or_default();

        if src_fields.is_empty() {
            self.emit(
                DiagnosticCode::STRUCT_EMPTY,
                span,
                "struct or union has no fields",
            );
        }

        let mut fields: Vec<NamedValue> = Vec::with_capacity(src_fields.len());
        for field in src_fields {
            if fields.iter().any(|f| f.name == field.name) {
                self.emit(
                    DiagnosticCode::DUPLICATE_FIELD,
                    field.span,
                    format!("duplicate field '{}'", field.name),
                );
            }
            let prefix = format!("{}_{}", dst_name, field.name);
            match self.resolve_type(true, &prefix, &field.ty) {
                Ok(ty) => fields.push(NamedValue {
                    documentation: field.documentation.clone(),
                    name: field.name.clone(),
                    ty,
                }),
                Err(_) => ok = false,
            }
        }

        self.pool.get_mut(dst).extra = TypeExtra::Record(RecordType { fields });
        ok
    }

    fn analyze_enum(
        &mut self,
        dst: TypeId,
        backing: Option<&'a TypeExpr>,
        items: &'a [EnumItemExpr],
        span: Span,
    ) -> bool {
        let mut ok = true;
        let dst_name = self.pool.get(dst).name.clone().unwrap_or_default();

        let mut int_range = ValueRange { min: 0, max: 0 };
        let mut underlying: Option<TypeId> = None;

        if let Some(backing_expr) = backing {
            match self.resolve_type(true, &dst_name, backing_expr) {
                Ok(id) => {
                    let kind = self.pool.get(self.pool.unalias(id)).kind;
                    if kind.is_integer() {
                        int_range = integer_range(kind);
                        if !int_range.is_valid() {
                            self.emit(
                                DiagnosticCode::ENUM_INT_UNDEFINED,
                                backing_expr.span,
                                format!(
                                    "enum backing type '{}' has a platform-defined range",
                                    kind.display_str()
                                ),
                            );
                        }
                        underlying = Some(id);
                    } else {
                        // Continue with auto-deduction to surface more errors.
                        self.emit(
                            DiagnosticCode::ENUM_TYPE_MUST_BE_INT,
                            backing_expr.span,
                            "enum backing type must be an integer",
                        );
                        ok = false;
                    }
                }
                Err(_) => ok = false,
            }
        }

        if items.is_empty() {
            self.emit(DiagnosticCode::ENUM_EMPTY, span, "enum has no items");
            return false;
        }

        let underlying_kind = underlying.map(|id| self.pool.get(self.pool.unalias(id)).kind);
        let mut value_is_signed = underlying_kind.map_or(false, |k| !k.is_unsigned_integer());
        // The running value is tracked as a bit pattern; `value_is_signed`
        // says how to read it.
        let mut current: u64 = 0;
        let mut observed = ValueRange::OBSERVED_INIT;
        let mut committed: Vec<EnumItem> = Vec::with_capacity(items.len());

        for item in items {
            if committed.iter().any(|it| it.name == item.name) {
                self.emit(
                    DiagnosticCode::DUPLICATE_ENUM_ITEM,
                    item.span,
                    format!("duplicate enum item '{}'", item.name),
                );
            }

            let mut skip_range_check = false;
            match &item.value {
                Value::Null => {
                    // No literal: the running value carries over.
                }
                Value::Str(_) => {
                    self.emit(
                        DiagnosticCode::ENUM_VALUE_ILLEGAL,
                        item.span,
                        format!("enum item '{}' has a non-integer value", item.name),
                    );
                }
                Value::Sint(v) => {
                    if underlying_kind.is_some_and(|k| k.is_unsigned_integer()) {
                        self.emit(
                            DiagnosticCode::ENUM_OUT_OF_RANGE,
                            item.span,
                            format!("value {} of enum item '{}' is out of range", v, item.name),
                        );
                        skip_range_check = true;
                    } else {
                        value_is_signed = true;
                        current = *v as u64;
                    }
                }
                Value::Uint(v) => {
                    if value_is_signed && *v > i64::MAX as u64 {
                        self.emit(
                            DiagnosticCode::ENUM_OUT_OF_RANGE,
                            item.span,
                            format!("value {} of enum item '{}' is out of range", v, item.name),
                        );
                        skip_range_check = true;
                    } else {
                        current = *v;
                    }
                }
            }

            if !skip_range_check && int_range.is_valid() {
                let in_range = if value_is_signed {
                    int_range.contains_signed(current as i64)
                } else {
                    int_range.contains_unsigned(current)
                };
                if !in_range {
                    self.emit(
                        DiagnosticCode::ENUM_OUT_OF_RANGE,
                        item.span,
                        format!(
                            "value {} of enum item '{}' is out of range",
                            show_current(current, value_is_signed),
                            item.name
                        ),
                    );
                }
            }

            // Bit-pattern comparison: signed and unsigned values with the
            // same bits collide in the emitted enum.
            if let Some(existing) = committed.iter().find(|it| it.value.bit_pattern() == current) {
                self.emit(
                    DiagnosticCode::DUPLICATE_ENUM_VALUE,
                    item.span,
                    format!(
                        "value {} of enum item '{}' is already used by '{}'",
                        show_current(current, value_is_signed),
                        item.name,
                        existing.name
                    ),
                );
            }

            let value = if value_is_signed {
                EnumValue::Signed(current as i64)
            } else {
                EnumValue::Unsigned(current)
            };
            match value {
                EnumValue::Signed(v) => observed.insert_signed(v),
                EnumValue::Unsigned(v) => observed.insert_unsigned(v),
            }
            committed.push(EnumItem {
                documentation: item.documentation.clone(),
                name: item.name.clone(),
                value,
            });
            current = current.wrapping_add(1);
        }

        let underlying = underlying.unwrap_or_else(|| {
            self.pool.builtin(deduce_enum_width(observed))
        });

        self.pool.get_mut(dst).extra = TypeExtra::Enum(EnumType {
            underlying,
            items: committed,
        });
        ok
    }

    // =========================================================================
    // Phase 6: globals
    // =========================================================================

    fn resolve_globals(&mut self, variables: &mut Vec<Global>) -> Result<(), AnalysisFailed> {
        let declarations = self.declarations;
        let mut ok = true;
        for decl in declarations {
            if !matches!(decl.kind, DeclarationKind::Const | DeclarationKind::Var) {
                continue;
            }
            match self.resolve_type(true, &decl.name, &decl.ty) {
                Ok(ty) => variables.push(Global {
                    documentation: decl.documentation.clone(),
                    name: decl.name.clone(),
                    ty,
                    is_const: decl.kind == DeclarationKind::Const,
                }),
                Err(_) => ok = false,
            }
        }
        if ok {
            Ok(())
        } else {
            Err(AnalysisFailed)
        }
    }

    // =========================================================================
    // Phase 7: functions
    // =========================================================================

    fn resolve_functions(&mut self, functions: &mut Vec<Function>) -> Result<(), AnalysisFailed> {
        let declarations = self.declarations;
        let mut ok = true;
        for decl in declarations {
            if decl.kind != DeclarationKind::Fn {
                continue;
            }
            match self.resolve_type(true, &decl.name, &decl.ty) {
                Ok(ty) => {
                    assert_eq!(
                        self.pool.get(ty).kind,
                        TypeKind::Function,
                        "fn declaration resolved to a non-function type"
                    );
                    functions.push(Function {
                        documentation: decl.documentation.clone(),
                        name: decl.name.clone(),
                        ty,
                    });
                }
                Err(_) => ok = false,
            }
        }
        if ok {
            Ok(())
        } else {
            Err(AnalysisFailed)
        }
    }

    // =========================================================================
    // Phase 8: constexpr constants
    // =========================================================================

    fn resolve_constants(&mut self, constants: &mut Vec<Constant>) -> Result<(), AnalysisFailed> {
        let declarations = self.declarations;
        let mut ok = true;
        for decl in declarations {
            if decl.kind != DeclarationKind::Constexpr {
                continue;
            }
            match self.resolve_type(true, &decl.name, &decl.ty) {
                Ok(ty) => {
                    if !self.check_constant_value(decl, ty) {
                        ok = false;
                    }
                    constants.push(Constant {
                        documentation: decl.documentation.clone(),
                        name: decl.name.clone(),
                        ty,
                        value: decl.value.clone(),
                    });
                }
                Err(_) => ok = false,
            }
        }
        if ok {
            Ok(())
        } else {
            Err(AnalysisFailed)
        }
    }

    fn check_constant_value(&mut self, decl: &Declaration, ty: TypeId) -> bool {
        if decl.value.is_null() {
            self.emit(
                DiagnosticCode::CONSTEXPR_TYPE_MISMATCH,
                decl.span,
                format!("value of constexpr '{}' does not match its type", decl.name),
            );
            return false;
        }

        let kind = self.pool.get(self.pool.unalias(ty)).kind;
        if kind.is_integer() {
            let range = integer_range(kind);
            if !range.is_valid() {
                self.emit(
                    DiagnosticCode::CONSTEXPR_UNCHECKED,
                    decl.span,
                    format!("range of constexpr '{}' cannot be checked", decl.name),
                );
                return true;
            }
            match &decl.value {
                Value::Sint(v) if !range.contains_signed(*v) => {
                    self.emit(
                        DiagnosticCode::CONSTEXPR_OUT_OF_RANGE,
                        decl.span,
                        format!("value of constexpr '{}' is out of range", decl.name),
                    );
                    false
                }
                Value::Uint(v) if !range.contains_unsigned(*v) => {
                    self.emit(
                        DiagnosticCode::CONSTEXPR_OUT_OF_RANGE,
                        decl.span,
                        format!("value of constexpr '{}' is out of range", decl.name),
                    );
                    false
                }
                Value::Sint(_) | Value::Uint(_) => true,
                _ => {
                    self.emit(
                        DiagnosticCode::CONSTEXPR_TYPE_MISMATCH,
                        decl.span,
                        format!("value of constexpr '{}' does not match its type", decl.name),
                    );
                    false
                }
            }
        } else if is_stringly(kind) {
            if decl.value.as_str().is_some() {
                true
            } else {
                self.emit(
                    DiagnosticCode::CONSTEXPR_TYPE_MISMATCH,
                    decl.span,
                    format!("value of constexpr '{}' does not match its type", decl.name),
                );
                false
            }
        } else {
            self.emit(
                DiagnosticCode::CONSTEXPR_ILLEGAL_TYPE,
                decl.span,
                format!(
                    "constexpr '{}' has a type that cannot hold a literal value",
                    decl.name
                ),
            );
            false
        }
    }

    // =========================================================================
    // Phase 9: anonymous types
    // =========================================================================

    fn drain_anonymous_types(&mut self, types: &mut Vec<TypeId>) -> Result<(), AnalysisFailed> {
        let mut ok = true;
        // Resolution may enqueue further nested types; pop until dry and
        // append in completion order.
        while let Some((id, src)) = self.queue.pop_front() {
            if !self.resolve_unique_type(id, src) {
                ok = false;
            }
            types.push(id);
        }
        if ok {
            Ok(())
        } else {
            Err(AnalysisFailed)
        }
    }
}

fn show_current(current: u64, signed: bool) -> String {
    if signed {
        (current as i64).to_string()
    } else {
        current.to_string()
    }
}

fn unique_type_kind(kind: &TypeExprKind) -> TypeKind {
    match kind {
        TypeExprKind::Enum { .. } => TypeKind::Enum,
        TypeExprKind::Struct { .. } => TypeKind::Struct,
        TypeExprKind::Union { .. } => TypeKind::Union,
        TypeExprKind::Opaque => TypeKind::Opaque,
        other => panic!("{other:?} is not a unique type kind"),
    }
}

fn unique_type_suffix(kind: &TypeExprKind) -> &'static str {
    match kind {
        TypeExprKind::Enum { .. } => "enum",
        TypeExprKind::Struct { .. } => "struct",
        TypeExprKind::Union { .. } => "union",
        TypeExprKind::Opaque => "opaque",
        other => panic!("{other:?} is not a unique type kind"),
    }
}

fn pointer_type_kind(size: PointerSize, is_const: bool, is_optional: bool) -> TypeKind {
    match (size, is_const, is_optional) {
        (PointerSize::One, false, false) => TypeKind::PtrToOne,
        (PointerSize::One, false, true) => TypeKind::NullablePtrToOne,
        (PointerSize::One, true, false) => TypeKind::ConstPtrToOne,
        (PointerSize::One, true, true) => TypeKind::NullableConstPtrToOne,
        (PointerSize::Many, false, false) => TypeKind::PtrToMany,
        (PointerSize::Many, false, true) => TypeKind::NullablePtrToMany,
        (PointerSize::Many, true, false) => TypeKind::ConstPtrToMany,
        (PointerSize::Many, true, true) => TypeKind::NullableConstPtrToMany,
        (PointerSize::SentinelledMany, false, false) => TypeKind::PtrToSentinelledMany,
        (PointerSize::SentinelledMany, false, true) => TypeKind::NullablePtrToSentinelledMany,
        (PointerSize::SentinelledMany, true, false) => TypeKind::ConstPtrToSentinelledMany,
        (PointerSize::SentinelledMany, true, true) => TypeKind::NullableConstPtrToSentinelledMany,
    }
}

/// `const` many-pointers accept string constants.
fn is_stringly(kind: TypeKind) -> bool {
    matches!(
        kind,
        TypeKind::ConstPtrToMany
            | TypeKind::ConstPtrToSentinelledMany
            | TypeKind::NullableConstPtrToMany
            | TypeKind::NullableConstPtrToSentinelledMany
    )
}

/// The narrowest fixed-width type containing the observed range.
fn deduce_enum_width(observed: ValueRange) -> TypeKind {
    if observed.min < 0 {
        if observed.min >= i8::MIN as i64 && observed.max <= i8::MAX as u64 {
            TypeKind::I8
        } else if observed.min >= i16::MIN as i64 && observed.max <= i16::MAX as u64 {
            TypeKind::I16
        } else if observed.min >= i32::MIN as i64 && observed.max <= i32::MAX as u64 {
            TypeKind::I32
        } else {
            TypeKind::I64
        }
    } else if observed.max <= u8::MAX as u64 {
        TypeKind::U8
    } else if observed.max <= u16::MAX as u64 {
        TypeKind::U16
    } else if observed.max <= u32::MAX as u64 {
        TypeKind::U32
    } else {
        TypeKind::U64
    }
}
