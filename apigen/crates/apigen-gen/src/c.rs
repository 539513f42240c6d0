//! The C backend.
//!
//! Rendering runs in stages: file header, declaration ordering, forward
//! declarations, typedefs, globals, `#define` constants, prototypes, and
//! the closing guard. The ordering stage exists because C requires every
//! *hard* dependency (array elements, fields, function signatures, alias
//! targets, primitives) to be fully declared before use, while a *weak*
//! dependency (through a pointer) is satisfied by a forward declaration.
//!
//! A cycle of hard dependencies cannot be rendered and indicates an
//! analyzer bug; the ordering pass panics on one.

use std::io::{self, Write};

use apigen_sem::types::FunctionType;
use apigen_sem::{Document, TypeExtra, TypeId, TypeKind, TypePool};
use apigen_util::Value;

use crate::{write_docstring, write_indent, RenderError, Renderer};

/// The C header backend.
pub struct CRenderer;

impl Renderer for CRenderer {
    fn render(&self, document: &Document, out: &mut dyn Write) -> Result<(), RenderError> {
        let writer = CWriter {
            pool: &document.pool,
        };
        writer.render_document(document, out)?;
        Ok(())
    }
}

/// The C++ backend stub; the C header is already consumable from C++
/// through its `extern "C"` block.
pub struct CppRenderer;

impl Renderer for CppRenderer {
    fn render(&self, _document: &Document, _out: &mut dyn Write) -> Result<(), RenderError> {
        Err(RenderError::Unsupported("c++"))
    }
}

/// Reserved words that may not be used verbatim as C identifiers:
/// the keyword list plus the common `<stdbool.h>`-style aliases.
const RESERVED_IDENTIFIERS: &[&str] = &[
    // true keywords
    "alignas",
    "alignof",
    "auto",
    "bool",
    "break",
    "case",
    "char",
    "const",
    "constexpr",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extern",
    "false",
    "float",
    "for",
    "goto",
    "if",
    "inline",
    "int",
    "long",
    "nullptr",
    "register",
    "restrict",
    "return",
    "short",
    "signed",
    "sizeof",
    "static",
    "static_assert",
    "struct",
    "switch",
    "thread_local",
    "true",
    "typedef",
    "typeof",
    "typeof_unqual",
    "union",
    "unsigned",
    "void",
    "volatile",
    "while",
    "_Alignas",
    "_Alignof",
    "_Atomic",
    "_BitInt",
    "_Bool",
    "_Complex",
    "_Decimal128",
    "_Decimal32",
    "_Decimal64",
    "_Generic",
    "_Imaginary",
    "_Noreturn",
    "_Static_assert",
    "_Thread_local",
    // typical aliases
    "complex",
    "imaginary",
    "noreturn",
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum RenderMode {
    /// The type is referred to by name where possible
    Reference,
    /// The type's full definition is spelled out
    Instance,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum IdentTransform {
    Keep,
    Uppercase,
    Lowercase,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DeclKind {
    Regular,
    Const,
}

fn is_reserved(identifier: &str) -> bool {
    let bytes = identifier.as_bytes();
    // Leading underscore followed by another underscore or an uppercase
    // letter lands in C's reserved namespace.
    if bytes.len() > 2 && bytes[0] == b'_' && (bytes[1] == b'_' || bytes[1].is_ascii_uppercase()) {
        return true;
    }
    RESERVED_IDENTIFIERS.contains(&identifier)
}

/// Writes an identifier, escaping reserved words with a trailing `_`.
///
/// # Panics
///
/// Panics when a reserved word lands in a position that requires the
/// exact spelling (a declaration); such a name must be rejected before
/// rendering.
fn write_identifier(
    out: &mut dyn Write,
    transform: IdentTransform,
    identifier: &str,
    exact_match: bool,
) -> io::Result<()> {
    let reserved = is_reserved(identifier);
    match transform {
        IdentTransform::Keep => write!(out, "{identifier}")?,
        IdentTransform::Uppercase => write!(out, "{}", identifier.to_ascii_uppercase())?,
        IdentTransform::Lowercase => write!(out, "{}", identifier.to_ascii_lowercase())?,
    }
    if reserved {
        if exact_match {
            panic!("used unrecoverable reserved identifier '{identifier}'");
        }
        write!(out, "_")?;
    }
    Ok(())
}

fn write_value(out: &mut dyn Write, value: &Value) -> io::Result<()> {
    match value {
        Value::Null => write!(out, "NULL"),
        Value::Sint(v) => write!(out, "{v}"),
        Value::Uint(v) => write!(out, "{v}"),
        Value::Str(s) => write!(out, "\"{s}\""),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DepStrength {
    /// Must be fully declared before use
    Hard,
    /// A forward declaration satisfies the reference
    Weak,
}

struct TypeOrderEntry {
    ty: TypeId,
    requires_forward_decl: bool,
    dependencies: Vec<(TypeId, DepStrength)>,
}

struct CWriter<'a> {
    pool: &'a TypePool,
}

impl<'a> CWriter<'a> {
    fn type_name(&self, ty: TypeId) -> &str {
        self.pool
            .get(ty)
            .name
            .as_deref()
            .unwrap_or_else(|| panic!("document type without a display name"))
    }

    // =========================================================================
    // Type spelling
    // =========================================================================

    fn write_declaration(
        &self,
        out: &mut dyn Write,
        kind: DeclKind,
        identifier: &str,
        transform: IdentTransform,
        ty: TypeId,
        mode: RenderMode,
        indent: usize,
    ) -> io::Result<()> {
        self.write_type_prefix(out, ty, mode, indent)?;
        match kind {
            DeclKind::Regular => write!(out, " ")?,
            DeclKind::Const => write!(out, " const ")?,
        }
        write_identifier(out, transform, identifier, true)?;
        self.write_type_suffix(out, ty, mode, indent)
    }

    fn write_type_prefix(
        &self,
        out: &mut dyn Write,
        ty: TypeId,
        mode: RenderMode,
        indent: usize,
    ) -> io::Result<()> {
        let t = self.pool.get(ty);

        if mode == RenderMode::Reference {
            if let Some(name) = &t.name {
                match t.kind {
                    TypeKind::Struct => write!(out, "struct ")?,
                    TypeKind::Union => write!(out, "union ")?,
                    _ => {}
                }
                return write_identifier(out, IdentTransform::Keep, name, false);
            }
        }

        match t.kind {
            TypeKind::Void => write!(out, "void"),
            TypeKind::Anyopaque => write!(out, "void"),
            // Opaque types are declared void and get named void-pointers.
            TypeKind::Opaque => write!(out, "void"),
            TypeKind::Bool => write!(out, "bool"),
            TypeKind::Uchar => write!(out, "unsigned char"),
            TypeKind::Ichar => write!(out, "signed char"),
            TypeKind::Char => write!(out, "char"),

            TypeKind::U8 => write!(out, "uint8_t"),
            TypeKind::U16 => write!(out, "uint16_t"),
            TypeKind::U32 => write!(out, "uint32_t"),
            TypeKind::U64 => write!(out, "uint64_t"),
            TypeKind::Usize => write!(out, "uintptr_t"),
            TypeKind::CUshort => write!(out, "unsigned short"),
            TypeKind::CUint => write!(out, "unsigned int"),
            TypeKind::CUlong => write!(out, "unsigned long"),
            TypeKind::CUlonglong => write!(out, "unsigned long long"),

            TypeKind::I8 => write!(out, "int8_t"),
            TypeKind::I16 => write!(out, "int16_t"),
            TypeKind::I32 => write!(out, "int32_t"),
            TypeKind::I64 => write!(out, "int64_t"),
            TypeKind::Isize => write!(out, "intptr_t"),
            TypeKind::CShort => write!(out, "short"),
            TypeKind::CInt => write!(out, "int"),
            TypeKind::CLong => write!(out, "long"),
            TypeKind::CLonglong => write!(out, "long long"),

            TypeKind::F32 => write!(out, "float"),
            TypeKind::F64 => write!(out, "double"),

            TypeKind::PtrToOne
            | TypeKind::PtrToMany
            | TypeKind::PtrToSentinelledMany
            | TypeKind::NullablePtrToOne
            | TypeKind::NullablePtrToMany
            | TypeKind::NullablePtrToSentinelledMany => {
                let pointer = self.pointer_extra(ty);
                self.write_type_prefix(out, pointer, RenderMode::Reference, indent)?;
                write!(out, " *")
            }

            TypeKind::ConstPtrToOne
            | TypeKind::ConstPtrToMany
            | TypeKind::ConstPtrToSentinelledMany
            | TypeKind::NullableConstPtrToOne
            | TypeKind::NullableConstPtrToMany
            | TypeKind::NullableConstPtrToSentinelledMany => {
                let pointer = self.pointer_extra(ty);
                self.write_type_prefix(out, pointer, RenderMode::Reference, indent)?;
                if self.pool.get(self.pool.unalias(pointer)).kind == TypeKind::Function {
                    // A const pointer-to-function cannot exist in C.
                    write!(out, " *")
                } else {
                    write!(out, " const *")
                }
            }

            TypeKind::Array => {
                let TypeExtra::Array(array) = &t.extra else {
                    panic!("array type without payload");
                };
                self.write_type_prefix(out, array.underlying, RenderMode::Reference, indent)
            }

            TypeKind::Function => {
                let TypeExtra::Function(func) = &t.extra else {
                    panic!("function type without payload");
                };
                self.write_type_prefix(out, func.return_type, RenderMode::Reference, indent)?;
                self.write_type_suffix(out, func.return_type, RenderMode::Reference, indent)?;
                write!(out, " (")
            }

            TypeKind::Enum => {
                let TypeExtra::Enum(enumeration) = &t.extra else {
                    panic!("enum type without payload");
                };
                let type_name = self.type_name(ty);
                writeln!(out, "enum {{")?;
                for item in &enumeration.items {
                    if let Some(doc) = &item.documentation {
                        write_docstring(out, indent + 1, doc)?;
                    }
                    write_indent(out, indent + 1)?;
                    write_identifier(out, IdentTransform::Uppercase, type_name, false)?;
                    write!(out, "_")?;
                    write_identifier(out, IdentTransform::Uppercase, &item.name, false)?;
                    writeln!(out, " = {},", item.value)?;
                }
                write_indent(out, indent)?;
                write!(out, "}}")
            }

            TypeKind::Struct | TypeKind::Union => {
                let TypeExtra::Record(record) = &t.extra else {
                    panic!("struct/union type without payload");
                };
                if t.kind == TypeKind::Struct {
                    write!(out, "struct ")?;
                } else {
                    write!(out, "union ")?;
                }
                write_identifier(out, IdentTransform::Keep, self.type_name(ty), true)?;
                writeln!(out, "{{")?;
                for field in &record.fields {
                    if let Some(doc) = &field.documentation {
                        write_docstring(out, indent + 1, doc)?;
                    }
                    write_indent(out, indent + 1)?;
                    self.write_declaration(
                        out,
                        DeclKind::Regular,
                        &field.name,
                        IdentTransform::Lowercase,
                        field.ty,
                        RenderMode::Reference,
                        indent + 1,
                    )?;
                    writeln!(out, ";")?;
                }
                write_indent(out, indent)?;
                write!(out, "}}")
            }

            TypeKind::Alias => {
                let TypeExtra::Alias(target) = t.extra else {
                    panic!("alias type without payload");
                };
                self.write_type_prefix(out, target, RenderMode::Reference, indent)
            }
        }
    }

    fn write_type_suffix(
        &self,
        out: &mut dyn Write,
        ty: TypeId,
        mode: RenderMode,
        indent: usize,
    ) -> io::Result<()> {
        let t = self.pool.get(ty);

        if mode == RenderMode::Reference && t.name.is_some() {
            return Ok(());
        }

        match t.kind {
            kind if kind.is_pointer() => {
                let pointer = self.pointer_extra(ty);
                self.write_type_suffix(out, pointer, RenderMode::Reference, indent)
            }

            TypeKind::Array => {
                let TypeExtra::Array(array) = &t.extra else {
                    panic!("array type without payload");
                };
                self.write_type_suffix(out, array.underlying, RenderMode::Reference, indent)?;
                write!(out, "[{}]", array.size)
            }

            TypeKind::Function => {
                let TypeExtra::Function(func) = &t.extra else {
                    panic!("function type without payload");
                };
                write!(out, ") ")?;
                self.write_parameter_list(out, func, indent)
            }

            TypeKind::Alias => {
                let TypeExtra::Alias(target) = t.extra else {
                    panic!("alias type without payload");
                };
                self.write_type_suffix(out, target, RenderMode::Reference, indent)
            }

            _ => Ok(()),
        }
    }

    fn write_parameter_list(
        &self,
        out: &mut dyn Write,
        func: &FunctionType,
        indent: usize,
    ) -> io::Result<()> {
        writeln!(out, "(")?;
        for (index, param) in func.parameters.iter().enumerate() {
            if let Some(doc) = &param.documentation {
                write_docstring(out, indent + 1, doc)?;
            }
            write_indent(out, indent + 1)?;
            self.write_declaration(
                out,
                DeclKind::Regular,
                &param.name,
                IdentTransform::Lowercase,
                param.ty,
                RenderMode::Reference,
                indent + 1,
            )?;
            if index + 1 == func.parameters.len() {
                writeln!(out)?;
            } else {
                writeln!(out, ",")?;
            }
        }
        write_indent(out, indent)?;
        write!(out, ") ")
    }

    fn pointer_extra(&self, ty: TypeId) -> TypeId {
        match &self.pool.get(ty).extra {
            TypeExtra::Pointer(pointer) => pointer.underlying,
            other => panic!("pointer type with payload {other:?}"),
        }
    }

    // =========================================================================
    // Declaration ordering
    // =========================================================================

    fn add_dependency(
        entry: &mut TypeOrderEntry,
        ty: TypeId,
        strength: DepStrength,
    ) {
        for (existing, existing_strength) in &mut entry.dependencies {
            if *existing == ty {
                // A hard reference overrides an earlier weak one.
                if *existing_strength == DepStrength::Weak && strength == DepStrength::Hard {
                    *existing_strength = DepStrength::Hard;
                }
                return;
            }
        }
        entry.dependencies.push((ty, strength));
    }

    fn fetch_dependencies(
        &self,
        entry: &mut TypeOrderEntry,
        ty: TypeId,
        top_level: bool,
        strength: DepStrength,
    ) {
        if !top_level {
            // A self-reference through pointers is circular and ignorable.
            if ty == entry.ty {
                return;
            }
            let t = self.pool.get(ty);
            if t.name.is_some() {
                let mut dep = strength;
                // Primitives have no forward form, and aliases must be
                // fully declared before use.
                if self.pool.get(self.pool.unalias(ty)).kind.is_primitive()
                    || t.kind == TypeKind::Alias
                {
                    dep = DepStrength::Hard;
                }
                Self::add_dependency(entry, ty, dep);
                return;
            }
        }

        let t = self.pool.get(ty);
        match t.kind {
            kind if kind.is_builtin() => {}

            kind if kind.is_pointer() => {
                let underlying = self.pointer_extra(ty);
                self.fetch_dependencies(entry, underlying, false, DepStrength::Weak);
            }

            TypeKind::Array => {
                let TypeExtra::Array(array) = &t.extra else {
                    panic!("array type without payload");
                };
                self.fetch_dependencies(entry, array.underlying, false, DepStrength::Hard);
            }

            TypeKind::Function => {
                let TypeExtra::Function(func) = &t.extra else {
                    panic!("function type without payload");
                };
                self.fetch_dependencies(entry, func.return_type, false, DepStrength::Hard);
                for param in &func.parameters {
                    self.fetch_dependencies(entry, param.ty, false, DepStrength::Hard);
                }
            }

            TypeKind::Opaque | TypeKind::Enum => {
                if !top_level {
                    panic!("cannot implicitly depend on a non-named unique type");
                }
            }

            TypeKind::Struct | TypeKind::Union => {
                if !top_level {
                    panic!("cannot implicitly depend on a non-named unique type");
                }
                let TypeExtra::Record(record) = &t.extra else {
                    panic!("struct/union type without payload");
                };
                for field in &record.fields {
                    self.fetch_dependencies(entry, field.ty, false, DepStrength::Hard);
                }
            }

            TypeKind::Alias => {
                debug_assert!(top_level || t.name.is_some());
                let TypeExtra::Alias(target) = t.extra else {
                    panic!("alias type without payload");
                };
                self.fetch_dependencies(entry, target, false, strength);
            }

            other => panic!("unhandled dependency kind {other:?}"),
        }
    }

    /// Sorts the document's types so every hard dependency precedes its
    /// user, and determines which types need a forward declaration.
    fn create_type_order(&self, document: &Document) -> Vec<TypeOrderEntry> {
        let mut entries: Vec<TypeOrderEntry> = document
            .types
            .iter()
            .map(|&ty| {
                let mut entry = TypeOrderEntry {
                    ty,
                    requires_forward_decl: false,
                    dependencies: Vec::new(),
                };
                self.fetch_dependencies(&mut entry, ty, true, DepStrength::Hard);
                entry
            })
            .collect();

        let len = entries.len();

        // Walk left to right; whenever the furthest hard dependency of
        // the current entry sits at or beyond it, rotate the entry down
        // past that dependency and reprocess the position. Each rotation
        // strictly improves the rank of a misplaced dependency, so the
        // budget below is only exhausted by a hard-dependency cycle.
        let mut rotation_budget = len * len + len;
        let mut index = 0;
        while index < len {
            let mut last_hard_dep: Option<usize> = None;
            for &(dep, strength) in &entries[index].dependencies {
                if strength != DepStrength::Hard {
                    continue;
                }
                let position = entries
                    .iter()
                    .position(|e| e.ty == dep)
                    .unwrap_or_else(|| panic!("hard dependency missing from document"));
                if last_hard_dep.map_or(true, |last| position > last) {
                    last_hard_dep = Some(position);
                }
            }

            match last_hard_dep {
                Some(last) if last >= index => {
                    assert!(
                        rotation_budget > 0,
                        "cycle of hard dependencies in document types"
                    );
                    rotation_budget -= 1;
                    entries[index..=last].rotate_left(1);
                }
                _ => index += 1,
            }
        }

        // Every weakly referenced enum/struct/union gets a forward
        // declaration; opaque types have none (they are typedefs of
        // void).
        let mut forward: Vec<TypeId> = Vec::new();
        for entry in &entries {
            for &(dep, strength) in &entry.dependencies {
                if strength == DepStrength::Weak {
                    let kind = self.pool.get(self.pool.unalias(dep)).kind;
                    if matches!(kind, TypeKind::Enum | TypeKind::Struct | TypeKind::Union) {
                        forward.push(dep);
                    }
                }
            }
        }
        for entry in &mut entries {
            if forward.contains(&entry.ty) {
                entry.requires_forward_decl = true;
            }
        }

        entries
    }

    // =========================================================================
    // Whole-document rendering
    // =========================================================================

    fn render_document(&self, document: &Document, out: &mut dyn Write) -> io::Result<()> {
        write!(
            out,
            "#pragma once\n\
             \n\
             // THIS IS AUTOGENERATED CODE!\n\
             \n\
             #include <stdint.h>\n\
             #include <stddef.h>\n\
             #include <stdbool.h>\n\
             \n\
             #ifdef __cplusplus\n\
             extern \"C\" {{\n\
             #endif\n\
             \n"
        )?;

        let ordered = self.create_type_order(document);

        for entry in &ordered {
            if !entry.requires_forward_decl {
                continue;
            }
            match self.pool.get(self.pool.unalias(entry.ty)).kind {
                TypeKind::Enum => write!(out, "enum ")?,
                TypeKind::Struct => write!(out, "struct ")?,
                TypeKind::Union => write!(out, "union ")?,
                other => panic!("no forward declaration form for {other:?}"),
            }
            write_identifier(out, IdentTransform::Keep, self.type_name(entry.ty), true)?;
            write!(out, ";\n\n")?;
        }

        for entry in &ordered {
            write!(out, "typedef ")?;
            self.write_declaration(
                out,
                DeclKind::Regular,
                self.type_name(entry.ty),
                IdentTransform::Keep,
                entry.ty,
                RenderMode::Instance,
                0,
            )?;
            write!(out, ";\n\n")?;
        }

        writeln!(out)?;

        for global in &document.variables {
            if let Some(doc) = &global.documentation {
                write_docstring(out, 0, doc)?;
            }
            write!(out, "extern ")?;
            self.write_declaration(
                out,
                if global.is_const {
                    DeclKind::Const
                } else {
                    DeclKind::Regular
                },
                &global.name,
                IdentTransform::Keep,
                global.ty,
                RenderMode::Reference,
                0,
            )?;
            write!(out, ";\n\n")?;
        }

        writeln!(out)?;

        for constant in &document.constants {
            if let Some(doc) = &constant.documentation {
                write_docstring(out, 0, doc)?;
            }
            write!(out, "#define ")?;
            write_identifier(out, IdentTransform::Uppercase, &constant.name, true)?;
            write!(out, " ")?;
            write_value(out, &constant.value)?;
            write!(out, " // ")?;
            self.write_type_prefix(out, constant.ty, RenderMode::Reference, 0)?;
            self.write_type_suffix(out, constant.ty, RenderMode::Reference, 0)?;
            write!(out, "\n\n")?;
        }

        writeln!(out)?;

        for function in &document.functions {
            if let Some(doc) = &function.documentation {
                write_docstring(out, 0, doc)?;
            }
            self.write_declaration(
                out,
                DeclKind::Regular,
                &function.name,
                IdentTransform::Keep,
                function.ty,
                RenderMode::Instance,
                0,
            )?;
            write!(out, ";\n\n")?;
        }

        write!(
            out,
            "\n\
             #ifdef __cplusplus\n\
             }} // ends extern \"C\"\n\
             #endif\n\
             \n"
        )?;

        Ok(())
    }
}
