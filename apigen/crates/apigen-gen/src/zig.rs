//! The Zig backend.
//!
//! Zig admits out-of-order declarations inside a file, so this backend
//! is a plain traversal of the document: no ordering pass and no forward
//! declarations. The type taxonomy maps almost one-to-one onto Zig's
//! surface syntax; the interesting differences are spelled out per kind
//! below. Reserved or otherwise unusable identifiers are quoted `@"..."`.

use std::io::{self, Write};

use apigen_sem::types::FunctionType;
use apigen_sem::{Document, TypeExtra, TypeId, TypeKind, TypePool};
use apigen_util::Value;

use crate::{write_docstring, write_indent, RenderError, Renderer};

/// The Zig module backend.
pub struct ZigRenderer;

impl Renderer for ZigRenderer {
    fn render(&self, document: &Document, out: &mut dyn Write) -> Result<(), RenderError> {
        let writer = ZigWriter {
            pool: &document.pool,
        };
        writer.render_document(document, out)?;
        Ok(())
    }
}

/// Zig keywords; using one as a plain identifier requires `@"..."`.
const RESERVED_IDENTIFIERS: &[&str] = &[
    "addrspace",
    "align",
    "allowzero",
    "and",
    "anyframe",
    "anytype",
    "asm",
    "async",
    "await",
    "break",
    "callconv",
    "catch",
    "comptime",
    "const",
    "continue",
    "defer",
    "else",
    "enum",
    "errdefer",
    "error",
    "export",
    "extern",
    "false",
    "fn",
    "for",
    "if",
    "inline",
    "linksection",
    "noalias",
    "noinline",
    "nosuspend",
    "null",
    "opaque",
    "or",
    "orelse",
    "packed",
    "pub",
    "resume",
    "return",
    "struct",
    "suspend",
    "switch",
    "test",
    "threadlocal",
    "true",
    "try",
    "undefined",
    "union",
    "unreachable",
    "usingnamespace",
    "var",
    "volatile",
    "while",
];

fn needs_quoting(identifier: &str) -> bool {
    if RESERVED_IDENTIFIERS.contains(&identifier) {
        return true;
    }
    let mut chars = identifier.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return true,
    }
    chars.any(|c| !c.is_ascii_alphanumeric() && c != '_')
}

fn write_identifier(out: &mut dyn Write, identifier: &str) -> io::Result<()> {
    if needs_quoting(identifier) {
        write!(out, "@\"{identifier}\"")
    } else {
        write!(out, "{identifier}")
    }
}

fn write_value(out: &mut dyn Write, value: &Value) -> io::Result<()> {
    match value {
        Value::Null => write!(out, "null"),
        Value::Sint(v) => write!(out, "{v}"),
        Value::Uint(v) => write!(out, "{v}"),
        Value::Str(s) => write!(out, "\"{s}\""),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RenderMode {
    Reference,
    Instance,
}

struct ZigWriter<'a> {
    pool: &'a TypePool,
}

impl<'a> ZigWriter<'a> {
    fn write_type(
        &self,
        out: &mut dyn Write,
        ty: TypeId,
        mode: RenderMode,
        indent: usize,
    ) -> io::Result<()> {
        let t = self.pool.get(ty);

        if mode == RenderMode::Reference {
            if let Some(name) = &t.name {
                return write_identifier(out, name);
            }
        }

        match t.kind {
            TypeKind::Void => write!(out, "void"),
            TypeKind::Anyopaque => write!(out, "anyopaque"),
            TypeKind::Opaque => write!(out, "opaque {{}}"),
            TypeKind::Bool => write!(out, "bool"),
            // The character trio collapses onto Zig's integer types.
            TypeKind::Uchar => write!(out, "u8"),
            TypeKind::Ichar => write!(out, "i8"),
            TypeKind::Char => write!(out, "u8"),

            TypeKind::U8 => write!(out, "u8"),
            TypeKind::U16 => write!(out, "u16"),
            TypeKind::U32 => write!(out, "u32"),
            TypeKind::U64 => write!(out, "u64"),
            TypeKind::Usize => write!(out, "usize"),
            TypeKind::CUshort => write!(out, "c_ushort"),
            TypeKind::CUint => write!(out, "c_uint"),
            TypeKind::CUlong => write!(out, "c_ulong"),
            TypeKind::CUlonglong => write!(out, "c_ulonglong"),

            TypeKind::I8 => write!(out, "i8"),
            TypeKind::I16 => write!(out, "i16"),
            TypeKind::I32 => write!(out, "i32"),
            TypeKind::I64 => write!(out, "i64"),
            TypeKind::Isize => write!(out, "isize"),
            TypeKind::CShort => write!(out, "c_short"),
            TypeKind::CInt => write!(out, "c_int"),
            TypeKind::CLong => write!(out, "c_long"),
            TypeKind::CLonglong => write!(out, "c_longlong"),

            TypeKind::F32 => write!(out, "f32"),
            TypeKind::F64 => write!(out, "f64"),

            kind if kind.is_pointer() => self.write_pointer(out, ty, kind, indent),

            TypeKind::Array => {
                let TypeExtra::Array(array) = &t.extra else {
                    panic!("array type without payload");
                };
                write!(out, "[{}]", array.size)?;
                self.write_type(out, array.underlying, RenderMode::Reference, indent)
            }

            TypeKind::Function => {
                let TypeExtra::Function(func) = &t.extra else {
                    panic!("function type without payload");
                };
                write!(out, "fn (")?;
                self.write_parameter_list(out, func)?;
                write!(out, ") callconv(.C) ")?;
                self.write_type(out, func.return_type, RenderMode::Reference, indent)
            }

            TypeKind::Enum => {
                let TypeExtra::Enum(enumeration) = &t.extra else {
                    panic!("enum type without payload");
                };
                write!(out, "enum(")?;
                self.write_type(out, enumeration.underlying, RenderMode::Reference, indent)?;
                writeln!(out, ") {{")?;
                for item in &enumeration.items {
                    if let Some(doc) = &item.documentation {
                        write_docstring(out, indent + 1, doc)?;
                    }
                    write_indent(out, indent + 1)?;
                    write_identifier(out, &item.name)?;
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
                    writeln!(out, "extern struct {{")?;
                } else {
                    writeln!(out, "extern union {{")?;
                }
                for field in &record.fields {
                    if let Some(doc) = &field.documentation {
                        write_docstring(out, indent + 1, doc)?;
                    }
                    write_indent(out, indent + 1)?;
                    write_identifier(out, &field.name)?;
                    write!(out, ": ")?;
                    self.write_type(out, field.ty, RenderMode::Reference, indent + 1)?;
                    writeln!(out, ",")?;
                }
                write_indent(out, indent)?;
                write!(out, "}}")
            }

            TypeKind::Alias => {
                let TypeExtra::Alias(target) = t.extra else {
                    panic!("alias type without payload");
                };
                self.write_type(out, target, RenderMode::Reference, indent)
            }

            other => panic!("unhandled type kind {other:?}"),
        }
    }

    fn write_pointer(
        &self,
        out: &mut dyn Write,
        ty: TypeId,
        kind: TypeKind,
        indent: usize,
    ) -> io::Result<()> {
        let TypeExtra::Pointer(pointer) = &self.pool.get(ty).extra else {
            panic!("pointer type without payload");
        };

        let nullable = matches!(
            kind,
            TypeKind::NullablePtrToOne
                | TypeKind::NullablePtrToMany
                | TypeKind::NullablePtrToSentinelledMany
                | TypeKind::NullableConstPtrToOne
                | TypeKind::NullableConstPtrToMany
                | TypeKind::NullableConstPtrToSentinelledMany
        );
        let is_const = matches!(
            kind,
            TypeKind::ConstPtrToOne
                | TypeKind::ConstPtrToMany
                | TypeKind::ConstPtrToSentinelledMany
                | TypeKind::NullableConstPtrToOne
                | TypeKind::NullableConstPtrToMany
                | TypeKind::NullableConstPtrToSentinelledMany
        );
        let to_one = matches!(
            kind,
            TypeKind::PtrToOne | TypeKind::NullablePtrToOne | TypeKind::ConstPtrToOne
                | TypeKind::NullableConstPtrToOne
        );

        if nullable {
            write!(out, "?")?;
        }
        if to_one {
            write!(out, "*")?;
        } else if kind.is_sentinelled_pointer() {
            write!(out, "[*:")?;
            write_value(out, &pointer.sentinel)?;
            write!(out, "]")?;
        } else {
            write!(out, "[*]")?;
        }
        if is_const {
            write!(out, "const ")?;
        }
        self.write_type(out, pointer.underlying, RenderMode::Reference, indent)
    }

    fn write_parameter_list(&self, out: &mut dyn Write, func: &FunctionType) -> io::Result<()> {
        for (index, param) in func.parameters.iter().enumerate() {
            if index > 0 {
                write!(out, ", ")?;
            }
            write_identifier(out, &param.name)?;
            write!(out, ": ")?;
            self.write_type(out, param.ty, RenderMode::Reference, 0)?;
        }
        Ok(())
    }

    fn render_document(&self, document: &Document, out: &mut dyn Write) -> io::Result<()> {
        write!(
            out,
            "// THIS IS AUTOGENERATED CODE!\n\
             \n"
        )?;

        for &ty in &document.types {
            let t = self.pool.get(ty);
            let name = t
                .name
                .as_deref()
                .unwrap_or_else(|| panic!("document type without a display name"));
            write!(out, "pub const ")?;
            write_identifier(out, name)?;
            write!(out, " = ")?;
            self.write_type(out, ty, RenderMode::Instance, 0)?;
            write!(out, ";\n\n")?;
        }

        for global in &document.variables {
            if let Some(doc) = &global.documentation {
                write_docstring(out, 0, doc)?;
            }
            if global.is_const {
                write!(out, "pub extern const ")?;
            } else {
                write!(out, "pub extern var ")?;
            }
            write_identifier(out, &global.name)?;
            write!(out, ": ")?;
            self.write_type(out, global.ty, RenderMode::Reference, 0)?;
            write!(out, ";\n\n")?;
        }

        for constant in &document.constants {
            if let Some(doc) = &constant.documentation {
                write_docstring(out, 0, doc)?;
            }
            write!(out, "pub const ")?;
            write_identifier(out, &constant.name)?;
            write!(out, ": ")?;
            self.write_type(out, constant.ty, RenderMode::Reference, 0)?;
            write!(out, " = ")?;
            write_value(out, &constant.value)?;
            write!(out, ";\n\n")?;
        }

        for function in &document.functions {
            if let Some(doc) = &function.documentation {
                write_docstring(out, 0, doc)?;
            }
            let func = match &self.pool.get(function.ty).extra {
                TypeExtra::Function(func) => func,
                other => panic!("function with payload {other:?}"),
            };
            write!(out, "pub extern fn ")?;
            write_identifier(out, &function.name)?;
            write!(out, "(")?;
            self.write_parameter_list(out, func)?;
            write!(out, ") ")?;
            self.write_type(out, func.return_type, RenderMode::Reference, 0)?;
            write!(out, ";\n\n")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apigen_par::{ParseOptions, Parser};
    use apigen_sem::analyze;
    use apigen_util::Handler;

    fn render_zig(source: &str) -> String {
        let handler = Handler::new();
        let parsed = Parser::new(source, &ParseOptions::default(), &handler).parse();
        assert!(parsed.ok, "test source must parse");
        let document = analyze(&parsed.declarations, "test.api", &handler)
            .unwrap_or_else(|_| panic!("analysis failed: {:?}", handler.diagnostics()));
        let mut out = Vec::new();
        ZigRenderer.render(&document, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_struct_declaration() {
        let output = render_zig("type Point = struct { x: i32, y: i32 };");
        assert!(output.contains("pub const Point = extern struct {"));
        assert!(output.contains("x: i32,"));
        assert!(output.contains("y: i32,"));
    }

    #[test]
    fn test_union_declaration() {
        let output = render_zig("type V = union { a: u32, b: f32 };");
        assert!(output.contains("pub const V = extern union {"));
    }

    #[test]
    fn test_opaque_declaration() {
        let output = render_zig("type Handle = opaque {};");
        assert!(output.contains("pub const Handle = opaque {};"));
    }

    #[test]
    fn test_enum_declaration() {
        let output = render_zig("type E = enum(u8) { a = 1, b };");
        assert!(output.contains("pub const E = enum(u8) {"));
        assert!(output.contains("a = 1,"));
        assert!(output.contains("b = 2,"));
    }

    #[test]
    fn test_pointer_spellings() {
        let output = render_zig(
            "type A = *u8;\n\
             type B = ?*const u8;\n\
             type C = [*]const u8;\n\
             type D = [*:0]u8;",
        );
        assert!(output.contains("pub const A = *u8;"));
        assert!(output.contains("pub const B = ?*const u8;"));
        assert!(output.contains("pub const C = [*]const u8;"));
        assert!(output.contains("pub const D = [*:0]u8;"));
    }

    #[test]
    fn test_array_spelling() {
        let output = render_zig("type Buffer = [64]u8;");
        assert!(output.contains("pub const Buffer = [64]u8;"));
    }

    #[test]
    fn test_character_trio_mapping() {
        let output = render_zig("type A = *c_char;\ntype B = *c_ichar;");
        assert!(output.contains("pub const A = *u8;"));
        assert!(output.contains("pub const B = *i8;"));
    }

    #[test]
    fn test_globals() {
        let output = render_zig("const version : u32;\nvar state : ?*anyopaque;");
        assert!(output.contains("pub extern const version: u32;"));
        assert!(output.contains("pub extern var state: ?*anyopaque;"));
    }

    #[test]
    fn test_constant() {
        let output = render_zig("constexpr limit : u8 = 16;");
        assert!(output.contains("pub const limit: u8 = 16;"));
    }

    #[test]
    fn test_function_prototype() {
        let output = render_zig("fn open(path: [*:0]const u8, mode: u32) i32;");
        assert!(output.contains("pub extern fn open(path: [*:0]const u8, mode: u32) i32;"));
    }

    #[test]
    fn test_function_type_in_field() {
        let output = render_zig("type Callbacks = struct { on_tick: *const fn (ms: u32) void };");
        assert!(output.contains("on_tick: *const fn (ms: u32) callconv(.C) void,"));
    }

    #[test]
    fn test_reserved_identifier_quoted() {
        let output = render_zig("type S = struct { error: u8 };");
        assert!(output.contains("@\"error\": u8,"));
    }

    #[test]
    fn test_identifier_with_spaces_quoted() {
        let output = render_zig("type S = struct { @\"two words\": u8 };");
        assert!(output.contains("@\"two words\": u8,"));
    }

    #[test]
    fn test_named_reference() {
        let output = render_zig("type Widget = opaque {};\nfn create() *Widget;");
        assert!(output.contains("pub extern fn create() *Widget;"));
    }
}
