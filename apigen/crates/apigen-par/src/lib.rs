//! apigen-par - Parser for the apigen IDL
//!
//! A recursive-descent parser producing the flat declaration list in
//! [`ast`]. Syntax errors are reported through the diagnostic sink as
//! `syntax_error` (1008) with the offending token's spelling; the parser
//! then skips to the next `;` and keeps going, so one run can surface
//! several errors.
//!
//! Multi-line string pieces are concatenated here with the configured
//! line-feed sequence, and adjacent `///` lines are joined with a plain
//! `\n`, so downstream stages only ever see finished strings.

pub mod ast;

use apigen_lex::{Lexer, Token};
use apigen_util::{DiagnosticCode, Handler, Span, Value};

use ast::{
    Declaration, DeclarationKind, EnumItemExpr, FieldExpr, PointerExpr, PointerSize, TypeExpr,
    TypeExprKind,
};

/// Per-invocation parser configuration.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// File name used in diagnostics
    pub file_name: String,
    /// Separator inserted between adjacent multi-line string pieces
    pub line_feed: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            file_name: String::from("<input>"),
            line_feed: String::from("\n"),
        }
    }
}

/// Result of parsing one source file.
#[derive(Clone, Debug)]
pub struct ParsedFile {
    /// Top-level declarations in source order
    pub declarations: Vec<Declaration>,
    /// False if any syntax error was reported
    pub ok: bool,
}

/// The recursive-descent parser.
///
/// # Example
///
/// ```
/// use apigen_par::{ParseOptions, Parser};
/// use apigen_util::Handler;
///
/// let handler = Handler::new();
/// let parsed = Parser::new("type Handle = opaque {};", &ParseOptions::default(), &handler)
///     .parse();
/// assert!(parsed.ok);
/// assert_eq!(parsed.declarations.len(), 1);
/// ```
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    handler: &'a Handler,
    file_name: String,
    line_feed: String,
    current: Token,
    current_span: Span,
    previous_span: Span,
    ok: bool,
}

impl<'a> Parser<'a> {
    /// Creates a parser over the given source text.
    pub fn new(source: &'a str, options: &ParseOptions, handler: &'a Handler) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let current_span = lexer.token_span();
        Self {
            lexer,
            handler,
            file_name: options.file_name.clone(),
            line_feed: options.line_feed.clone(),
            current,
            current_span,
            previous_span: current_span,
            ok: true,
        }
    }

    /// Parses the whole input, recovering at `;` after errors.
    pub fn parse(mut self) -> ParsedFile {
        let mut declarations = Vec::new();
        while self.current != Token::Eof {
            match self.parse_declaration() {
                Some(decl) => declarations.push(decl),
                None => self.recover_to_semicolon(),
            }
        }
        ParsedFile {
            declarations,
            ok: self.ok,
        }
    }

    // =========================================================================
    // Token plumbing
    // =========================================================================

    fn advance(&mut self) {
        self.previous_span = self.current_span;
        self.current = self.lexer.next_token();
        self.current_span = self.lexer.token_span();
    }

    fn eat(&mut self, token: &Token) -> bool {
        if &self.current == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, context: &str) -> Option<()> {
        if self.current == token {
            self.advance();
            Some(())
        } else {
            self.syntax_error(&format!("expected '{}' {}", token.spelling(), context));
            None
        }
    }

    fn expect_identifier(&mut self, context: &str) -> Option<String> {
        match &self.current {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => {
                self.syntax_error(&format!("expected identifier {context}"));
                None
            }
        }
    }

    fn syntax_error(&mut self, message: &str) {
        self.ok = false;
        self.handler.emit_at(
            DiagnosticCode::SYNTAX_ERROR,
            &self.file_name,
            self.current_span,
            format!("at '{}': {}", self.current.spelling(), message),
        );
    }

    /// Skips forward until a `;` has been consumed or the input ends.
    fn recover_to_semicolon(&mut self) {
        while self.current != Token::Eof {
            let was_semi = self.current == Token::Semi;
            self.advance();
            if was_semi {
                return;
            }
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn take_doc_comment(&mut self) -> Option<String> {
        let mut doc: Option<String> = None;
        while let Token::DocComment(line) = &self.current {
            let line = line.clone();
            match &mut doc {
                Some(text) => {
                    text.push('\n');
                    text.push_str(&line);
                }
                None => doc = Some(line),
            }
            self.advance();
        }
        doc
    }

    fn parse_declaration(&mut self) -> Option<Declaration> {
        let documentation = self.take_doc_comment();
        let start = self.current_span;

        match self.current {
            Token::Type => {
                self.advance();
                let name = self.expect_identifier("after 'type'")?;
                self.expect(Token::Eq, "in type declaration")?;
                let ty = self.parse_type()?;
                self.expect(Token::Semi, "after type declaration")?;
                Some(Declaration {
                    kind: DeclarationKind::Type,
                    documentation,
                    name,
                    ty,
                    value: Value::Null,
                    span: start.merge(self.previous_span),
                })
            }
            Token::Const | Token::Var => {
                let kind = if self.current == Token::Const {
                    DeclarationKind::Const
                } else {
                    DeclarationKind::Var
                };
                self.advance();
                let name = self.expect_identifier("after 'const'/'var'")?;
                self.expect(Token::Colon, "in global declaration")?;
                let ty = self.parse_type()?;
                self.expect(Token::Semi, "after global declaration")?;
                Some(Declaration {
                    kind,
                    documentation,
                    name,
                    ty,
                    value: Value::Null,
                    span: start.merge(self.previous_span),
                })
            }
            Token::Constexpr => {
                self.advance();
                let name = self.expect_identifier("after 'constexpr'")?;
                self.expect(Token::Colon, "in constexpr declaration")?;
                let ty = self.parse_type()?;
                self.expect(Token::Eq, "in constexpr declaration")?;
                let value = self.parse_value()?;
                self.expect(Token::Semi, "after constexpr declaration")?;
                Some(Declaration {
                    kind: DeclarationKind::Constexpr,
                    documentation,
                    name,
                    ty,
                    value,
                    span: start.merge(self.previous_span),
                })
            }
            Token::Fn => {
                self.advance();
                let name = self.expect_identifier("after 'fn'")?;
                let ty = self.parse_function_type(start)?;
                self.expect(Token::Semi, "after function declaration")?;
                Some(Declaration {
                    kind: DeclarationKind::Fn,
                    documentation,
                    name,
                    ty,
                    value: Value::Null,
                    span: start.merge(self.previous_span),
                })
            }
            _ => {
                self.syntax_error("expected 'type', 'const', 'var', 'constexpr', or 'fn'");
                None
            }
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn parse_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_span;
        match &self.current {
            Token::Question => {
                self.advance();
                self.parse_pointer(start, true)
            }
            Token::Star | Token::LBracket => self.parse_pointer(start, false),
            Token::Enum => self.parse_enum(start),
            Token::Struct => self.parse_record(start, /* is_union */ false),
            Token::Union => self.parse_record(start, /* is_union */ true),
            Token::Opaque => {
                self.advance();
                self.expect(Token::LBrace, "after 'opaque'")?;
                self.expect(Token::RBrace, "in opaque type")?;
                Some(TypeExpr {
                    kind: TypeExprKind::Opaque,
                    span: start.merge(self.previous_span),
                })
            }
            Token::Fn => {
                self.advance();
                self.parse_function_type(start)
            }
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Some(TypeExpr {
                    kind: TypeExprKind::Named(name),
                    span: start,
                })
            }
            _ => {
                self.syntax_error("expected a type");
                None
            }
        }
    }

    fn parse_pointer(&mut self, start: Span, is_optional: bool) -> Option<TypeExpr> {
        match self.current {
            Token::Star => {
                self.advance();
                let is_const = self.eat(&Token::Const);
                let underlying = self.parse_type()?;
                Some(TypeExpr {
                    span: start.merge(underlying.span),
                    kind: TypeExprKind::Pointer(PointerExpr {
                        size: PointerSize::One,
                        is_const,
                        is_optional,
                        sentinel: None,
                        underlying: Box::new(underlying),
                    }),
                })
            }
            Token::LBracket => {
                self.advance();
                if self.eat(&Token::Star) {
                    // [*]T or [*:N]T
                    let sentinel = if self.eat(&Token::Colon) {
                        Some(self.parse_value()?)
                    } else {
                        None
                    };
                    self.expect(Token::RBracket, "in pointer type")?;
                    let is_const = self.eat(&Token::Const);
                    let underlying = self.parse_type()?;
                    let size = if sentinel.is_some() {
                        PointerSize::SentinelledMany
                    } else {
                        PointerSize::Many
                    };
                    Some(TypeExpr {
                        span: start.merge(underlying.span),
                        kind: TypeExprKind::Pointer(PointerExpr {
                            size,
                            is_const,
                            is_optional,
                            sentinel,
                            underlying: Box::new(underlying),
                        }),
                    })
                } else {
                    // [N]T
                    if is_optional {
                        self.syntax_error("'?' is only valid on pointer types");
                        return None;
                    }
                    let size = self.parse_value()?;
                    self.expect(Token::RBracket, "in array type")?;
                    let elem = self.parse_type()?;
                    Some(TypeExpr {
                        span: start.merge(elem.span),
                        kind: TypeExprKind::Array {
                            size,
                            elem: Box::new(elem),
                        },
                    })
                }
            }
            _ => {
                self.syntax_error("expected a pointer type after '?'");
                None
            }
        }
    }

    fn parse_function_type(&mut self, start: Span) -> Option<TypeExpr> {
        self.expect(Token::LParen, "in function signature")?;
        let mut params = Vec::new();
        while self.current != Token::RParen {
            let documentation = self.take_doc_comment();
            let param_start = self.current_span;
            let name = self.expect_identifier("as parameter name")?;
            self.expect(Token::Colon, "after parameter name")?;
            let ty = self.parse_type()?;
            params.push(FieldExpr {
                documentation,
                name,
                ty,
                span: param_start.merge(self.previous_span),
            });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen, "after parameter list")?;
        let ret = self.parse_type()?;
        Some(TypeExpr {
            span: start.merge(self.previous_span),
            kind: TypeExprKind::Function {
                ret: Box::new(ret),
                params,
            },
        })
    }

    fn parse_record(&mut self, start: Span, is_union: bool) -> Option<TypeExpr> {
        self.advance();
        self.expect(Token::LBrace, "in struct/union type")?;
        let mut fields = Vec::new();
        while self.current != Token::RBrace {
            let documentation = self.take_doc_comment();
            let field_start = self.current_span;
            let name = self.expect_identifier("as field name")?;
            self.expect(Token::Colon, "after field name")?;
            let ty = self.parse_type()?;
            fields.push(FieldExpr {
                documentation,
                name,
                ty,
                span: field_start.merge(self.previous_span),
            });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBrace, "at end of struct/union")?;
        let kind = if is_union {
            TypeExprKind::Union { fields }
        } else {
            TypeExprKind::Struct { fields }
        };
        Some(TypeExpr {
            kind,
            span: start.merge(self.previous_span),
        })
    }

    fn parse_enum(&mut self, start: Span) -> Option<TypeExpr> {
        self.advance();
        let backing = if self.eat(&Token::LParen) {
            let ty = self.parse_type()?;
            self.expect(Token::RParen, "after enum backing type")?;
            Some(Box::new(ty))
        } else {
            None
        };
        self.expect(Token::LBrace, "in enum type")?;
        let mut items = Vec::new();
        while self.current != Token::RBrace {
            let documentation = self.take_doc_comment();
            let item_start = self.current_span;
            let name = self.expect_identifier("as enum item name")?;
            let value = if self.eat(&Token::Eq) {
                self.parse_value()?
            } else {
                Value::Null
            };
            items.push(EnumItemExpr {
                documentation,
                name,
                value,
                span: item_start.merge(self.previous_span),
            });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBrace, "at end of enum")?;
        Some(TypeExpr {
            kind: TypeExprKind::Enum { backing, items },
            span: start.merge(self.previous_span),
        })
    }

    // =========================================================================
    // Values
    // =========================================================================

    fn parse_value(&mut self) -> Option<Value> {
        match &self.current {
            Token::Int(value) => {
                let value = *value;
                self.advance();
                Some(Value::Uint(value))
            }
            Token::Minus => {
                self.advance();
                match self.current {
                    Token::Int(magnitude) => {
                        self.advance();
                        self.negate(magnitude)
                    }
                    _ => {
                        self.syntax_error("expected an integer after '-'");
                        None
                    }
                }
            }
            Token::Str(text) => {
                let text = text.clone();
                self.advance();
                Some(Value::Str(text))
            }
            Token::MultilineStr(_) => Some(Value::Str(self.collect_multiline_string())),
            Token::Ident(name) if name == "null" => {
                self.advance();
                Some(Value::Null)
            }
            _ => {
                self.syntax_error("expected a value");
                None
            }
        }
    }

    fn negate(&mut self, magnitude: u64) -> Option<Value> {
        const MIN_MAGNITUDE: u64 = i64::MAX as u64 + 1;
        if magnitude == 0 {
            Some(Value::Uint(0))
        } else if magnitude < MIN_MAGNITUDE {
            Some(Value::Sint(-(magnitude as i64)))
        } else if magnitude == MIN_MAGNITUDE {
            Some(Value::Sint(i64::MIN))
        } else {
            self.syntax_error("negative integer literal out of range");
            None
        }
    }

    /// Joins adjacent `\\` pieces with the configured line feed.
    fn collect_multiline_string(&mut self) -> String {
        let mut text = String::new();
        let mut first = true;
        while let Token::MultilineStr(piece) = &self.current {
            if !first {
                text.push_str(&self.line_feed);
            }
            text.push_str(piece);
            first = false;
            self.advance();
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_source(source: &str) -> (ParsedFile, Handler) {
        let handler = Handler::new();
        let parsed = Parser::new(source, &ParseOptions::default(), &handler).parse();
        (parsed, handler)
    }

    #[test]
    fn test_type_declaration() {
        let (parsed, handler) = parse_source("type Handle = opaque {};");
        assert!(parsed.ok);
        assert!(!handler.has_errors());
        assert_eq!(parsed.declarations.len(), 1);
        let decl = &parsed.declarations[0];
        assert_eq!(decl.kind, DeclarationKind::Type);
        assert_eq!(decl.name, "Handle");
        assert!(matches!(decl.ty.kind, TypeExprKind::Opaque));
    }

    #[test]
    fn test_global_declarations() {
        let (parsed, _) = parse_source("const max : u32;\nvar counter : u64;");
        assert!(parsed.ok);
        assert_eq!(parsed.declarations[0].kind, DeclarationKind::Const);
        assert_eq!(parsed.declarations[1].kind, DeclarationKind::Var);
        assert!(matches!(
            &parsed.declarations[0].ty.kind,
            TypeExprKind::Named(name) if name == "u32"
        ));
    }

    #[test]
    fn test_constexpr_declaration() {
        let (parsed, _) = parse_source("constexpr limit : u8 = 200;");
        assert!(parsed.ok);
        let decl = &parsed.declarations[0];
        assert_eq!(decl.kind, DeclarationKind::Constexpr);
        assert_eq!(decl.value, Value::Uint(200));
    }

    #[test]
    fn test_negative_constexpr_value() {
        let (parsed, _) = parse_source("constexpr low : i8 = -128;");
        assert_eq!(parsed.declarations[0].value, Value::Sint(-128));
    }

    #[test]
    fn test_fn_declaration() {
        let (parsed, _) = parse_source("fn open(path: [*:0]const u8, mode: u32) i32;");
        assert!(parsed.ok);
        let decl = &parsed.declarations[0];
        assert_eq!(decl.kind, DeclarationKind::Fn);
        match &decl.ty.kind {
            TypeExprKind::Function { params, ret } => {
                assert_eq!(params.len(), 2);
                assert_eq!(params[0].name, "path");
                match &params[0].ty.kind {
                    TypeExprKind::Pointer(ptr) => {
                        assert_eq!(ptr.size, PointerSize::SentinelledMany);
                        assert!(ptr.is_const);
                        assert!(!ptr.is_optional);
                        assert_eq!(ptr.sentinel, Some(Value::Uint(0)));
                    }
                    other => panic!("expected pointer parameter, got {other:?}"),
                }
                assert!(matches!(&ret.kind, TypeExprKind::Named(n) if n == "i32"));
            }
            other => panic!("expected function type, got {other:?}"),
        }
    }

    #[test]
    fn test_pointer_forms() {
        let (parsed, _) = parse_source(
            "type A = *u8;\n\
             type B = ?*const u8;\n\
             type C = [*]u8;\n\
             type D = ?[*]const u8;",
        );
        assert!(parsed.ok);
        let ptr = |i: usize| match &parsed.declarations[i].ty.kind {
            TypeExprKind::Pointer(p) => p.clone(),
            other => panic!("expected pointer, got {other:?}"),
        };
        assert_eq!(ptr(0).size, PointerSize::One);
        assert!(!ptr(0).is_const && !ptr(0).is_optional);
        assert!(ptr(1).is_const && ptr(1).is_optional);
        assert_eq!(ptr(2).size, PointerSize::Many);
        assert!(ptr(3).is_const && ptr(3).is_optional);
    }

    #[test]
    fn test_array_type() {
        let (parsed, _) = parse_source("type Buffer = [64]u8;");
        assert!(parsed.ok);
        match &parsed.declarations[0].ty.kind {
            TypeExprKind::Array { size, elem } => {
                assert_eq!(size, &Value::Uint(64));
                assert!(matches!(&elem.kind, TypeExprKind::Named(n) if n == "u8"));
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_array_is_error() {
        let (parsed, handler) = parse_source("type T = ?[3]u8;");
        assert!(!parsed.ok);
        assert!(handler.count_of(DiagnosticCode::SYNTAX_ERROR) > 0);
    }

    #[test]
    fn test_enum_with_backing_type() {
        let (parsed, _) = parse_source("type E = enum(u8) { a = 1, b, c = 5 };");
        assert!(parsed.ok);
        match &parsed.declarations[0].ty.kind {
            TypeExprKind::Enum { backing, items } => {
                assert!(backing.is_some());
                assert_eq!(items.len(), 3);
                assert_eq!(items[0].value, Value::Uint(1));
                assert_eq!(items[1].value, Value::Null);
                assert_eq!(items[2].value, Value::Uint(5));
            }
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn test_struct_fields() {
        let (parsed, _) = parse_source("type P = struct { x: i32, y: i32 };");
        match &parsed.declarations[0].ty.kind {
            TypeExprKind::Struct { fields } => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "x");
                assert_eq!(fields[1].name, "y");
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn test_doc_comments_concatenate() {
        let (parsed, _) = parse_source("/// First line\n/// Second line\ntype T = u8;");
        assert_eq!(
            parsed.declarations[0].documentation.as_deref(),
            Some("First line\nSecond line")
        );
    }

    #[test]
    fn test_field_doc_comment() {
        let (parsed, _) = parse_source("type S = struct {\n/// The width\nw: u32,\n};");
        match &parsed.declarations[0].ty.kind {
            TypeExprKind::Struct { fields } => {
                assert_eq!(fields[0].documentation.as_deref(), Some("The width"));
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn test_multiline_string_concat() {
        let options = ParseOptions {
            file_name: "test.api".into(),
            line_feed: "\r\n".into(),
        };
        let handler = Handler::new();
        let parsed = Parser::new(
            "constexpr banner : [*:0]const u8 =\n\\\\line one\n\\\\line two\n;",
            &options,
            &handler,
        )
        .parse();
        assert!(parsed.ok);
        assert_eq!(
            parsed.declarations[0].value,
            Value::Str("line one\r\nline two".into())
        );
    }

    #[test]
    fn test_at_identifier_declaration() {
        let (parsed, _) = parse_source("type @\"reserved name\" = u8;");
        assert_eq!(parsed.declarations[0].name, "reserved name");
    }

    #[test]
    fn test_syntax_error_sets_failure() {
        let (parsed, handler) = parse_source("type = u8;");
        assert!(!parsed.ok);
        assert_eq!(handler.count_of(DiagnosticCode::SYNTAX_ERROR), 1);
    }

    #[test]
    fn test_recovery_reports_multiple_errors() {
        let (parsed, handler) = parse_source("type = u8;\ntype B = u16;\nconst : u8;");
        assert!(!parsed.ok);
        assert_eq!(handler.count_of(DiagnosticCode::SYNTAX_ERROR), 2);
        // The well-formed declaration in the middle still parses.
        assert_eq!(parsed.declarations.len(), 1);
        assert_eq!(parsed.declarations[0].name, "B");
    }

    #[test]
    fn test_nested_inline_struct() {
        let (parsed, _) = parse_source("type Outer = struct { inner: struct { x: u8 } };");
        assert!(parsed.ok);
        match &parsed.declarations[0].ty.kind {
            TypeExprKind::Struct { fields } => {
                assert!(matches!(&fields[0].ty.kind, TypeExprKind::Struct { .. }));
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }
}
