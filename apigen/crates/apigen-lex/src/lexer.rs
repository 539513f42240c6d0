//! Main lexer implementation for the apigen IDL.
//!
//! The lexer transforms source text into a stream of tokens. String
//! escape processing happens here so the parser only ever sees converted
//! payloads: `\n \r \e \" \' \\` are interpreted, any other escaped
//! character stands for itself.

use apigen_util::Span;

use crate::cursor::Cursor;
use crate::token::{keyword_from_ident, Token};

/// The lexer for apigen IDL source.
///
/// Call [`Lexer::next_token`] repeatedly until it returns [`Token::Eof`];
/// [`Lexer::token_span`] reports the source range of the most recently
/// returned token.
///
/// # Example
///
/// ```
/// use apigen_lex::{Lexer, Token};
///
/// let mut lexer = Lexer::new("type Handle = opaque {};");
/// assert_eq!(lexer.next_token(), Token::Type);
/// assert_eq!(lexer.next_token(), Token::Ident("Handle".into()));
/// ```
pub struct Lexer<'a> {
    /// Character cursor for traversing source.
    cursor: Cursor<'a>,

    /// Start line of the current token.
    token_start_line: u32,

    /// Start column of the current token.
    token_start_column: u32,

    /// End line of the current token.
    token_end_line: u32,

    /// End column of the current token.
    token_end_column: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            token_start_line: 1,
            token_start_column: 1,
            token_end_line: 1,
            token_end_column: 1,
        }
    }

    /// Returns the span of the most recently returned token.
    pub fn token_span(&self) -> Span {
        Span::new(
            self.token_start_line,
            self.token_start_column,
            self.token_end_line,
            self.token_end_column,
        )
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        let token = if self.cursor.is_at_end() {
            Token::Eof
        } else {
            self.dispatch()
        };

        self.token_end_line = self.cursor.line();
        self.token_end_column = self.cursor.column().saturating_sub(1).max(1);
        token
    }

    fn dispatch(&mut self) -> Token {
        match self.cursor.current_char() {
            '/' if self.cursor.peek_char(1) == '/' && self.cursor.peek_char(2) == '/' => {
                self.lex_doc_comment()
            }
            '\\' if self.cursor.peek_char(1) == '\\' => self.lex_multiline_piece(),
            '"' => self.lex_string(),
            '@' if self.cursor.peek_char(1) == '"' => self.lex_at_identifier(),
            c if c.is_ascii_digit() => self.lex_number(),
            c if is_ident_start(c) => self.lex_identifier(),
            '=' => self.single(Token::Eq),
            ':' => self.single(Token::Colon),
            ';' => self.single(Token::Semi),
            ',' => self.single(Token::Comma),
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '{' => self.single(Token::LBrace),
            '}' => self.single(Token::RBrace),
            '[' => self.single(Token::LBracket),
            ']' => self.single(Token::RBracket),
            '*' => self.single(Token::Star),
            '?' => self.single(Token::Question),
            '-' => self.single(Token::Minus),
            c => {
                self.cursor.advance();
                Token::Error(c.to_string())
            }
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.cursor.advance();
        token
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            let c = self.cursor.current_char();
            if c.is_whitespace() {
                self.cursor.advance();
                continue;
            }
            // Plain // comments are skipped; /// is a doc comment token.
            if c == '/' && self.cursor.peek_char(1) == '/' && self.cursor.peek_char(2) != '/' {
                self.skip_to_line_end();
                continue;
            }
            break;
        }
    }

    fn skip_to_line_end(&mut self) {
        while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
            self.cursor.advance();
        }
    }

    fn lex_doc_comment(&mut self) -> Token {
        for _ in 0..3 {
            self.cursor.advance();
        }
        // One optional space after /// is part of the prefix.
        if self.cursor.current_char() == ' ' {
            self.cursor.advance();
        }
        let start = self.cursor.position();
        self.skip_to_line_end();
        let text = self.cursor.slice(start, self.cursor.position());
        Token::DocComment(text.to_string())
    }

    fn lex_multiline_piece(&mut self) -> Token {
        self.cursor.advance();
        self.cursor.advance();
        let start = self.cursor.position();
        self.skip_to_line_end();
        let text = self.cursor.slice(start, self.cursor.position());
        Token::MultilineStr(text.to_string())
    }

    fn lex_identifier(&mut self) -> Token {
        let start = self.cursor.position();
        while is_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice(start, self.cursor.position());
        keyword_from_ident(text).unwrap_or_else(|| Token::Ident(text.to_string()))
    }

    fn lex_at_identifier(&mut self) -> Token {
        self.cursor.advance(); // @
        match self.lex_string() {
            Token::Str(name) => Token::Ident(name),
            Token::Error(spelling) => Token::Error(format!("@{spelling}")),
            _ => unreachable!("lex_string returns Str or Error"),
        }
    }

    fn lex_string(&mut self) -> Token {
        let start = self.cursor.position();
        self.cursor.advance(); // opening quote

        let mut converted = String::new();
        loop {
            match self.cursor.current_char() {
                '"' => {
                    self.cursor.advance();
                    return Token::Str(converted);
                }
                '\0' | '\n' => {
                    // Unterminated; hand the raw spelling to the parser.
                    let raw = self.cursor.slice(start, self.cursor.position());
                    return Token::Error(raw.to_string());
                }
                '\\' => {
                    self.cursor.advance();
                    let escaped = self.cursor.current_char();
                    self.cursor.advance();
                    converted.push(match escaped {
                        'n' => '\n',
                        'r' => '\r',
                        'e' => '\u{1b}',
                        '"' => '"',
                        '\'' => '\'',
                        '\\' => '\\',
                        other => other,
                    });
                }
                c => {
                    self.cursor.advance();
                    converted.push(c);
                }
            }
        }
    }

    fn lex_number(&mut self) -> Token {
        let start = self.cursor.position();

        let radix = if self.cursor.current_char() == '0' {
            match self.cursor.peek_char(1) {
                'x' | 'X' => 16,
                'o' | 'O' => 8,
                'b' | 'B' => 2,
                _ => 10,
            }
        } else {
            10
        };

        if radix != 10 {
            self.cursor.advance(); // 0
            self.cursor.advance(); // base marker
        }

        let digits_start = self.cursor.position();
        while self.cursor.current_char().is_ascii_alphanumeric() {
            self.cursor.advance();
        }

        let digits = self.cursor.slice(digits_start, self.cursor.position());
        match u64::from_str_radix(digits, radix) {
            Ok(value) => Token::Int(value),
            Err(_) => {
                let raw = self.cursor.slice(start, self.cursor.position());
                Token::Error(raw.to_string())
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            lex_all("type const var constexpr fn widget"),
            vec![
                Token::Type,
                Token::Const,
                Token::Var,
                Token::Constexpr,
                Token::Fn,
                Token::Ident("widget".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            lex_all("= : ; , ( ) { } [ ] * ? -"),
            vec![
                Token::Eq,
                Token::Colon,
                Token::Semi,
                Token::Comma,
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
                Token::LBracket,
                Token::RBracket,
                Token::Star,
                Token::Question,
                Token::Minus,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_in_all_bases() {
        assert_eq!(
            lex_all("0 42 0xFF 0o17 0b1010"),
            vec![
                Token::Int(0),
                Token::Int(42),
                Token::Int(255),
                Token::Int(15),
                Token::Int(10),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_number_overflow_is_error() {
        let tokens = lex_all("99999999999999999999999");
        assert!(matches!(tokens[0], Token::Error(_)));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            lex_all(r#""a\nb\\c\"d""#),
            vec![Token::Str("a\nb\\c\"d".into()), Token::Eof]
        );
    }

    #[test]
    fn test_unknown_escape_keeps_character() {
        assert_eq!(lex_all(r#""\q""#), vec![Token::Str("q".into()), Token::Eof]);
    }

    #[test]
    fn test_escape_e_is_escape_char() {
        assert_eq!(
            lex_all(r#""\e[0m""#),
            vec![Token::Str("\u{1b}[0m".into()), Token::Eof]
        );
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let tokens = lex_all("\"oops\nfn");
        assert!(matches!(tokens[0], Token::Error(_)));
        assert_eq!(tokens[1], Token::Fn);
    }

    #[test]
    fn test_at_identifier() {
        assert_eq!(
            lex_all(r#"@"while loop""#),
            vec![Token::Ident("while loop".into()), Token::Eof]
        );
    }

    #[test]
    fn test_at_identifier_applies_escapes() {
        assert_eq!(
            lex_all(r#"@"a\"b""#),
            vec![Token::Ident("a\"b".into()), Token::Eof]
        );
    }

    #[test]
    fn test_doc_comment() {
        assert_eq!(
            lex_all("/// Hello there\ntype"),
            vec![Token::DocComment("Hello there".into()), Token::Type, Token::Eof]
        );
    }

    #[test]
    fn test_plain_comment_skipped() {
        assert_eq!(
            lex_all("// expected: 1007\ntype"),
            vec![Token::Type, Token::Eof]
        );
    }

    #[test]
    fn test_multiline_string_piece() {
        assert_eq!(
            lex_all("\\\\first line\n\\\\second"),
            vec![
                Token::MultilineStr("first line".into()),
                Token::MultilineStr("second".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_character() {
        let tokens = lex_all("$");
        assert_eq!(tokens[0], Token::Error("$".into()));
    }

    #[test]
    fn test_token_span() {
        let mut lexer = Lexer::new("type Name");
        lexer.next_token();
        assert_eq!(lexer.token_span(), Span::new(1, 1, 1, 4));
        lexer.next_token();
        assert_eq!(lexer.token_span(), Span::new(1, 6, 1, 9));
    }
}
