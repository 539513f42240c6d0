//! apigen-lex - Lexer for the apigen interface definition language
//!
//! The IDL is small: five declaration keywords, the compound type
//! keywords, identifiers (including `@"..."` quoted identifiers), integer
//! literals in four bases, quoted strings, `\\`-prefixed multi-line
//! string pieces, `///` documentation comments, and a handful of
//! punctuation tokens.
//!
//! The lexer never reports diagnostics itself. Anything it cannot
//! tokenize becomes a [`Token::Error`] carrying the offending spelling;
//! the parser turns that into a `syntax_error` diagnostic so all user
//! errors flow through one sink.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{keyword_from_ident, Token};
