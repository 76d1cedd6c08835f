//! SQL Lexer/Tokenizer
//!
//! A hand-written lexer that turns statement text into a token stream. It
//! understands just enough SQL (keywords, quoting, literals, comments,
//! placeholders) for the table resolver to walk the statement safely.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
