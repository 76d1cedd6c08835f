//! Token types for the SQL lexer.

use super::Span;

/// SQL keywords relevant to locating the target table of a statement.
///
/// Only statement heads, `FROM`/`INTO` and the modifiers that may precede a
/// table name are keywords. Everything else, `WHERE` and `JOIN` included,
/// is lexed as an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    // Statement heads
    Select,
    Insert,
    Update,
    Delete,
    Replace,

    // Clauses
    From,
    Into,

    // Modifiers that may precede a table name
    Lateral,
    Or,
    Ignore,
    Abort,
    Fail,
    Rollback,
    Only,
    LowPriority,
}

impl Keyword {
    /// Attempts to parse a keyword from a string (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Some(Self::Select),
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            "REPLACE" => Some(Self::Replace),
            "FROM" => Some(Self::From),
            "INTO" => Some(Self::Into),
            "LATERAL" => Some(Self::Lateral),
            "OR" => Some(Self::Or),
            "IGNORE" => Some(Self::Ignore),
            "ABORT" => Some(Self::Abort),
            "FAIL" => Some(Self::Fail),
            "ROLLBACK" => Some(Self::Rollback),
            "ONLY" => Some(Self::Only),
            "LOW_PRIORITY" => Some(Self::LowPriority),
            _ => None,
        }
    }

    /// Returns the keyword as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Replace => "REPLACE",
            Self::From => "FROM",
            Self::Into => "INTO",
            Self::Lateral => "LATERAL",
            Self::Or => "OR",
            Self::Ignore => "IGNORE",
            Self::Abort => "ABORT",
            Self::Fail => "FAIL",
            Self::Rollback => "ROLLBACK",
            Self::Only => "ONLY",
            Self::LowPriority => "LOW_PRIORITY",
        }
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Integer literal (e.g., 42)
    Integer(i64),
    /// Float literal (e.g., 3.14)
    Float(f64),
    /// String literal (e.g., 'hello')
    String(String),

    // Identifiers and keywords
    /// Bare identifier (e.g., `column_name`)
    Identifier(String),
    /// Delimited identifier with its delimiters stripped (e.g., `` `user` ``, `[user]`)
    QuotedIdentifier(String),
    /// SQL keyword
    Keyword(Keyword),
    /// Bind parameter: `?`, `?1`, `$1`, `:name` or `@name`
    Placeholder(String),

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// =
    Eq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// ||
    Concat,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// ::
    DoubleColon,

    // Special
    /// End of input
    Eof,
    /// Invalid/unknown token
    Error(String),
}

/// A token with its span in the source code.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source code.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns true if this is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.as_keyword() == Some(keyword)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }

    /// Returns the name if this is a bare or delimited identifier.
    #[must_use]
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Keyword::from_str("SELECT"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("select"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("SeLeCt"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("low_priority"), Some(Keyword::LowPriority));
        assert_eq!(Keyword::from_str("user"), None);
        assert_eq!(Keyword::from_str("where"), None);
    }

    #[test]
    fn test_keyword_round_trips_through_as_str() {
        for kw in [Keyword::Insert, Keyword::Into, Keyword::Lateral, Keyword::Only] {
            assert_eq!(Keyword::from_str(kw.as_str()), Some(kw));
        }
    }

    #[test]
    fn test_token_as_identifier() {
        let bare = Token::new(TokenKind::Identifier(String::from("users")), Span::new(0, 5));
        let quoted = Token::new(
            TokenKind::QuotedIdentifier(String::from("user")),
            Span::new(0, 6),
        );
        let comma = Token::new(TokenKind::Comma, Span::new(0, 1));
        assert_eq!(bare.as_identifier(), Some("users"));
        assert_eq!(quoted.as_identifier(), Some("user"));
        assert_eq!(comma.as_identifier(), None);
    }

    #[test]
    fn test_token_is_keyword() {
        let from = Token::new(TokenKind::Keyword(Keyword::From), Span::new(0, 4));
        assert!(from.is_keyword(Keyword::From));
        assert!(!from.is_keyword(Keyword::Into));
        assert!(!Token::new(TokenKind::Eof, Span::default()).is_keyword(Keyword::From));
    }
}
