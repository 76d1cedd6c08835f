//! Target table resolution.
//!
//! Finds the one table a statement is considered to act on, by walking the
//! token stream rather than parsing the statement:
//!
//! - `INSERT [OR …] INTO t`, `REPLACE INTO t`, `UPDATE [OR …] t` and
//!   `DELETE FROM t` name the table directly;
//! - `SELECT … FROM t [JOIN u …]` yields the driving table `t`. Joined
//!   tables are ignored, and so are `FROM` keywords nested in parentheses
//!   (sub-selects in the column list, `EXTRACT(… FROM …)` and the like);
//! - `FROM (SELECT … FROM t) alias` resolves to the sub-select's table;
//! - delimiters (`` ` ``, `"`, `[ ]`) are stripped and schema qualifiers
//!   dropped, so `` `app`.`user` `` and `[app].[user]` resolve to `user`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InterceptError, Result};
use crate::lexer::{Keyword, Lexer, Token, TokenKind};

/// The kind of statement being intercepted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    /// Returns the statement keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    const fn from_head(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Select => Some(Self::Select),
            Keyword::Insert | Keyword::Replace => Some(Self::Insert),
            Keyword::Update => Some(Self::Update),
            Keyword::Delete => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statement's kind and target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStatement {
    /// The statement kind.
    pub kind: StatementKind,
    /// The target (or driving) table, without delimiters or schema.
    pub table: String,
}

/// Resolves the target table of a statement.
///
/// ```rust
/// use oxide_intercept::resolve_table;
///
/// let table = resolve_table("select u.name from `user` u join score s on s.uid = u.id").unwrap();
/// assert_eq!(table, "user");
/// ```
///
/// # Errors
///
/// Returns [`InterceptError::TableResolution`] when no table-bearing clause
/// is found.
pub fn resolve_table(sql: &str) -> Result<String> {
    resolve_statement(sql).map(|resolved| resolved.table)
}

/// Resolves the kind and target table of a statement.
///
/// # Errors
///
/// Returns [`InterceptError::TableResolution`] when no table-bearing clause
/// is found.
pub fn resolve_statement(sql: &str) -> Result<ResolvedStatement> {
    let tokens = Lexer::new(sql).tokenize();
    match resolve_tokens(&tokens) {
        Some(resolved) => {
            debug!(kind = %resolved.kind, table = %resolved.table, "resolved target table");
            Ok(resolved)
        }
        None => Err(InterceptError::TableResolution {
            sql: sql.to_string(),
        }),
    }
}

/// Keywords that may sit between a statement keyword and its table.
const fn is_modifier(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::Or
            | Keyword::Replace
            | Keyword::Ignore
            | Keyword::Abort
            | Keyword::Fail
            | Keyword::Rollback
            | Keyword::LowPriority
            | Keyword::Into
            | Keyword::Only
            | Keyword::Lateral
    )
}

/// Parenthesis depth of every token.
fn depths(tokens: &[Token]) -> Vec<usize> {
    let mut depth = 0usize;
    tokens
        .iter()
        .map(|token| match token.kind {
            TokenKind::LeftParen => {
                depth += 1;
                depth - 1
            }
            TokenKind::RightParen => {
                depth = depth.saturating_sub(1);
                depth
            }
            _ => depth,
        })
        .collect()
}

fn resolve_tokens(tokens: &[Token]) -> Option<ResolvedStatement> {
    let depths = depths(tokens);

    // The statement keyword is the shallowest one; CTE bodies sit deeper.
    let (head, kind) = tokens
        .iter()
        .enumerate()
        .filter_map(|(i, t)| t.as_keyword().and_then(StatementKind::from_head).map(|k| (i, k)))
        .min_by_key(|(i, _)| depths[*i])?;
    let level = depths[head];

    let find_from = || {
        (head + 1..tokens.len())
            .take_while(|i| depths[*i] >= level)
            .find(|i| depths[*i] == level && tokens[*i].is_keyword(Keyword::From))
    };

    let table = match kind {
        StatementKind::Select => driving_table(tokens, find_from()? + 1)?,
        StatementKind::Delete => {
            let start = find_from().map_or(head + 1, |from| from + 1);
            table_name_at(tokens, skip_modifiers(tokens, start))?
        }
        StatementKind::Insert | StatementKind::Update => {
            table_name_at(tokens, skip_modifiers(tokens, head + 1))?
        }
    };

    Some(ResolvedStatement { kind, table })
}

fn skip_modifiers(tokens: &[Token], mut i: usize) -> usize {
    while tokens.get(i).and_then(Token::as_keyword).is_some_and(is_modifier) {
        i += 1;
    }
    i
}

/// Resolves the table reference starting at `i`, descending into a
/// parenthesised sub-select when there is one.
fn driving_table(tokens: &[Token], i: usize) -> Option<String> {
    let i = skip_modifiers(tokens, i);
    if !matches!(tokens.get(i)?.kind, TokenKind::LeftParen) {
        return table_name_at(tokens, i);
    }

    let mut depth = 0usize;
    for (offset, token) in tokens[i..].iter().enumerate() {
        match token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return resolve_tokens(&tokens[i + 1..i + offset]).map(|inner| inner.table);
                }
            }
            _ => {}
        }
    }
    None
}

/// Reads a possibly qualified name (`a.b.c`) and returns its last part.
fn table_name_at(tokens: &[Token], i: usize) -> Option<String> {
    let mut name = tokens.get(i)?.as_identifier()?;
    let mut j = i + 1;
    while matches!(tokens.get(j).map(|t| &t.kind), Some(TokenKind::Dot)) {
        name = tokens.get(j + 1)?.as_identifier()?;
        j += 2;
    }
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}
