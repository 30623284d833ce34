//! Token types.

use std::sync::Arc;

/// A token with its source span (byte offsets).
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

/// Token kinds for the Turtle family.
///
/// Numeric literals keep their lexical form so that a parse/write cycle
/// reproduces them exactly.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // IRIs
    /// `<...>` with escapes decoded; may be relative
    Iri(Arc<str>),
    /// `prefix:`
    PrefixedNameNs(Arc<str>),
    /// `prefix:local`
    PrefixedName { prefix: Arc<str>, local: Arc<str> },

    // Blank nodes
    /// `_:name`
    BlankNodeLabel(Arc<str>),
    /// `[]`
    Anon,
    /// `()`
    Nil,

    // Literals
    /// String literal (unescaped content)
    String(Arc<str>),
    Integer(Arc<str>),
    Decimal(Arc<str>),
    Double(Arc<str>),
    /// Language tag without the `@`
    LangTag(Arc<str>),

    // Keywords / directives
    KwPrefix,
    KwBase,
    KwSparqlPrefix,
    KwSparqlBase,
    /// TriG `GRAPH`
    KwGraph,
    KwA,
    KwTrue,
    KwFalse,

    // Punctuation
    Dot,
    Comma,
    Semicolon,
    DoubleCaret,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,

    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Iri(s) => write!(f, "<{}>", s),
            TokenKind::PrefixedNameNs(s) => write!(f, "{}:", s),
            TokenKind::PrefixedName { prefix, local } => write!(f, "{}:{}", prefix, local),
            TokenKind::BlankNodeLabel(s) => write!(f, "_:{}", s),
            TokenKind::Anon => write!(f, "[]"),
            TokenKind::Nil => write!(f, "()"),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Integer(s) | TokenKind::Decimal(s) | TokenKind::Double(s) => {
                write!(f, "{}", s)
            }
            TokenKind::LangTag(s) => write!(f, "@{}", s),
            TokenKind::KwPrefix => write!(f, "@prefix"),
            TokenKind::KwBase => write!(f, "@base"),
            TokenKind::KwSparqlPrefix => write!(f, "PREFIX"),
            TokenKind::KwSparqlBase => write!(f, "BASE"),
            TokenKind::KwGraph => write!(f, "GRAPH"),
            TokenKind::KwA => write!(f, "a"),
            TokenKind::KwTrue => write!(f, "true"),
            TokenKind::KwFalse => write!(f, "false"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::DoubleCaret => write!(f, "^^"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}
