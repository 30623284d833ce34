//! Lexer implementation using winnow.
//!
//! Tokenizes input into a stream of tokens with source spans. Fails fast on
//! the first lexical error with a message that points at the offending line.

use std::sync::Arc;

use winnow::ascii::digit1;
use winnow::combinator::{alt, delimited, opt, peek, preceded};
use winnow::error::{ContextError, ErrMode};
use winnow::stream::{AsChar, Location, Stream};
use winnow::token::{any, one_of, take, take_till, take_while};
use winnow::{LocatingSlice, ModalResult, Parser};

use super::chars::*;
use super::token::{Token, TokenKind};
use crate::error::{Result, TurtleError};

/// Input type for the lexer - tracks position for spans.
pub type Input<'a> = LocatingSlice<&'a str>;

fn backtrack<T>() -> ModalResult<T> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Tokenize the entire input, ending with an `Eof` token.
    pub fn tokenize(self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut input = LocatingSlice::new(self.input);

        loop {
            skip_ws_and_comments(&mut input);

            if input.is_empty() {
                let pos = input.current_token_start();
                tokens.push(Token::new(TokenKind::Eof, pos, pos));
                break;
            }

            let start = input.current_token_start();
            match next_token(&mut input) {
                Ok(kind) => {
                    let end = input.current_token_start();
                    tokens.push(Token::new(kind, start, end));
                }
                Err(_) => return Err(self.make_error(start, &input)),
            }
        }

        tracing::trace!(count = tokens.len(), "tokenized input");
        Ok(tokens)
    }

    fn make_error(&self, position: usize, input: &Input<'_>) -> TurtleError {
        let bad_char = input.as_ref().chars().next().unwrap_or('?');
        let (line, column) = line_col(self.input, position);

        let what = match bad_char {
            '"' | '\'' => "unterminated string literal".to_string(),
            '<' => "invalid or unterminated IRI".to_string(),
            c if !c.is_ascii() && !is_pn_chars_base(c) => {
                format!("unexpected character '{}' (U+{:04X})", c.escape_unicode(), c as u32)
            }
            c => format!("unexpected character '{}'", c),
        };
        let source_line = self.input.lines().nth(line.saturating_sub(1)).unwrap_or("");
        let pointer = " ".repeat(column.saturating_sub(1));

        TurtleError::Lexer {
            line,
            column,
            message: format!("{what}\n  |\n{line} | {source_line}\n  | {pointer}^"),
        }
    }
}

/// Convert a byte offset into a 1-indexed (line, column) pair.
pub fn line_col(input: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, c) in input.char_indices() {
        if i >= position {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn skip_ws_and_comments(input: &mut Input<'_>) {
    loop {
        let _: ModalResult<&str, ContextError> = take_while(0.., is_ws).parse_next(input);

        if input.starts_with('#') {
            let _: ModalResult<&str, ContextError> =
                take_till(0.., |c| c == '\n' || c == '\r').parse_next(input);
        } else {
            break;
        }
    }
}

fn next_token(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        parse_double_caret,
        parse_iri_ref,
        // Blank nodes before prefixed names
        parse_blank_node_label,
        parse_anon,
        parse_nil,
        parse_at_directive,
        parse_default_prefix,
        parse_prefixed_name_or_keyword,
        parse_string_literal,
        parse_number,
        parse_punctuation,
    ))
    .parse_next(input)
}

// =============================================================================
// IRIs
// =============================================================================

fn parse_iri_ref(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    delimited('<', parse_iri_content, '>')
        .map(|s: String| TokenKind::Iri(Arc::from(s)))
        .parse_next(input)
}

/// IRI body with `\u`/`\U` escapes decoded. Empty is allowed (`<>`).
fn parse_iri_content(input: &mut Input<'_>) -> ModalResult<String> {
    let mut result = String::new();

    loop {
        let chunk: &str = take_while(0.., is_iri_char).parse_next(input)?;
        result.push_str(chunk);

        if input.is_empty() || input.starts_with('>') {
            break;
        }

        if input.starts_with("\\u") || input.starts_with("\\U") {
            '\\'.parse_next(input)?;
            result.push(parse_unicode_escape(input)?);
        } else {
            return backtrack();
        }
    }

    Ok(result)
}

/// `uXXXX` or `UXXXXXXXX` (the backslash is already consumed).
fn parse_unicode_escape(input: &mut Input<'_>) -> ModalResult<char> {
    let width = match one_of(['u', 'U']).parse_next(input)? {
        'u' => 4,
        _ => 8,
    };
    let hex: &str = take_while(width, AsChar::is_hex_digit).parse_next(input)?;
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .map_or_else(backtrack, Ok)
}

// =============================================================================
// Directives and language tags
// =============================================================================

fn parse_at_directive(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    '@'.parse_next(input)?;

    let word: &str =
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-').parse_next(input)?;

    match word {
        "prefix" => Ok(TokenKind::KwPrefix),
        "base" => Ok(TokenKind::KwBase),
        _ => Ok(TokenKind::LangTag(Arc::from(word))),
    }
}

// =============================================================================
// Prefixed names and keywords
// =============================================================================

/// `:local` or `:`
fn parse_default_prefix(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    ':'.parse_next(input)?;

    match opt(parse_pn_local).parse_next(input)? {
        Some(local) => Ok(TokenKind::PrefixedName {
            prefix: Arc::from(""),
            local: Arc::from(local.as_str()),
        }),
        None => Ok(TokenKind::PrefixedNameNs(Arc::from(""))),
    }
}

/// `prefix:local`, `prefix:`, or one of the bare keywords.
fn parse_prefixed_name_or_keyword(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let start = input.checkpoint();

    let first: char = any.parse_next(input)?;
    let mut word = String::new();
    word.push(first);

    loop {
        let chunk: &str = take_while(0.., is_pn_chars).parse_next(input)?;
        word.push_str(chunk);

        // A '.' belongs to the prefix only when more name characters follow
        let continues = input.starts_with('.')
            && input.as_ref()[1..].chars().next().is_some_and(is_pn_chars);
        if !continues {
            break;
        }
        '.'.parse_next(input)?;
        word.push('.');
    }

    if peek(opt(':')).parse_next(input)?.is_some() {
        if !is_pn_chars_base(first) {
            input.reset(&start);
            return backtrack();
        }
        ':'.parse_next(input)?;

        return match opt(parse_pn_local).parse_next(input)? {
            Some(local) => Ok(TokenKind::PrefixedName {
                prefix: Arc::from(word.as_str()),
                local: Arc::from(local.as_str()),
            }),
            None => Ok(TokenKind::PrefixedNameNs(Arc::from(word.as_str()))),
        };
    }

    match word.as_str() {
        "a" => Ok(TokenKind::KwA),
        "true" => Ok(TokenKind::KwTrue),
        "false" => Ok(TokenKind::KwFalse),
        w if w.eq_ignore_ascii_case("prefix") => Ok(TokenKind::KwSparqlPrefix),
        w if w.eq_ignore_ascii_case("base") => Ok(TokenKind::KwSparqlBase),
        w if w.eq_ignore_ascii_case("graph") => Ok(TokenKind::KwGraph),
        _ => {
            input.reset(&start);
            backtrack()
        }
    }
}

/// Local part of a prefixed name, with `%XX` kept and `\x` escapes decoded.
fn parse_pn_local(input: &mut Input<'_>) -> ModalResult<String> {
    let first = input.chars().next().map_or_else(backtrack, Ok)?;
    if !is_pn_local_start(first) && first != '%' && first != '\\' {
        return backtrack();
    }

    let mut result = String::new();

    loop {
        let chunk: &str =
            take_while(0.., |c: char| is_pn_chars(c) || c == ':').parse_next(input)?;
        result.push_str(chunk);

        if input.starts_with('.') {
            let continues = input.as_ref()[1..]
                .chars()
                .next()
                .is_some_and(|c| is_pn_chars(c) || matches!(c, ':' | '%' | '\\'));
            if continues {
                '.'.parse_next(input)?;
                result.push('.');
                continue;
            }
            break;
        }

        if input.starts_with('%') {
            '%'.parse_next(input)?;
            let hex: &str = take_while(2, AsChar::is_hex_digit).parse_next(input)?;
            result.push('%');
            result.push_str(hex);
        } else if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            let escaped: char = any.parse_next(input)?;
            if !"_~.-!$&'()*+,;=/?#@%".contains(escaped) {
                return backtrack();
            }
            result.push(escaped);
        } else {
            break;
        }
    }

    if result.is_empty() {
        return backtrack();
    }
    Ok(result)
}

// =============================================================================
// Blank nodes
// =============================================================================

fn parse_blank_node_label(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    preceded("_:", parse_blank_node_name)
        .map(|name: &str| TokenKind::BlankNodeLabel(Arc::from(name)))
        .parse_next(input)
}

fn parse_blank_node_name<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    let start = input.checkpoint();
    let name: &str = (
        take_while(1, |c: char| is_pn_chars_u(c) || c.is_ascii_digit()),
        take_while(0.., |c: char| is_pn_chars(c) || c == '.'),
    )
        .take()
        .parse_next(input)?;

    // A trailing '.' terminates the statement rather than the label
    let trimmed = name.trim_end_matches('.');
    if trimmed.len() != name.len() {
        input.reset(&start);
        return take(trimmed.chars().count()).parse_next(input);
    }
    Ok(name)
}

fn parse_anon(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    ('[', take_while(0.., is_ws), ']')
        .map(|_| TokenKind::Anon)
        .parse_next(input)
}

fn parse_nil(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    ('(', take_while(0.., is_ws), ')')
        .map(|_| TokenKind::Nil)
        .parse_next(input)
}

// =============================================================================
// String literals
// =============================================================================

fn parse_string_literal(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        delimited("\"\"\"", long_double_content, "\"\"\""),
        delimited("'''", long_single_content, "'''"),
        delimited('"', short_double_content, '"'),
        delimited('\'', short_single_content, '\''),
    ))
    .map(|s: String| TokenKind::String(Arc::from(s)))
    .parse_next(input)
}

fn short_double_content(input: &mut Input<'_>) -> ModalResult<String> {
    parse_short_string_content(input, '"')
}

fn short_single_content(input: &mut Input<'_>) -> ModalResult<String> {
    parse_short_string_content(input, '\'')
}

fn long_double_content(input: &mut Input<'_>) -> ModalResult<String> {
    parse_long_string_content(input, '"')
}

fn long_single_content(input: &mut Input<'_>) -> ModalResult<String> {
    parse_long_string_content(input, '\'')
}

fn parse_short_string_content(input: &mut Input<'_>, quote: char) -> ModalResult<String> {
    let mut result = String::new();

    loop {
        let chunk: &str = take_while(0.., |c| c != quote && c != '\\' && c != '\n' && c != '\r')
            .parse_next(input)?;
        result.push_str(chunk);

        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            result.push(parse_escape_char(input)?);
        } else {
            break;
        }
    }

    Ok(result)
}

fn parse_long_string_content(input: &mut Input<'_>, quote: char) -> ModalResult<String> {
    let mut result = String::new();
    let closing: String = std::iter::repeat(quote).take(3).collect();

    loop {
        let chunk: &str = take_while(0.., |c| c != quote && c != '\\').parse_next(input)?;
        result.push_str(chunk);

        if input.is_empty() || input.starts_with(closing.as_str()) {
            break;
        }

        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            result.push(parse_escape_char(input)?);
        } else {
            // A lone quote inside the long string
            result.push(any.parse_next(input)?);
        }
    }

    Ok(result)
}

fn parse_escape_char(input: &mut Input<'_>) -> ModalResult<char> {
    if input.starts_with('u') || input.starts_with('U') {
        return parse_unicode_escape(input);
    }
    match any.parse_next(input)? {
        't' => Ok('\t'),
        'b' => Ok('\x08'),
        'n' => Ok('\n'),
        'r' => Ok('\r'),
        'f' => Ok('\x0C'),
        '"' => Ok('"'),
        '\'' => Ok('\''),
        '\\' => Ok('\\'),
        _ => backtrack(),
    }
}

// =============================================================================
// Numbers (lexical form preserved)
// =============================================================================

fn parse_number(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((parse_double, parse_decimal, parse_integer)).parse_next(input)
}

fn parse_integer(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let lexical: &str = (opt(one_of(['+', '-'])), digit1).take().parse_next(input)?;

    if peek(opt(one_of(['e', 'E']))).parse_next(input)?.is_some() {
        return backtrack();
    }
    if input.starts_with('.') && input.as_ref()[1..].starts_with(|c: char| c.is_ascii_digit()) {
        return backtrack();
    }

    Ok(TokenKind::Integer(Arc::from(lexical)))
}

fn parse_decimal(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let lexical: &str = (
        opt(one_of(['+', '-'])),
        alt(((digit1, '.', digit1).take(), ('.', digit1).take())),
    )
        .take()
        .parse_next(input)?;

    if peek(opt(one_of(['e', 'E']))).parse_next(input)?.is_some() {
        return backtrack();
    }

    Ok(TokenKind::Decimal(Arc::from(lexical)))
}

fn parse_double(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let lexical: &str = (
        opt(one_of(['+', '-'])),
        alt((
            (digit1, '.', opt(digit1)).take(),
            ('.', digit1).take(),
            digit1,
        )),
        one_of(['e', 'E']),
        opt(one_of(['+', '-'])),
        digit1,
    )
        .take()
        .parse_next(input)?;

    Ok(TokenKind::Double(Arc::from(lexical)))
}

// =============================================================================
// Punctuation
// =============================================================================

fn parse_double_caret(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    "^^".map(|_| TokenKind::DoubleCaret).parse_next(input)
}

fn parse_punctuation(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    any.verify_map(|c| match c {
        '.' => Some(TokenKind::Dot),
        ',' => Some(TokenKind::Comma),
        ';' => Some(TokenKind::Semicolon),
        '[' => Some(TokenKind::LBracket),
        ']' => Some(TokenKind::RBracket),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '{' => Some(TokenKind::LBrace),
        '}' => Some(TokenKind::RBrace),
        _ => None,
    })
    .parse_next(input)
}

/// Tokenize a document string.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).tokenize()
}
