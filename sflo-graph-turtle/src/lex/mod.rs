//! Lexer shared by Turtle, TriG, N-Triples and N-Quads.
//!
//! Tokenizes input using winnow.

pub mod chars;
pub mod lexer;
pub mod token;

pub use lexer::{line_col, tokenize, Lexer};
pub use token::{Token, TokenKind};
