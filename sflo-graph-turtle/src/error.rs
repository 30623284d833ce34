//! Error types for the Turtle-family parsers and writer

/// Error type for parsing and writing Turtle, TriG, N-Triples and N-Quads
#[derive(Debug, thiserror::Error)]
pub enum TurtleError {
    /// Lexer error (invalid token)
    #[error("syntax error at line {line}, column {column}: {message}")]
    Lexer {
        line: usize,
        column: usize,
        message: String,
    },

    /// Parser error (unexpected token or invalid structure)
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A quad cannot be written in the requested dialect
    #[error("cannot write quad #{index} as {dialect}: {message}")]
    Write {
        index: usize,
        dialect: crate::Dialect,
        message: String,
    },
}

/// Result type for Turtle operations
pub type Result<T> = std::result::Result<T, TurtleError>;

impl TurtleError {
    /// Line and column of the error, when it has a source position
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            TurtleError::Lexer { line, column, .. } | TurtleError::Parse { line, column, .. } => {
                Some((*line, *column))
            }
            _ => None,
        }
    }
}
