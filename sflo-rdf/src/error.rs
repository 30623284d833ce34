//! Error types for resolving, parsing and serializing RDF

use crate::syntax::Syntax;
use std::path::PathBuf;
use thiserror::Error;

/// A source could not be read or fetched
#[derive(Debug, Error)]
pub enum SourceFailure {
    /// Reading a local file failed
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fetching a URL failed.
    ///
    /// `status` is set for non-2xx responses and absent for transport
    /// errors, timeouts and cancellation.
    #[error("failed to fetch {url}: {reason}")]
    Fetch {
        url: String,
        status: Option<u16>,
        reason: String,
    },
}

/// Content could not be parsed in its syntax
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{syntax} parse error{}: {message}", at_position(.position))]
pub struct GraphParseError {
    pub syntax: Syntax,
    pub message: String,
    /// Line and column, when the parser reports one
    pub position: Option<(usize, usize)>,
}

fn at_position(position: &Option<(usize, usize)>) -> String {
    position
        .map(|(line, column)| format!(" at line {line}, column {column}"))
        .unwrap_or_default()
}

impl GraphParseError {
    pub fn new(syntax: Syntax, message: impl Into<String>) -> Self {
        Self {
            syntax,
            message: message.into(),
            position: None,
        }
    }

    pub fn at(mut self, position: Option<(usize, usize)>) -> Self {
        self.position = position;
        self
    }
}

impl From<(Syntax, sflo_graph_turtle::TurtleError)> for GraphParseError {
    fn from((syntax, err): (Syntax, sflo_graph_turtle::TurtleError)) -> Self {
        let message = match &err {
            sflo_graph_turtle::TurtleError::Lexer { message, .. }
            | sflo_graph_turtle::TurtleError::Parse { message, .. }
            | sflo_graph_turtle::TurtleError::Write { message, .. } => message.clone(),
        };
        GraphParseError::new(syntax, message).at(err.position())
    }
}

impl From<sflo_graph_json_ld::JsonLdError> for GraphParseError {
    fn from(err: sflo_graph_json_ld::JsonLdError) -> Self {
        GraphParseError::new(Syntax::Jsonld, err.to_string())
    }
}

impl From<serde_json::Error> for GraphParseError {
    fn from(err: serde_json::Error) -> Self {
        GraphParseError::new(Syntax::Jsonld, format!("invalid JSON: {err}"))
            .at(Some((err.line(), err.column())))
    }
}

/// A quad set could not be written
#[derive(Debug, Error)]
pub enum GraphSerializeError {
    /// The stream writer rejected a quad
    #[error(transparent)]
    Writer(#[from] sflo_graph_turtle::TurtleError),

    /// Converting quads to a JSON-LD tree failed
    #[error("JSON-LD conversion failed: {0}")]
    Conversion(String),

    /// The requested syntax is not handled by this serialization path
    #[error("syntax {syntax} is not supported by the {path} serializer")]
    UnsupportedSyntax { syntax: Syntax, path: &'static str },
}

impl From<sflo_graph_json_ld::JsonLdError> for GraphSerializeError {
    fn from(err: sflo_graph_json_ld::JsonLdError) -> Self {
        GraphSerializeError::Conversion(err.to_string())
    }
}

impl From<serde_json::Error> for GraphSerializeError {
    fn from(err: serde_json::Error) -> Self {
        GraphSerializeError::Conversion(err.to_string())
    }
}

/// Failure of `parse_rdf_source`
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error(transparent)]
    Source(#[from] SourceFailure),

    #[error(transparent)]
    Parse(#[from] GraphParseError),
}

/// Failure of `serialize_rdf`
pub type SerializeFailure = GraphSerializeError;
