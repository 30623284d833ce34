//! Error types for IRI reference handling

use thiserror::Error;

/// Errors raised while resolving IRI references
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IriError {
    /// The base is not an absolute IRI
    #[error("base IRI is not absolute: {0}")]
    RelativeBase(String),

    /// A relative reference was found but no base is in scope
    #[error("relative IRI '{0}' without base")]
    MissingBase(String),
}
