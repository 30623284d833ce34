use sflo_graph_ir::IriError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JsonLdError {
    #[error("Invalid context: {message}")]
    InvalidContext { message: String },

    #[error("Remote context '{url}' cannot be loaded; only inline contexts are supported")]
    RemoteContext { url: String },

    #[error("Cyclic IRI mapping for term '{term}'")]
    CyclicIriMapping { term: String },

    #[error("Invalid IRI: {0}")]
    InvalidIri(#[from] IriError),

    #[error("@language cannot be used for values with a specified @type")]
    LanguageWithType,

    #[error("Invalid value object: {message}")]
    InvalidValueObject { message: String },

    #[error("{keyword} is not supported")]
    Unsupported { keyword: String },

    #[error("Lists of lists are not supported at {path}")]
    NestedList { path: String },

    #[error("Invalid expanded JSON-LD: {0}")]
    InvalidStructure(String),
}

pub type Result<T> = std::result::Result<T, JsonLdError>;
