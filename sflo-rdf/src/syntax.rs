//! Syntax registry: hint, file extension and content-type lookup

use serde::{Deserialize, Serialize};
use sflo_graph_turtle::Dialect;
use sflo_vocab::media;
use std::fmt;
use std::str::FromStr;

/// A supported RDF wire syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    #[default]
    Jsonld,
    Turtle,
    Trig,
    Ntriples,
    Nquads,
}

/// File extensions (lowercase, without the dot)
const EXTENSIONS: &[(&str, Syntax)] = &[
    ("jsonld", Syntax::Jsonld),
    ("json", Syntax::Jsonld),
    ("ttl", Syntax::Turtle),
    ("turtle", Syntax::Turtle),
    ("trig", Syntax::Trig),
    ("nt", Syntax::Ntriples),
    ("ntriples", Syntax::Ntriples),
    ("nq", Syntax::Nquads),
    ("nquads", Syntax::Nquads),
];

/// Media types (lowercase, without parameters)
const CONTENT_TYPES: &[(&str, Syntax)] = &[
    (media::JSON_LD, Syntax::Jsonld),
    (media::TURTLE, Syntax::Turtle),
    (media::TRIG, Syntax::Trig),
    (media::N_TRIPLES, Syntax::Ntriples),
    (media::N_QUADS, Syntax::Nquads),
];

impl Syntax {
    pub const ALL: [Syntax; 5] = [
        Syntax::Jsonld,
        Syntax::Turtle,
        Syntax::Trig,
        Syntax::Ntriples,
        Syntax::Nquads,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Syntax::Jsonld => "jsonld",
            Syntax::Turtle => "turtle",
            Syntax::Trig => "trig",
            Syntax::Ntriples => "ntriples",
            Syntax::Nquads => "nquads",
        }
    }

    /// The stream dialect for this syntax; `None` for jsonld.
    pub fn dialect(self) -> Option<Dialect> {
        match self {
            Syntax::Jsonld => None,
            Syntax::Turtle => Some(Dialect::Turtle),
            Syntax::Trig => Some(Dialect::TriG),
            Syntax::Ntriples => Some(Dialect::NTriples),
            Syntax::Nquads => Some(Dialect::NQuads),
        }
    }

    /// The registered media type
    pub fn content_type(self) -> &'static str {
        CONTENT_TYPES
            .iter()
            .find(|(_, s)| *s == self)
            .map(|(ct, _)| *ct)
            .unwrap_or(media::JSON_LD)
    }

    /// Look up a file extension, ignoring ASCII case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(e, _)| ext.eq_ignore_ascii_case(e))
            .map(|(_, s)| *s)
    }

    /// Look up a `Content-Type` header value, ignoring parameters and case.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        CONTENT_TYPES
            .iter()
            .find(|(ct, _)| essence.eq_ignore_ascii_case(ct))
            .map(|(_, s)| *s)
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized syntax token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown RDF syntax '{0}' (expected one of: jsonld, turtle, trig, ntriples, nquads)")]
pub struct UnknownSyntax(pub String);

impl FromStr for Syntax {
    type Err = UnknownSyntax;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Syntax::ALL
            .into_iter()
            .find(|syntax| s.eq_ignore_ascii_case(syntax.as_str()))
            .ok_or_else(|| UnknownSyntax(s.to_string()))
    }
}

/// Pick a syntax for a source.
///
/// Priority: explicit hint > extension of `path_or_url` > content type >
/// jsonld. Never fails.
pub fn detect_syntax(hint: Option<Syntax>, path_or_url: Option<&str>, content_type: Option<&str>) -> Syntax {
    if let Some(syntax) = hint {
        return syntax;
    }
    if let Some(syntax) = path_or_url.and_then(extension).and_then(Syntax::from_extension) {
        return syntax;
    }
    if let Some(syntax) = content_type.and_then(Syntax::from_content_type) {
        return syntax;
    }
    Syntax::default()
}

/// Extension of the last path segment, with any query or fragment removed.
fn extension(path_or_url: &str) -> Option<&str> {
    let path = path_or_url
        .split(['?', '#'])
        .next()
        .unwrap_or(path_or_url);
    let segment = path.rsplit(['/', '\\']).next().unwrap_or(path);
    segment.rsplit_once('.').map(|(_, ext)| ext).filter(|ext| !ext.is_empty())
}
