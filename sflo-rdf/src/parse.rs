//! Graph parser: resolved content + base IRI -> quads with absolute IRIs

use crate::error::GraphParseError;
use crate::source::{ResolvedSource, SourceContent};
use crate::syntax::Syntax;
use serde_json::Value as JsonValue;
use sflo_graph_ir::Quad;
use tracing::debug;

/// A parsed document. Every IRI in `quads` is absolute.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedGraph {
    pub syntax: Syntax,
    /// The base every relative reference was resolved against
    pub base_iri: String,
    pub quads: Vec<Quad>,
}

impl ParsedGraph {
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }
}

/// Parse resolved content. Fails without partial results.
pub fn parse_resolved(source: ResolvedSource) -> Result<ParsedGraph, GraphParseError> {
    let ResolvedSource {
        content,
        base_iri,
        syntax,
    } = source;

    let quads = match (syntax.dialect(), content) {
        (None, SourceContent::Document(document)) => parse_jsonld(&document, &base_iri)?,
        (None, SourceContent::Text(text)) => {
            let document: JsonValue = serde_json::from_str(&text)?;
            parse_jsonld(&document, &base_iri)?
        }
        (Some(dialect), SourceContent::Text(text)) => {
            sflo_graph_turtle::parse_to_quads(&text, dialect, Some(&base_iri))
                .map_err(|e| GraphParseError::from((syntax, e)))?
        }
        (Some(_), SourceContent::Document(_)) => {
            return Err(GraphParseError::new(
                syntax,
                "a structured JSON document cannot be parsed as a stream syntax",
            ))
        }
    };

    debug!(%syntax, base = %base_iri, quads = quads.len(), "parsed graph");
    Ok(ParsedGraph {
        syntax,
        base_iri,
        quads,
    })
}

/// Expand with `base` as the explicit base, then convert to quads.
fn parse_jsonld(document: &JsonValue, base: &str) -> Result<Vec<Quad>, GraphParseError> {
    Ok(sflo_graph_json_ld::to_quads(document, base)?)
}
