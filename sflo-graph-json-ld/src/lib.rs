//! JSON-LD processing for the Semantic Flow RDF core
//!
//! This crate provides:
//! - Context processing (inline contexts only)
//! - Expansion against an explicit document base
//! - Conversion between expanded JSON-LD and quads (toRDF / fromRDF)
//! - Compaction against a caller-supplied context
//! - Debasing of identifiers under a target base
//!
//! # Example
//!
//! ```
//! use sflo_graph_json_ld::{debase, from_rdf, to_quads};
//! use serde_json::json;
//!
//! let doc = json!({
//!     "@context": {"dc": "http://purl.org/dc/terms/"},
//!     "@id": "#section1",
//!     "dc:title": "Intro"
//! });
//!
//! let base = "file:///mesh/node/doc.jsonld";
//! let quads = to_quads(&doc, base).unwrap();
//! assert_eq!(quads[0].subject.as_iri(), Some("file:///mesh/node/doc.jsonld#section1"));
//!
//! let tree = debase::debase(&from_rdf(&quads), base);
//! assert_eq!(tree[0]["@id"], "#section1");
//! ```

pub mod compact;
pub mod context;
pub mod debase;
pub mod error;
pub mod expand;
pub mod from_rdf;
pub mod to_rdf;

pub use compact::{compact, ContextCompactor};
pub use context::{Container, ParsedContext, TermDefinition, TypeValue};
pub use error::{JsonLdError, Result};
pub use expand::expand;
pub use from_rdf::from_rdf;
pub use to_rdf::to_rdf;

use serde_json::Value as JsonValue;
use sflo_graph_ir::{Quad, QuadCollectorSink};

/// Expand `document` against `base` and convert it to quads.
pub fn to_quads(document: &JsonValue, base: &str) -> Result<Vec<Quad>> {
    let expanded = expand(document, base)?;
    let mut sink = QuadCollectorSink::new();
    to_rdf(&expanded, &mut sink)?;
    tracing::debug!(base, quads = sink.len(), "converted JSON-LD document to quads");
    Ok(sink.finish())
}
