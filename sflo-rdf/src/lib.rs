//! Parse, debase and serialize RDF for Semantic Flow meshes
//!
//! Documents come in from local files, URLs or inline JSON-LD, are parsed
//! into quads whose IRIs are all absolute, and go back out as text in which
//! identifiers under a target location are written as relative references.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use sflo_rdf::{parse_rdf_source, serialize_rdf, SerializeOptions, SourceDescriptor, Syntax};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let graph = parse_rdf_source(SourceDescriptor::inline(json!({
//!     "@id": "file:///mesh/node/_meta/x",
//!     "http://purl.org/dc/terms/title": "Intro"
//! })))
//! .await
//! .unwrap();
//! assert!(graph.base_iri.starts_with("file:///virtual/inline-"));
//!
//! let options = SerializeOptions::new("file:///mesh/node", Syntax::Jsonld);
//! let text = serialize_rdf(&graph.quads, &options).unwrap();
//! assert!(text.contains("\"@id\": \"_meta/x\""));
//! # });
//! ```

pub mod config;
pub mod error;
pub mod parse;
pub mod serialize;
pub mod source;
pub mod syntax;
pub mod telemetry;

pub use config::ResolverConfig;
pub use error::{GraphParseError, GraphSerializeError, ParseFailure, SerializeFailure, SourceFailure};
pub use parse::ParsedGraph;
pub use serialize::{stream_writer, SerializeOptions};
pub use source::{ResolvedSource, SourceContent, SourceDescriptor};
pub use syntax::{detect_syntax, Syntax};

pub use sflo_graph_ir::{GraphName, Quad, Term};
pub use sflo_graph_json_ld::debase::{debase, debase_iri, normalize_base};

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Resolve and parse a source with the default resolver settings.
pub async fn parse_rdf_source(source: SourceDescriptor) -> Result<ParsedGraph, ParseFailure> {
    parse_rdf_source_with(source, &ResolverConfig::default(), None).await
}

/// Resolve and parse a source.
///
/// `cancel` aborts an in-flight URL fetch with `SourceFailure::Fetch`.
pub async fn parse_rdf_source_with(
    descriptor: SourceDescriptor,
    config: &ResolverConfig,
    cancel: Option<CancellationToken>,
) -> Result<ParsedGraph, ParseFailure> {
    let span = tracing::debug_span!("parse_rdf_source", kind = source_kind(&descriptor));
    async move {
        let resolved = source::resolve(&descriptor, config, cancel.as_ref()).await?;
        Ok::<_, ParseFailure>(parse::parse_resolved(resolved)?)
    }
    .instrument(span)
    .await
}

/// Serialize quads for storage at `options.target_base`.
pub fn serialize_rdf(quads: &[Quad], options: &SerializeOptions) -> Result<String, SerializeFailure> {
    let _span = tracing::debug_span!(
        "serialize_rdf",
        syntax = %options.syntax,
        base = %options.target_base
    )
    .entered();
    serialize::serialize_quads(quads, options)
}

fn source_kind(descriptor: &SourceDescriptor) -> &'static str {
    match descriptor {
        SourceDescriptor::Inline { .. } => "inline",
        SourceDescriptor::File { .. } => "file",
        SourceDescriptor::Url { .. } => "url",
    }
}
