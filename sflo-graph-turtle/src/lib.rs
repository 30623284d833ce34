//! Turtle, TriG, N-Triples and N-Quads for the Semantic Flow RDF core.
//!
//! This crate provides one parser for the four stream syntaxes that emits to
//! `sflo_graph_ir::QuadSink`, plus a base-aware two-phase writer.
//!
//! # Example
//!
//! ```
//! use sflo_graph_turtle::{parse_to_quads, Dialect, QuadWriter};
//!
//! let turtle = r#"
//!     @prefix ex: <http://example.org/> .
//!     ex:alice ex:name "Alice" ;
//!              ex:knows <bob> .
//! "#;
//!
//! let quads = parse_to_quads(turtle, Dialect::Turtle, Some("http://example.org/people/")).unwrap();
//! assert_eq!(quads[1].object.as_iri(), Some("http://example.org/people/bob"));
//!
//! let mut writer = QuadWriter::new(Dialect::NQuads);
//! for quad in quads {
//!     writer.add(quad);
//! }
//! let nquads = writer.finish().unwrap();
//! assert_eq!(nquads.lines().count(), 2);
//! ```

mod dialect;
pub mod error;
pub mod lex;
pub mod parser;
pub mod writer;

pub use dialect::Dialect;
pub use error::{Result, TurtleError};
pub use parser::parse;
pub use writer::QuadWriter;

use sflo_graph_ir::{Quad, QuadCollectorSink};

/// Parse a document into an ordered quad list.
///
/// Nothing is returned on error; quads collected before the failure are
/// dropped.
pub fn parse_to_quads(input: &str, dialect: Dialect, base: Option<&str>) -> Result<Vec<Quad>> {
    let mut sink = QuadCollectorSink::new();
    parse(input, dialect, base, &mut sink)?;
    Ok(sink.finish())
}
