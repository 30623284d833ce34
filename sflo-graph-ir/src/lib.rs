//! Format-agnostic RDF quad model
//!
//! This crate provides the canonical types that every parser in the workspace
//! produces and every writer consumes, regardless of the serialization format
//! (JSON-LD, Turtle, TriG, N-Triples, N-Quads).
//!
//! # Key Design Principles
//!
//! 1. **Absolute IRIs only** - Every `Term::Iri` produced by a parser is
//!    absolute. Relative forms only exist in serialized output.
//!
//! 2. **Explicit datatypes** - Literals always have an explicit datatype. Plain
//!    strings use `xsd:string`, language-tagged strings use `rdf:langString`.
//!
//! 3. **Lexical literals** - Literal values are kept in their lexical form so
//!    that a parse/serialize round trip never rewrites `"01"^^xsd:integer`
//!    into `"1"`.
//!
//! 4. **Order preserving** - A quad set is a `Vec<Quad>` in emission order.
//!
//! # Example
//!
//! ```
//! use sflo_graph_ir::{Quad, Term};
//!
//! let quad = Quad::triple(
//!     Term::iri("http://example.org/alice"),
//!     Term::iri("http://xmlns.com/foaf/0.1/name"),
//!     Term::string("Alice"),
//! );
//!
//! assert_eq!(
//!     quad.to_string(),
//!     "<http://example.org/alice> <http://xmlns.com/foaf/0.1/name> \"Alice\" ."
//! );
//! ```

pub mod datatype;
pub mod error;
pub mod iri;
mod quad;
mod sink;
mod term;

pub use datatype::Datatype;
pub use error::IriError;
pub use quad::{GraphName, Quad};
pub use sink::{QuadCollectorSink, QuadSink, TermId};
pub use term::{escape_iri, escape_string, BlankId, Term};
