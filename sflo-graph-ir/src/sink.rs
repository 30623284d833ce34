//! QuadSink trait for event-driven graph construction
//!
//! Parsers call methods like `term_iri()` and `emit_quad()` on a sink without
//! knowing the concrete sink type. `QuadCollectorSink` collects the events
//! into an ordered `Vec<Quad>`.

use crate::{Datatype, GraphName, Quad, Term};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Opaque term identifier for efficient quad emission
///
/// `TermId` is only valid within a single sink session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TermId(pub(crate) u32);

impl TermId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

/// Event-driven interface for RDF graph construction
///
/// # Example
///
/// ```
/// use sflo_graph_ir::{QuadSink, QuadCollectorSink, Datatype};
///
/// let mut sink = QuadCollectorSink::new();
///
/// let alice = sink.term_iri("http://example.org/alice");
/// let name = sink.term_iri("http://xmlns.com/foaf/0.1/name");
/// let alice_name = sink.term_literal("Alice", Datatype::xsd_string(), None);
///
/// sink.emit_triple(alice, name, alice_name);
///
/// let quads = sink.finish();
/// assert_eq!(quads.len(), 1);
/// ```
pub trait QuadSink {
    /// Called when a prefix is declared
    ///
    /// In Turtle: `@prefix foaf: <http://xmlns.com/foaf/0.1/> .`
    fn on_prefix(&mut self, prefix: &str, namespace_iri: &str) {
        let _ = (prefix, namespace_iri);
    }

    /// Create an IRI term and return its ID
    ///
    /// The IRI must already be resolved to absolute form.
    fn term_iri(&mut self, iri: &str) -> TermId;

    /// Create a blank node term and return its ID
    ///
    /// If `label` is Some, every call with the same label yields the same
    /// node. If None, a fresh blank node is generated.
    fn term_blank(&mut self, label: Option<&str>) -> TermId;

    /// Create a literal term from its lexical form
    fn term_literal(&mut self, value: &str, datatype: Datatype, language: Option<&str>) -> TermId;

    /// Emit a quad; `graph` is None for the default graph
    fn emit_quad(&mut self, subject: TermId, predicate: TermId, object: TermId, graph: Option<TermId>);

    /// Emit a quad in the default graph
    fn emit_triple(&mut self, subject: TermId, predicate: TermId, object: TermId) {
        self.emit_quad(subject, predicate, object, None);
    }
}

/// A sink that collects quads in emission order
#[derive(Debug, Default)]
pub struct QuadCollectorSink {
    quads: Vec<Quad>,
    terms: Vec<Term>,
    /// Counter for generating blank node labels
    blank_counter: u32,
    /// Source label -> TermId
    blank_labels: HashMap<String, TermId>,
    /// Every blank label handed out so far
    used_labels: HashSet<String>,
    prefixes: BTreeMap<String, String>,
}

impl QuadCollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish building and return the quads
    pub fn finish(self) -> Vec<Quad> {
        self.quads
    }

    /// Prefixes declared by the source document
    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefixes
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    fn get_term(&self, id: TermId) -> &Term {
        &self.terms[id.0 as usize]
    }

    fn add_term(&mut self, term: Term) -> TermId {
        let id = TermId(self.terms.len() as u32);
        self.terms.push(term);
        id
    }

    /// Generated labels never collide with labels taken from the source.
    fn fresh_label(&mut self) -> String {
        loop {
            self.blank_counter += 1;
            let label = format!("b{}", self.blank_counter);
            if self.used_labels.insert(label.clone()) {
                return label;
            }
        }
    }
}

impl QuadSink for QuadCollectorSink {
    fn on_prefix(&mut self, prefix: &str, namespace_iri: &str) {
        self.prefixes
            .insert(prefix.to_string(), namespace_iri.to_string());
    }

    fn term_iri(&mut self, iri: &str) -> TermId {
        self.add_term(Term::iri(iri))
    }

    fn term_blank(&mut self, label: Option<&str>) -> TermId {
        match label {
            Some(l) => {
                if let Some(&id) = self.blank_labels.get(l) {
                    return id;
                }
                let assigned = if self.used_labels.insert(l.to_string()) {
                    l.to_string()
                } else {
                    self.fresh_label()
                };
                let id = self.add_term(Term::blank(assigned));
                self.blank_labels.insert(l.to_string(), id);
                id
            }
            None => {
                let label = self.fresh_label();
                self.add_term(Term::blank(label))
            }
        }
    }

    fn term_literal(&mut self, value: &str, datatype: Datatype, language: Option<&str>) -> TermId {
        self.add_term(Term::literal(value, datatype, language))
    }

    fn emit_quad(&mut self, subject: TermId, predicate: TermId, object: TermId, graph: Option<TermId>) {
        let s = self.get_term(subject).clone();
        let p = self.get_term(predicate).clone();
        let o = self.get_term(object).clone();
        let g = match graph {
            Some(g) => GraphName::Named(self.get_term(g).clone()),
            None => GraphName::Default,
        };
        self.quads.push(Quad::new(s, p, o, g));
    }
}
