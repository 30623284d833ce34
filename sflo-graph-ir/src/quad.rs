//! Quad and graph name types

use crate::Term;
use serde::{Deserialize, Serialize};

/// Graph position of a quad
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GraphName {
    /// The default graph
    Default,
    /// A named graph (IRI or blank node)
    Named(Term),
}

impl GraphName {
    pub fn is_default(&self) -> bool {
        matches!(self, GraphName::Default)
    }

    pub fn as_term(&self) -> Option<&Term> {
        match self {
            GraphName::Default => None,
            GraphName::Named(t) => Some(t),
        }
    }
}

/// An RDF quad
///
/// The predicate is always a `Term::Iri`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: GraphName,
}

impl Quad {
    pub fn new(subject: Term, predicate: Term, object: Term, graph: GraphName) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph,
        }
    }

    /// Create a quad in the default graph
    pub fn triple(subject: Term, predicate: Term, object: Term) -> Self {
        Self::new(subject, predicate, object, GraphName::Default)
    }
}

/// One N-Quads statement, without the trailing newline
impl std::fmt::Display for Quad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let GraphName::Named(g) = &self.graph {
            write!(f, " {}", g)?;
        }
        write!(f, " .")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_default_graph() {
        let q = Quad::triple(
            Term::iri("http://ex.org/s"),
            Term::iri("http://ex.org/p"),
            Term::blank("o"),
        );
        assert_eq!(q.to_string(), "<http://ex.org/s> <http://ex.org/p> _:o .");
    }

    #[test]
    fn test_display_named_graph() {
        let q = Quad::new(
            Term::iri("http://ex.org/s"),
            Term::iri("http://ex.org/p"),
            Term::string("o"),
            GraphName::Named(Term::iri("http://ex.org/g")),
        );
        assert_eq!(
            q.to_string(),
            "<http://ex.org/s> <http://ex.org/p> \"o\" <http://ex.org/g> ."
        );
    }
}
