//! Base-aware writer for Turtle, TriG, N-Triples and N-Quads.
//!
//! Writing is two-phase: quads are buffered with [`QuadWriter::add`] and
//! rendered by [`QuadWriter::finish`], which is also the only place a
//! writer error can surface.
//!
//! Turtle and TriG output writes IRIs relative to the configured base (the
//! shortest RFC 3986 reference that resolves back to the IRI) and never
//! declares `@base`; a reader must supply the same base. N-Triples and
//! N-Quads always carry absolute IRIs.

use std::collections::{HashMap, HashSet};

use sflo_graph_ir::{escape_iri, escape_string, iri, GraphName, Quad, Term};
use sflo_vocab::{rdf, xsd};
use tracing::debug;

use crate::error::{Result, TurtleError};
use crate::lex::chars::{is_blank_label, is_plain_local_name};
use crate::Dialect;

const INDENT: &str = "    ";

/// Buffers quads and renders them in one dialect.
///
/// # Example
///
/// ```
/// use sflo_graph_ir::{Quad, Term};
/// use sflo_graph_turtle::{Dialect, QuadWriter};
///
/// let mut writer = QuadWriter::new(Dialect::Turtle).with_base("http://example.org/doc");
/// writer.add(Quad::triple(
///     Term::iri("http://example.org/doc#me"),
///     Term::iri("http://xmlns.com/foaf/0.1/name"),
///     Term::string("Alice"),
/// ));
/// let text = writer.finish().unwrap();
/// assert_eq!(text, "<#me> <http://xmlns.com/foaf/0.1/name> \"Alice\" .\n");
/// ```
#[derive(Debug, Clone)]
pub struct QuadWriter {
    dialect: Dialect,
    base: Option<String>,
    /// (prefix, namespace) in declaration order
    prefixes: Vec<(String, String)>,
    quads: Vec<Quad>,
}

impl QuadWriter {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            base: None,
            prefixes: Vec::new(),
            quads: Vec::new(),
        }
    }

    /// Relativize IRIs against `base` (Turtle and TriG only).
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Declare a prefix for Turtle and TriG output.
    ///
    /// `prefix` must be a valid PN_PREFIX (or empty). Ignored by the line
    /// dialects.
    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.push((prefix.into(), namespace.into()));
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Buffer one quad.
    pub fn add(&mut self, quad: Quad) {
        self.quads.push(quad);
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Validate and render every buffered quad.
    pub fn finish(self) -> Result<String> {
        debug!(
            dialect = %self.dialect,
            base = ?self.base,
            quads = self.quads.len(),
            "writing quads"
        );
        self.validate()?;

        let renderer = Renderer::new(&self);
        let mut out = String::new();

        if self.dialect.is_line_based() {
            for quad in &self.quads {
                renderer.line(quad, &mut out);
            }
            return Ok(out);
        }

        for (prefix, namespace) in &self.prefixes {
            out.push_str(&format!("@prefix {}: <{}> .\n", prefix, escape_iri(namespace)));
        }
        if !self.prefixes.is_empty() && !self.quads.is_empty() {
            out.push('\n');
        }

        // Runs of consecutive quads sharing a graph keep the input order.
        let mut start = 0;
        while start < self.quads.len() {
            let graph = &self.quads[start].graph;
            let end = start
                + self.quads[start..]
                    .iter()
                    .take_while(|q| &q.graph == graph)
                    .count();
            match graph {
                GraphName::Default => renderer.blocks(&self.quads[start..end], "", &mut out),
                GraphName::Named(g) => {
                    out.push_str(&renderer.term(g));
                    out.push_str(" {\n");
                    renderer.blocks(&self.quads[start..end], INDENT, &mut out);
                    out.push_str("}\n");
                }
            }
            start = end;
        }
        Ok(out)
    }

    fn validate(&self) -> Result<()> {
        for (index, quad) in self.quads.iter().enumerate() {
            let problem = if quad.subject.is_literal() {
                Some("literal in subject position")
            } else if !quad.predicate.is_iri() {
                Some("predicate must be an IRI")
            } else {
                match &quad.graph {
                    GraphName::Named(_) if !self.dialect.supports_named_graphs() => {
                        Some("named graphs are not supported")
                    }
                    GraphName::Named(g) if g.is_literal() => Some("literal as graph name"),
                    _ => None,
                }
            };
            if let Some(message) = problem {
                return Err(TurtleError::Write {
                    index,
                    dialect: self.dialect,
                    message: message.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Rendering state computed once per `finish`.
struct Renderer<'a> {
    dialect: Dialect,
    base: Option<&'a str>,
    prefixes: &'a [(String, String)],
    /// Labels that cannot be written verbatim
    relabeled: HashMap<&'a str, String>,
}

impl<'a> Renderer<'a> {
    fn new(writer: &'a QuadWriter) -> Self {
        let mut labels: HashSet<&str> = HashSet::new();
        for quad in &writer.quads {
            for term in [&quad.subject, &quad.object]
                .into_iter()
                .chain(quad.graph.as_term())
            {
                if let Term::BlankNode(id) = term {
                    labels.insert(id.as_str());
                }
            }
        }

        let mut relabeled = HashMap::new();
        let mut counter = 0usize;
        let mut invalid: Vec<&str> = labels
            .iter()
            .copied()
            .filter(|l| !is_blank_label(l))
            .collect();
        invalid.sort_unstable();
        for label in invalid {
            let fresh = loop {
                counter += 1;
                let candidate = format!("b{}", counter);
                if !labels.contains(candidate.as_str()) {
                    break candidate;
                }
            };
            relabeled.insert(label, fresh);
        }

        Self {
            dialect: writer.dialect,
            base: if writer.dialect.is_line_based() {
                None
            } else {
                writer.base.as_deref()
            },
            prefixes: if writer.dialect.is_line_based() {
                &[]
            } else {
                writer.prefixes.as_slice()
            },
            relabeled,
        }
    }

    /// One N-Triples / N-Quads statement
    fn line(&self, quad: &Quad, out: &mut String) {
        out.push_str(&self.term(&quad.subject));
        out.push(' ');
        out.push_str(&self.term(&quad.predicate));
        out.push(' ');
        out.push_str(&self.term(&quad.object));
        if let (Dialect::NQuads, GraphName::Named(g)) = (self.dialect, &quad.graph) {
            out.push(' ');
            out.push_str(&self.term(g));
        }
        out.push_str(" .\n");
    }

    /// Subject blocks with `;` between predicates and `,` between objects
    fn blocks(&self, quads: &[Quad], indent: &str, out: &mut String) {
        let mut i = 0;
        while i < quads.len() {
            let subject = &quads[i].subject;
            out.push_str(indent);
            out.push_str(&self.term(subject));

            let mut first_predicate = true;
            while i < quads.len() && &quads[i].subject == subject {
                let predicate = &quads[i].predicate;
                if first_predicate {
                    out.push(' ');
                } else {
                    out.push_str(" ;\n");
                    out.push_str(indent);
                    out.push_str(INDENT);
                }
                out.push_str(&self.predicate(predicate));
                out.push(' ');

                let mut first_object = true;
                while i < quads.len()
                    && &quads[i].subject == subject
                    && &quads[i].predicate == predicate
                {
                    if !first_object {
                        out.push_str(", ");
                    }
                    out.push_str(&self.term(&quads[i].object));
                    first_object = false;
                    i += 1;
                }
                first_predicate = false;
            }
            out.push_str(" .\n");
        }
    }

    fn predicate(&self, term: &Term) -> String {
        match term {
            Term::Iri(iri) if iri.as_ref() == rdf::TYPE => "a".to_string(),
            other => self.term(other),
        }
    }

    fn term(&self, term: &Term) -> String {
        match term {
            Term::Iri(iri) => self.iri(iri),
            Term::BlankNode(id) => match self.relabeled.get(id.as_str()) {
                Some(fresh) => format!("_:{}", fresh),
                None => id.to_string(),
            },
            Term::Literal {
                value,
                datatype,
                language,
            } => {
                if let Some(lang) = language {
                    return format!("\"{}\"@{}", escape_string(value), lang);
                }
                let dt = datatype.as_iri();
                if dt == xsd::STRING {
                    format!("\"{}\"", escape_string(value))
                } else if !self.dialect.is_line_based() && is_bare_literal(value, dt) {
                    value.to_string()
                } else {
                    format!("\"{}\"^^{}", escape_string(value), self.iri(dt))
                }
            }
        }
    }

    /// Prefixed name, then relative reference, then absolute `<iri>`.
    fn iri(&self, value: &str) -> String {
        let prefixed = self
            .prefixes
            .iter()
            .filter(|(_, ns)| value.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len())
            .and_then(|(prefix, ns)| {
                let local = &value[ns.len()..];
                is_plain_local_name(local).then(|| format!("{}:{}", prefix, local))
            });
        if let Some(name) = prefixed {
            return name;
        }

        let reference = self
            .base
            .and_then(|base| iri::relativize(value, base))
            .unwrap_or_else(|| value.to_string());
        format!("<{}>", escape_iri(&reference))
    }
}

/// Lexical forms Turtle can write without quotes and datatype.
fn is_bare_literal(lexical: &str, datatype: &str) -> bool {
    let unsigned = lexical.strip_prefix(&['+', '-'][..]).unwrap_or(lexical);
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    match datatype {
        xsd::BOOLEAN => lexical == "true" || lexical == "false",
        xsd::INTEGER => all_digits(unsigned),
        xsd::DECIMAL => match unsigned.split_once('.') {
            Some((whole, frac)) => {
                (whole.is_empty() || all_digits(whole)) && all_digits(frac)
            }
            None => false,
        },
        xsd::DOUBLE => {
            let Some((mantissa, exponent)) = unsigned.split_once(&['e', 'E'][..]) else {
                return false;
            };
            let exponent = exponent.strip_prefix(&['+', '-'][..]).unwrap_or(exponent);
            let mantissa_ok = match mantissa.split_once('.') {
                Some((whole, frac)) => {
                    (all_digits(whole) && (frac.is_empty() || all_digits(frac)))
                        || (whole.is_empty() && all_digits(frac))
                }
                None => all_digits(mantissa),
            };
            mantissa_ok && all_digits(exponent)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sflo_graph_ir::Datatype;

    fn ex(local: &str) -> Term {
        Term::iri(format!("http://example.org/{}", local))
    }

    fn write(dialect: Dialect, base: Option<&str>, quads: Vec<Quad>) -> Result<String> {
        let mut writer = QuadWriter::new(dialect);
        if let Some(b) = base {
            writer = writer.with_base(b);
        }
        for q in quads {
            writer.add(q);
        }
        writer.finish()
    }

    #[test]
    fn test_turtle_groups_subject_and_predicate() {
        let text = write(
            Dialect::Turtle,
            None,
            vec![
                Quad::triple(ex("alice"), Term::iri(rdf::TYPE), ex("Person")),
                Quad::triple(ex("alice"), ex("knows"), ex("bob")),
                Quad::triple(ex("alice"), ex("knows"), ex("carol")),
                Quad::triple(ex("bob"), ex("name"), Term::string("Bob")),
            ],
        )
        .unwrap();
        assert_eq!(
            text,
            "<http://example.org/alice> a <http://example.org/Person> ;\n    \
             <http://example.org/knows> <http://example.org/bob>, <http://example.org/carol> .\n\
             <http://example.org/bob> <http://example.org/name> \"Bob\" .\n"
        );
    }

    #[test]
    fn test_turtle_relativizes_against_base() {
        let text = write(
            Dialect::Turtle,
            Some("file:///mesh/node/_working/node.ttl"),
            vec![Quad::triple(
                Term::iri("file:///mesh/node/_working/node.ttl"),
                Term::iri("file:///mesh/node/_meta/p"),
                Term::iri("https://example.org/other"),
            )],
        )
        .unwrap();
        assert_eq!(text, "<> <../_meta/p> <https://example.org/other> .\n");
        assert!(!text.contains("@base"));
    }

    #[test]
    fn test_line_dialects_ignore_base() {
        let quad = Quad::triple(
            Term::iri("http://example.org/doc#a"),
            ex("p"),
            Term::typed("5", Datatype::xsd_integer()),
        );
        let text = write(Dialect::NTriples, Some("http://example.org/doc"), vec![quad]).unwrap();
        assert_eq!(
            text,
            "<http://example.org/doc#a> <http://example.org/p> \"5\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n"
        );
    }

    #[test]
    fn test_prefixes_and_bare_literals() {
        let mut writer = QuadWriter::new(Dialect::Turtle).with_prefix("ex", "http://example.org/");
        writer.add(Quad::triple(
            ex("s"),
            ex("n"),
            Term::typed("42", Datatype::xsd_integer()),
        ));
        writer.add(Quad::triple(
            ex("s"),
            ex("b"),
            Term::typed("true", Datatype::xsd_boolean()),
        ));
        writer.add(Quad::triple(ex("s"), ex("path/x"), Term::lang_string("hi", "en")));
        let text = writer.finish().unwrap();
        assert_eq!(
            text,
            "@prefix ex: <http://example.org/> .\n\n\
             ex:s ex:n 42 ;\n    ex:b true ;\n    <http://example.org/path/x> \"hi\"@en .\n"
        );
    }

    #[test]
    fn test_trig_named_graph_blocks() {
        let g = ex("g");
        let text = write(
            Dialect::TriG,
            Some("http://example.org/"),
            vec![
                Quad::triple(ex("a"), ex("p"), ex("b")),
                Quad::new(ex("s"), ex("p"), ex("o"), GraphName::Named(g.clone())),
                Quad::new(ex("s"), ex("p"), ex("o2"), GraphName::Named(g)),
            ],
        )
        .unwrap();
        assert_eq!(text, "<a> <p> <b> .\n<g> {\n    <s> <p> <o>, <o2> .\n}\n");
    }

    #[test]
    fn test_nquads_graph_label() {
        let text = write(
            Dialect::NQuads,
            None,
            vec![Quad::new(
                Term::blank("x"),
                ex("p"),
                Term::string("line\nbreak"),
                GraphName::Named(ex("g")),
            )],
        )
        .unwrap();
        assert_eq!(
            text,
            "_:x <http://example.org/p> \"line\\nbreak\" <http://example.org/g> .\n"
        );
    }

    #[test]
    fn test_named_graph_rejected_by_triple_dialects() {
        for dialect in [Dialect::Turtle, Dialect::NTriples] {
            let err = write(
                dialect,
                None,
                vec![Quad::new(ex("s"), ex("p"), ex("o"), GraphName::Named(ex("g")))],
            )
            .unwrap_err();
            assert!(matches!(err, TurtleError::Write { index: 0, .. }));
        }
    }

    #[test]
    fn test_literal_subject_rejected_at_finish() {
        let mut writer = QuadWriter::new(Dialect::NTriples);
        writer.add(Quad::triple(Term::string("x"), ex("p"), ex("o")));
        assert_eq!(writer.len(), 1);
        assert!(writer.finish().is_err());
    }

    #[test]
    fn test_invalid_blank_labels_are_relabeled() {
        let text = write(
            Dialect::NTriples,
            None,
            vec![Quad::triple(Term::blank("has space"), ex("p"), Term::blank("b1"))],
        )
        .unwrap();
        assert_eq!(text, "_:b2 <http://example.org/p> _:b1 .\n");
    }

    #[test]
    fn test_is_bare_literal() {
        assert!(is_bare_literal("-12", xsd::INTEGER));
        assert!(!is_bare_literal("12a", xsd::INTEGER));
        assert!(is_bare_literal(".5", xsd::DECIMAL));
        assert!(!is_bare_literal("5", xsd::DECIMAL));
        assert!(is_bare_literal("1.e5", xsd::DOUBLE));
        assert!(is_bare_literal("-2E-3", xsd::DOUBLE));
        assert!(!is_bare_literal("INF", xsd::DOUBLE));
        assert!(!is_bare_literal("1", xsd::STRING));
    }
}
