//! Write-then-parse behaviour across the four stream dialects.

use std::collections::{BTreeSet, HashMap};

use pretty_assertions::assert_eq;
use sflo_graph_ir::{Datatype, GraphName, Quad, Term};
use sflo_graph_turtle::{parse_to_quads, Dialect, QuadWriter};

const BASE: &str = "file:///mesh/node/_ref/_working/node_ref.ttl";

fn sample(with_graphs: bool) -> Vec<Quad> {
    let doc = |frag: &str| Term::iri(format!("{BASE}#{frag}"));
    let graph = if with_graphs {
        GraphName::Named(Term::iri("file:///mesh/node/_ref/_working/graph"))
    } else {
        GraphName::Default
    };
    vec![
        Quad::triple(
            doc("section1"),
            Term::iri("http://www.w3.org/1999/02/22-rdf-syntax-ns#type"),
            Term::iri("https://w3id.org/semantic-flow#Section"),
        ),
        Quad::triple(
            doc("section1"),
            Term::iri("http://purl.org/dc/terms/title"),
            Term::lang_string("Intro \"quoted\"\n", "en"),
        ),
        Quad::triple(
            doc("section1"),
            Term::iri("file:///mesh/node/_meta/order"),
            Term::typed("01", Datatype::xsd_integer()),
        ),
        Quad::triple(
            Term::blank("anon"),
            Term::iri("http://purl.org/dc/terms/source"),
            Term::iri(BASE),
        ),
        Quad::triple(
            Term::iri("http://ex.org/a/../b"),
            Term::iri("http://ex.org/p"),
            Term::string("x"),
        ),
        Quad::new(
            Term::iri("file:///other/place"),
            Term::iri("http://purl.org/dc/terms/relation"),
            Term::blank("anon"),
            graph,
        ),
    ]
}

/// Canonical form with blank nodes renamed by first appearance.
fn canonical(quads: &[Quad]) -> BTreeSet<String> {
    let mut names: HashMap<String, String> = HashMap::new();
    let mut rename = |t: &Term| -> Term {
        match t {
            Term::BlankNode(id) => {
                let next = format!("c{}", names.len());
                Term::blank(names.entry(id.as_str().to_string()).or_insert(next).clone())
            }
            other => other.clone(),
        }
    };
    quads
        .iter()
        .map(|q| {
            let graph = match &q.graph {
                GraphName::Named(g) => GraphName::Named(rename(g)),
                GraphName::Default => GraphName::Default,
            };
            Quad::new(rename(&q.subject), q.predicate.clone(), rename(&q.object), graph)
                .to_string()
        })
        .collect()
}

fn round_trip(dialect: Dialect, quads: Vec<Quad>) -> Vec<Quad> {
    let mut writer = QuadWriter::new(dialect).with_base(BASE);
    for q in quads {
        writer.add(q);
    }
    let text = writer.finish().unwrap();
    parse_to_quads(&text, dialect, Some(BASE)).unwrap()
}

#[test]
fn turtle_round_trip_is_set_equal() {
    let original = sample(false);
    assert_eq!(canonical(&round_trip(Dialect::Turtle, original.clone())), canonical(&original));
}

#[test]
fn ntriples_round_trip_is_set_equal() {
    let original = sample(false);
    assert_eq!(canonical(&round_trip(Dialect::NTriples, original.clone())), canonical(&original));
}

#[test]
fn trig_round_trip_is_set_equal() {
    let original = sample(true);
    assert_eq!(canonical(&round_trip(Dialect::TriG, original.clone())), canonical(&original));
}

#[test]
fn nquads_round_trip_is_set_equal() {
    let original = sample(true);
    assert_eq!(canonical(&round_trip(Dialect::NQuads, original.clone())), canonical(&original));
}

#[test]
fn turtle_output_is_relative_to_base() {
    let mut writer = QuadWriter::new(Dialect::Turtle).with_base(BASE);
    for q in sample(false) {
        writer.add(q);
    }
    let text = writer.finish().unwrap();
    assert!(text.contains("<#section1>"));
    assert!(text.contains("<../../_meta/order>"));
    assert!(text.contains("<https://w3id.org/semantic-flow#Section>"));
    assert!(!text.contains("@base"));
    assert!(text.contains("<http://ex.org/a/../b>"));
}

#[test]
fn dot_segments_in_absolute_iris_survive_parsing() {
    let text = "<http://ex.org/a/../b> <http://ex.org/p> <http://ex.org/c/./d> .\n";
    for dialect in [Dialect::NTriples, Dialect::Turtle] {
        let quads = parse_to_quads(text, dialect, Some(BASE)).unwrap();
        assert_eq!(quads[0].subject, Term::iri("http://ex.org/a/../b"));
        assert_eq!(quads[0].object, Term::iri("http://ex.org/c/./d"));
    }
}

#[test]
fn round_trip_preserves_statement_order() {
    let original = sample(false);
    let parsed = round_trip(Dialect::NTriples, original.clone());
    let predicates: Vec<&Term> = parsed.iter().map(|q| &q.predicate).collect();
    let expected: Vec<&Term> = original.iter().map(|q| &q.predicate).collect();
    assert_eq!(predicates, expected);
}
