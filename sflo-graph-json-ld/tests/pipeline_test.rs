//! End-to-end tests: document -> quads -> expanded tree -> debased tree

use pretty_assertions::assert_eq;
use serde_json::json;
use sflo_graph_ir::{Datatype, Term};
use sflo_graph_json_ld::{compact, debase, from_rdf, to_quads, ParsedContext};

const DOC_BASE: &str = "file:///mesh/node/_ref/_working/node_ref.jsonld";

#[test]
fn test_vocab_with_references() {
    let ctx = ParsedContext::new(None)
        .process(&json!({
            "@vocab": "https://schema.org/",
            "reverseRef": {"@reverse": "isBasedOn"},
            "explicit": "name",
            "dontTouch": "https://example.com/ns#42",
            "id": "@id"
        }))
        .unwrap();

    assert_eq!(
        ctx.get("reverseRef").unwrap().id.as_deref(),
        Some("https://schema.org/isBasedOn")
    );
    assert_eq!(ctx.get("explicit").unwrap().id.as_deref(), Some("https://schema.org/name"));
    assert_eq!(
        ctx.get("dontTouch").unwrap().id.as_deref(),
        Some("https://example.com/ns#42")
    );
    assert_eq!(ctx.get("id").unwrap().id.as_deref(), Some("@id"));
}

#[test]
fn test_relative_references_become_absolute_quads() {
    let doc = json!({
        "@context": {
            "dc": "http://purl.org/dc/terms/",
            "sflo": "https://w3id.org/semantic-flow#",
            "hasPart": {"@id": "dc:hasPart", "@type": "@id"}
        },
        "@id": "",
        "@type": "sflo:Reference",
        "hasPart": ["#section1", "../../_meta/meta.jsonld"],
        "dc:created": {"@value": "2024-05-01", "@type": "http://www.w3.org/2001/XMLSchema#date"}
    });

    let quads = to_quads(&doc, DOC_BASE).unwrap();
    let objects: Vec<&Term> = quads.iter().map(|q| &q.object).collect();

    assert!(quads.iter().all(|q| q.subject == Term::iri(DOC_BASE)));
    assert_eq!(
        objects,
        vec![
            &Term::iri("https://w3id.org/semantic-flow#Reference"),
            &Term::iri(format!("{DOC_BASE}#section1")),
            &Term::iri("file:///mesh/node/_meta/meta.jsonld"),
            &Term::typed("2024-05-01", Datatype::from_iri("http://www.w3.org/2001/XMLSchema#date")),
        ]
    );
}

#[test]
fn test_debased_tree_relative_to_document() {
    let doc = json!({
        "@id": "#section1",
        "@type": "https://w3id.org/semantic-flow#Section",
        "http://purl.org/dc/terms/isPartOf": {"@id": ""},
        "http://purl.org/dc/terms/source": {"@id": "https://example.org/other"}
    });

    let quads = to_quads(&doc, DOC_BASE).unwrap();
    let tree = debase::debase(&from_rdf(&quads), DOC_BASE);

    assert_eq!(
        tree,
        json!([{
            "@id": "#section1",
            "@type": ["https://w3id.org/semantic-flow#Section"],
            "http://purl.org/dc/terms/isPartOf": [{"@id": ""}],
            "http://purl.org/dc/terms/source": [{"@id": "https://example.org/other"}]
        }])
    );
}

#[test]
fn test_rebasing_moves_identifiers() {
    let doc = json!({
        "@id": "_meta/x",
        "http://purl.org/dc/terms/title": "X"
    });

    // Parsed under one base, written under its parent directory.
    let quads = to_quads(&doc, "file:///mesh/node/doc.jsonld").unwrap();
    let tree = debase::debase(&from_rdf(&quads), "file:///mesh/node/");
    assert_eq!(tree[0]["@id"], "_meta/x");

    let elsewhere = debase::debase(&from_rdf(&quads), "file:///mesh/other/");
    assert_eq!(elsewhere[0]["@id"], "file:///mesh/node/_meta/x");
}

#[test]
fn test_compaction_after_debasing_keeps_relative_ids() {
    let doc = json!({
        "@context": {"dc": "http://purl.org/dc/terms/"},
        "@graph": [
            {"@id": "#a", "dc:title": "A"},
            {"@id": "#b", "dc:title": "B", "dc:references": {"@id": "#a"}}
        ]
    });
    let context = json!({"dc": "http://purl.org/dc/terms/"});

    let quads = to_quads(&doc, DOC_BASE).unwrap();
    let tree = debase::debase(&from_rdf(&quads), DOC_BASE);
    let compacted = compact(tree.as_array().unwrap(), &context).unwrap();

    assert_eq!(
        compacted,
        json!({
            "@context": {"dc": "http://purl.org/dc/terms/"},
            "@graph": [
                {"@id": "#a", "dc:title": "A"},
                {"@id": "#b", "dc:title": "B", "dc:references": {"@id": "#a"}}
            ]
        })
    );
    assert!(!compacted.to_string().contains("@base"));
}

#[test]
fn test_lists_survive_the_round_trip() {
    let doc = json!({
        "@context": {"steps": {"@id": "http://ex.org/steps", "@container": "@list"}},
        "@id": "http://ex.org/recipe",
        "steps": ["mix", "bake"]
    });

    let quads = to_quads(&doc, DOC_BASE).unwrap();
    assert_eq!(quads.len(), 5);
    assert_eq!(
        from_rdf(&quads),
        json!([{
            "@id": "http://ex.org/recipe",
            "http://ex.org/steps": [{"@list": [{"@value": "mix"}, {"@value": "bake"}]}]
        }])
    );
}

#[test]
fn test_named_graph_round_trip() {
    let doc = json!({
        "@id": "http://ex.org/g",
        "@graph": {"@id": "http://ex.org/a", "http://ex.org/p": "v"}
    });

    let quads = to_quads(&doc, DOC_BASE).unwrap();
    assert_eq!(quads.len(), 1);
    assert_eq!(
        from_rdf(&quads),
        json!([{
            "@id": "http://ex.org/g",
            "@graph": [{"@id": "http://ex.org/a", "http://ex.org/p": [{"@value": "v"}]}]
        }])
    );
}
