//! Quads to expanded JSON-LD
//!
//! Groups quads into node objects per graph. The output is a top-level array
//! of default-graph nodes sorted by `@id`; each named graph appears as the
//! `@graph` member of the node whose `@id` names it.

use serde_json::{json, Map, Value as JsonValue};
use sflo_graph_ir::{GraphName, Quad, Term};
use sflo_vocab::{jsonld, rdf};
use std::collections::{BTreeMap, HashMap};

const DEFAULT_GRAPH: &str = "@default";

/// Nodes of one graph, keyed by `@id`, plus where each blank node and
/// `rdf:nil` is referenced from.
#[derive(Default)]
struct GraphNodes {
    nodes: BTreeMap<String, Map<String, JsonValue>>,
    /// object id -> (subject id, predicate) of every statement referencing it
    usages: HashMap<String, Vec<(String, String)>>,
}

impl GraphNodes {
    fn node(&mut self, id: &str) -> &mut Map<String, JsonValue> {
        self.nodes.entry(id.to_string()).or_insert_with(|| {
            let mut node = Map::new();
            node.insert(jsonld::ID.to_string(), JsonValue::String(id.to_string()));
            node
        })
    }
}

/// Convert quads to expanded JSON-LD.
pub fn from_rdf(quads: &[Quad]) -> JsonValue {
    let mut graphs: BTreeMap<String, GraphNodes> = BTreeMap::new();
    graphs.insert(DEFAULT_GRAPH.to_string(), GraphNodes::default());

    for quad in quads {
        let (Some(subject), Some(predicate)) = (node_id(&quad.subject), quad.predicate.as_iri()) else {
            tracing::warn!(quad = %quad, "skipping quad that cannot be represented as a node");
            continue;
        };

        let graph_key = match &quad.graph {
            GraphName::Default => DEFAULT_GRAPH.to_string(),
            GraphName::Named(term) => match node_id(term) {
                Some(id) => {
                    graphs.entry(DEFAULT_GRAPH.to_string()).or_default().node(&id);
                    id
                }
                None => continue,
            },
        };
        let graph = graphs.entry(graph_key).or_default();
        graph.node(&subject);

        let object_id = node_id(&quad.object);
        if let Some(id) = &object_id {
            graph.node(id);
        }

        if predicate == rdf::TYPE {
            if let Some(id) = &object_id {
                push_unique(graph.node(&subject), jsonld::TYPE, JsonValue::String(id.clone()));
                continue;
            }
        }

        let value = object_value(&quad.object);
        let inserted = push_unique(graph.node(&subject), predicate, value);
        if let Some(id) = object_id {
            if inserted && (id.starts_with("_:") || id == rdf::NIL) {
                graph
                    .usages
                    .entry(id)
                    .or_default()
                    .push((subject.clone(), predicate.to_string()));
            }
        }
    }

    for graph in graphs.values_mut() {
        fold_lists(graph);
    }

    let mut default = graphs.remove(DEFAULT_GRAPH).unwrap_or_default();
    let mut result = Vec::new();
    for (id, mut node) in std::mem::take(&mut default.nodes) {
        if let Some(named) = graphs.remove(&id) {
            let members: Vec<JsonValue> = named
                .nodes
                .into_values()
                .filter(|n| !is_reference_only(n))
                .map(JsonValue::Object)
                .collect();
            node.insert(jsonld::GRAPH.to_string(), JsonValue::Array(members));
        }
        if !is_reference_only(&node) {
            result.push(JsonValue::Object(node));
        }
    }
    JsonValue::Array(result)
}

/// Replace well-formed `rdf:first`/`rdf:rest` chains with `@list` objects.
fn fold_lists(graph: &mut GraphNodes) {
    let Some(nil_usages) = graph.usages.get(rdf::NIL).cloned() else {
        return;
    };

    for (start_subject, start_predicate) in nil_usages {
        let mut subject = start_subject;
        let mut predicate = start_predicate;
        let mut object = rdf::NIL.to_string();
        let mut items = Vec::new();
        let mut chain = Vec::new();

        while predicate == rdf::REST && is_list_node(graph, &subject) {
            let Some(node) = graph.nodes.get(&subject) else {
                break;
            };
            if let Some(first) = node.get(rdf::FIRST).and_then(|v| v.get(0)) {
                items.push(first.clone());
            }
            chain.push(subject.clone());
            let Some((next_subject, next_predicate)) =
                graph.usages.get(&subject).and_then(|u| u.first()).cloned()
            else {
                break;
            };
            object = subject;
            subject = next_subject;
            predicate = next_predicate;
        }

        // An empty list used as a list item stays rdf:nil.
        if predicate == rdf::FIRST && object == rdf::NIL {
            continue;
        }

        items.reverse();
        let Some(values) = graph
            .nodes
            .get_mut(&subject)
            .and_then(|n| n.get_mut(&predicate))
            .and_then(JsonValue::as_array_mut)
        else {
            continue;
        };
        let reference = json!({ "@id": object });
        if let Some(slot) = values.iter_mut().find(|v| **v == reference) {
            *slot = json!({ "@list": items });
            for id in chain {
                graph.nodes.remove(&id);
            }
        }
    }
}

/// A blank node with exactly one `rdf:first`, one `rdf:rest`, nothing else,
/// referenced exactly once.
fn is_list_node(graph: &GraphNodes, id: &str) -> bool {
    if !id.starts_with("_:") {
        return false;
    }
    let Some(node) = graph.nodes.get(id) else {
        return false;
    };
    let single = |key: &str| node.get(key).and_then(JsonValue::as_array).map(Vec::len) == Some(1);
    let only_list_keys = node.keys().all(|k| {
        k == jsonld::ID
            || k == rdf::FIRST
            || k == rdf::REST
            || (k == jsonld::TYPE && node[k] == json!([format!("{}List", rdf::NS)]))
    });
    single(rdf::FIRST)
        && single(rdf::REST)
        && only_list_keys
        && graph.usages.get(id).map(Vec::len) == Some(1)
}

fn is_reference_only(node: &Map<String, JsonValue>) -> bool {
    node.len() == 1 && node.contains_key(jsonld::ID)
}

fn push_unique(node: &mut Map<String, JsonValue>, key: &str, value: JsonValue) -> bool {
    let entry = node
        .entry(key.to_string())
        .or_insert_with(|| JsonValue::Array(Vec::new()));
    match entry {
        JsonValue::Array(values) if !values.contains(&value) => {
            values.push(value);
            true
        }
        _ => false,
    }
}

fn node_id(term: &Term) -> Option<String> {
    match term {
        Term::Iri(iri) => Some(iri.to_string()),
        Term::BlankNode(id) => Some(id.to_string()),
        Term::Literal { .. } => None,
    }
}

fn object_value(term: &Term) -> JsonValue {
    match term {
        Term::Iri(_) | Term::BlankNode(_) => json!({ "@id": node_id(term) }),
        Term::Literal {
            value,
            datatype,
            language,
        } => {
            let mut obj = Map::new();
            if let Some(lang) = language {
                obj.insert(jsonld::VALUE.to_string(), JsonValue::String(value.to_string()));
                obj.insert(jsonld::LANGUAGE.to_string(), JsonValue::String(lang.to_string()));
            } else if datatype.is_json() {
                match serde_json::from_str::<JsonValue>(value) {
                    Ok(parsed) => {
                        obj.insert(jsonld::VALUE.to_string(), parsed);
                        obj.insert(jsonld::TYPE.to_string(), JsonValue::String(jsonld::JSON.to_string()));
                    }
                    Err(_) => {
                        obj.insert(jsonld::VALUE.to_string(), JsonValue::String(value.to_string()));
                        obj.insert(jsonld::TYPE.to_string(), JsonValue::String(rdf::JSON.to_string()));
                    }
                }
            } else {
                obj.insert(jsonld::VALUE.to_string(), JsonValue::String(value.to_string()));
                if !datatype.is_xsd_string() {
                    obj.insert(
                        jsonld::TYPE.to_string(),
                        JsonValue::String(datatype.as_iri().to_string()),
                    );
                }
            }
            JsonValue::Object(obj)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sflo_graph_ir::Datatype;

    fn iri(s: &str) -> Term {
        Term::iri(s)
    }

    #[test]
    fn test_nodes_sorted_by_id() {
        let quads = vec![
            Quad::triple(iri("http://ex.org/b"), iri("http://ex.org/p"), Term::string("B")),
            Quad::triple(iri("http://ex.org/a"), iri(rdf::TYPE), iri("http://ex.org/T")),
            Quad::triple(iri("http://ex.org/a"), iri("http://ex.org/p"), Term::lang_string("A", "en")),
        ];

        assert_eq!(
            from_rdf(&quads),
            json!([
                {
                    "@id": "http://ex.org/a",
                    "@type": ["http://ex.org/T"],
                    "http://ex.org/p": [{"@value": "A", "@language": "en"}]
                },
                {
                    "@id": "http://ex.org/b",
                    "http://ex.org/p": [{"@value": "B"}]
                }
            ])
        );
    }

    #[test]
    fn test_typed_literals_and_duplicates() {
        let quads = vec![
            Quad::triple(
                iri("http://ex.org/a"),
                iri("http://ex.org/n"),
                Term::typed("01", Datatype::xsd_integer()),
            ),
            Quad::triple(
                iri("http://ex.org/a"),
                iri("http://ex.org/n"),
                Term::typed("01", Datatype::xsd_integer()),
            ),
        ];

        assert_eq!(
            from_rdf(&quads),
            json!([{
                "@id": "http://ex.org/a",
                "http://ex.org/n": [{
                    "@value": "01",
                    "@type": "http://www.w3.org/2001/XMLSchema#integer"
                }]
            }])
        );
    }

    #[test]
    fn test_list_folding() {
        let quads = vec![
            Quad::triple(Term::blank("l1"), iri(rdf::FIRST), Term::string("a")),
            Quad::triple(Term::blank("l1"), iri(rdf::REST), Term::blank("l2")),
            Quad::triple(Term::blank("l2"), iri(rdf::FIRST), Term::string("b")),
            Quad::triple(Term::blank("l2"), iri(rdf::REST), iri(rdf::NIL)),
            Quad::triple(iri("http://ex.org/s"), iri("http://ex.org/items"), Term::blank("l1")),
        ];

        assert_eq!(
            from_rdf(&quads),
            json!([{
                "@id": "http://ex.org/s",
                "http://ex.org/items": [{"@list": [{"@value": "a"}, {"@value": "b"}]}]
            }])
        );
    }

    #[test]
    fn test_shared_list_node_not_folded() {
        let quads = vec![
            Quad::triple(Term::blank("l1"), iri(rdf::FIRST), Term::string("a")),
            Quad::triple(Term::blank("l1"), iri(rdf::REST), iri(rdf::NIL)),
            Quad::triple(iri("http://ex.org/s"), iri("http://ex.org/p"), Term::blank("l1")),
            Quad::triple(iri("http://ex.org/t"), iri("http://ex.org/p"), Term::blank("l1")),
        ];

        let result = from_rdf(&quads);
        let nodes = result.as_array().unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0]["@id"], "_:l1");
        assert_eq!(nodes[0][rdf::REST], json!([{"@list": []}]));
    }

    #[test]
    fn test_named_graph_nested() {
        let quads = vec![
            Quad::new(
                iri("http://ex.org/a"),
                iri("http://ex.org/p"),
                Term::string("v"),
                GraphName::Named(iri("http://ex.org/g")),
            ),
            Quad::triple(iri("http://ex.org/z"), iri("http://ex.org/p"), Term::string("w")),
        ];

        assert_eq!(
            from_rdf(&quads),
            json!([
                {
                    "@id": "http://ex.org/g",
                    "@graph": [{"@id": "http://ex.org/a", "http://ex.org/p": [{"@value": "v"}]}]
                },
                {"@id": "http://ex.org/z", "http://ex.org/p": [{"@value": "w"}]}
            ])
        );
    }

    #[test]
    fn test_json_literal() {
        let quads = vec![Quad::triple(
            iri("http://ex.org/a"),
            iri("http://ex.org/data"),
            Term::typed(r#"{"a":1}"#, Datatype::rdf_json()),
        )];

        assert_eq!(
            from_rdf(&quads)[0]["http://ex.org/data"],
            json!([{"@value": {"a": 1}, "@type": "@json"}])
        );
    }
}
