//! Expanded JSON-LD to quads
//!
//! Walks the output of [`crate::expand`] and emits quad events to a
//! [`QuadSink`]:
//!
//! - `@type` becomes `rdf:type`
//! - named graphs (`@id` + `@graph`) emit their nodes into that graph
//! - `@list` becomes an `rdf:first`/`rdf:rest` chain
//! - `@reverse` properties emit with subject and object swapped
//! - native numbers and booleans become canonical `xsd:integer`,
//!   `xsd:double` and `xsd:boolean` literals
//!
//! Statements whose subject, predicate, object or datatype is still a
//! relative reference are skipped, as in JSON-LD toRDF.

use crate::error::{JsonLdError, Result};
use serde_json::{Map, Value as JsonValue};
use sflo_graph_ir::{iri, Datatype, QuadSink, TermId};
use sflo_vocab::{jsonld, rdf, xsd};

/// Convert expanded JSON-LD to quad events.
pub fn to_rdf<S: QuadSink>(expanded: &[JsonValue], sink: &mut S) -> Result<()> {
    let mut emitter = Emitter { sink };
    for node in expanded {
        let obj = node.as_object().ok_or_else(|| {
            JsonLdError::InvalidStructure("expected a node object at top level".to_string())
        })?;
        emitter.node(obj, None)?;
    }
    Ok(())
}

struct Emitter<'s, S> {
    sink: &'s mut S,
}

impl<S: QuadSink> Emitter<'_, S> {
    /// Emit a node's statements and return its subject term.
    ///
    /// Returns `None` when the node's `@id` is relative.
    fn node(&mut self, node: &Map<String, JsonValue>, graph: Option<TermId>) -> Result<Option<TermId>> {
        let subject = match node.get(jsonld::ID) {
            Some(JsonValue::String(id)) => match self.reference(id) {
                Some(term) => term,
                None => {
                    tracing::warn!(id = %id, "skipping node with relative @id");
                    return Ok(None);
                }
            },
            Some(_) => {
                return Err(JsonLdError::InvalidStructure("@id must be a string".to_string()))
            }
            None => self.sink.term_blank(None),
        };

        if let Some(JsonValue::Array(members)) = node.get(jsonld::GRAPH) {
            for member in members {
                if let Some(obj) = member.as_object() {
                    self.node(obj, Some(subject))?;
                }
            }
        }

        for (key, value) in node {
            match key.as_str() {
                jsonld::TYPE => self.types(subject, value, graph),
                jsonld::REVERSE => self.reverse(subject, value, graph)?,
                k if k.starts_with('@') => {}
                predicate => {
                    if !iri::is_absolute(predicate) {
                        tracing::trace!(predicate, "skipping non-IRI predicate");
                        continue;
                    }
                    let p = self.sink.term_iri(predicate);
                    for item in as_items(value) {
                        if let Some(o) = self.object(item, graph)? {
                            self.sink.emit_quad(subject, p, o, graph);
                        }
                    }
                }
            }
        }

        Ok(Some(subject))
    }

    fn types(&mut self, subject: TermId, value: &JsonValue, graph: Option<TermId>) {
        let rdf_type = self.sink.term_iri(rdf::TYPE);
        for t in as_items(value) {
            match t.as_str().and_then(|s| self.reference(s)) {
                Some(o) => self.sink.emit_quad(subject, rdf_type, o, graph),
                None => tracing::warn!(value = %t, "skipping relative @type"),
            }
        }
    }

    fn reverse(&mut self, subject: TermId, value: &JsonValue, graph: Option<TermId>) -> Result<()> {
        let Some(map) = value.as_object() else {
            return Err(JsonLdError::InvalidStructure("@reverse must be an object".to_string()));
        };
        for (predicate, nodes) in map {
            if !iri::is_absolute(predicate) {
                continue;
            }
            let p = self.sink.term_iri(predicate);
            for item in as_items(nodes) {
                let Some(obj) = item.as_object() else {
                    continue;
                };
                if let Some(s) = self.node(obj, graph)? {
                    self.sink.emit_quad(s, p, subject, graph);
                }
            }
        }
        Ok(())
    }

    /// Convert a property value to an object term.
    fn object(&mut self, value: &JsonValue, graph: Option<TermId>) -> Result<Option<TermId>> {
        let Some(obj) = value.as_object() else {
            return Err(JsonLdError::InvalidStructure(format!(
                "expanded property values must be objects, got {value}"
            )));
        };

        if obj.contains_key(jsonld::VALUE) {
            return self.literal(obj);
        }
        if let Some(items) = obj.get(jsonld::LIST) {
            return self.list(items, graph).map(Some);
        }
        self.node(obj, graph)
    }

    fn list(&mut self, items: &JsonValue, graph: Option<TermId>) -> Result<TermId> {
        let mut terms = Vec::new();
        for item in as_items(items) {
            if let Some(term) = self.object(item, graph)? {
                terms.push(term);
            }
        }

        let nil = self.sink.term_iri(rdf::NIL);
        if terms.is_empty() {
            return Ok(nil);
        }

        let first = self.sink.term_iri(rdf::FIRST);
        let rest = self.sink.term_iri(rdf::REST);
        let head = self.sink.term_blank(None);
        let mut current = head;
        let count = terms.len();
        for (i, term) in terms.into_iter().enumerate() {
            self.sink.emit_quad(current, first, term, graph);
            let next = if i + 1 == count {
                nil
            } else {
                self.sink.term_blank(None)
            };
            self.sink.emit_quad(current, rest, next, graph);
            current = next;
        }
        Ok(head)
    }

    fn literal(&mut self, obj: &Map<String, JsonValue>) -> Result<Option<TermId>> {
        let value = obj.get(jsonld::VALUE).unwrap_or(&JsonValue::Null);
        let type_iri = obj.get(jsonld::TYPE).and_then(JsonValue::as_str);
        let language = obj.get(jsonld::LANGUAGE).and_then(JsonValue::as_str);

        if type_iri == Some(jsonld::JSON) {
            let lexical = canonical_json(value);
            return Ok(Some(self.sink.term_literal(&lexical, Datatype::rdf_json(), None)));
        }
        if let Some(t) = type_iri {
            if !iri::is_absolute(t) {
                tracing::warn!(datatype = t, "skipping literal with relative datatype");
                return Ok(None);
            }
        }

        let (lexical, datatype) = match value {
            JsonValue::String(s) => match (language, type_iri) {
                (Some(_), _) => (s.clone(), Datatype::rdf_lang_string()),
                (None, Some(t)) => (s.clone(), Datatype::from_iri(t)),
                (None, None) => (s.clone(), Datatype::xsd_string()),
            },
            JsonValue::Bool(b) => (
                b.to_string(),
                type_iri.map_or_else(Datatype::xsd_boolean, Datatype::from_iri),
            ),
            JsonValue::Number(n) => {
                let as_double = type_iri == Some(xsd::DOUBLE) || !is_integral(n);
                if as_double {
                    (
                        canonical_double(n.as_f64().unwrap_or_default()),
                        type_iri.map_or_else(Datatype::xsd_double, Datatype::from_iri),
                    )
                } else {
                    (
                        integer_lexical(n),
                        type_iri.map_or_else(Datatype::xsd_integer, Datatype::from_iri),
                    )
                }
            }
            JsonValue::Null => return Ok(None),
            other => {
                return Err(JsonLdError::InvalidValueObject {
                    message: format!("@value must be a scalar, got {other}"),
                })
            }
        };

        Ok(Some(self.sink.term_literal(&lexical, datatype, language)))
    }

    /// IRI or blank node term for a reference; `None` if it is relative.
    fn reference(&mut self, id: &str) -> Option<TermId> {
        if let Some(label) = id.strip_prefix("_:") {
            Some(self.sink.term_blank(Some(label)))
        } else if iri::is_absolute(id) {
            Some(self.sink.term_iri(id))
        } else {
            None
        }
    }
}

fn as_items(value: &JsonValue) -> &[JsonValue] {
    match value {
        JsonValue::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

fn is_integral(n: &serde_json::Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64()
        .map(|f| f.fract() == 0.0 && f.abs() < 1e21)
        .unwrap_or(false)
}

fn integer_lexical(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        format!("{:.0}", n.as_f64().unwrap_or_default())
    }
}

/// Canonical `xsd:double` lexical form, e.g. `5.3E0` or `1.0E21`.
pub fn canonical_double(f: f64) -> String {
    let formatted = format!("{f:E}");
    match formatted.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            format!("{mantissa}.0E{exponent}")
        }
        _ => formatted,
    }
}

/// Serialize JSON with object keys sorted and no insignificant whitespace.
pub fn canonical_json(value: &JsonValue) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &JsonValue, out: &mut String) {
    match value {
        JsonValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&JsonValue::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
