use crate::context::{Container, ParsedContext, TermDefinition, TypeValue};
use crate::error::Result;
use serde_json::{Map, Value as JsonValue};
use sflo_vocab::jsonld;
use std::collections::HashMap;

/// A precomputed lookup table for IRI compaction.
///
/// Prefix entries are sorted longest-first so the most specific prefix
/// always wins. `@id` values are only ever shortened with prefixes; the
/// context's `@base` is never consulted.
#[derive(Debug, Clone)]
pub struct ContextCompactor {
    context: ParsedContext,
    /// Full IRI -> terms defined for it, shortest term first
    terms_by_iri: HashMap<String, Vec<String>>,
    /// Namespace IRIs (ending in `/` or `#`) paired with their prefix term
    prefixes: Vec<(String, String)>,
}

impl ContextCompactor {
    pub fn new(context: ParsedContext) -> Self {
        let mut terms_by_iri: HashMap<String, Vec<String>> = HashMap::new();
        let mut prefixes = Vec::new();

        for (term, def) in &context.terms {
            let Some(id) = &def.id else { continue };
            if def.reverse || term.contains(':') {
                continue;
            }
            terms_by_iri.entry(id.clone()).or_default().push(term.clone());
            if is_simple(def) && (id.ends_with('/') || id.ends_with('#')) {
                prefixes.push((id.clone(), term.clone()));
            }
        }
        for terms in terms_by_iri.values_mut() {
            terms.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        }
        prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.1.cmp(&b.1)));

        Self {
            context,
            terms_by_iri,
            prefixes,
        }
    }

    /// Compact an IRI in a vocabulary position (`@type` values, datatypes).
    ///
    /// Exact simple term, then longest prefix, then `@vocab`.
    pub fn compact_vocab(&self, iri: &str) -> String {
        if let Some(term) = self
            .terms_by_iri
            .get(iri)
            .and_then(|terms| terms.iter().find(|t| self.context.get(t).map(is_simple).unwrap_or(false)))
        {
            return term.clone();
        }
        self.compact_without_terms(iri, true)
    }

    /// Compact an IRI in an `@id` position. Only prefixes apply.
    pub fn compact_id(&self, iri: &str) -> String {
        self.compact_without_terms(iri, false)
    }

    fn compact_without_terms(&self, iri: &str, vocab: bool) -> String {
        if iri.starts_with("_:") {
            return iri.to_string();
        }

        for (namespace, prefix) in &self.prefixes {
            if let Some(suffix) = iri.strip_prefix(namespace.as_str()) {
                if !suffix.is_empty() && !suffix.starts_with("//") {
                    let candidate = format!("{prefix}:{suffix}");
                    if !self.context.contains(&candidate) {
                        return candidate;
                    }
                }
            }
        }

        if vocab {
            if let Some(suffix) = self.context.vocab.as_deref().and_then(|v| iri.strip_prefix(v)) {
                let clashes = self
                    .context
                    .get(suffix)
                    .map(|def| def.id.as_deref() != Some(iri))
                    .unwrap_or(false);
                if !suffix.is_empty() && !suffix.contains(':') && !clashes {
                    return suffix.to_string();
                }
            }
        }

        iri.to_string()
    }

    /// The key used for a keyword, honoring aliases defined in the context.
    fn keyword(&self, keyword: &str) -> String {
        self.terms_by_iri
            .get(keyword)
            .and_then(|terms| terms.first())
            .cloned()
            .unwrap_or_else(|| keyword.to_string())
    }

    /// Compact a list of expanded nodes into a document carrying `context`.
    pub fn compact_document(&self, nodes: &[JsonValue], context: &JsonValue) -> JsonValue {
        let mut compacted: Vec<JsonValue> = nodes
            .iter()
            .filter_map(JsonValue::as_object)
            .map(|n| JsonValue::Object(self.compact_node(n)))
            .collect();

        let mut out = Map::new();
        if !is_empty_context(context) {
            out.insert(jsonld::CONTEXT.to_string(), context.clone());
        }
        match compacted.len() {
            0 => {}
            1 => {
                if let Some(JsonValue::Object(node)) = compacted.pop() {
                    out.extend(node);
                }
            }
            _ => {
                out.insert(self.keyword(jsonld::GRAPH), JsonValue::Array(compacted));
            }
        }
        JsonValue::Object(out)
    }

    fn compact_node(&self, node: &Map<String, JsonValue>) -> Map<String, JsonValue> {
        let mut out = Map::new();
        for (key, value) in node {
            match key.as_str() {
                jsonld::ID => {
                    let id = value.as_str().map(|s| self.compact_id(s)).unwrap_or_default();
                    out.insert(self.keyword(jsonld::ID), JsonValue::String(id));
                }
                jsonld::TYPE => {
                    let mut types: Vec<JsonValue> = as_items(value)
                        .iter()
                        .filter_map(JsonValue::as_str)
                        .map(|t| JsonValue::String(self.compact_vocab(t)))
                        .collect();
                    let v = if types.len() == 1 {
                        types.remove(0)
                    } else {
                        JsonValue::Array(types)
                    };
                    out.insert(self.keyword(jsonld::TYPE), v);
                }
                jsonld::GRAPH => {
                    let members = as_items(value)
                        .iter()
                        .filter_map(JsonValue::as_object)
                        .map(|n| JsonValue::Object(self.compact_node(n)))
                        .collect();
                    out.insert(self.keyword(jsonld::GRAPH), JsonValue::Array(members));
                }
                jsonld::REVERSE => {
                    let mut reverse = Map::new();
                    if let Some(map) = value.as_object() {
                        for (p, v) in map {
                            reverse.insert(self.compact_vocab(p), self.generic_values(as_items(v)));
                        }
                    }
                    out.insert(self.keyword(jsonld::REVERSE), JsonValue::Object(reverse));
                }
                k if k.starts_with('@') => {
                    out.insert(k.to_string(), value.clone());
                }
                property => {
                    let (name, compacted) = self.compact_property(property, as_items(value));
                    out.insert(name, compacted);
                }
            }
        }
        out
    }

    /// Pick the term for a property and compact its values to match it.
    fn compact_property(&self, iri: &str, values: &[JsonValue]) -> (String, JsonValue) {
        if let Some(terms) = self.terms_by_iri.get(iri) {
            for term in terms {
                let Some(def) = self.context.get(term) else { continue };
                if let Some(compacted) = self.compact_for_term(def, values) {
                    return (term.clone(), compacted);
                }
            }
        }
        (self.compact_without_terms(iri, true), self.generic_values(values))
    }

    /// Compact `values` for a term, or `None` if the term cannot hold them.
    fn compact_for_term(&self, def: &TermDefinition, values: &[JsonValue]) -> Option<JsonValue> {
        if def.has_container(Container::List) {
            let [single] = values else { return None };
            let items = single.get(jsonld::LIST)?.as_array()?;
            let compacted = items.iter().map(|v| self.typed_value(def, v)).collect::<Option<Vec<_>>>()?;
            return Some(JsonValue::Array(compacted));
        }
        if values.iter().any(|v| v.get(jsonld::LIST).is_some()) {
            return is_simple(def).then(|| self.generic_values(values));
        }

        if def.has_container(Container::Language) {
            let mut map = Map::new();
            for v in values {
                let text = v.get(jsonld::VALUE)?.as_str()?;
                if v.get(jsonld::TYPE).is_some() {
                    return None;
                }
                let lang = v
                    .get(jsonld::LANGUAGE)
                    .and_then(JsonValue::as_str)
                    .unwrap_or("@none");
                push_value(&mut map, lang, JsonValue::String(text.to_string()));
            }
            return Some(JsonValue::Object(map));
        }

        let compacted = values
            .iter()
            .map(|v| self.typed_value(def, v))
            .collect::<Option<Vec<_>>>()?;
        Some(collapse(compacted, def.has_container(Container::Set)))
    }

    /// Compact one value under a term's type or language coercion.
    fn typed_value(&self, def: &TermDefinition, value: &JsonValue) -> Option<JsonValue> {
        match &def.type_ {
            Some(TypeValue::Id) | Some(TypeValue::Vocab) => {
                let obj = value.as_object()?;
                let id = obj.get(jsonld::ID)?.as_str()?;
                if obj.len() != 1 {
                    return None;
                }
                let compacted = if def.type_ == Some(TypeValue::Vocab) {
                    self.compact_vocab(id)
                } else {
                    self.compact_id(id)
                };
                Some(JsonValue::String(compacted))
            }
            Some(TypeValue::Json) => {
                if value.get(jsonld::TYPE)?.as_str()? != jsonld::JSON {
                    return None;
                }
                value.get(jsonld::VALUE).cloned()
            }
            Some(TypeValue::Iri(t)) => {
                if value.get(jsonld::TYPE)?.as_str()? != t.as_str() {
                    return None;
                }
                value.get(jsonld::VALUE).cloned()
            }
            None => match &def.language {
                Some(expected) => {
                    let text = value.get(jsonld::VALUE)?.as_str()?;
                    let lang = value.get(jsonld::LANGUAGE).and_then(JsonValue::as_str);
                    (value.get(jsonld::TYPE).is_none() && lang == expected.as_deref())
                        .then(|| JsonValue::String(text.to_string()))
                }
                None => Some(self.generic_value(value)),
            },
        }
    }

    fn generic_values(&self, values: &[JsonValue]) -> JsonValue {
        collapse(values.iter().map(|v| self.generic_value(v)).collect(), false)
    }

    /// Compact a value with no term-specific coercion.
    fn generic_value(&self, value: &JsonValue) -> JsonValue {
        let Some(obj) = value.as_object() else {
            return value.clone();
        };

        if let Some(v) = obj.get(jsonld::VALUE) {
            let lang = obj.get(jsonld::LANGUAGE).and_then(JsonValue::as_str);
            let type_iri = obj.get(jsonld::TYPE).and_then(JsonValue::as_str);
            return match (type_iri, lang) {
                (None, None) if !(v.is_string() && self.context.language.is_some()) => v.clone(),
                (None, Some(l)) if self.context.language.as_deref() == Some(l) => v.clone(),
                (Some(t), _) if t != jsonld::JSON => {
                    let mut out = Map::new();
                    out.insert(self.keyword(jsonld::VALUE), v.clone());
                    out.insert(self.keyword(jsonld::TYPE), JsonValue::String(self.compact_vocab(t)));
                    JsonValue::Object(out)
                }
                _ => {
                    let mut out = Map::new();
                    for (k, v) in obj {
                        out.insert(self.keyword(k), v.clone());
                    }
                    JsonValue::Object(out)
                }
            };
        }

        if let Some(items) = obj.get(jsonld::LIST) {
            let items = as_items(items).iter().map(|v| self.generic_value(v)).collect();
            let mut out = Map::new();
            out.insert(self.keyword(jsonld::LIST), JsonValue::Array(items));
            return JsonValue::Object(out);
        }

        JsonValue::Object(self.compact_node(obj))
    }
}

/// Compact expanded nodes against a caller-supplied context.
///
/// `context` may be the context itself or an object wrapping it in
/// `@context`; the output carries it unchanged. Remote (string) contexts
/// are rejected.
pub fn compact(expanded: &[JsonValue], context: &JsonValue) -> Result<JsonValue> {
    let inner = match context {
        JsonValue::Object(map) if map.contains_key(jsonld::CONTEXT) => &map[jsonld::CONTEXT],
        other => other,
    };
    let parsed = ParsedContext::new(None).process(inner)?;
    Ok(ContextCompactor::new(parsed).compact_document(expanded, inner))
}

/// A term with no coercion, container or language of its own.
fn is_simple(def: &TermDefinition) -> bool {
    def.type_.is_none() && def.container.is_empty() && def.language.is_none() && !def.reverse
}

fn is_empty_context(context: &JsonValue) -> bool {
    match context {
        JsonValue::Null => true,
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn as_items(value: &JsonValue) -> &[JsonValue] {
    match value {
        JsonValue::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

fn collapse(mut values: Vec<JsonValue>, keep_array: bool) -> JsonValue {
    if values.len() == 1 && !keep_array {
        values.remove(0)
    } else {
        JsonValue::Array(values)
    }
}

fn push_value(map: &mut Map<String, JsonValue>, key: &str, value: JsonValue) {
    match map.get_mut(key) {
        Some(JsonValue::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = JsonValue::Array(vec![first, value]);
        }
        None => {
            map.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn compactor(ctx: JsonValue) -> ContextCompactor {
        ContextCompactor::new(ParsedContext::new(None).process(&ctx).unwrap())
    }

    #[test]
    fn test_longest_prefix_wins() {
        let c = compactor(json!({
            "schema": "http://schema.org/",
            "person": "http://schema.org/Person/"
        }));
        assert_eq!(c.compact_vocab("http://schema.org/Person/name"), "person:name");
        assert_eq!(c.compact_vocab("http://schema.org/name"), "schema:name");
        assert_eq!(c.compact_vocab("http://other.org/x"), "http://other.org/x");
    }

    #[test]
    fn test_vocab_applies_to_vocab_positions_only() {
        let c = compactor(json!({"@vocab": "http://ex.org/"}));
        assert_eq!(c.compact_vocab("http://ex.org/Thing"), "Thing");
        assert_eq!(c.compact_id("http://ex.org/Thing"), "http://ex.org/Thing");
    }

    #[test]
    fn test_base_never_used_for_ids() {
        let c = compactor(json!({"@base": "http://ex.org/"}));
        assert_eq!(c.compact_id("http://ex.org/thing"), "http://ex.org/thing");
    }

    #[test]
    fn test_exact_term_for_type() {
        let c = compactor(json!({"Person": "http://schema.org/Person"}));
        assert_eq!(c.compact_vocab("http://schema.org/Person"), "Person");
    }

    #[test]
    fn test_compact_single_node() {
        let expanded = vec![json!({
            "@id": "http://ex.org/alice",
            "@type": ["http://schema.org/Person"],
            "http://schema.org/name": [{"@value": "Alice"}],
            "http://schema.org/knows": [{"@id": "http://ex.org/bob"}]
        })];
        let context = json!({
            "schema": "http://schema.org/",
            "ex": "http://ex.org/",
            "knows": {"@id": "http://schema.org/knows", "@type": "@id"}
        });

        assert_eq!(
            compact(&expanded, &context).unwrap(),
            json!({
                "@context": context,
                "@id": "ex:alice",
                "@type": "schema:Person",
                "schema:name": "Alice",
                "knows": "ex:bob"
            })
        );
    }

    #[test]
    fn test_compact_multiple_nodes_uses_graph() {
        let expanded = vec![
            json!({"@id": "http://ex.org/a", "http://ex.org/p": [{"@value": "1"}]}),
            json!({"@id": "http://ex.org/b", "http://ex.org/p": [{"@value": "2"}]}),
        ];
        let wrapped = json!({"@context": {"ex": "http://ex.org/"}});

        assert_eq!(
            compact(&expanded, &wrapped).unwrap(),
            json!({
                "@context": {"ex": "http://ex.org/"},
                "@graph": [
                    {"@id": "ex:a", "ex:p": "1"},
                    {"@id": "ex:b", "ex:p": "2"}
                ]
            })
        );
    }

    #[test]
    fn test_typed_term_and_fallback() {
        let expanded = vec![json!({
            "@id": "_:b0",
            "http://ex.org/age": [
                {"@value": "42", "@type": "http://www.w3.org/2001/XMLSchema#integer"},
                {"@value": "old"}
            ]
        })];
        let context = json!({
            "ex": "http://ex.org/",
            "xsd": "http://www.w3.org/2001/XMLSchema#",
            "age": {"@id": "ex:age", "@type": "xsd:integer"}
        });

        // Mixed values do not fit the coerced term.
        let out = compact(&expanded, &context).unwrap();
        assert_eq!(
            out["ex:age"],
            json!([{"@value": "42", "@type": "xsd:integer"}, "old"])
        );
        assert_eq!(out["@id"], "_:b0");
    }

    #[test]
    fn test_list_and_language_containers() {
        let expanded = vec![json!({
            "@id": "http://ex.org/x",
            "http://ex.org/items": [{"@list": [{"@value": "a"}, {"@value": "b"}]}],
            "http://ex.org/label": [
                {"@value": "Ding", "@language": "de"},
                {"@value": "Thing", "@language": "en"}
            ]
        })];
        let context = json!({
            "items": {"@id": "http://ex.org/items", "@container": "@list"},
            "label": {"@id": "http://ex.org/label", "@container": "@language"}
        });

        let out = compact(&expanded, &context).unwrap();
        assert_eq!(out["items"], json!(["a", "b"]));
        assert_eq!(out["label"], json!({"de": "Ding", "en": "Thing"}));
    }

    #[test]
    fn test_keyword_aliases() {
        let expanded = vec![json!({"@id": "http://ex.org/a", "@type": ["http://ex.org/T"]})];
        let context = json!({"id": "@id", "type": "@type", "ex": "http://ex.org/"});
        let out = compact(&expanded, &context).unwrap();
        assert_eq!(out["id"], "ex:a");
        assert_eq!(out["type"], "ex:T");
    }
}
