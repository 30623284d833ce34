use crate::context::{Container, ParsedContext, TypeValue};
use crate::error::{JsonLdError, Result};
use serde_json::{json, Map, Value as JsonValue};
use sflo_vocab::jsonld;

/// Expand a JSON-LD document located at `base`.
///
/// Every relative reference is resolved strictly against `base` (or an
/// in-document `@base` derived from it). The result is the expanded node
/// array; a top-level object holding only `@graph` is unwrapped.
pub fn expand(document: &JsonValue, base: &str) -> Result<Vec<JsonValue>> {
    let active = ParsedContext::new(Some(base));
    let expanded = expand_element(&active, None, document, "")?;

    let nodes = match expanded {
        None => Vec::new(),
        Some(JsonValue::Array(items)) => items,
        Some(JsonValue::Object(mut map)) if map.len() == 1 && map.contains_key(jsonld::GRAPH) => {
            match map.remove(jsonld::GRAPH) {
                Some(JsonValue::Array(items)) => items,
                Some(other) => vec![other],
                None => Vec::new(),
            }
        }
        Some(other) => vec![other],
    };
    Ok(nodes)
}

/// Expand a single element under `property` (the key as written in the
/// document; `None` at top level).
fn expand_element(
    active: &ParsedContext,
    property: Option<&str>,
    element: &JsonValue,
    path: &str,
) -> Result<Option<JsonValue>> {
    match element {
        JsonValue::Null => Ok(None),

        JsonValue::Bool(_) | JsonValue::Number(_) | JsonValue::String(_) => {
            match property {
                None | Some(jsonld::GRAPH) => Ok(None),
                Some(prop) => expand_value(active, prop, element).map(Some),
            }
        }

        JsonValue::Array(items) => {
            let is_list = property
                .and_then(|p| active.get(p))
                .map(|def| def.has_container(Container::List))
                .unwrap_or(false);
            let mut results = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}/{i}");
                if is_list && item.is_array() {
                    return Err(JsonLdError::NestedList { path: item_path });
                }
                match expand_element(active, property, item, &item_path)? {
                    Some(JsonValue::Array(nested)) => results.extend(nested),
                    Some(v) => results.push(v),
                    None => {}
                }
            }
            Ok(Some(JsonValue::Array(results)))
        }

        JsonValue::Object(map) => expand_object(active, property, map, path),
    }
}

fn expand_object(
    active: &ParsedContext,
    property: Option<&str>,
    map: &Map<String, JsonValue>,
    path: &str,
) -> Result<Option<JsonValue>> {
    let local;
    let active = match map.get(jsonld::CONTEXT) {
        Some(ctx) => {
            local = active.process(ctx)?;
            &local
        }
        None => active,
    };

    let mut result = Map::new();
    let mut reverse = Map::new();

    for (key, value) in map {
        if key == jsonld::CONTEXT {
            continue;
        }
        let Some(expanded_key) = active.expand_iri(key, true, false)? else {
            continue;
        };
        let key_path = format!("{path}/{key}");

        if jsonld::is_keyword(&expanded_key) {
            expand_keyword(active, property, &expanded_key, value, &key_path, &mut result, &mut reverse)?;
            continue;
        }

        // Keys that expand to neither an IRI nor a blank node are dropped.
        if !expanded_key.contains(':') {
            tracing::trace!(key = %key, "dropping property with no IRI mapping");
            continue;
        }

        let def = active.get(key);
        let scoped;
        let value_ctx = match active.scoped(key)? {
            Some(ctx) => {
                scoped = ctx;
                &scoped
            }
            None => active,
        };

        let mut values = if def.and_then(|d| d.type_.as_ref()) == Some(&TypeValue::Json) {
            vec![json!({ "@value": value, "@type": "@json" })]
        } else if def.map(|d| d.has_container(Container::Language)).unwrap_or(false) && value.is_object() {
            expand_language_map(value)?
        } else {
            match expand_element(value_ctx, Some(key), value, &key_path)? {
                Some(JsonValue::Array(items)) => items,
                Some(v) => vec![v],
                None => Vec::new(),
            }
        };

        if def.map(|d| d.has_container(Container::List)).unwrap_or(false) && !is_single_list(&values) {
            values = vec![json!({ "@list": values })];
        }

        if def.map(|d| d.reverse).unwrap_or(false) {
            if values.iter().any(|v| v.get(jsonld::VALUE).is_some() || v.get(jsonld::LIST).is_some()) {
                return Err(JsonLdError::InvalidStructure(format!(
                    "reverse property '{key}' must have node values"
                )));
            }
            append(&mut reverse, &expanded_key, values);
        } else {
            append(&mut result, &expanded_key, values);
        }
    }

    if !reverse.is_empty() {
        result.insert(jsonld::REVERSE.to_string(), JsonValue::Object(reverse));
    }

    finish_object(property, result)
}

fn expand_keyword(
    active: &ParsedContext,
    property: Option<&str>,
    keyword: &str,
    value: &JsonValue,
    path: &str,
    result: &mut Map<String, JsonValue>,
    reverse: &mut Map<String, JsonValue>,
) -> Result<()> {
    match keyword {
        jsonld::ID => {
            let id = value.as_str().ok_or_else(|| {
                JsonLdError::InvalidStructure(format!("@id must be a string at {path}"))
            })?;
            if let Some(iri) = active.expand_iri(id, false, true)? {
                result.insert(jsonld::ID.to_string(), JsonValue::String(iri));
            }
        }
        jsonld::TYPE => {
            let raw: Vec<&JsonValue> = match value {
                JsonValue::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            let mut types = Vec::with_capacity(raw.len());
            for t in raw {
                let t = t.as_str().ok_or_else(|| {
                    JsonLdError::InvalidStructure(format!("@type values must be strings at {path}"))
                })?;
                if let Some(iri) = active.expand_iri(t, true, true)? {
                    types.push(JsonValue::String(iri));
                }
            }
            result.insert(jsonld::TYPE.to_string(), JsonValue::Array(types));
        }
        jsonld::GRAPH => {
            let graph = match expand_element(active, Some(jsonld::GRAPH), value, path)? {
                Some(JsonValue::Array(items)) => items,
                Some(v) => vec![v],
                None => Vec::new(),
            };
            result.insert(jsonld::GRAPH.to_string(), JsonValue::Array(graph));
        }
        jsonld::VALUE => {
            result.insert(jsonld::VALUE.to_string(), value.clone());
        }
        jsonld::LANGUAGE => {
            let lang = value.as_str().ok_or_else(|| JsonLdError::InvalidValueObject {
                message: format!("@language must be a string at {path}"),
            })?;
            result.insert(jsonld::LANGUAGE.to_string(), JsonValue::String(lang.to_string()));
        }
        jsonld::INDEX => {
            result.insert(jsonld::INDEX.to_string(), value.clone());
        }
        jsonld::LIST => {
            let items = match expand_element(active, property, value, path)? {
                Some(JsonValue::Array(items)) => items,
                Some(v) => vec![v],
                None => Vec::new(),
            };
            if items.iter().any(|i| i.get(jsonld::LIST).is_some()) {
                return Err(JsonLdError::NestedList {
                    path: path.to_string(),
                });
            }
            result.insert(jsonld::LIST.to_string(), JsonValue::Array(items));
        }
        jsonld::SET => {
            let items = match expand_element(active, property, value, path)? {
                Some(JsonValue::Array(items)) => items,
                Some(v) => vec![v],
                None => Vec::new(),
            };
            result.insert(jsonld::SET.to_string(), JsonValue::Array(items));
        }
        jsonld::REVERSE => {
            let map = value.as_object().ok_or_else(|| {
                JsonLdError::InvalidStructure(format!("@reverse must be an object at {path}"))
            })?;
            for (key, v) in map {
                let Some(expanded_key) = active.expand_iri(key, true, false)? else {
                    continue;
                };
                if !expanded_key.contains(':') {
                    continue;
                }
                let values = match expand_element(active, Some(key), v, &format!("{path}/{key}"))? {
                    Some(JsonValue::Array(items)) => items,
                    Some(v) => vec![v],
                    None => Vec::new(),
                };
                append(reverse, &expanded_key, values);
            }
        }
        jsonld::INCLUDED | jsonld::NEST => {
            return Err(JsonLdError::Unsupported {
                keyword: keyword.to_string(),
            })
        }
        _ => {
            tracing::trace!(keyword, "ignoring keyword during expansion");
        }
    }
    Ok(())
}

/// Validate and normalize an expanded object.
fn finish_object(property: Option<&str>, mut result: Map<String, JsonValue>) -> Result<Option<JsonValue>> {
    if result.contains_key(jsonld::VALUE) {
        if let Some(key) = result
            .keys()
            .find(|k| ![jsonld::VALUE, jsonld::TYPE, jsonld::LANGUAGE, jsonld::INDEX].contains(&k.as_str()))
        {
            return Err(JsonLdError::InvalidValueObject {
                message: format!("unexpected key '{key}'"),
            });
        }
        if result.contains_key(jsonld::TYPE) && result.contains_key(jsonld::LANGUAGE) {
            return Err(JsonLdError::LanguageWithType);
        }
        if let Some(JsonValue::Array(mut types)) = result.remove(jsonld::TYPE) {
            if types.len() != 1 {
                return Err(JsonLdError::InvalidValueObject {
                    message: "@type of a value object must be a single IRI".to_string(),
                });
            }
            result.insert(jsonld::TYPE.to_string(), types.remove(0));
        }

        let is_json = result.get(jsonld::TYPE).and_then(JsonValue::as_str) == Some(jsonld::JSON);
        match result.get(jsonld::VALUE) {
            Some(JsonValue::Null) if !is_json => return Ok(None),
            Some(JsonValue::Object(_)) | Some(JsonValue::Array(_)) if !is_json => {
                return Err(JsonLdError::InvalidValueObject {
                    message: "@value must be a scalar unless typed @json".to_string(),
                })
            }
            Some(v) if result.contains_key(jsonld::LANGUAGE) && !v.is_string() => {
                return Err(JsonLdError::InvalidValueObject {
                    message: "@language requires a string @value".to_string(),
                })
            }
            _ => {}
        }
    } else if result.contains_key(jsonld::LIST) || result.contains_key(jsonld::SET) {
        if let Some(key) = result
            .keys()
            .find(|k| ![jsonld::LIST, jsonld::SET, jsonld::INDEX].contains(&k.as_str()))
        {
            return Err(JsonLdError::InvalidStructure(format!(
                "list or set object has unexpected key '{key}'"
            )));
        }
        if let Some(set) = result.remove(jsonld::SET) {
            return Ok(Some(set));
        }
    }

    if result.is_empty() || (result.len() == 1 && result.contains_key(jsonld::LANGUAGE)) {
        return Ok(None);
    }

    // Free-floating values and bare references add nothing at top level.
    if matches!(property, None | Some(jsonld::GRAPH)) {
        if result.contains_key(jsonld::VALUE) || result.contains_key(jsonld::LIST) {
            return Ok(None);
        }
        if result.len() == 1 && result.contains_key(jsonld::ID) {
            return Ok(None);
        }
    }

    Ok(Some(JsonValue::Object(result)))
}

fn expand_value(active: &ParsedContext, property: &str, value: &JsonValue) -> Result<JsonValue> {
    let def = active.get(property);
    let coercion = def.and_then(|d| d.type_.as_ref());

    if let JsonValue::String(s) = value {
        match coercion {
            Some(TypeValue::Id) => {
                let id = active.expand_iri(s, false, true)?.unwrap_or_default();
                return Ok(json!({ "@id": id }));
            }
            Some(TypeValue::Vocab) => {
                let id = active.expand_iri(s, true, true)?.unwrap_or_default();
                return Ok(json!({ "@id": id }));
            }
            _ => {}
        }
    }

    let mut obj = Map::new();
    obj.insert(jsonld::VALUE.to_string(), value.clone());
    match coercion {
        Some(TypeValue::Iri(t)) => {
            obj.insert(jsonld::TYPE.to_string(), JsonValue::String(t.clone()));
        }
        _ if value.is_string() => {
            let language = match def.and_then(|d| d.language.as_ref()) {
                Some(term_lang) => term_lang.clone(),
                None => active.language.clone(),
            };
            if let Some(lang) = language {
                obj.insert(jsonld::LANGUAGE.to_string(), JsonValue::String(lang));
            }
        }
        _ => {}
    }
    Ok(JsonValue::Object(obj))
}

fn expand_language_map(value: &JsonValue) -> Result<Vec<JsonValue>> {
    let mut results = Vec::new();
    let Some(map) = value.as_object() else {
        return Ok(results);
    };
    for (lang, v) in map {
        let items: Vec<&JsonValue> = match v {
            JsonValue::Array(arr) => arr.iter().collect(),
            other => vec![other],
        };
        for item in items {
            match item {
                JsonValue::Null => {}
                JsonValue::String(s) => {
                    let mut obj = Map::new();
                    obj.insert(jsonld::VALUE.to_string(), JsonValue::String(s.clone()));
                    if lang != "@none" {
                        obj.insert(jsonld::LANGUAGE.to_string(), JsonValue::String(lang.clone()));
                    }
                    results.push(JsonValue::Object(obj));
                }
                other => {
                    return Err(JsonLdError::InvalidValueObject {
                        message: format!("language map values must be strings, got {other}"),
                    })
                }
            }
        }
    }
    Ok(results)
}

fn is_single_list(values: &[JsonValue]) -> bool {
    values.len() == 1 && values[0].get(jsonld::LIST).is_some()
}

fn append(target: &mut Map<String, JsonValue>, key: &str, values: Vec<JsonValue>) {
    match target.get_mut(key) {
        Some(JsonValue::Array(existing)) => existing.extend(values),
        _ => {
            target.insert(key.to_string(), JsonValue::Array(values));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BASE: &str = "http://example.org/doc";

    #[test]
    fn test_expand_node_basic() {
        let doc = json!({
            "@context": {
                "ical": "http://www.w3.org/2002/12/cal/ical#",
                "xsd": "http://www.w3.org/2001/XMLSchema#",
                "ical:dtstart": {"@type": "xsd:dateTime"}
            },
            "ical:summary": "Lady Gaga Concert",
            "ical:dtstart": "2011-04-09T20:00:00Z"
        });

        let result = expand(&doc, BASE).unwrap();
        assert_eq!(
            result,
            vec![json!({
                "http://www.w3.org/2002/12/cal/ical#summary": [{"@value": "Lady Gaga Concert"}],
                "http://www.w3.org/2002/12/cal/ical#dtstart": [{
                    "@value": "2011-04-09T20:00:00Z",
                    "@type": "http://www.w3.org/2001/XMLSchema#dateTime"
                }]
            })]
        );
    }

    #[test]
    fn test_relative_id_resolves_against_explicit_base() {
        let doc = json!({
            "@id": "#section1",
            "http://purl.org/dc/terms/relation": {"@id": "../other"}
        });

        let result = expand(&doc, "file:///mesh/node/_ref/doc.jsonld").unwrap();
        assert_eq!(result[0]["@id"], "file:///mesh/node/_ref/doc.jsonld#section1");
        assert_eq!(
            result[0]["http://purl.org/dc/terms/relation"][0]["@id"],
            "file:///mesh/node/other"
        );
    }

    #[test]
    fn test_expand_base_and_vocab() {
        let doc = json!({
            "@context": {
                "@base": "https://base.com/base/iri",
                "@vocab": "https://vocab.com/vocab/iri/",
                "iriProperty": {"@type": "@id"}
            },
            "@id": "#joebob",
            "@type": "Joey",
            "name": "Joe Bob",
            "iriProperty": "#a-relative-id"
        });

        let result = expand(&doc, BASE).unwrap();
        let obj = &result[0];
        assert_eq!(obj["@id"], "https://base.com/base/iri#joebob");
        assert_eq!(obj["@type"], json!(["https://vocab.com/vocab/iri/Joey"]));
        assert_eq!(
            obj["https://vocab.com/vocab/iri/iriProperty"],
            json!([{"@id": "https://base.com/base/iri#a-relative-id"}])
        );
    }

    #[test]
    fn test_expand_list_container() {
        let doc = json!({
            "@context": {
                "nick": {"@id": "http://xmlns.com/foaf/0.1/nick", "@container": "@list"}
            },
            "@id": "http://example.org/people#joebob",
            "nick": ["joe", "bob", "jaybee"]
        });

        let result = expand(&doc, BASE).unwrap();
        let list = result[0]["http://xmlns.com/foaf/0.1/nick"][0]["@list"]
            .as_array()
            .unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], json!({"@value": "joe"}));
    }

    #[test]
    fn test_list_of_lists_rejected() {
        let doc = json!({
            "@context": {"nick": {"@id": "http://ex.org/nick", "@container": "@list"}},
            "nick": [["a"]]
        });
        assert!(matches!(expand(&doc, BASE), Err(JsonLdError::NestedList { .. })));
    }

    #[test]
    fn test_expand_set_flattens() {
        let doc = json!({
            "@context": {"foaf": "http://xmlns.com/foaf/0.1/"},
            "@id": "http://example.org/people#joebob",
            "foaf:nick": {"@set": ["joe", "bob"]}
        });

        let result = expand(&doc, BASE).unwrap();
        assert_eq!(
            result[0]["http://xmlns.com/foaf/0.1/nick"],
            json!([{"@value": "joe"}, {"@value": "bob"}])
        );
    }

    #[test]
    fn test_language_defaults_and_maps() {
        let doc = json!({
            "@context": {
                "@language": "en",
                "ex": "http://ex.org/",
                "label": {"@id": "ex:label", "@container": "@language"},
                "code": {"@id": "ex:code", "@language": null}
            },
            "@id": "ex:thing",
            "ex:name": "Thing",
            "label": {"de": "Ding", "@none": "thing"},
            "code": "T1"
        });

        let result = expand(&doc, BASE).unwrap();
        let node = &result[0];
        assert_eq!(node["http://ex.org/name"], json!([{"@value": "Thing", "@language": "en"}]));
        assert_eq!(
            node["http://ex.org/label"],
            json!([{"@value": "Ding", "@language": "de"}, {"@value": "thing"}])
        );
        assert_eq!(node["http://ex.org/code"], json!([{"@value": "T1"}]));
    }

    #[test]
    fn test_reverse_property() {
        let doc = json!({
            "@context": {
                "ex": "http://ex.org/",
                "children": {"@reverse": "ex:parent"}
            },
            "@id": "ex:alice",
            "children": [{"@id": "ex:bob"}]
        });

        let result = expand(&doc, BASE).unwrap();
        assert_eq!(
            result[0]["@reverse"],
            json!({"http://ex.org/parent": [{"@id": "http://ex.org/bob"}]})
        );
    }

    #[test]
    fn test_default_graph_unwrapped() {
        let doc = json!({
            "@context": {"ex": "http://ex.org/"},
            "@graph": [
                {"@id": "ex:a", "ex:p": "1"},
                {"@id": "ex:b", "ex:p": "2"}
            ]
        });

        let result = expand(&doc, BASE).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[1]["@id"], "http://ex.org/b");
    }

    #[test]
    fn test_json_literal() {
        let doc = json!({
            "@context": {"data": {"@id": "http://ex.org/data", "@type": "@json"}},
            "@id": "http://ex.org/x",
            "data": {"b": 1, "a": [true]}
        });

        let result = expand(&doc, BASE).unwrap();
        assert_eq!(
            result[0]["http://ex.org/data"],
            json!([{"@value": {"b": 1, "a": [true]}, "@type": "@json"}])
        );
    }

    #[test]
    fn test_value_object_with_language_and_type() {
        let doc = json!({
            "http://ex.org/p": {"@value": "x", "@language": "en", "@type": "http://ex.org/t"}
        });
        assert_eq!(expand(&doc, BASE), Err(JsonLdError::LanguageWithType));
    }

    #[test]
    fn test_included_unsupported() {
        let doc = json!({"@id": "http://ex.org/a", "@included": []});
        assert!(matches!(expand(&doc, BASE), Err(JsonLdError::Unsupported { .. })));
    }

    #[test]
    fn test_unmapped_properties_dropped() {
        let doc = json!({"@id": "http://ex.org/a", "name": "no vocab", "http://ex.org/p": 1});
        let result = expand(&doc, BASE).unwrap();
        let obj = result[0].as_object().unwrap();
        assert_eq!(obj.len(), 2);
    }
}
