//! Debasing: rewriting identifiers under a target base into relative form
//!
//! This is a literal string-prefix strip, not RFC 3986 relativization. An
//! IRI that does not start with the normalized base is returned unchanged,
//! so external identifiers stay absolute.

use serde_json::{Map, Value as JsonValue};
use sflo_vocab::jsonld;
use std::borrow::Cow;

/// Extensions that mark a base as naming a document rather than a directory
const DOCUMENT_EXTENSIONS: &[&str] = &["jsonld", "ttl", "trig", "nt", "nq", "rdf", "owl"];

/// Normalize a target base for prefix matching.
///
/// A base ending in `/` or `#` is used as-is, as is a document base ending
/// in a known RDF extension. Anything else is treated as a directory and
/// gets a trailing `/`.
///
/// ```
/// use sflo_graph_json_ld::debase::normalize_base;
///
/// assert_eq!(normalize_base("file:///mesh/node/"), "file:///mesh/node/");
/// assert_eq!(normalize_base("file:///mesh/node/doc.ttl"), "file:///mesh/node/doc.ttl");
/// assert_eq!(normalize_base("file:///mesh/node"), "file:///mesh/node/");
/// ```
pub fn normalize_base(base: &str) -> Cow<'_, str> {
    if base.ends_with('/') || base.ends_with('#') || is_document_base(base) {
        Cow::Borrowed(base)
    } else {
        Cow::Owned(format!("{base}/"))
    }
}

/// True when the last path segment, ignoring query and fragment, ends in a
/// known RDF extension. A bare authority has no path segment to check.
fn is_document_base(base: &str) -> bool {
    let end = base.find(|c| c == '?' || c == '#').unwrap_or(base.len());
    let without_query = &base[..end];
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |pos| &rest[pos..]),
        None => without_query,
    };
    let segment = path.rsplit('/').next().unwrap_or_default();
    let Some((_, extension)) = segment.rsplit_once('.') else {
        return false;
    };
    DOCUMENT_EXTENSIONS
        .iter()
        .any(|ext| extension.eq_ignore_ascii_case(ext))
}

/// Strip `normalized_base` from the front of `iri`.
///
/// The remainder may be empty when `iri` equals the base.
pub fn debase_iri<'a>(iri: &'a str, normalized_base: &str) -> &'a str {
    iri.strip_prefix(normalized_base).unwrap_or(iri)
}

/// Rewrite every `@id` and `@type` string in `tree` against `target_base`.
///
/// Object keys keep their order; all other values are copied unchanged.
pub fn debase(tree: &JsonValue, target_base: &str) -> JsonValue {
    let base = normalize_base(target_base);
    debase_value(tree, &base)
}

fn debase_value(value: &JsonValue, base: &str) -> JsonValue {
    match value {
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(|v| debase_value(v, base)).collect()),
        JsonValue::Object(map) => JsonValue::Object(debase_object(map, base)),
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) | JsonValue::String(_) => value.clone(),
    }
}

fn debase_object(map: &Map<String, JsonValue>, base: &str) -> Map<String, JsonValue> {
    map.iter()
        .map(|(key, value)| {
            let rewritten = match (key.as_str(), value) {
                (jsonld::ID, JsonValue::String(iri)) => JsonValue::String(debase_iri(iri, base).to_string()),
                (jsonld::TYPE, JsonValue::String(iri)) => JsonValue::String(debase_iri(iri, base).to_string()),
                (jsonld::TYPE, JsonValue::Array(items)) => JsonValue::Array(
                    items
                        .iter()
                        .map(|item| match item {
                            JsonValue::String(iri) => JsonValue::String(debase_iri(iri, base).to_string()),
                            other => other.clone(),
                        })
                        .collect(),
                ),
                (jsonld::TYPE, other) => other.clone(),
                (_, other) => debase_value(other, base),
            };
            (key.clone(), rewritten)
        })
        .collect()
}
