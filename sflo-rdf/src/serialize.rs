//! Graph serializer: quads + target base -> text
//!
//! Two relativization strategies coexist:
//!
//! - jsonld output is debased with a literal prefix strip of the target base
//! - Turtle and TriG output is relativized by the writer per RFC 3986
//!
//! The same quads can therefore produce `../x` in Turtle but an absolute
//! IRI in JSON-LD.

use crate::error::GraphSerializeError;
use crate::syntax::Syntax;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sflo_graph_ir::Quad;
use sflo_graph_json_ld::{compact, debase, from_rdf};
use sflo_graph_turtle::{Dialect, QuadWriter};
use sflo_vocab::jsonld;
use std::collections::BTreeMap;
use tracing::debug;

/// How to write a quad set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializeOptions {
    /// Location the output will be stored at; identifiers under it are
    /// written relative to it
    pub target_base: String,
    #[serde(default)]
    pub syntax: Syntax,
    /// Compact jsonld output; only applies when `context` is set
    #[serde(default = "default_compact")]
    pub compact: bool,
    /// Context for jsonld compaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<JsonValue>,
    /// Prefix declarations for Turtle and TriG output
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prefixes: BTreeMap<String, String>,
}

fn default_compact() -> bool {
    true
}

impl SerializeOptions {
    pub fn new(target_base: impl Into<String>, syntax: Syntax) -> Self {
        Self {
            target_base: target_base.into(),
            syntax,
            compact: true,
            context: None,
            prefixes: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, context: JsonValue) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), namespace.into());
        self
    }
}

/// Serialize `quads` in `options.syntax`.
pub fn serialize_quads(quads: &[Quad], options: &SerializeOptions) -> Result<String, GraphSerializeError> {
    debug!(syntax = %options.syntax, base = %options.target_base, quads = quads.len(), "serializing graph");
    match options.syntax {
        Syntax::Jsonld => serialize_jsonld(quads, options),
        _ => serialize_stream(quads, options),
    }
}

// ---------------------------------------------------------------------------
// jsonld
// ---------------------------------------------------------------------------

/// quads -> N-Quads -> expanded tree -> debased tree -> compacted tree -> JSON
///
/// The output never carries `@base`, even when the supplied context has one.
pub fn serialize_jsonld(quads: &[Quad], options: &SerializeOptions) -> Result<String, GraphSerializeError> {
    if options.syntax != Syntax::Jsonld {
        return Err(GraphSerializeError::UnsupportedSyntax {
            syntax: options.syntax,
            path: "jsonld",
        });
    }

    let canonical = canonical_nquads(quads)?;
    let tree = debase::debase(&from_rdf(&canonical), &options.target_base);

    let output = match &options.context {
        Some(context) if options.compact => {
            let context = without_base(context);
            let nodes = tree.as_array().map(Vec::as_slice).unwrap_or_default();
            compact(nodes, &context)?
        }
        _ => tree,
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

/// Round-trip through N-Quads text so the tree is built from the same
/// canonical form a stream consumer would see.
fn canonical_nquads(quads: &[Quad]) -> Result<Vec<Quad>, GraphSerializeError> {
    let mut writer = QuadWriter::new(Dialect::NQuads);
    for quad in quads {
        writer.add(quad.clone());
    }
    let text = writer.finish()?;
    Ok(sflo_graph_turtle::parse_to_quads(&text, Dialect::NQuads, None)?)
}

/// Drop every `@base` entry from a context, including those in nested and
/// term-scoped contexts.
fn without_base(context: &JsonValue) -> JsonValue {
    match context {
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != jsonld::BASE)
                .map(|(key, value)| (key.clone(), without_base(value)))
                .collect(),
        ),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(without_base).collect()),
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Stream syntaxes
// ---------------------------------------------------------------------------

/// A writer for a stream syntax, configured with `base`.
///
/// Fails with `UnsupportedSyntax` for jsonld.
pub fn stream_writer(syntax: Syntax, base: &str) -> Result<QuadWriter, GraphSerializeError> {
    let dialect = syntax.dialect().ok_or(GraphSerializeError::UnsupportedSyntax {
        syntax,
        path: "stream",
    })?;
    Ok(QuadWriter::new(dialect).with_base(base))
}

pub fn serialize_stream(quads: &[Quad], options: &SerializeOptions) -> Result<String, GraphSerializeError> {
    let mut writer = stream_writer(options.syntax, &options.target_base)?;
    for (prefix, namespace) in &options.prefixes {
        writer = writer.with_prefix(prefix.as_str(), namespace.as_str());
    }
    for quad in quads {
        writer.add(quad.clone());
    }
    Ok(writer.finish()?)
}
