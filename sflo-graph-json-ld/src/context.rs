use crate::error::{JsonLdError, Result};
use serde_json::{Map, Value as JsonValue};
use sflo_graph_ir::iri;
use sflo_vocab::jsonld;
use std::collections::HashMap;

/// Container types for JSON-LD @container values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    List,
    Set,
    Language,
    Index,
}

/// Type values can be keywords or IRIs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeValue {
    Id,          // @id - value is an IRI reference
    Vocab,       // @vocab - value is a vocabulary-relative IRI
    Json,        // @json - JSON literal
    Iri(String), // Specific datatype IRI
}

/// A single term definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermDefinition {
    /// The expanded IRI, keyword or blank node label. `None` means the term
    /// was explicitly mapped to null and must not expand.
    pub id: Option<String>,
    /// True when the term was defined with `@reverse`
    pub reverse: bool,
    /// Type coercion (@type)
    pub type_: Option<TypeValue>,
    /// Container mapping (@container)
    pub container: Vec<Container>,
    /// Language mapping; `Some(None)` means explicitly cleared
    pub language: Option<Option<String>>,
    /// Property-scoped context, processed against the active context on use
    pub context: Option<JsonValue>,
}

impl TermDefinition {
    pub fn has_container(&self, container: Container) -> bool {
        self.container.contains(&container)
    }
}

/// The active context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedContext {
    /// Base IRI used for document-relative references
    pub base: Option<String>,
    /// Base IRI of the document itself; a null context resets to it
    document_base: Option<String>,
    /// Default vocabulary (@vocab)
    pub vocab: Option<String>,
    /// Default language (@language)
    pub language: Option<String>,
    /// Term definitions
    pub terms: HashMap<String, TermDefinition>,
}

impl ParsedContext {
    /// Initial context for a document located at `base`.
    pub fn new(base: Option<&str>) -> Self {
        Self {
            base: base.map(str::to_string),
            document_base: base.map(str::to_string),
            ..Default::default()
        }
    }

    /// Get a term definition by key
    pub fn get(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// Process a local context (object, array or null) on top of this one.
    ///
    /// String contexts reference remote documents and are rejected.
    pub fn process(&self, local: &JsonValue) -> Result<ParsedContext> {
        match local {
            JsonValue::Null => Ok(ParsedContext::new(self.document_base.as_deref())),
            JsonValue::String(url) => Err(JsonLdError::RemoteContext { url: url.clone() }),
            JsonValue::Array(items) => {
                let mut active = self.clone();
                for item in items {
                    active = active.process(item)?;
                }
                Ok(active)
            }
            JsonValue::Object(map) => self.process_map(map),
            other => Err(JsonLdError::InvalidContext {
                message: format!("context must be an object, array or null, got {other}"),
            }),
        }
    }

    fn process_map(&self, map: &Map<String, JsonValue>) -> Result<ParsedContext> {
        let mut result = self.clone();

        if let Some(value) = map.get(jsonld::BASE) {
            result.base = match value {
                JsonValue::Null => None,
                JsonValue::String(s) if iri::is_absolute(s) => Some(s.clone()),
                JsonValue::String(s) => match &result.base {
                    Some(base) => Some(iri::resolve(base, s)?),
                    None => {
                        return Err(JsonLdError::InvalidContext {
                            message: format!("relative @base '{s}' with no base IRI to resolve against"),
                        })
                    }
                },
                other => {
                    return Err(JsonLdError::InvalidContext {
                        message: format!("@base must be a string or null, got {other}"),
                    })
                }
            };
        }

        if let Some(value) = map.get(jsonld::VOCAB) {
            result.vocab = match value {
                JsonValue::Null => None,
                JsonValue::String(s) if s.is_empty() => match &result.base {
                    Some(base) => Some(base.clone()),
                    None => {
                        return Err(JsonLdError::InvalidContext {
                            message: "empty @vocab requires a base IRI".to_string(),
                        })
                    }
                },
                JsonValue::String(s) => expand_iri_in(&result, s, true, true)?,
                other => {
                    return Err(JsonLdError::InvalidContext {
                        message: format!("@vocab must be a string or null, got {other}"),
                    })
                }
            };
        }

        if let Some(value) = map.get(jsonld::LANGUAGE) {
            result.language = match value {
                JsonValue::Null => None,
                JsonValue::String(s) => Some(s.clone()),
                other => {
                    return Err(JsonLdError::InvalidContext {
                        message: format!("@language must be a string or null, got {other}"),
                    })
                }
            };
        }

        if map.contains_key("@import") {
            return Err(JsonLdError::Unsupported {
                keyword: "@import".to_string(),
            });
        }

        let mut defined = HashMap::new();
        for key in map.keys() {
            if key.starts_with('@') {
                continue;
            }
            create_term_definition(&mut result, map, key, &mut defined)?;
        }

        Ok(result)
    }

    /// Expand a string against this context.
    ///
    /// `vocab` enables term and @vocab lookups (property names, types);
    /// `document_relative` resolves remaining relative references against the
    /// base per RFC 3986. Returns `None` for terms mapped to null.
    pub fn expand_iri(&self, value: &str, vocab: bool, document_relative: bool) -> Result<Option<String>> {
        expand_iri_in(self, value, vocab, document_relative)
    }

    /// The context that applies inside a property defined with a scoped context.
    pub fn scoped(&self, term: &str) -> Result<Option<ParsedContext>> {
        match self.get(term).and_then(|def| def.context.as_ref()) {
            Some(local) => self.process(local).map(Some),
            None => Ok(None),
        }
    }
}

fn expand_iri_in(
    ctx: &ParsedContext,
    value: &str,
    vocab: bool,
    document_relative: bool,
) -> Result<Option<String>> {
    if jsonld::is_keyword(value) {
        return Ok(Some(value.to_string()));
    }

    if vocab {
        if let Some(def) = ctx.terms.get(value) {
            return Ok(def.id.clone());
        }
    }

    if let Some((prefix, suffix)) = value.split_once(':') {
        if prefix == "_" || suffix.starts_with("//") {
            return Ok(Some(value.to_string()));
        }
        if let Some(id) = ctx.terms.get(prefix).and_then(|def| def.id.as_deref()) {
            return Ok(Some(format!("{id}{suffix}")));
        }
        if iri::is_absolute(value) {
            return Ok(Some(value.to_string()));
        }
    }

    if vocab {
        if let Some(v) = &ctx.vocab {
            return Ok(Some(format!("{v}{value}")));
        }
    }

    if document_relative {
        if let Some(base) = &ctx.base {
            return Ok(Some(iri::resolve(base, value)?));
        }
    }

    Ok(Some(value.to_string()))
}

/// Expand a value that may reference terms from the context being defined.
fn expand_iri_local(
    active: &mut ParsedContext,
    local: &Map<String, JsonValue>,
    defined: &mut HashMap<String, bool>,
    value: &str,
    vocab: bool,
) -> Result<Option<String>> {
    if local.contains_key(value) && !value.starts_with('@') {
        create_term_definition(active, local, value, defined)?;
    }
    if let Some((prefix, _)) = value.split_once(':') {
        if local.contains_key(prefix) {
            create_term_definition(active, local, prefix, defined)?;
        }
    }
    expand_iri_in(active, value, vocab, false)
}

fn create_term_definition(
    active: &mut ParsedContext,
    local: &Map<String, JsonValue>,
    term: &str,
    defined: &mut HashMap<String, bool>,
) -> Result<()> {
    match defined.get(term) {
        Some(true) => return Ok(()),
        Some(false) => {
            return Err(JsonLdError::CyclicIriMapping {
                term: term.to_string(),
            })
        }
        None => {}
    }
    defined.insert(term.to_string(), false);

    if jsonld::is_keyword(term) {
        return Err(JsonLdError::InvalidContext {
            message: format!("keywords cannot be redefined: {term}"),
        });
    }

    let value = local.get(term).cloned().unwrap_or(JsonValue::Null);
    let map = match value {
        JsonValue::Null => {
            active.terms.insert(term.to_string(), TermDefinition::default());
            defined.insert(term.to_string(), true);
            return Ok(());
        }
        JsonValue::String(s) => {
            let mut m = Map::new();
            m.insert(jsonld::ID.to_string(), JsonValue::String(s));
            m
        }
        JsonValue::Object(m) => m,
        other => {
            return Err(JsonLdError::InvalidContext {
                message: format!("invalid term definition for '{term}': {other}"),
            })
        }
    };

    let mut def = TermDefinition::default();

    if let Some(rev) = map.get(jsonld::REVERSE) {
        let rev = rev.as_str().ok_or_else(|| JsonLdError::InvalidContext {
            message: format!("@reverse of '{term}' must be a string"),
        })?;
        def.id = expand_iri_local(active, local, defined, rev, true)?;
        def.reverse = true;
    } else {
        match map.get(jsonld::ID) {
            Some(JsonValue::Null) => {}
            Some(JsonValue::String(id)) if id != term => {
                def.id = expand_iri_local(active, local, defined, id, true)?;
            }
            Some(JsonValue::String(_)) | None => {
                def.id = Some(default_term_iri(active, local, defined, term)?);
            }
            Some(other) => {
                return Err(JsonLdError::InvalidContext {
                    message: format!("@id of '{term}' must be a string, got {other}"),
                })
            }
        }
    }

    if let Some(t) = map.get(jsonld::TYPE) {
        let t = t.as_str().ok_or_else(|| JsonLdError::InvalidContext {
            message: format!("@type of '{term}' must be a string"),
        })?;
        let expanded = expand_iri_local(active, local, defined, t, true)?.unwrap_or_default();
        def.type_ = Some(match expanded.as_str() {
            "@id" => TypeValue::Id,
            "@vocab" => TypeValue::Vocab,
            "@json" => TypeValue::Json,
            _ if iri::is_absolute(&expanded) => TypeValue::Iri(expanded),
            _ => {
                return Err(JsonLdError::InvalidContext {
                    message: format!("invalid type mapping '{t}' for term '{term}'"),
                })
            }
        });
    }

    if let Some(c) = map.get(jsonld::CONTAINER) {
        def.container = parse_container(c)?;
    }

    if let Some(lang) = map.get(jsonld::LANGUAGE) {
        def.language = Some(lang.as_str().map(str::to_string));
    }

    if let Some(scoped) = map.get(jsonld::CONTEXT) {
        def.context = Some(scoped.clone());
    }

    active.terms.insert(term.to_string(), def);
    defined.insert(term.to_string(), true);
    Ok(())
}

/// IRI for a term defined without an explicit `@id`.
fn default_term_iri(
    active: &mut ParsedContext,
    local: &Map<String, JsonValue>,
    defined: &mut HashMap<String, bool>,
    term: &str,
) -> Result<String> {
    if term.contains(':') {
        if let Some(iri) = expand_iri_local(active, local, defined, term, false)? {
            return Ok(iri);
        }
    }
    match &active.vocab {
        Some(vocab) => Ok(format!("{vocab}{term}")),
        None => Err(JsonLdError::InvalidContext {
            message: format!("term '{term}' has no IRI mapping and no @vocab is set"),
        }),
    }
}

fn parse_container(value: &JsonValue) -> Result<Vec<Container>> {
    match value {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::String(s) => parse_container_string(s).map(|c| vec![c]),
        JsonValue::Array(arr) => arr
            .iter()
            .map(|item| match item {
                JsonValue::String(s) => parse_container_string(s),
                other => Err(JsonLdError::InvalidContext {
                    message: format!("@container array items must be strings, got {other}"),
                }),
            })
            .collect(),
        other => Err(JsonLdError::InvalidContext {
            message: format!("@container must be a string or array, got {other}"),
        }),
    }
}

fn parse_container_string(s: &str) -> Result<Container> {
    match s {
        "@list" => Ok(Container::List),
        "@set" => Ok(Container::Set),
        "@language" => Ok(Container::Language),
        "@index" => Ok(Container::Index),
        "@graph" | "@id" | "@type" => Err(JsonLdError::Unsupported {
            keyword: format!("@container {s}"),
        }),
        _ => Err(JsonLdError::InvalidContext {
            message: format!("Unknown @container value: {s}"),
        }),
    }
}
