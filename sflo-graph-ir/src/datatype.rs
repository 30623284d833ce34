//! RDF datatype representation
//!
//! Datatypes are always explicit in this model - there is no "untyped" literal.
//! Plain strings default to `xsd:string`, and language-tagged strings use
//! `rdf:langString`.

use serde::{Deserialize, Serialize};
use sflo_vocab::{rdf, xsd};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// RDF literal datatype
///
/// # Special Handling
///
/// - `JsonLdJson` represents the JSON-LD `@json` datatype, which maps to
///   `rdf:JSON` in RDF. JSON-LD output writes `"@type": "@json"` for it
///   instead of the full IRI.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Datatype {
    /// Datatype IRI (always absolute)
    Iri(Arc<str>),
    /// JSON-LD @json (rdf:JSON)
    JsonLdJson,
}

impl Datatype {
    /// Create a datatype from an absolute IRI
    pub fn from_iri(iri: impl AsRef<str>) -> Self {
        let iri = iri.as_ref();
        if iri == rdf::JSON || iri == "@json" {
            Datatype::JsonLdJson
        } else {
            Datatype::Iri(Arc::from(iri))
        }
    }

    /// xsd:string - default for plain string literals
    pub fn xsd_string() -> Self {
        Datatype::Iri(Arc::from(xsd::STRING))
    }

    pub fn xsd_boolean() -> Self {
        Datatype::Iri(Arc::from(xsd::BOOLEAN))
    }

    pub fn xsd_integer() -> Self {
        Datatype::Iri(Arc::from(xsd::INTEGER))
    }

    pub fn xsd_decimal() -> Self {
        Datatype::Iri(Arc::from(xsd::DECIMAL))
    }

    pub fn xsd_double() -> Self {
        Datatype::Iri(Arc::from(xsd::DOUBLE))
    }

    /// rdf:langString - for language-tagged literals
    pub fn rdf_lang_string() -> Self {
        Datatype::Iri(Arc::from(rdf::LANG_STRING))
    }

    /// rdf:JSON / @json
    pub fn rdf_json() -> Self {
        Datatype::JsonLdJson
    }

    /// Get the IRI representation of this datatype
    pub fn as_iri(&self) -> &str {
        match self {
            Datatype::Iri(iri) => iri,
            Datatype::JsonLdJson => rdf::JSON,
        }
    }

    pub fn is_xsd_string(&self) -> bool {
        self.as_iri() == xsd::STRING
    }

    pub fn is_lang_string(&self) -> bool {
        self.as_iri() == rdf::LANG_STRING
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Datatype::JsonLdJson)
    }
}

impl PartialEq for Datatype {
    fn eq(&self, other: &Self) -> bool {
        self.as_iri() == other.as_iri()
    }
}

impl Eq for Datatype {}

impl Hash for Datatype {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_iri().hash(state);
    }
}

impl PartialOrd for Datatype {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Datatype {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_iri().cmp(other.as_iri())
    }
}

impl std::fmt::Display for Datatype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_iri())
    }
}
