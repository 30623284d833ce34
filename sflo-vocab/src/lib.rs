//! RDF vocabulary constants for the Semantic Flow RDF core
//!
//! Constants are organized by vocabulary:
//! - `rdf` - RDF vocabulary (http://www.w3.org/1999/02/22-rdf-syntax-ns#)
//! - `xsd` - XSD vocabulary (http://www.w3.org/2001/XMLSchema#)
//! - `jsonld` - JSON-LD keywords used by the expansion and fromRDF code
//! - `media` - content types for the supported RDF syntaxes

/// RDF vocabulary constants
pub mod rdf {
    /// RDF namespace
    pub const NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

    /// rdf:type IRI
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

    /// rdf:langString IRI
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

    /// rdf:JSON IRI
    pub const JSON: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON";

    /// rdf:first IRI (RDF list head)
    pub const FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";

    /// rdf:rest IRI (RDF list tail)
    pub const REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";

    /// rdf:nil IRI (RDF list terminator)
    pub const NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
}

/// XSD vocabulary constants
pub mod xsd {
    /// XSD namespace
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";

    /// xsd:string IRI
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

    /// xsd:integer IRI
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

    /// xsd:decimal IRI
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";

    /// xsd:double IRI
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

    /// xsd:boolean IRI
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
}

/// JSON-LD keywords
pub mod jsonld {
    pub const CONTEXT: &str = "@context";
    pub const ID: &str = "@id";
    pub const TYPE: &str = "@type";
    pub const VALUE: &str = "@value";
    pub const LANGUAGE: &str = "@language";
    pub const LIST: &str = "@list";
    pub const SET: &str = "@set";
    pub const GRAPH: &str = "@graph";
    pub const REVERSE: &str = "@reverse";
    pub const VOCAB: &str = "@vocab";
    pub const BASE: &str = "@base";
    pub const CONTAINER: &str = "@container";
    pub const JSON: &str = "@json";
    pub const INCLUDED: &str = "@included";
    pub const INDEX: &str = "@index";
    pub const NEST: &str = "@nest";

    /// Returns true if `s` is a JSON-LD keyword (`@` followed by letters).
    pub fn is_keyword(s: &str) -> bool {
        s.len() > 1
            && s.starts_with('@')
            && s[1..].bytes().all(|b| b.is_ascii_alphabetic())
    }
}

/// Content types for the supported RDF syntaxes
pub mod media {
    pub const JSON_LD: &str = "application/ld+json";
    pub const TURTLE: &str = "text/turtle";
    pub const TRIG: &str = "application/trig";
    pub const N_TRIPLES: &str = "application/n-triples";
    pub const N_QUADS: &str = "application/n-quads";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_prefix_constants() {
        assert!(rdf::TYPE.starts_with(rdf::NS));
        assert!(rdf::LANG_STRING.starts_with(rdf::NS));
        assert!(xsd::BOOLEAN.starts_with(xsd::NS));
    }

    #[test]
    fn test_is_keyword() {
        assert!(jsonld::is_keyword("@id"));
        assert!(jsonld::is_keyword("@context"));
        assert!(!jsonld::is_keyword("@"));
        assert!(!jsonld::is_keyword("id"));
        assert!(!jsonld::is_keyword("@foo1"));
    }
}
