//! The four stream syntaxes handled by this crate

use serde::{Deserialize, Serialize};

/// Stream syntax dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Turtle,
    #[serde(rename = "trig")]
    TriG,
    #[serde(rename = "ntriples")]
    NTriples,
    #[serde(rename = "nquads")]
    NQuads,
}

impl Dialect {
    /// Dialects that can carry named graphs
    pub fn supports_named_graphs(self) -> bool {
        matches!(self, Dialect::TriG | Dialect::NQuads)
    }

    /// Line-based dialects: one statement per line, no prefixes, no
    /// relative IRIs in output
    pub fn is_line_based(self) -> bool {
        matches!(self, Dialect::NTriples | Dialect::NQuads)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Dialect::Turtle => "Turtle",
            Dialect::TriG => "TriG",
            Dialect::NTriples => "N-Triples",
            Dialect::NQuads => "N-Quads",
        })
    }
}
