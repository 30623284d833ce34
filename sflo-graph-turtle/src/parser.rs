//! Recursive-descent parser for Turtle, TriG, N-Triples and N-Quads.
//!
//! Emits quad events to a `QuadSink`. Every IRI is resolved against the
//! base in scope (RFC 3986) before it reaches the sink.

use std::collections::HashMap;

use sflo_graph_ir::{iri, Datatype, QuadSink, TermId};
use sflo_vocab::rdf;
use tracing::debug;

use crate::error::{Result, TurtleError};
use crate::lex::{line_col, tokenize, Token, TokenKind};
use crate::Dialect;

/// Parser state.
pub struct Parser<'i, 's, S> {
    input: &'i str,
    tokens: Vec<Token>,
    pos: usize,
    sink: &'s mut S,
    dialect: Dialect,
    /// prefix -> namespace IRI
    prefixes: HashMap<String, String>,
    /// Base IRI for relative IRI resolution
    base: Option<String>,
    /// Graph of the block being parsed (None = default graph)
    graph: Option<TermId>,
}

impl<'i, 's, S: QuadSink> Parser<'i, 's, S> {
    pub fn new(input: &'i str, dialect: Dialect, sink: &'s mut S) -> Result<Self> {
        Ok(Self {
            input,
            tokens: tokenize(input)?,
            pos: 0,
            sink,
            dialect,
            prefixes: HashMap::new(),
            base: None,
            graph: None,
        })
    }

    /// Set the initial base IRI (the document location).
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Parse the entire document.
    pub fn parse(mut self) -> Result<()> {
        debug!(
            dialect = %self.dialect,
            base = ?self.base,
            tokens = self.tokens.len(),
            "parsing document"
        );
        while !self.is_at_end() {
            match self.dialect {
                Dialect::NTriples | Dialect::NQuads => self.parse_line_statement()?,
                Dialect::Turtle => self.parse_statement()?,
                Dialect::TriG => self.parse_trig_statement()?,
            }
        }
        Ok(())
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    fn is_at_end(&self) -> bool {
        self.current().is_eof()
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Token `offset` positions ahead, clamped to `Eof`.
    fn peek(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{}', found '{}'",
                kind,
                self.current().kind
            )))
        }
    }

    /// Parse error positioned at the current token.
    fn error(&self, message: impl Into<String>) -> TurtleError {
        let (line, column) = line_col(self.input, self.current().start);
        TurtleError::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    fn emit(&mut self, subject: TermId, predicate: TermId, object: TermId) {
        self.sink.emit_quad(subject, predicate, object, self.graph);
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Turtle statement: directive or triples.
    fn parse_statement(&mut self) -> Result<()> {
        match &self.current().kind {
            TokenKind::KwPrefix | TokenKind::KwSparqlPrefix => self.parse_prefix_directive(),
            TokenKind::KwBase | TokenKind::KwSparqlBase => self.parse_base_directive(),
            TokenKind::Eof => Ok(()),
            _ => self.parse_triples(),
        }
    }

    /// TriG statement: directive, graph block, or default-graph triples.
    fn parse_trig_statement(&mut self) -> Result<()> {
        match &self.current().kind {
            TokenKind::KwGraph => {
                self.advance();
                let label = self.parse_graph_label()?;
                self.parse_graph_block(Some(label))
            }
            TokenKind::LBrace => self.parse_graph_block(None),
            TokenKind::Iri(_)
            | TokenKind::PrefixedName { .. }
            | TokenKind::PrefixedNameNs(_)
            | TokenKind::BlankNodeLabel(_)
            | TokenKind::Anon
                if matches!(self.peek(1), TokenKind::LBrace) =>
            {
                let label = self.parse_graph_label()?;
                self.parse_graph_block(Some(label))
            }
            _ => self.parse_statement(),
        }
    }

    fn parse_graph_label(&mut self) -> Result<TermId> {
        match self.current().kind.clone() {
            TokenKind::BlankNodeLabel(label) => {
                self.advance();
                Ok(self.sink.term_blank(Some(&label)))
            }
            TokenKind::Anon => {
                self.advance();
                Ok(self.sink.term_blank(None))
            }
            _ => {
                let iri = self.parse_iri_like("graph name")?;
                Ok(self.sink.term_iri(&iri))
            }
        }
    }

    /// `{ triples ( '.' triples )* '.'? }`
    fn parse_graph_block(&mut self, label: Option<TermId>) -> Result<()> {
        self.expect(&TokenKind::LBrace)?;
        self.graph = label;

        while !self.check(&TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.error("unterminated graph block, expected '}'"));
            }
            self.parse_subject_and_predicates()?;
            if self.check(&TokenKind::Dot) {
                self.advance();
            } else if !self.check(&TokenKind::RBrace) {
                return Err(self.error(format!(
                    "expected '.' or '}}', found '{}'",
                    self.current().kind
                )));
            }
        }

        self.expect(&TokenKind::RBrace)?;
        self.graph = None;
        Ok(())
    }

    /// `@prefix` or `PREFIX`
    fn parse_prefix_directive(&mut self) -> Result<()> {
        let is_sparql_style = matches!(self.current().kind, TokenKind::KwSparqlPrefix);
        self.advance();

        let prefix = match &self.current().kind {
            TokenKind::PrefixedNameNs(p) => p.to_string(),
            _ => return Err(self.error("expected prefix namespace")),
        };
        self.advance();

        let namespace = match self.current().kind.clone() {
            TokenKind::Iri(reference) => self.resolve(&reference)?,
            _ => return Err(self.error("expected IRI for prefix namespace")),
        };
        self.advance();

        self.sink.on_prefix(&prefix, &namespace);
        self.prefixes.insert(prefix, namespace);

        if !is_sparql_style {
            self.expect(&TokenKind::Dot)?;
        }
        Ok(())
    }

    /// `@base` or `BASE`; the new base is itself resolved against the old one.
    fn parse_base_directive(&mut self) -> Result<()> {
        let is_sparql_style = matches!(self.current().kind, TokenKind::KwSparqlBase);
        self.advance();

        let base = match self.current().kind.clone() {
            TokenKind::Iri(reference) => self.resolve(&reference)?,
            _ => return Err(self.error("expected IRI for base")),
        };
        self.advance();
        self.base = Some(base);

        if !is_sparql_style {
            self.expect(&TokenKind::Dot)?;
        }
        Ok(())
    }

    fn parse_triples(&mut self) -> Result<()> {
        self.parse_subject_and_predicates()?;
        self.expect(&TokenKind::Dot)
    }

    /// Subject plus predicate-object list. A bracketed blank node may stand
    /// alone (`[ :p :o ] .`).
    fn parse_subject_and_predicates(&mut self) -> Result<()> {
        if matches!(self.current().kind, TokenKind::LBracket) {
            let subject = self.parse_blank_node_property_list()?;
            if matches!(
                self.current().kind,
                TokenKind::Dot | TokenKind::RBrace | TokenKind::Eof
            ) {
                return Ok(());
            }
            return self.parse_predicate_object_list(subject);
        }
        let subject = self.parse_subject()?;
        self.parse_predicate_object_list(subject)
    }

    // =========================================================================
    // Terms
    // =========================================================================

    fn parse_subject(&mut self) -> Result<TermId> {
        match self.current().kind.clone() {
            TokenKind::BlankNodeLabel(label) => {
                self.advance();
                Ok(self.sink.term_blank(Some(&label)))
            }
            TokenKind::Anon => {
                self.advance();
                Ok(self.sink.term_blank(None))
            }
            TokenKind::LBracket => self.parse_blank_node_property_list(),
            TokenKind::LParen => self.parse_collection(),
            TokenKind::Nil => {
                self.advance();
                Ok(self.sink.term_iri(rdf::NIL))
            }
            TokenKind::Iri(_) | TokenKind::PrefixedName { .. } | TokenKind::PrefixedNameNs(_) => {
                let iri = self.parse_iri_like("subject")?;
                Ok(self.sink.term_iri(&iri))
            }
            other => Err(self.error(format!("expected subject, found '{}'", other))),
        }
    }

    fn parse_predicate_object_list(&mut self, subject: TermId) -> Result<()> {
        loop {
            let predicate = self.parse_predicate()?;
            self.parse_object_list(subject, predicate)?;

            if !matches!(self.current().kind, TokenKind::Semicolon) {
                break;
            }
            // Repeated and trailing semicolons are allowed
            while matches!(self.current().kind, TokenKind::Semicolon) {
                self.advance();
            }
            if matches!(
                self.current().kind,
                TokenKind::Dot | TokenKind::RBracket | TokenKind::RBrace | TokenKind::Eof
            ) {
                break;
            }
        }
        Ok(())
    }

    fn parse_predicate(&mut self) -> Result<TermId> {
        if matches!(self.current().kind, TokenKind::KwA) {
            self.advance();
            return Ok(self.sink.term_iri(rdf::TYPE));
        }
        let iri = self.parse_iri_like("predicate")?;
        Ok(self.sink.term_iri(&iri))
    }

    fn parse_object_list(&mut self, subject: TermId, predicate: TermId) -> Result<()> {
        loop {
            let object = self.parse_object()?;
            self.emit(subject, predicate, object);

            if matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(())
    }

    fn parse_object(&mut self) -> Result<TermId> {
        match self.current().kind.clone() {
            TokenKind::String(_)
            | TokenKind::Integer(_)
            | TokenKind::Decimal(_)
            | TokenKind::Double(_)
            | TokenKind::KwTrue
            | TokenKind::KwFalse => self.parse_literal(),
            TokenKind::BlankNodeLabel(label) => {
                self.advance();
                Ok(self.sink.term_blank(Some(&label)))
            }
            TokenKind::Anon => {
                self.advance();
                Ok(self.sink.term_blank(None))
            }
            TokenKind::LBracket => self.parse_blank_node_property_list(),
            TokenKind::LParen => self.parse_collection(),
            TokenKind::Nil => {
                self.advance();
                Ok(self.sink.term_iri(rdf::NIL))
            }
            TokenKind::Iri(_) | TokenKind::PrefixedName { .. } | TokenKind::PrefixedNameNs(_) => {
                let iri = self.parse_iri_like("object")?;
                Ok(self.sink.term_iri(&iri))
            }
            other => Err(self.error(format!("expected object, found '{}'", other))),
        }
    }

    /// String with optional language tag or datatype, or a bare
    /// number/boolean. Lexical forms are passed through untouched.
    fn parse_literal(&mut self) -> Result<TermId> {
        let (lexical, datatype) = match self.current().kind.clone() {
            TokenKind::String(value) => {
                self.advance();
                match self.current().kind.clone() {
                    TokenKind::LangTag(lang) => {
                        self.advance();
                        return Ok(self.sink.term_literal(
                            &value,
                            Datatype::rdf_lang_string(),
                            Some(&lang),
                        ));
                    }
                    TokenKind::DoubleCaret => {
                        self.advance();
                        let dt = self.parse_iri_like("datatype IRI")?;
                        (value, Datatype::from_iri(dt))
                    }
                    _ => (value, Datatype::xsd_string()),
                }
            }
            TokenKind::Integer(s) => {
                self.advance();
                (s, Datatype::xsd_integer())
            }
            TokenKind::Decimal(s) => {
                self.advance();
                (s, Datatype::xsd_decimal())
            }
            TokenKind::Double(s) => {
                self.advance();
                (s, Datatype::xsd_double())
            }
            TokenKind::KwTrue | TokenKind::KwFalse => {
                let lexical = self.current().kind.to_string();
                self.advance();
                (lexical.into(), Datatype::xsd_boolean())
            }
            other => return Err(self.error(format!("expected literal, found '{}'", other))),
        };
        Ok(self.sink.term_literal(&lexical, datatype, None))
    }

    /// `<iri>`, `prefix:local` or `prefix:`, returned as an absolute IRI.
    fn parse_iri_like(&mut self, role: &str) -> Result<String> {
        let iri = match self.current().kind.clone() {
            TokenKind::Iri(reference) => self.resolve(&reference)?,
            TokenKind::PrefixedName { prefix, local } => self.expand_prefixed_name(&prefix, &local)?,
            TokenKind::PrefixedNameNs(prefix) => self.expand_prefixed_name(&prefix, "")?,
            other => return Err(self.error(format!("expected {}, found '{}'", role, other))),
        };
        self.advance();
        Ok(iri)
    }

    /// `[ predicate object ; ... ]`
    fn parse_blank_node_property_list(&mut self) -> Result<TermId> {
        self.expect(&TokenKind::LBracket)?;
        let bnode = self.sink.term_blank(None);

        if !matches!(self.current().kind, TokenKind::RBracket) {
            self.parse_predicate_object_list(bnode)?;
        }

        self.expect(&TokenKind::RBracket)?;
        Ok(bnode)
    }

    /// `( item1 item2 ... )` as an rdf:first/rdf:rest chain
    fn parse_collection(&mut self) -> Result<TermId> {
        self.expect(&TokenKind::LParen)?;

        if matches!(self.current().kind, TokenKind::RParen) {
            self.advance();
            return Ok(self.sink.term_iri(rdf::NIL));
        }

        let rdf_first = self.sink.term_iri(rdf::FIRST);
        let rdf_rest = self.sink.term_iri(rdf::REST);

        let head = self.sink.term_blank(None);
        let mut node = head;

        loop {
            let item = self.parse_object()?;
            self.emit(node, rdf_first, item);

            if matches!(self.current().kind, TokenKind::RParen) {
                let nil = self.sink.term_iri(rdf::NIL);
                self.emit(node, rdf_rest, nil);
                break;
            }
            if self.is_at_end() {
                return Err(self.error("unterminated collection, expected ')'"));
            }
            let next = self.sink.term_blank(None);
            self.emit(node, rdf_rest, next);
            node = next;
        }

        self.expect(&TokenKind::RParen)?;
        Ok(head)
    }

    // =========================================================================
    // Line-based dialects
    // =========================================================================

    /// `subject predicate object graph? .` with no abbreviations
    fn parse_line_statement(&mut self) -> Result<()> {
        let subject = match self.current().kind.clone() {
            TokenKind::Iri(reference) => {
                let iri = self.resolve(&reference)?;
                self.advance();
                self.sink.term_iri(&iri)
            }
            TokenKind::BlankNodeLabel(label) => {
                self.advance();
                self.sink.term_blank(Some(&label))
            }
            other => return Err(self.error(format!("expected subject, found '{}'", other))),
        };

        let predicate = match self.current().kind.clone() {
            TokenKind::Iri(reference) => {
                let iri = self.resolve(&reference)?;
                self.advance();
                self.sink.term_iri(&iri)
            }
            other => return Err(self.error(format!("expected predicate IRI, found '{}'", other))),
        };

        let object = match self.current().kind.clone() {
            TokenKind::Iri(reference) => {
                let iri = self.resolve(&reference)?;
                self.advance();
                self.sink.term_iri(&iri)
            }
            TokenKind::BlankNodeLabel(label) => {
                self.advance();
                self.sink.term_blank(Some(&label))
            }
            TokenKind::String(_) => self.parse_literal()?,
            other => return Err(self.error(format!("expected object, found '{}'", other))),
        };

        let graph = match (self.dialect, self.current().kind.clone()) {
            (Dialect::NQuads, TokenKind::Iri(reference)) => {
                let iri = self.resolve(&reference)?;
                self.advance();
                Some(self.sink.term_iri(&iri))
            }
            (Dialect::NQuads, TokenKind::BlankNodeLabel(label)) => {
                self.advance();
                Some(self.sink.term_blank(Some(&label)))
            }
            _ => None,
        };

        self.expect(&TokenKind::Dot)?;
        self.sink.emit_quad(subject, predicate, object, graph);
        Ok(())
    }

    // =========================================================================
    // IRI helpers
    // =========================================================================

    /// Resolve a possibly relative IRI against the base (RFC 3986).
    fn resolve(&self, reference: &str) -> Result<String> {
        iri::resolve_opt(self.base.as_deref(), reference).map_err(|e| self.error(e.to_string()))
    }

    fn expand_prefixed_name(&self, prefix: &str, local: &str) -> Result<String> {
        match self.prefixes.get(prefix) {
            Some(namespace) => Ok(format!("{}{}", namespace, local)),
            None => Err(self.error(format!("undefined prefix '{}:'", prefix))),
        }
    }
}

/// Parse a document in the given dialect into `sink`.
///
/// `base` is the document location; relative IRIs in the input are resolved
/// against it.
pub fn parse<S: QuadSink>(
    input: &str,
    dialect: Dialect,
    base: Option<&str>,
    sink: &mut S,
) -> Result<()> {
    let parser = Parser::new(input, dialect, sink)?;
    match base {
        Some(b) => parser.with_base(b).parse(),
        None => parser.parse(),
    }
}
