//! Minimal RDF term model used across the server.
//!
//! The persistence backends and the HTTP layer only need a small slice of RDF:
//! IRIs, blank nodes, literals, and quads partitioned into a fixed set of named
//! graphs. Everything is ordered so datasets serialize deterministically.

pub mod ntriples;
pub mod vocab;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An absolute IRI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iri(String);

impl Iri {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for Iri {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Iri {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// An RDF literal. A literal carries either a language tag or a datatype, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Literal {
    pub fn simple(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: Iri) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype),
            language: None,
        }
    }

    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into().to_lowercase()),
        }
    }
}

/// Subject or object position of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Iri(Iri),
    BlankNode(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri(Iri::new(value))
    }

    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }
}

impl From<Iri> for Term {
    fn from(value: Iri) -> Self {
        Term::Iri(value)
    }
}

impl From<Literal> for Term {
    fn from(value: Literal) -> Self {
        Term::Literal(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Iri,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: impl Into<Term>, predicate: Iri, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }

    pub fn in_graph(self, graph: Iri) -> Quad {
        Quad {
            graph,
            subject: self.subject,
            predicate: self.predicate,
            object: self.object,
        }
    }
}

/// A statement in one of the server's named graphs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quad {
    pub graph: Iri,
    pub subject: Term,
    pub predicate: Iri,
    pub object: Term,
}

impl Quad {
    pub fn new(
        graph: Iri,
        subject: impl Into<Term>,
        predicate: Iri,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            graph,
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }

    pub fn to_triple(&self) -> Triple {
        Triple {
            subject: self.subject.clone(),
            predicate: self.predicate.clone(),
            object: self.object.clone(),
        }
    }
}

/// A set of triples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    triples: BTreeSet<Triple>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, triple: Triple) {
        self.triples.insert(triple);
    }

    pub fn remove(&mut self, triple: &Triple) -> bool {
        self.triples.remove(triple)
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Lift every triple into `graph`.
    pub fn into_quads(self, graph: &Iri) -> impl Iterator<Item = Quad> + '_ {
        self.triples.into_iter().map(move |t| t.in_graph(graph.clone()))
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

/// A set of quads. Handlers own their scratch datasets for the duration of one
/// request; they are released when the handler drops them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    quads: BTreeSet<Quad>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, quad: Quad) {
        self.quads.insert(quad);
    }

    pub fn contains(&self, quad: &Quad) -> bool {
        self.quads.contains(quad)
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    /// Quads whose graph is `graph`.
    pub fn graph<'a>(&'a self, graph: &'a Iri) -> impl Iterator<Item = &'a Quad> + 'a {
        self.quads.iter().filter(move |q| &q.graph == graph)
    }

    /// Drop every quad in `graph`.
    pub fn clear_graph(&mut self, graph: &Iri) {
        self.quads.retain(|q| &q.graph != graph);
    }
}

impl FromIterator<Quad> for Dataset {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        Self {
            quads: iter.into_iter().collect(),
        }
    }
}

impl Extend<Quad> for Dataset {
    fn extend<I: IntoIterator<Item = Quad>>(&mut self, iter: I) {
        self.quads.extend(iter);
    }
}

impl IntoIterator for Dataset {
    type Item = Quad;
    type IntoIter = std::collections::btree_set::IntoIter<Quad>;

    fn into_iter(self) -> Self::IntoIter {
        self.quads.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_deduplicates_quads() {
        let g = Iri::new("urn:graph");
        let quad = Quad::new(
            g.clone(),
            Iri::new("urn:s"),
            Iri::new("urn:p"),
            Literal::simple("o"),
        );

        let mut dataset = Dataset::new();
        dataset.add(quad.clone());
        dataset.add(quad);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.graph(&g).count(), 1);
    }

    #[test]
    fn clear_graph_keeps_other_graphs() {
        let a = Iri::new("urn:a");
        let b = Iri::new("urn:b");
        let mut dataset: Dataset = [
            Quad::new(a.clone(), Iri::new("urn:s"), Iri::new("urn:p"), Iri::new("urn:o")),
            Quad::new(b.clone(), Iri::new("urn:s"), Iri::new("urn:p"), Iri::new("urn:o")),
        ]
        .into_iter()
        .collect();

        dataset.clear_graph(&a);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.graph(&b).count(), 1);
    }

    #[test]
    fn language_tags_are_normalized() {
        assert_eq!(Literal::lang("x", "EN-us").language.as_deref(), Some("en-us"));
    }
}
