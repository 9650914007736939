use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{InteractionModel, Metadata, ResourceLookup, TRELLIS_BNODE_PREFIX, TRELLIS_DATA_PREFIX};
use crate::rdf::{Dataset, Iri, Quad, Term};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource not found: {0}")]
    NotFound(Iri),

    #[error("unsupported interaction model: {0}")]
    UnsupportedInteractionModel(InteractionModel),

    #[error("persistence backend failure: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, ResourceError>;

/// Persistence contract for LDP resources.
///
/// Lookups never fail for absent or tombstoned targets; they resolve to
/// [`ResourceLookup::Missing`] or [`ResourceLookup::Deleted`]. Each write is
/// all-or-nothing.
#[async_trait]
pub trait ResourceService: Send + Sync {
    async fn get(&self, identifier: &Iri) -> Result<ResourceLookup>;

    async fn create(&self, metadata: Metadata, dataset: Dataset) -> Result<()>;

    async fn replace(&self, metadata: Metadata, dataset: Dataset) -> Result<()>;

    /// Tombstone the resource described by `metadata`.
    async fn delete(&self, metadata: Metadata) -> Result<()>;

    /// Append write-once data (audit records) to a resource.
    async fn add(&self, identifier: &Iri, dataset: Dataset) -> Result<()>;

    fn supported_interaction_models(&self) -> BTreeSet<InteractionModel> {
        InteractionModel::ALL.into_iter().collect()
    }

    fn generate_identifier(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn skolemize(&self, term: &Term) -> Term {
        match term {
            Term::BlankNode(label) => Term::iri(format!("{TRELLIS_BNODE_PREFIX}{label}")),
            other => other.clone(),
        }
    }

    fn unskolemize(&self, term: &Term) -> Term {
        match term {
            Term::Iri(iri) => match iri.as_str().strip_prefix(TRELLIS_BNODE_PREFIX) {
                Some(label) => Term::BlankNode(label.to_string()),
                None => term.clone(),
            },
            other => other.clone(),
        }
    }

    /// Map an external IRI under `base_url` onto the internal identifier scheme.
    fn to_internal(&self, term: &Term, base_url: &str) -> Term {
        match term {
            Term::Iri(iri) => match iri.as_str().strip_prefix(base_url) {
                Some(path) => Term::iri(format!("{TRELLIS_DATA_PREFIX}{path}")),
                None => term.clone(),
            },
            other => other.clone(),
        }
    }

    /// Map an internal identifier onto an external IRI under `base_url`.
    fn to_external(&self, term: &Term, base_url: &str) -> Term {
        match term {
            Term::Iri(iri) => match iri.as_str().strip_prefix(TRELLIS_DATA_PREFIX) {
                Some(path) => Term::iri(format!("{base_url}{path}")),
                None => term.clone(),
            },
            other => other.clone(),
        }
    }
}

/// Apply a term mapping to both subject and object positions of a quad.
pub fn map_quad(quad: &Quad, f: impl Fn(&Term) -> Term) -> Quad {
    Quad {
        graph: quad.graph.clone(),
        subject: f(&quad.subject),
        predicate: quad.predicate.clone(),
        object: f(&quad.object),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Defaults;

    #[async_trait]
    impl ResourceService for Defaults {
        async fn get(&self, _: &Iri) -> Result<ResourceLookup> {
            Ok(ResourceLookup::Missing)
        }
        async fn create(&self, _: Metadata, _: Dataset) -> Result<()> {
            Ok(())
        }
        async fn replace(&self, _: Metadata, _: Dataset) -> Result<()> {
            Ok(())
        }
        async fn delete(&self, _: Metadata) -> Result<()> {
            Ok(())
        }
        async fn add(&self, _: &Iri, _: Dataset) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn skolemize_round_trips_blank_nodes() {
        let svc = Defaults;
        let bnode = Term::BlankNode("randomValue".into());
        let skolem = svc.skolemize(&bnode);
        assert_eq!(skolem, Term::iri("trellis:bnode/randomValue"));
        assert_eq!(svc.unskolemize(&skolem), bnode);

        let literal = Term::Literal(crate::rdf::Literal::simple("x"));
        assert_eq!(svc.skolemize(&literal), literal);
    }

    #[test]
    fn internal_external_translation() {
        let svc = Defaults;
        let base = "http://example.org/";
        let external = Term::iri("http://example.org/resource");
        let internal = svc.to_internal(&external, base);
        assert_eq!(internal, Term::iri("trellis:data/resource"));
        assert_eq!(svc.to_external(&internal, base), external);

        let foreign = Term::iri("http://other.example/x");
        assert_eq!(svc.to_internal(&foreign, base), foreign);
    }

    #[test]
    fn supports_every_model_by_default() {
        assert_eq!(Defaults.supported_interaction_models().len(), 7);
        assert_ne!(Defaults.generate_identifier(), Defaults.generate_identifier());
    }
}
