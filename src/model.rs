//! Domain types shared by the persistence services and the handlers.

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rdf::vocab::{ldp, trellis};
use crate::rdf::{Dataset, Graph, Iri, Quad};

/// Prefix of every internal resource identifier.
pub const TRELLIS_DATA_PREFIX: &str = "trellis:data/";
/// Prefix of skolemized blank nodes.
pub const TRELLIS_BNODE_PREFIX: &str = "trellis:bnode/";
/// Prefix of agent IRIs minted for plain (non-IRI) principal names.
pub const TRELLIS_USER_PREFIX: &str = "trellis:user/";

/// LDP interaction models, organised as a strict supertype chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InteractionModel {
    Resource,
    RdfSource,
    NonRdfSource,
    Container,
    BasicContainer,
    DirectContainer,
    IndirectContainer,
}

impl InteractionModel {
    pub const ALL: [InteractionModel; 7] = [
        InteractionModel::Resource,
        InteractionModel::RdfSource,
        InteractionModel::NonRdfSource,
        InteractionModel::Container,
        InteractionModel::BasicContainer,
        InteractionModel::DirectContainer,
        InteractionModel::IndirectContainer,
    ];

    pub fn iri(self) -> &'static str {
        match self {
            InteractionModel::Resource => ldp::RESOURCE,
            InteractionModel::RdfSource => ldp::RDF_SOURCE,
            InteractionModel::NonRdfSource => ldp::NON_RDF_SOURCE,
            InteractionModel::Container => ldp::CONTAINER,
            InteractionModel::BasicContainer => ldp::BASIC_CONTAINER,
            InteractionModel::DirectContainer => ldp::DIRECT_CONTAINER,
            InteractionModel::IndirectContainer => ldp::INDIRECT_CONTAINER,
        }
    }

    pub fn from_iri(iri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|model| model.iri() == iri)
    }

    pub fn superclass(self) -> Option<Self> {
        match self {
            InteractionModel::Resource => None,
            InteractionModel::RdfSource | InteractionModel::NonRdfSource => {
                Some(InteractionModel::Resource)
            }
            InteractionModel::Container => Some(InteractionModel::RdfSource),
            InteractionModel::BasicContainer
            | InteractionModel::DirectContainer
            | InteractionModel::IndirectContainer => Some(InteractionModel::Container),
        }
    }

    /// This model followed by all of its ancestors.
    pub fn ldp_types(self) -> Vec<Self> {
        std::iter::successors(Some(self), |model| model.superclass()).collect()
    }

    pub fn is_a(self, other: Self) -> bool {
        self.ldp_types().contains(&other)
    }

    pub fn is_container(self) -> bool {
        self.is_a(InteractionModel::Container)
    }

    pub fn is_rdf_source(self) -> bool {
        self.is_a(InteractionModel::RdfSource)
    }

    pub fn is_binary(self) -> bool {
        self == InteractionModel::NonRdfSource
    }
}

impl fmt::Display for InteractionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.iri())
    }
}

/// Location and shape of a stored binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct BinaryMetadata {
    #[builder(into)]
    pub identifier: String,
    #[builder(into)]
    pub mime_type: Option<String>,
    pub size: Option<u64>,
}

/// Descriptor submitted to the resource service for create, replace and delete.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct Metadata {
    pub identifier: Iri,
    pub interaction_model: InteractionModel,
    pub container: Option<Iri>,
    pub binary: Option<BinaryMetadata>,
    pub membership_resource: Option<Iri>,
    pub member_relation: Option<Iri>,
    pub member_of_relation: Option<Iri>,
    pub inserted_content_relation: Option<Iri>,
}

/// A read-only snapshot of a stored resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub identifier: Iri,
    pub interaction_model: InteractionModel,
    pub modified: DateTime<Utc>,
    pub container: Option<Iri>,
    pub binary: Option<BinaryMetadata>,
    pub membership_resource: Option<Iri>,
    pub member_relation: Option<Iri>,
    pub member_of_relation: Option<Iri>,
    pub inserted_content_relation: Option<Iri>,
    pub quads: Dataset,
}

impl Resource {
    /// Snapshot a resource from the metadata and content it was written with.
    pub fn from_metadata(metadata: &Metadata, quads: Dataset, modified: DateTime<Utc>) -> Self {
        Self {
            identifier: metadata.identifier.clone(),
            interaction_model: metadata.interaction_model,
            modified,
            container: metadata.container.clone(),
            binary: metadata.binary.clone(),
            membership_resource: metadata.membership_resource.clone(),
            member_relation: metadata.member_relation.clone(),
            member_of_relation: metadata.member_of_relation.clone(),
            inserted_content_relation: metadata.inserted_content_relation.clone(),
            quads,
        }
    }

    pub fn stream(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    /// Quads whose graph is one of `graphs`.
    pub fn stream_graphs<'a>(&'a self, graphs: &'a [Iri]) -> impl Iterator<Item = &'a Quad> + 'a {
        self.quads.iter().filter(move |q| graphs.contains(&q.graph))
    }

    /// The triples of a single named graph.
    pub fn graph(&self, graph: &str) -> Graph {
        self.quads
            .iter()
            .filter(|q| q.graph == graph)
            .map(Quad::to_triple)
            .collect()
    }

    pub fn has_acl(&self) -> bool {
        self.quads
            .iter()
            .any(|q| q.graph == trellis::PREFER_ACCESS_CONTROL)
    }
}

/// Outcome of a resource lookup. Non-existent and tombstoned targets are
/// values, not errors, so handlers can match on them exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceLookup {
    Found(Resource),
    Missing,
    Deleted,
}

impl ResourceLookup {
    pub fn found(self) -> Option<Resource> {
        match self {
            ResourceLookup::Found(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn as_found(&self) -> Option<&Resource> {
        match self {
            ResourceLookup::Found(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn exists(&self) -> bool {
        matches!(self, ResourceLookup::Found(_))
    }
}

/// The security context a request runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identifier: Iri,
    pub agent: Iri,
    pub delegated_by: Option<Iri>,
    pub created: DateTime<Utc>,
}

impl Session {
    pub fn new(agent: Iri) -> Self {
        Self {
            identifier: Iri::new(format!("trellis:session/{}", uuid::Uuid::new_v4())),
            agent,
            delegated_by: None,
            created: Utc::now(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(Iri::new(trellis::ANONYMOUS_AGENT))
    }

    pub fn with_delegate(mut self, delegated_by: Iri) -> Self {
        self.delegated_by = Some(delegated_by);
        self
    }
}

/// Parent of an internal identifier. The root has no container.
pub fn container_of(identifier: &Iri) -> Option<Iri> {
    let path = identifier.as_str().strip_prefix(TRELLIS_DATA_PREFIX)?;
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        return None;
    }
    match path.rfind('/') {
        Some(idx) => Some(Iri::new(format!("{TRELLIS_DATA_PREFIX}{}", &path[..idx]))),
        None => Some(Iri::new(TRELLIS_DATA_PREFIX)),
    }
}
