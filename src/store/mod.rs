//! Resource and memento persistence.
//!
//! Two backends implement both [`ResourceService`](crate::services::ResourceService)
//! and [`MementoService`](crate::services::MementoService):
//!
//! - [`MemoryStore`] keeps everything in process; used by tests and the default config.
//! - [`FjallStore`] persists into an embedded Fjall keyspace.
//!
//! Both store the user-supplied dataset as written and derive the
//! server-managed, containment and membership graphs when a resource is read.

pub mod error;
pub mod fjall_store;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use fjall_store::FjallStore;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;

use crate::model::{InteractionModel, Resource};
use crate::rdf::vocab::{dc, ldp, rdf, trellis, xsd};
use crate::rdf::{Iri, Literal, Quad, Term};

/// What a backend keeps per identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub(crate) enum Record {
    Live(Resource),
    Deleted { modified: DateTime<Utc> },
}

/// Type and timestamp triples plus binary description.
pub(crate) fn server_managed(resource: &Resource) -> Vec<Quad> {
    let graph = Iri::new(trellis::PREFER_SERVER_MANAGED);
    let id = &resource.identifier;
    let mut quads = vec![
        Quad::new(
            graph.clone(),
            id.clone(),
            Iri::new(rdf::TYPE),
            Iri::new(resource.interaction_model.iri()),
        ),
        Quad::new(
            graph.clone(),
            id.clone(),
            Iri::new(dc::MODIFIED),
            Literal::typed(resource.modified.to_rfc3339(), Iri::new(xsd::DATE_TIME)),
        ),
    ];

    if let Some(container) = &resource.container {
        quads.push(Quad::new(graph.clone(), id.clone(), Iri::new(dc::IS_PART_OF), container.clone()));
    }

    if let Some(binary) = &resource.binary {
        let location = Term::iri(binary.identifier.clone());
        quads.push(Quad::new(graph.clone(), id.clone(), Iri::new(dc::HAS_PART), location.clone()));
        if let Some(mime_type) = &binary.mime_type {
            quads.push(Quad::new(
                graph.clone(),
                location.clone(),
                Iri::new(dc::FORMAT),
                Literal::simple(mime_type.clone()),
            ));
        }
        if let Some(size) = binary.size {
            quads.push(Quad::new(
                graph,
                location,
                Iri::new(dc::EXTENT),
                Literal::typed(size.to_string(), Iri::new(xsd::LONG)),
            ));
        }
    }
    quads
}

/// `ldp:contains` for each live child.
pub(crate) fn containment<'a>(
    container: &'a Iri,
    children: impl IntoIterator<Item = &'a Iri> + 'a,
) -> impl Iterator<Item = Quad> + 'a {
    children.into_iter().map(move |child| {
        Quad::new(
            Iri::new(ldp::PREFER_CONTAINMENT),
            container.clone(),
            Iri::new(ldp::CONTAINS),
            child.clone(),
        )
    })
}

/// Membership triples a Direct/Indirect `container` contributes to its
/// membership resource, given its live children.
pub(crate) fn membership(container: &Resource, children: &[Resource]) -> Vec<Quad> {
    let (Some(target), Some(relation)) =
        (&container.membership_resource, &container.member_relation)
    else {
        return Vec::new();
    };
    let graph = Iri::new(ldp::PREFER_MEMBERSHIP);

    children
        .iter()
        .flat_map(|child| member_terms(container, child))
        .map(|member| Quad::new(graph.clone(), target.clone(), relation.clone(), member))
        .collect()
}

fn member_terms(container: &Resource, child: &Resource) -> Vec<Term> {
    match (container.interaction_model, &container.inserted_content_relation) {
        (InteractionModel::IndirectContainer, Some(inserted)) if inserted.as_str() != ldp::MEMBER_SUBJECT => {
            child
                .graph(trellis::PREFER_USER_MANAGED)
                .iter()
                .filter(|t| &t.predicate == inserted && t.subject == Term::Iri(child.identifier.clone()))
                .map(|t| t.object.clone())
                .collect()
        }
        _ => vec![Term::Iri(child.identifier.clone())],
    }
}

/// The `isMemberOfRelation` triple a Direct container adds to its child.
pub(crate) fn member_of(child: &Iri, parent: &Resource) -> Option<Quad> {
    if parent.interaction_model != InteractionModel::DirectContainer {
        return None;
    }
    let relation = parent.member_of_relation.as_ref()?;
    let target = parent.membership_resource.as_ref()?;
    Some(Quad::new(
        Iri::new(ldp::PREFER_MEMBERSHIP),
        child.clone(),
        relation.clone(),
        target.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metadata;
    use crate::rdf::{Dataset, Triple};

    fn resource(id: &str, model: InteractionModel) -> Resource {
        let metadata = Metadata::builder()
            .identifier(Iri::new(id))
            .interaction_model(model)
            .build();
        Resource::from_metadata(&metadata, Dataset::new(), Utc::now())
    }

    #[test]
    fn server_managed_includes_type() {
        let r = resource("trellis:data/r", InteractionModel::RdfSource);
        let quads = server_managed(&r);
        assert!(quads.iter().any(|q| q.predicate == rdf::TYPE
            && q.object == Term::iri(ldp::RDF_SOURCE)));
    }

    #[test]
    fn direct_container_membership() {
        let mut container = resource("trellis:data/c", InteractionModel::DirectContainer);
        container.membership_resource = Some(Iri::new("trellis:data/m"));
        container.member_relation = Some(Iri::new("http://example.org/member"));
        let child = resource("trellis:data/c/1", InteractionModel::RdfSource);

        let quads = membership(&container, std::slice::from_ref(&child));
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].subject, Term::iri("trellis:data/m"));
        assert_eq!(quads[0].object, Term::iri("trellis:data/c/1"));
    }

    #[test]
    fn indirect_container_uses_inserted_content() {
        let mut container = resource("trellis:data/c", InteractionModel::IndirectContainer);
        container.membership_resource = Some(Iri::new("trellis:data/c"));
        container.member_relation = Some(Iri::new("http://example.org/member"));
        container.inserted_content_relation = Some(Iri::new("http://xmlns.com/foaf/0.1/primaryTopic"));

        let mut child = resource("trellis:data/c/1", InteractionModel::RdfSource);
        child.quads.add(
            Triple::new(
                Iri::new("trellis:data/c/1"),
                Iri::new("http://xmlns.com/foaf/0.1/primaryTopic"),
                Iri::new("trellis:data/c/1#it"),
            )
            .in_graph(Iri::new(trellis::PREFER_USER_MANAGED)),
        );

        let quads = membership(&container, &[child]);
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].object, Term::iri("trellis:data/c/1#it"));
    }
}
