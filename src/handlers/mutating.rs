//! Composite write steps: audit datasets, paired persistence calls, memento
//! snapshots, constraint checks and event emission.

use bytes::Bytes;
use tracing::{debug, error, warn};

use super::base::BaseLdpHandler;
use crate::api::LdpError;
use crate::api::request::TrellisRequest;
use crate::model::{BinaryMetadata, InteractionModel, Metadata, Resource, ResourceLookup};
use crate::rdf::vocab::{ldp, prov};
use crate::rdf::{Dataset, Graph, Iri, Term, ntriples};
use crate::services::resource::map_quad;
use crate::services::{Event, RdfSyntax, ServiceBundler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    Creation,
    Update,
    Deletion,
}

pub struct MutatingLdpHandler<'a> {
    pub base: BaseLdpHandler<'a>,
}

impl<'a> MutatingLdpHandler<'a> {
    pub fn new(request: &'a TrellisRequest, services: &'a ServiceBundler) -> Self {
        Self {
            base: BaseLdpHandler::new(request, services),
        }
    }

    fn services(&self) -> &'a ServiceBundler {
        self.base.services
    }

    /// Audit quads for `subject`, skolemized for persistence.
    pub fn audit_quads(&self, kind: AuditKind, subject: &Iri) -> Dataset {
        let audit = &self.services().audit;
        let session = self.base.session();
        let quads = match kind {
            AuditKind::Creation => audit.creation(subject, session),
            AuditKind::Update => audit.update(subject, session),
            AuditKind::Deletion => audit.deletion(subject, session),
        };
        let resources = &self.services().resources;
        quads
            .iter()
            .map(|q| map_quad(q, |t| resources.skolemize(t)))
            .collect()
    }

    /// Persist a new resource together with its creation audit.
    pub async fn create(&self, metadata: Metadata, mutable: Dataset, immutable: Dataset) -> Result<(), LdpError> {
        let resources = &self.services().resources;
        let identifier = metadata.identifier.clone();
        tokio::try_join!(
            resources.create(metadata, mutable),
            resources.add(&identifier, immutable)
        )?;
        Ok(())
    }

    /// Replace a resource's content and append an audit record.
    pub async fn replace(&self, metadata: Metadata, mutable: Dataset, immutable: Dataset) -> Result<(), LdpError> {
        let resources = &self.services().resources;
        let identifier = metadata.identifier.clone();
        tokio::try_join!(
            resources.replace(metadata, mutable),
            resources.add(&identifier, immutable)
        )?;
        Ok(())
    }

    /// Remove a resource. Both calls must succeed before the delete counts.
    pub async fn delete(&self, metadata: Metadata, immutable: Dataset) -> Result<(), LdpError> {
        let resources = &self.services().resources;
        let identifier = metadata.identifier.clone();
        tokio::try_join!(
            resources.delete(metadata),
            resources.add(&identifier, immutable)
        )?;
        Ok(())
    }

    /// Record the current state of `identifier` as a memento. Failures are logged.
    pub async fn snapshot(&self, identifier: &Iri) {
        let services = self.services();
        match services.resources.get(identifier).await {
            Ok(ResourceLookup::Found(resource)) => {
                if let Err(err) = services.mementos.put(&resource).await {
                    warn!(identifier = %identifier, error = %err, "Failed to store memento");
                }
            }
            Ok(_) => debug!(identifier = %identifier, "No resource to snapshot"),
            Err(err) => warn!(identifier = %identifier, error = %err, "Failed to load resource for memento"),
        }
    }

    /// Reject `graph` (internal form) if any constraint service objects to it.
    pub fn check_constraints(&self, model: InteractionModel, graph: &Graph) -> Result<(), LdpError> {
        for service in &self.services().constraints {
            if let Some(violation) = service.constrained_by(model, graph).next() {
                let triples = violation
                    .triples
                    .iter()
                    .map(|t| ntriples::write([t]).trim_end().to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(constraint = %violation.constraint, "Constraint violation");
                return Err(LdpError::violation(
                    &violation.constraint,
                    format!("{} violated by: {triples}", violation.constraint),
                ));
            }
        }
        Ok(())
    }

    /// Parse an RDF request body. An empty body is an empty graph.
    pub fn read_graph(&self, body: &[u8], base_iri: &str) -> Result<Graph, LdpError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Graph::new());
        }
        let content_type = self.base.request.content_type();
        let syntax = content_type
            .as_deref()
            .and_then(RdfSyntax::from_media_type)
            .ok_or_else(|| LdpError::UnsupportedMediaType(content_type.clone().unwrap_or_default()))?;
        Ok(self.services().io.read(body, syntax, base_iri)?)
    }

    /// Whether the request body is in an RDF syntax the server reads.
    pub fn has_rdf_body(&self) -> bool {
        self.base
            .request
            .content_type()
            .as_deref()
            .and_then(RdfSyntax::from_media_type)
            .is_some()
    }

    /// The interaction model to write: the `Link rel="type"` if given, else
    /// `existing`, else chosen by whether the body is RDF.
    pub fn requested_model(&self, existing: Option<InteractionModel>) -> Result<InteractionModel, LdpError> {
        let model = match self.base.request.link_type()? {
            Some(model) if model != InteractionModel::Resource => model,
            _ => match existing {
                Some(existing) if existing.is_binary() != self.has_rdf_body() => existing,
                _ if self.has_rdf_body() => InteractionModel::RdfSource,
                _ => InteractionModel::NonRdfSource,
            },
        };
        if !self.services().resources.supported_interaction_models().contains(&model) {
            return Err(LdpError::UnsupportedInteractionModel(model.iri().to_string()));
        }
        Ok(model)
    }

    /// Stage a non-RDF body with the binary service before the metadata commit.
    pub async fn stage_binary(&self, body: Bytes) -> Result<BinaryMetadata, LdpError> {
        let binaries = &self.services().binaries;
        let identifier = binaries.generate_identifier();
        let size = binaries.set_content(&identifier, body).await?;
        debug!(binary = %identifier, size, "Staged binary content");
        Ok(BinaryMetadata::builder()
            .identifier(identifier)
            .mime_type(
                self.base
                    .request
                    .content_type()
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            )
            .size(size)
            .build())
    }

    /// Submit an activity-stream event. Delivery failures never fail the request.
    pub async fn emit_event(&self, target: &Iri, activity: &str, model: InteractionModel, inbox: Option<Iri>) {
        let external = self.base.external_term(&Term::Iri(target.clone()));
        let target = external.as_iri().cloned().unwrap_or_else(|| target.clone());
        let event = Event::builder()
            .agents(vec![self.base.session().agent.clone()])
            .target(target)
            .types(vec![Iri::new(prov::ACTIVITY), Iri::new(activity)])
            .target_types(model.ldp_types().into_iter().map(|m| Iri::new(m.iri())).collect())
            .maybe_inbox(inbox)
            .build();

        if let Err(err) = self.services().events.emit(&event).await {
            error!(event = %event.identifier, error = %err, "Failed to emit event");
        }
    }
}

/// The descriptor to hand back to the resource service for an existing resource.
pub fn metadata_of(resource: &Resource) -> Metadata {
    Metadata::builder()
        .identifier(resource.identifier.clone())
        .interaction_model(resource.interaction_model)
        .maybe_container(resource.container.clone())
        .maybe_binary(resource.binary.clone())
        .maybe_membership_resource(resource.membership_resource.clone())
        .maybe_member_relation(resource.member_relation.clone())
        .maybe_member_of_relation(resource.member_of_relation.clone())
        .maybe_inserted_content_relation(resource.inserted_content_relation.clone())
        .build()
}

/// The `ldp:inbox` advertised in a resource's user content, if any.
pub fn inbox_of(graph: &Graph) -> Option<Iri> {
    graph
        .iter()
        .find(|t| t.predicate == ldp::INBOX)
        .and_then(|t| t.object.as_iri().cloned())
}

/// Membership settings carried in the user graph of a Direct/Indirect container.
pub fn membership_settings(subject: &Iri, graph: &Graph) -> MembershipSettings {
    let object = |predicate: &str| {
        graph
            .iter()
            .filter(|t| t.subject.as_iri() == Some(subject))
            .find(|t| t.predicate == predicate)
            .and_then(|t| t.object.as_iri().cloned())
    };
    MembershipSettings {
        membership_resource: object(ldp::MEMBERSHIP_RESOURCE),
        member_relation: object(ldp::HAS_MEMBER_RELATION),
        member_of_relation: object(ldp::IS_MEMBER_OF_RELATION),
        inserted_content_relation: object(ldp::INSERTED_CONTENT_RELATION),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSettings {
    pub membership_resource: Option<Iri>,
    pub member_relation: Option<Iri>,
    pub member_of_relation: Option<Iri>,
    pub inserted_content_relation: Option<Iri>,
}
