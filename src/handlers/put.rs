use axum::http::{HeaderName, StatusCode, header};
use bytes::Bytes;
use tracing::info;

use super::get::negotiate;
use super::mutating::{AuditKind, MutatingLdpHandler, inbox_of, membership_settings, metadata_of};
use super::response::ResponseBuilder;
use crate::api::LdpError;
use crate::api::headers::{PREFERENCE_APPLIED, PreferReturn};
use crate::api::request::TrellisRequest;
use crate::model::{InteractionModel, Metadata, Resource, ResourceLookup, container_of};
use crate::rdf::vocab::{activity_streams as as_, trellis};
use crate::rdf::{Dataset, Graph, Iri};
use crate::services::ServiceBundler;

/// PUT: create or replace a resource, or replace its ACL with `ext=acl`.
pub struct PutHandler<'a> {
    inner: MutatingLdpHandler<'a>,
}

impl<'a> PutHandler<'a> {
    pub fn new(request: &'a TrellisRequest, services: &'a ServiceBundler) -> Self {
        Self {
            inner: MutatingLdpHandler::new(request, services),
        }
    }

    /// Existing targets go through the usual checks. A missing or deleted
    /// target is (re)created, which needs a live parent container.
    pub fn initialize(
        &mut self,
        parent: Option<ResourceLookup>,
        lookup: ResourceLookup,
    ) -> Result<(), LdpError> {
        let parent = parent.and_then(ResourceLookup::found);
        let base = &mut self.inner.base;

        if lookup.exists() || base.request.is_acl() {
            base.initialize(parent, lookup, InteractionModel::Resource)?;
            let resource = base.require_resource()?;
            return base.check_cache(resource.modified, &base.etag(resource, false));
        }

        if base.request.header(header::IF_MATCH).is_some() {
            return Err(LdpError::PreconditionFailed);
        }
        let has_container = container_of(&base.internal_id()).is_some();
        match &parent {
            Some(p) if p.interaction_model.is_container() => {}
            None if !has_container => {}
            _ => {
                return Err(LdpError::Conflict {
                    constraint: None,
                    message: format!("no parent container for {}", base.identifier()),
                });
            }
        }
        base.set_parent(parent);
        Ok(())
    }

    pub async fn set_resource(&self, body: Bytes) -> Result<ResponseBuilder, LdpError> {
        if self.inner.base.request.is_acl() {
            return self.set_acl(body).await;
        }

        let base = &self.inner.base;
        let existing = base.resource();
        let identifier = base.internal_id();
        let external = base.request.external_id();
        let model = self.inner.requested_model(existing.map(|r| r.interaction_model))?;

        if let Some(existing) = existing {
            if existing.interaction_model.is_binary() != model.is_binary() {
                return Err(LdpError::violation(
                    &Iri::new(trellis::INVALID_INTERACTION_MODEL),
                    format!("cannot change {} to {model}", existing.interaction_model),
                ));
            }
        }

        let mut metadata = Metadata::builder()
            .identifier(identifier.clone())
            .interaction_model(model)
            .maybe_container(match existing {
                Some(existing) => existing.container.clone(),
                None => base.parent().map(|p| p.identifier.clone()),
            })
            .build();

        // ACL triples survive a content replacement.
        let mut mutable: Dataset = preserved(existing, trellis::PREFER_ACCESS_CONTROL);
        let mut written = Graph::new();
        let mut inbox = None;
        if model.is_binary() {
            metadata.binary = Some(self.inner.stage_binary(body).await?);
            mutable.extend(preserved(existing, trellis::PREFER_USER_MANAGED));
        } else {
            let parsed = self.inner.read_graph(&body, &external)?;
            let graph = base.internal_graph(&parsed);
            self.inner.check_constraints(model, &graph)?;
            let settings = membership_settings(&identifier, &graph);
            metadata.membership_resource = settings.membership_resource;
            metadata.member_relation = settings.member_relation;
            metadata.member_of_relation = settings.member_of_relation;
            metadata.inserted_content_relation = settings.inserted_content_relation;
            inbox = inbox_of(&graph);
            mutable.extend(graph.into_quads(&Iri::new(trellis::PREFER_USER_MANAGED)));
            written = parsed;
        }

        let created = existing.is_none();
        if created {
            let immutable = self.inner.audit_quads(AuditKind::Creation, &identifier);
            self.inner.create(metadata, mutable, immutable).await?;
            info!(identifier = %identifier, model = %model, "Created resource");
        } else {
            let immutable = self.inner.audit_quads(AuditKind::Update, &identifier);
            self.inner.replace(metadata, mutable, immutable).await?;
            info!(identifier = %identifier, model = %model, "Replaced resource");
        }

        let activity = if created { as_::CREATE } else { as_::UPDATE };
        self.inner.emit_event(&identifier, activity, model, inbox).await;
        if let (true, Some(parent)) = (created, base.parent()) {
            self.inner
                .emit_event(&parent.identifier, as_::UPDATE, parent.interaction_model, None)
                .await;
            self.inner.snapshot(&parent.identifier).await;
        }
        self.inner.snapshot(&identifier).await;

        let builder = if created {
            ResponseBuilder::new(StatusCode::CREATED).header(header::LOCATION, &external)
        } else {
            ResponseBuilder::no_content()
        };
        let builder = base.type_links(builder, model);
        if model.is_binary() {
            return Ok(builder);
        }
        self.representation(builder, &written)
    }

    async fn set_acl(&self, body: Bytes) -> Result<ResponseBuilder, LdpError> {
        let base = &self.inner.base;
        let resource = base.require_resource()?;
        let parsed = self.inner.read_graph(&body, &base.identifier())?;
        let graph = base.internal_graph(&parsed);

        let mut mutable = preserved(Some(resource), trellis::PREFER_USER_MANAGED);
        mutable.extend(graph.into_quads(&Iri::new(trellis::PREFER_ACCESS_CONTROL)));
        let immutable = self.inner.audit_quads(AuditKind::Update, &resource.identifier);
        self.inner
            .replace(metadata_of(resource), mutable, immutable)
            .await?;
        info!(identifier = %resource.identifier, "Replaced access control");

        self.inner
            .emit_event(&resource.identifier, as_::UPDATE, resource.interaction_model, None)
            .await;
        self.inner.snapshot(&resource.identifier).await;
        self.representation(ResponseBuilder::no_content(), &parsed)
    }

    /// Echo the written graph for `Prefer: return=representation`.
    fn representation(&self, builder: ResponseBuilder, graph: &Graph) -> Result<ResponseBuilder, LdpError> {
        let request = self.inner.base.request;
        let wants_body = request
            .prefer()
            .is_some_and(|p| p.preference == Some(PreferReturn::Representation));
        if !wants_body {
            return Ok(builder);
        }

        let syntax = negotiate(request.header(header::ACCEPT))?;
        let triples: Vec<_> = graph.iter().cloned().collect();
        let body = self.inner.base.services.io.write(&triples, syntax);
        let status = if builder.status() == StatusCode::NO_CONTENT {
            StatusCode::OK
        } else {
            builder.status()
        };
        Ok(builder
            .with_status(status)
            .header(HeaderName::from_static(PREFERENCE_APPLIED), "return=representation")
            .body(syntax.media_type(), body))
    }
}

/// The quads of one named graph of an existing resource.
fn preserved(resource: Option<&Resource>, graph: &str) -> Dataset {
    resource
        .map(|r| r.stream().filter(|q| q.graph == graph).cloned().collect())
        .unwrap_or_default()
}

pub async fn handle(request: &TrellisRequest, services: &ServiceBundler, body: Bytes) -> Result<ResponseBuilder, LdpError> {
    let internal = request.internal_id();
    let lookup = services.resources.get(&internal).await?;
    let parent = match container_of(&internal) {
        Some(parent) => Some(services.resources.get(&parent).await?),
        None => None,
    };

    let mut handler = PutHandler::new(request, services);
    handler.initialize(parent, lookup)?;
    handler.set_resource(body).await
}
