use axum::http::{StatusCode, header};
use bytes::Bytes;
use tracing::{debug, info};

use super::base::allowed_methods;
use super::mutating::{AuditKind, MutatingLdpHandler, inbox_of, membership_settings};
use super::response::ResponseBuilder;
use crate::api::LdpError;
use crate::api::request::TrellisRequest;
use crate::model::{InteractionModel, Metadata, ResourceLookup, TRELLIS_DATA_PREFIX};
use crate::rdf::vocab::{activity_streams as as_, trellis};
use crate::rdf::{Dataset, Iri};
use crate::services::ServiceBundler;

/// POST to a container, creating a child resource.
pub struct PostHandler<'a> {
    inner: MutatingLdpHandler<'a>,
}

impl<'a> PostHandler<'a> {
    pub fn new(request: &'a TrellisRequest, services: &'a ServiceBundler) -> Self {
        Self {
            inner: MutatingLdpHandler::new(request, services),
        }
    }

    /// The target must be a live container.
    pub fn initialize(&mut self, lookup: ResourceLookup) -> Result<(), LdpError> {
        let base = &mut self.inner.base;
        let container = base.initialize(None, lookup, InteractionModel::Resource)?;
        if !container.interaction_model.is_container() {
            return Err(LdpError::MethodNotAllowed {
                allow: allowed_methods(container.interaction_model),
            });
        }
        let container = base.require_resource()?;
        base.check_cache(container.modified, &base.etag(container, false))
    }

    /// Path of the new child, from the Slug when it names a free identifier.
    pub async fn child_path(&self) -> Result<String, LdpError> {
        let request = self.inner.base.request;
        let services = self.inner.base.services;
        let join = |segment: &str| {
            if request.path.is_empty() {
                segment.to_string()
            } else {
                format!("{}/{segment}", request.path)
            }
        };

        if let Some(slug) = request.slug() {
            let path = join(slug.as_str());
            let candidate = Iri::new(format!("{TRELLIS_DATA_PREFIX}{path}"));
            if services.resources.get(&candidate).await? == ResourceLookup::Missing {
                return Ok(path);
            }
            debug!(slug = slug.as_str(), "Slug already in use, generating identifier");
        }
        Ok(join(&services.resources.generate_identifier()))
    }

    pub async fn create_child(&self, path: String, body: Bytes) -> Result<ResponseBuilder, LdpError> {
        let base = &self.inner.base;
        let container = base.require_resource()?;
        let child = Iri::new(format!("{TRELLIS_DATA_PREFIX}{path}"));
        let location = format!("{}{path}", base.base_url());
        let model = self.inner.requested_model(None)?;

        let mut metadata = Metadata::builder()
            .identifier(child.clone())
            .interaction_model(model)
            .container(container.identifier.clone())
            .build();

        let mut mutable = Dataset::new();
        let mut inbox = None;
        if model.is_binary() {
            metadata.binary = Some(self.inner.stage_binary(body).await?);
        } else {
            let graph = base.internal_graph(&self.inner.read_graph(&body, &location)?);
            self.inner.check_constraints(model, &graph)?;
            let settings = membership_settings(&child, &graph);
            metadata.membership_resource = settings.membership_resource;
            metadata.member_relation = settings.member_relation;
            metadata.member_of_relation = settings.member_of_relation;
            metadata.inserted_content_relation = settings.inserted_content_relation;
            inbox = inbox_of(&graph);
            mutable.extend(graph.into_quads(&Iri::new(trellis::PREFER_USER_MANAGED)));
        }

        let immutable = self.inner.audit_quads(AuditKind::Creation, &child);
        self.inner.create(metadata, mutable, immutable).await?;
        info!(identifier = %child, model = %model, "Created resource");

        self.inner.emit_event(&child, as_::CREATE, model, inbox).await;
        self.inner
            .emit_event(&container.identifier, as_::UPDATE, container.interaction_model, None)
            .await;
        self.inner.snapshot(&child).await;
        self.inner.snapshot(&container.identifier).await;

        let builder = ResponseBuilder::new(StatusCode::CREATED).header(header::LOCATION, &location);
        Ok(base.type_links(builder, model))
    }
}

pub async fn handle(request: &TrellisRequest, services: &ServiceBundler, body: Bytes) -> Result<ResponseBuilder, LdpError> {
    let lookup = services.resources.get(&request.internal_id()).await?;
    let mut handler = PostHandler::new(request, services);
    handler.initialize(lookup)?;
    let path = handler.child_path().await?;
    handler.create_child(path, body).await
}
