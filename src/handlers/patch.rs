use bytes::Bytes;
use tracing::info;

use super::mutating::{AuditKind, MutatingLdpHandler, inbox_of, membership_settings, metadata_of};
use super::response::ResponseBuilder;
use crate::api::LdpError;
use crate::api::request::TrellisRequest;
use crate::model::{InteractionModel, ResourceLookup};
use crate::rdf::vocab::{activity_streams as as_, trellis};
use crate::rdf::{Dataset, Graph, Iri};
use crate::services::ServiceBundler;
use crate::services::io::APPLICATION_SPARQL_UPDATE;

/// PATCH with a SPARQL update against the user graph, or the ACL graph with `ext=acl`.
pub struct PatchHandler<'a> {
    inner: MutatingLdpHandler<'a>,
}

impl<'a> PatchHandler<'a> {
    pub fn new(request: &'a TrellisRequest, services: &'a ServiceBundler) -> Self {
        Self {
            inner: MutatingLdpHandler::new(request, services),
        }
    }

    pub fn initialize(&mut self, lookup: ResourceLookup) -> Result<(), LdpError> {
        let base = &mut self.inner.base;
        let content_type = base.request.content_type();
        if content_type.as_deref() != Some(APPLICATION_SPARQL_UPDATE) {
            return Err(LdpError::UnsupportedMediaType(content_type.unwrap_or_default()));
        }

        let model = base.initialize(None, lookup, InteractionModel::Resource)?.interaction_model;
        if model.is_binary() && !base.request.is_description() && !base.request.is_acl() {
            return Err(LdpError::BadRequest(
                "binary content cannot be patched; use ext=description".to_string(),
            ));
        }
        let resource = base.require_resource()?;
        base.check_cache(resource.modified, &base.etag(resource, false))
    }

    fn target_graph(&self) -> &'static str {
        if self.inner.base.request.is_acl() {
            trellis::PREFER_ACCESS_CONTROL
        } else {
            trellis::PREFER_USER_MANAGED
        }
    }

    pub async fn update_resource(&self, body: Bytes) -> Result<ResponseBuilder, LdpError> {
        let base = &self.inner.base;
        let resource = base.require_resource()?;
        let update = std::str::from_utf8(&body)
            .map_err(|_| LdpError::BadRequest("update is not valid UTF-8".to_string()))?;
        let target = self.target_graph();

        let mut graph: Graph = base
            .external_triples(resource.stream().filter(|q| q.graph == target))
            .into_iter()
            .collect();
        base.services.io.update(&mut graph, update, &base.identifier())?;
        let graph = base.internal_graph(&graph);

        let mut metadata = metadata_of(resource);
        let mut inbox = None;
        if target == trellis::PREFER_USER_MANAGED {
            self.inner.check_constraints(resource.interaction_model, &graph)?;
            let settings = membership_settings(&resource.identifier, &graph);
            metadata.membership_resource = settings.membership_resource;
            metadata.member_relation = settings.member_relation;
            metadata.member_of_relation = settings.member_of_relation;
            metadata.inserted_content_relation = settings.inserted_content_relation;
            inbox = inbox_of(&graph);
        }

        let mut mutable: Dataset = resource
            .stream()
            .filter(|q| q.graph != target && is_mutable_graph(q.graph.as_str()))
            .cloned()
            .collect();
        mutable.extend(graph.into_quads(&Iri::new(target)));

        let immutable = self.inner.audit_quads(AuditKind::Update, &resource.identifier);
        self.inner.replace(metadata, mutable, immutable).await?;
        info!(identifier = %resource.identifier, graph = target, "Patched resource");

        self.inner
            .emit_event(&resource.identifier, as_::UPDATE, resource.interaction_model, inbox)
            .await;
        self.inner.snapshot(&resource.identifier).await;

        let builder = ResponseBuilder::no_content();
        Ok(base.type_links(builder, resource.interaction_model))
    }
}

/// Graphs a client may write. Server-managed and audit quads are regenerated by the store.
fn is_mutable_graph(graph: &str) -> bool {
    graph == trellis::PREFER_USER_MANAGED || graph == trellis::PREFER_ACCESS_CONTROL
}

pub async fn handle(request: &TrellisRequest, services: &ServiceBundler, body: Bytes) -> Result<ResponseBuilder, LdpError> {
    let lookup = services.resources.get(&request.internal_id()).await?;
    let mut handler = PatchHandler::new(request, services);
    handler.initialize(lookup)?;
    handler.update_resource(body).await
}
