use tracing::debug;

use super::mutating::{AuditKind, MutatingLdpHandler, metadata_of};
use super::response::ResponseBuilder;
use crate::api::LdpError;
use crate::api::request::TrellisRequest;
use crate::model::{InteractionModel, Resource, ResourceLookup};
use crate::rdf::Dataset;
use crate::rdf::vocab::{activity_streams as as_, trellis};
use crate::services::ServiceBundler;

/// DELETE on a resource, or on its ACL (`ext=acl`).
///
/// Removing an ACL keeps the resource: its user triples are written back
/// without the access-control graph and the change is audited as an update.
pub struct DeleteHandler<'a> {
    inner: MutatingLdpHandler<'a>,
}

impl<'a> DeleteHandler<'a> {
    pub fn new(request: &'a TrellisRequest, services: &'a ServiceBundler) -> Self {
        Self {
            inner: MutatingLdpHandler::new(request, services),
        }
    }

    /// Resolve the target and evaluate the conditional headers.
    ///
    /// Fails before any write for missing, deleted or precondition-failing targets.
    pub fn initialize(
        &mut self,
        parent: Option<Resource>,
        lookup: ResourceLookup,
    ) -> Result<ResponseBuilder, LdpError> {
        let base = &mut self.inner.base;
        base.initialize(parent, lookup, InteractionModel::Resource)?;
        let resource = base.require_resource()?;
        base.check_cache(resource.modified, &base.etag(resource, false))?;
        Ok(ResponseBuilder::no_content())
    }

    pub async fn delete_resource(&self, builder: ResponseBuilder) -> Result<ResponseBuilder, LdpError> {
        let resource = self.inner.base.require_resource()?;
        debug!(identifier = %self.inner.base.identifier(), "Deleting resource");

        if self.inner.base.request.is_acl() {
            self.delete_acl(resource).await?;
        } else {
            self.delete_full(resource).await?;
        }
        Ok(builder)
    }

    async fn delete_acl(&self, resource: &Resource) -> Result<(), LdpError> {
        let mutable: Dataset = resource
            .stream()
            .filter(|q| q.graph == trellis::PREFER_USER_MANAGED)
            .cloned()
            .collect();
        let immutable = self.inner.audit_quads(AuditKind::Update, &resource.identifier);

        self.inner
            .replace(metadata_of(resource), mutable, immutable)
            .await?;

        self.inner
            .emit_event(&resource.identifier, as_::UPDATE, resource.interaction_model, None)
            .await;
        self.inner.snapshot(&resource.identifier).await;
        Ok(())
    }

    async fn delete_full(&self, resource: &Resource) -> Result<(), LdpError> {
        let immutable = self.inner.audit_quads(AuditKind::Deletion, &resource.identifier);

        self.inner.delete(metadata_of(resource), immutable).await?;

        self.inner
            .emit_event(&resource.identifier, as_::DELETE, resource.interaction_model, None)
            .await;
        Ok(())
    }
}

pub async fn handle(request: &TrellisRequest, services: &ServiceBundler) -> Result<ResponseBuilder, LdpError> {
    let lookup = services.resources.get(&request.internal_id()).await?;
    let mut handler = DeleteHandler::new(request, services);
    let builder = handler.initialize(None, lookup)?;
    handler.delete_resource(builder).await
}
