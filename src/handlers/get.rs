use axum::http::{HeaderName, StatusCode, header};
use tracing::debug;

use super::base::{BaseLdpHandler, READ_ONLY_METHODS};
use super::response::ResponseBuilder;
use crate::api::LdpError;
use crate::api::headers::{MEMENTO_DATETIME, PREFERENCE_APPLIED, PreferReturn};
use crate::api::request::TrellisRequest;
use crate::model::{InteractionModel, Resource, ResourceLookup};
use crate::rdf::Iri;
use crate::rdf::vocab::{ldp, trellis};
use crate::services::memento::{LINK_FORMAT, http_date, memento_time, select_memento};
use crate::services::{RdfSyntax, ServiceBundler};

const OCTET_STREAM: &str = "application/octet-stream";

/// Pick the RDF syntax for an `Accept` header. Absent means Turtle.
pub fn negotiate(accept: Option<&str>) -> Result<RdfSyntax, LdpError> {
    let Some(accept) = accept else {
        return Ok(RdfSyntax::Turtle);
    };

    let mut ranges: Vec<(f32, String)> = accept
        .split(',')
        .filter_map(|item| {
            let mut parts = item.split(';');
            let media = parts.next()?.trim().to_ascii_lowercase();
            let quality = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (!media.is_empty()).then_some((quality, media))
        })
        .collect();
    ranges.sort_by(|a, b| b.0.total_cmp(&a.0));

    for (quality, media) in ranges {
        if quality <= 0.0 {
            continue;
        }
        if media == "*/*" || media == "text/*" {
            return Ok(RdfSyntax::Turtle);
        }
        if media == "application/*" {
            return Ok(RdfSyntax::NTriples);
        }
        if let Some(syntax) = RdfSyntax::from_media_type(&media) {
            return Ok(syntax);
        }
    }
    Err(LdpError::NotAcceptable)
}

/// GET and HEAD on resources, ACLs, binary descriptions, mementos and TimeMaps.
pub struct GetHandler<'a> {
    base: BaseLdpHandler<'a>,
    head: bool,
    memento: bool,
}

impl<'a> GetHandler<'a> {
    pub fn new(request: &'a TrellisRequest, services: &'a ServiceBundler, head: bool) -> Self {
        Self {
            base: BaseLdpHandler::new(request, services),
            head,
            memento: false,
        }
    }

    fn serves_binary(&self, resource: &Resource) -> bool {
        let request = self.base.request;
        resource.interaction_model.is_binary() && !request.is_acl() && !request.is_description()
    }

    pub fn initialize(&mut self, lookup: ResourceLookup) -> Result<ResponseBuilder, LdpError> {
        self.base.initialize(None, lookup, InteractionModel::Resource)?;
        let resource = self.base.require_resource()?;

        if self.base.request.is_acl() && !resource.has_acl() {
            return Err(LdpError::NotFound(self.base.identifier()));
        }

        let etag = self.base.etag(resource, !self.serves_binary(resource));
        self.base.check_cache(resource.modified, &etag)?;

        Ok(ResponseBuilder::ok()
            .header(header::ETAG, etag.to_string())
            .header(header::LAST_MODIFIED, http_date(resource.modified)))
    }

    pub async fn get_representation(&self, builder: ResponseBuilder) -> Result<ResponseBuilder, LdpError> {
        let resource = self.base.require_resource()?;
        let request = self.base.request;
        let services = self.base.services;
        let external = request.external_id();

        let mut builder = self.base.type_links(builder, resource.interaction_model);
        let mementos = services.mementos.mementos(&resource.identifier).await?;
        for link in services.timemaps.links(&external, &mementos) {
            builder = builder.header(header::LINK, link);
        }
        if !request.is_acl() {
            builder = builder.link(&format!("{external}?ext=acl"), "acl");
        }

        if self.memento {
            builder = builder
                .header(
                    HeaderName::from_static(MEMENTO_DATETIME),
                    http_date(memento_time(resource.modified)),
                )
                .header(header::ALLOW, READ_ONLY_METHODS.join(","));
        } else {
            builder = self
                .base
                .allow_headers(builder, resource.interaction_model)
                .header(header::VARY, "Accept-Datetime");
        }

        let builder = if self.serves_binary(resource) {
            self.binary_representation(resource, builder).await?
        } else {
            self.rdf_representation(resource, builder)?
        };
        Ok(if self.head { builder.without_body() } else { builder })
    }

    fn rdf_representation(&self, resource: &Resource, builder: ResponseBuilder) -> Result<ResponseBuilder, LdpError> {
        let request = self.base.request;
        let syntax = negotiate(request.header(header::ACCEPT))?;
        let mut builder = builder.header(header::VARY, "Accept, Prefer");

        if resource.interaction_model.is_binary() {
            let described = request.external_id();
            builder = builder.link(&described, "describes");
        }

        let prefer = request.prefer();
        if let Some(prefer) = &prefer {
            if prefer.preference == Some(PreferReturn::Minimal) {
                return Ok(builder
                    .with_status(StatusCode::NO_CONTENT)
                    .header(HeaderName::from_static(PREFERENCE_APPLIED), "return=minimal"));
            }
            builder = builder.header(HeaderName::from_static(PREFERENCE_APPLIED), "return=representation");
        }

        let defaults: &[&'static str] = if request.is_acl() {
            &[trellis::PREFER_ACCESS_CONTROL]
        } else {
            &[trellis::PREFER_USER_MANAGED, ldp::PREFER_CONTAINMENT, ldp::PREFER_MEMBERSHIP]
        };
        let graphs: Vec<Iri> = match &prefer {
            Some(prefer) => prefer.graphs(defaults).into_iter().map(Iri::new).collect(),
            None => defaults.iter().map(|g| Iri::new(*g)).collect(),
        };
        debug!(identifier = %resource.identifier, graphs = graphs.len(), "Rendering RDF");

        let triples = self.base.external_triples(resource.stream_graphs(&graphs));
        let body = self.base.services.io.write(&triples, syntax);
        Ok(builder.body(syntax.media_type(), body))
    }

    async fn binary_representation(&self, resource: &Resource, builder: ResponseBuilder) -> Result<ResponseBuilder, LdpError> {
        let binary = resource
            .binary
            .as_ref()
            .ok_or_else(|| LdpError::Backend(format!("{} has no binary content", resource.identifier)))?;
        let binaries = &self.base.services.binaries;
        let mime_type = binary.mime_type.as_deref().unwrap_or(OCTET_STREAM);
        let external = self.base.request.external_id();

        let builder = builder
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::VARY, "Range")
            .link(&format!("{external}?ext=description"), "describedby");

        if self.head {
            return Ok(builder.header(header::CONTENT_TYPE, mime_type));
        }

        match self.base.request.range() {
            Some(range) => {
                let size = match binary.size {
                    Some(size) => size,
                    None => binaries.size(&binary.identifier).await?,
                };
                let span = range
                    .resolve(size)
                    .ok_or(LdpError::RangeNotSatisfiable { size })?;
                let content = binaries.get_range(&binary.identifier, span.clone()).await?;
                Ok(builder
                    .with_status(StatusCode::PARTIAL_CONTENT)
                    .header(
                        header::CONTENT_RANGE,
                        format!("bytes {}-{}/{size}", span.start, span.end - 1),
                    )
                    .body(mime_type, content))
            }
            None => {
                let content = binaries.get(&binary.identifier).await?;
                Ok(builder.body(mime_type, content))
            }
        }
    }

    /// The `application/link-format` TimeMap of the target.
    pub async fn timemap(&mut self, lookup: ResourceLookup) -> Result<ResponseBuilder, LdpError> {
        self.base.initialize(None, lookup, InteractionModel::Resource)?;
        let resource = self.base.require_resource()?;
        let services = self.base.services;
        let external = self.base.request.external_id();

        let mementos = services.mementos.mementos(&resource.identifier).await?;
        let mut builder = ResponseBuilder::ok().header(header::ALLOW, READ_ONLY_METHODS.join(","));
        for link in services.timemaps.links(&external, &mementos) {
            builder = builder.header(header::LINK, link);
        }
        let builder = builder.body(LINK_FORMAT, services.timemaps.timemap(&external, &mementos));
        Ok(if self.head { builder.without_body() } else { builder })
    }
}

pub async fn handle(request: &TrellisRequest, services: &ServiceBundler, head: bool) -> Result<ResponseBuilder, LdpError> {
    let internal = request.internal_id();
    let mut handler = GetHandler::new(request, services, head);

    if let Some(version) = request.version() {
        let lookup = services.mementos.get(&internal, version.instant()).await?;
        handler.memento = true;
        let builder = handler.initialize(lookup)?;
        return handler.get_representation(builder).await;
    }

    let lookup = services.resources.get(&internal).await?;
    if request.is_timemap() {
        return handler.timemap(lookup).await;
    }

    if let (Some(accept), ResourceLookup::Found(_)) = (request.accept_datetime(), &lookup) {
        let mementos = services.mementos.mementos(&internal).await?;
        if let Some(time) = select_memento(&mementos, accept.instant()) {
            let external = request.external_id();
            let mut builder = ResponseBuilder::new(StatusCode::FOUND)
                .header(header::LOCATION, format!("{external}?version={}", time.timestamp()))
                .header(header::VARY, "Accept-Datetime");
            for link in services.timemaps.links(&external, &mementos) {
                builder = builder.header(header::LINK, link);
            }
            return Ok(builder);
        }
    }

    let builder = handler.initialize(lookup)?;
    handler.get_representation(builder).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_defaults_to_turtle() {
        assert_eq!(negotiate(None).unwrap(), RdfSyntax::Turtle);
        assert_eq!(negotiate(Some("*/*")).unwrap(), RdfSyntax::Turtle);
    }

    #[test]
    fn test_negotiate_quality() {
        assert_eq!(
            negotiate(Some("text/turtle;q=0.5, application/n-triples")).unwrap(),
            RdfSyntax::NTriples
        );
        assert_eq!(
            negotiate(Some("application/ld+json, text/turtle;q=0.1")).unwrap(),
            RdfSyntax::Turtle
        );
    }

    #[test]
    fn test_negotiate_rejects_unsupported() {
        assert!(matches!(
            negotiate(Some("application/ld+json")),
            Err(LdpError::NotAcceptable)
        ));
        assert!(matches!(
            negotiate(Some("text/turtle;q=0")),
            Err(LdpError::NotAcceptable)
        ));
    }
}
