//! Steps shared by every verb handler: resource resolution, interaction-model
//! checks, conditional requests, identifier translation and the common
//! response headers.

use std::fmt;

use axum::http::{Method, header};
use chrono::{DateTime, SubsecRound, Utc};
use tracing::debug;

use super::response::ResponseBuilder;
use crate::api::LdpError;
use crate::api::headers::{ACCEPT_PATCH, ACCEPT_POST};
use crate::api::request::TrellisRequest;
use crate::model::{InteractionModel, Resource, ResourceLookup, Session};
use crate::rdf::{Graph, Iri, Quad, Term, Triple};
use crate::services::ServiceBundler;
use crate::services::io::{APPLICATION_N_TRIPLES, APPLICATION_SPARQL_UPDATE, TEXT_TURTLE};
use crate::services::resource::map_quad;

/// An HTTP entity tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag {
    value: String,
    weak: bool,
}

impl EntityTag {
    pub fn strong(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            weak: false,
        }
    }

    pub fn weak(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            weak: true,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether any tag in an `If-Match`/`If-None-Match` list has the same
    /// opaque value, weak or not.
    fn matches_any(&self, header: &str) -> bool {
        header.split(',').map(str::trim).any(|candidate| {
            if candidate == "*" {
                return true;
            }
            let opaque = candidate.strip_prefix("W/").unwrap_or(candidate);
            opaque.trim_matches('"') == self.value
        })
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            write!(f, "W/\"{}\"", self.value)
        } else {
            write!(f, "\"{}\"", self.value)
        }
    }
}

fn http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Methods allowed on a resource of `model`.
pub fn allowed_methods(model: InteractionModel) -> Vec<&'static str> {
    let mut methods = vec!["GET", "HEAD", "OPTIONS", "PUT", "DELETE"];
    if !model.is_binary() {
        methods.push("PATCH");
    }
    if model.is_container() {
        methods.push("POST");
    }
    methods
}

pub const READ_ONLY_METHODS: [&str; 3] = ["GET", "HEAD", "OPTIONS"];

pub struct BaseLdpHandler<'a> {
    pub request: &'a TrellisRequest,
    pub services: &'a ServiceBundler,
    resource: Option<Resource>,
    parent: Option<Resource>,
}

impl<'a> BaseLdpHandler<'a> {
    pub fn new(request: &'a TrellisRequest, services: &'a ServiceBundler) -> Self {
        Self {
            request,
            services,
            resource: None,
            parent: None,
        }
    }

    /// The external identifier, with the ACL marker for `ext=acl` requests.
    pub fn identifier(&self) -> String {
        if self.request.is_acl() {
            format!("{}?ext=acl", self.request.external_id())
        } else {
            self.request.external_id()
        }
    }

    pub fn internal_id(&self) -> Iri {
        self.request.internal_id()
    }

    pub fn base_url(&self) -> &str {
        &self.request.base_url
    }

    pub fn session(&self) -> &Session {
        &self.request.session
    }

    pub fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }

    pub fn parent(&self) -> Option<&Resource> {
        self.parent.as_ref()
    }

    /// Record the parent when the target itself does not exist yet.
    pub fn set_parent(&mut self, parent: Option<Resource>) {
        self.parent = parent;
    }

    pub fn require_resource(&self) -> Result<&Resource, LdpError> {
        self.resource
            .as_ref()
            .ok_or_else(|| LdpError::NotFound(self.identifier()))
    }

    /// Resolve the target: missing is 404, deleted is 410, and the resource
    /// must be a `required` and be backed by a supported model.
    pub fn initialize(
        &mut self,
        parent: Option<Resource>,
        lookup: ResourceLookup,
        required: InteractionModel,
    ) -> Result<&Resource, LdpError> {
        let resource = match lookup {
            ResourceLookup::Missing => return Err(LdpError::NotFound(self.identifier())),
            ResourceLookup::Deleted => return Err(LdpError::Gone(self.identifier())),
            ResourceLookup::Found(resource) => resource,
        };

        let supported = self.services.resources.supported_interaction_models();
        if !supported.contains(&required)
            || !supported.contains(&resource.interaction_model)
            || !resource.interaction_model.is_a(required)
        {
            return Err(LdpError::UnsupportedInteractionModel(required.iri().to_string()));
        }

        debug!(
            identifier = %resource.identifier,
            model = %resource.interaction_model,
            "Resolved resource"
        );
        self.parent = parent;
        Ok(self.resource.insert(resource))
    }

    pub fn etag(&self, resource: &Resource, weak: bool) -> EntityTag {
        let value = self.services.etags.etag(resource);
        if weak {
            EntityTag::weak(value)
        } else {
            EntityTag::strong(value)
        }
    }

    /// Evaluate the conditional request headers against the current state.
    pub fn check_cache(&self, modified: DateTime<Utc>, etag: &EntityTag) -> Result<(), LdpError> {
        let request = self.request;
        let safe = request.method == Method::GET || request.method == Method::HEAD;
        let modified = modified.trunc_subsecs(0);

        if let Some(if_match) = request.header(header::IF_MATCH) {
            if !etag.matches_any(if_match) {
                return Err(LdpError::PreconditionFailed);
            }
        } else if let Some(since) = request.header(header::IF_UNMODIFIED_SINCE).and_then(http_date) {
            if modified > since {
                return Err(LdpError::PreconditionFailed);
            }
        }

        let not_modified = || LdpError::NotModified {
            etag: etag.to_string(),
            modified,
        };
        if let Some(if_none_match) = request.header(header::IF_NONE_MATCH) {
            if etag.matches_any(if_none_match) {
                return Err(if safe { not_modified() } else { LdpError::PreconditionFailed });
            }
        } else if safe {
            if let Some(since) = request.header(header::IF_MODIFIED_SINCE).and_then(http_date) {
                if modified <= since {
                    return Err(not_modified());
                }
            }
        }
        Ok(())
    }

    /// `Link rel="type"` for every model in the closure of `model`.
    pub fn type_links(&self, builder: ResponseBuilder, model: InteractionModel) -> ResponseBuilder {
        model
            .ldp_types()
            .into_iter()
            .fold(builder, |b, m| b.link(m.iri(), "type"))
    }

    /// `Allow`, `Accept-Post` and `Accept-Patch` for `model`.
    pub fn allow_headers(&self, builder: ResponseBuilder, model: InteractionModel) -> ResponseBuilder {
        let mut builder = builder.header(header::ALLOW, allowed_methods(model).join(","));
        if model.is_container() {
            builder = builder.header(
                header::HeaderName::from_static(ACCEPT_POST),
                format!("{TEXT_TURTLE},{APPLICATION_N_TRIPLES},*/*"),
            );
        }
        if !model.is_binary() || self.request.is_description() {
            builder = builder.header(
                header::HeaderName::from_static(ACCEPT_PATCH),
                APPLICATION_SPARQL_UPDATE,
            );
        }
        builder
    }

    /// Translate an external term onto internal identifiers, skolemizing blank nodes.
    pub fn internal_term(&self, term: &Term) -> Term {
        let resources = &self.services.resources;
        resources.skolemize(&resources.to_internal(term, self.base_url()))
    }

    pub fn external_term(&self, term: &Term) -> Term {
        let resources = &self.services.resources;
        resources.to_external(&resources.unskolemize(term), self.base_url())
    }

    /// Internal triples as shown to clients.
    pub fn external_triples<'q>(&self, quads: impl IntoIterator<Item = &'q Quad>) -> Vec<Triple> {
        quads
            .into_iter()
            .map(|q| map_quad(q, |term| self.external_term(term)).to_triple())
            .collect()
    }

    /// Internal form of an externally-addressed graph, for constraint checks.
    pub fn internal_graph(&self, graph: &Graph) -> Graph {
        graph
            .iter()
            .map(|t| {
                Triple::new(
                    self.internal_term(&t.subject),
                    t.predicate.clone(),
                    self.internal_term(&t.object),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_tag_display() {
        assert_eq!(EntityTag::strong("abc").to_string(), "\"abc\"");
        assert_eq!(EntityTag::weak("abc").to_string(), "W/\"abc\"");
    }

    #[test]
    fn test_entity_tag_comparison() {
        let strong = EntityTag::strong("abc");
        assert!(strong.matches_any("\"abc\""));
        assert!(strong.matches_any("\"x\", \"abc\""));
        assert!(strong.matches_any("*"));
        assert!(strong.matches_any("W/\"abc\""));
        assert!(!strong.matches_any("\"xyz\""));

        let weak = EntityTag::weak("abc");
        assert!(weak.matches_any("\"abc\""));
        assert!(weak.matches_any("W/\"abc\""));
        assert!(!weak.matches_any("W/\"abd\""));
    }

    #[test]
    fn test_allowed_methods() {
        assert!(allowed_methods(InteractionModel::BasicContainer).contains(&"POST"));
        assert!(!allowed_methods(InteractionModel::RdfSource).contains(&"POST"));
        assert!(!allowed_methods(InteractionModel::NonRdfSource).contains(&"PATCH"));
    }
}
