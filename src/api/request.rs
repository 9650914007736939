//! `TrellisRequest`: the per-request value snapshot every handler works from.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, HeaderValue, Method, header, header::AsHeaderName, request::Parts};
use bon::Builder;
use percent_encoding::percent_decode_str;

use super::error::LdpError;
use super::headers::{self, AcceptDatetime, ByteRange, Link, Prefer, Slug, Version};
use super::state::AppState;
use crate::model::{InteractionModel, Session, TRELLIS_DATA_PREFIX};
use crate::rdf::Iri;
use crate::rdf::vocab::ldp;

pub const EXT_ACL: &str = "acl";
pub const EXT_TIMEMAP: &str = "timemap";
pub const EXT_DESCRIPTION: &str = "description";

/// Principal authenticated by an outer layer, placed in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

#[derive(Debug, Clone, Builder)]
pub struct TrellisRequest {
    pub method: Method,
    /// Path relative to the base URL, without leading or trailing `/`.
    #[builder(into, default)]
    pub path: String,
    #[builder(into, default = "http://localhost:8080/".to_string())]
    pub base_url: String,
    #[builder(into)]
    pub ext: Option<String>,
    /// Raw `version` query parameter.
    #[builder(into)]
    pub version: Option<String>,
    #[builder(default)]
    pub headers: HeaderMap,
    #[builder(default = Session::anonymous())]
    pub session: Session,
}

impl TrellisRequest {
    pub fn with_header(mut self, name: header::HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// External IRI of the target, without any `ext` marker.
    pub fn external_id(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }

    pub fn internal_id(&self) -> Iri {
        Iri::new(format!("{TRELLIS_DATA_PREFIX}{}", self.path))
    }

    pub fn is_acl(&self) -> bool {
        self.ext.as_deref() == Some(EXT_ACL)
    }

    pub fn is_timemap(&self) -> bool {
        self.ext.as_deref() == Some(EXT_TIMEMAP)
    }

    pub fn is_description(&self) -> bool {
        self.ext.as_deref() == Some(EXT_DESCRIPTION)
    }

    /// Lower-cased `type/subtype` of the body, parameters dropped.
    pub fn content_type(&self) -> Option<String> {
        let mime: mime::Mime = self.header(header::CONTENT_TYPE)?.parse().ok()?;
        Some(mime.essence_str().to_ascii_lowercase())
    }

    pub fn prefer(&self) -> Option<Prefer> {
        Prefer::parse(self.header(headers::PREFER))
    }

    pub fn range(&self) -> Option<ByteRange> {
        ByteRange::parse(self.header(header::RANGE))
    }

    pub fn slug(&self) -> Option<Slug> {
        Slug::parse(self.header(headers::SLUG))
    }

    pub fn accept_datetime(&self) -> Option<AcceptDatetime> {
        AcceptDatetime::parse(self.header(headers::ACCEPT_DATETIME))
    }

    pub fn version(&self) -> Option<Version> {
        Version::parse(self.version.as_deref())
    }

    pub fn links(&self) -> Vec<Link> {
        self.headers
            .get_all(header::LINK)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(Link::parse)
            .collect()
    }

    /// The interaction model requested with `Link: <...>; rel="type"`.
    ///
    /// `Ok(None)` when no LDP type link is present; an unknown LDP type is an error.
    pub fn link_type(&self) -> Result<Option<InteractionModel>, LdpError> {
        let Some(link) = self
            .links()
            .into_iter()
            .find(|l| l.has_rel("type") && l.uri.starts_with(ldp::NS))
        else {
            return Ok(None);
        };
        InteractionModel::from_iri(&link.uri)
            .map(Some)
            .ok_or(LdpError::UnsupportedInteractionModel(link.uri))
    }
}

impl FromRequestParts<AppState> for TrellisRequest {
    type Rejection = LdpError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let base_url = state
            .config
            .server
            .base_url
            .clone()
            .unwrap_or_else(|| base_url_from_headers(&parts.headers));

        let mut ext = None;
        let mut version = None;
        for (key, value) in parse_query(parts.uri.query()) {
            match key.as_str() {
                "ext" => ext = Some(value),
                "version" => version = Some(value),
                _ => {}
            }
        }

        Ok(TrellisRequest {
            method: parts.method.clone(),
            path: normalize_path(parts.uri.path()),
            base_url,
            ext,
            version,
            headers: parts.headers.clone(),
            session: parts
                .extensions
                .get::<Session>()
                .cloned()
                .unwrap_or_else(Session::anonymous),
        })
    }
}

fn base_url_from_headers(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .filter(|p| *p == "https")
        .unwrap_or("http");
    format!("{scheme}://{host}/")
}

pub(crate) fn normalize_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

pub(crate) fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let decode = |s: &str| percent_decode_str(&s.replace('+', " ")).decode_utf8_lossy().into_owned();
            (decode(key), decode(value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_normalization() {
        assert_eq!(normalize_path("/"), "");
        assert_eq!(normalize_path("/container/child/"), "container/child");
        assert_eq!(normalize_path("/resource"), "resource");
    }

    #[test]
    fn test_query_parsing() {
        let query = parse_query(Some("ext=acl&version=1496260729&flag"));
        assert_eq!(
            query,
            vec![
                ("ext".to_string(), "acl".to_string()),
                ("version".to_string(), "1496260729".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn test_identifiers() {
        let request = TrellisRequest::builder()
            .method(Method::GET)
            .path("a/b")
            .base_url("https://example.org/")
            .build();
        assert_eq!(request.external_id(), "https://example.org/a/b");
        assert_eq!(request.internal_id(), "trellis:data/a/b");
        assert!(!request.is_acl());
    }

    #[test]
    fn test_content_type_and_link_type() {
        let request = TrellisRequest::builder()
            .method(Method::POST)
            .build()
            .with_header(header::CONTENT_TYPE, "text/turtle; charset=UTF-8")
            .with_header(header::LINK, "<http://www.w3.org/ns/ldp#DirectContainer>; rel=\"type\"");

        assert_eq!(request.content_type().as_deref(), Some("text/turtle"));
        assert_eq!(request.link_type().unwrap(), Some(InteractionModel::DirectContainer));

        let request = request.with_header(header::LINK, "<http://www.w3.org/ns/ldp#Bogus>; rel=\"type\"");
        // First matching link wins.
        assert!(request.link_type().is_ok());

        let bogus = TrellisRequest::builder()
            .method(Method::PUT)
            .build()
            .with_header(header::LINK, "<http://www.w3.org/ns/ldp#Bogus>; rel=\"type\"");
        assert!(matches!(
            bogus.link_type(),
            Err(LdpError::UnsupportedInteractionModel(_))
        ));
    }

    #[test]
    fn test_malformed_headers_degrade_to_absent() {
        let request = TrellisRequest::builder()
            .method(Method::GET)
            .version("yesterday")
            .build()
            .with_header(header::RANGE, "bytes=z-")
            .with_header(header::HeaderName::from_static(headers::PREFER), "nonsense")
            .with_header(header::HeaderName::from_static(headers::ACCEPT_DATETIME), "soon");

        assert!(request.range().is_none());
        assert!(request.prefer().is_none());
        assert!(request.accept_datetime().is_none());
        assert!(request.version().is_none());
    }
}
