use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

use super::models::ErrorResponse;
use crate::rdf::{Iri, ntriples::IoError, vocab::ldp, vocab::trellis};
use crate::services::{BinaryError, ResourceError, memento::http_date};

#[derive(Debug, Error)]
pub enum LdpError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("resource is gone: {0}")]
    Gone(String),
    #[error("unsupported interaction model: {0}")]
    UnsupportedInteractionModel(String),
    #[error("not modified")]
    NotModified { etag: String, modified: DateTime<Utc> },
    #[error("precondition failed")]
    PreconditionFailed,
    #[error("constraint violation: {message}")]
    Conflict {
        constraint: Option<Iri>,
        message: String,
    },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("method not allowed")]
    MethodNotAllowed { allow: Vec<&'static str> },
    #[error("no acceptable representation")]
    NotAcceptable,
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("range not satisfiable")]
    RangeNotSatisfiable { size: u64 },
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("backend failure: {0}")]
    Backend(String),
}

impl LdpError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LdpError::NotFound(_) => StatusCode::NOT_FOUND,
            LdpError::Gone(_) => StatusCode::GONE,
            LdpError::UnsupportedInteractionModel(_) => StatusCode::BAD_REQUEST,
            LdpError::NotModified { .. } => StatusCode::NOT_MODIFIED,
            LdpError::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            LdpError::Conflict { .. } => StatusCode::CONFLICT,
            LdpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            LdpError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            LdpError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            LdpError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            LdpError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            LdpError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            LdpError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LdpError::NotFound(_) => "NOT_FOUND",
            LdpError::Gone(_) => "GONE",
            LdpError::UnsupportedInteractionModel(_) => "UNSUPPORTED_INTERACTION_MODEL",
            LdpError::NotModified { .. } => "NOT_MODIFIED",
            LdpError::PreconditionFailed => "PRECONDITION_FAILED",
            LdpError::Conflict { .. } => "CONSTRAINT_VIOLATION",
            LdpError::BadRequest(_) => "BAD_REQUEST",
            LdpError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            LdpError::NotAcceptable => "NOT_ACCEPTABLE",
            LdpError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            LdpError::RangeNotSatisfiable { .. } => "RANGE_NOT_SATISFIABLE",
            LdpError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            LdpError::Backend(_) => "INTERNAL_ERROR",
        }
    }

    /// The `constrainedBy` target attached to the response, if any.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            LdpError::UnsupportedInteractionModel(_) => Some(trellis::UNSUPPORTED_INTERACTION_MODEL),
            LdpError::Conflict {
                constraint: Some(c),
                ..
            } => Some(c.as_str()),
            _ => None,
        }
    }

    pub fn violation(constraint: &Iri, message: impl Into<String>) -> Self {
        LdpError::Conflict {
            constraint: Some(constraint.clone()),
            message: message.into(),
        }
    }
}

impl IntoResponse for LdpError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let LdpError::NotModified { etag, modified } = &self {
            let mut response = status.into_response();
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(etag) {
                headers.insert(header::ETAG, value);
            }
            if let Ok(value) = HeaderValue::from_str(&http_date(*modified)) {
                headers.insert(header::LAST_MODIFIED, value);
            }
            return response;
        }

        let link = self
            .constraint()
            .map(|c| format!("<{c}>; rel=\"{}\"", ldp::CONSTRAINED_BY));
        let allow = match &self {
            LdpError::MethodNotAllowed { allow } => Some(allow.join(",")),
            _ => None,
        };
        let content_range = match &self {
            LdpError::RangeNotSatisfiable { size } => Some(format!("bytes */{size}")),
            _ => None,
        };

        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };
        let mut response = (status, Json(json!(body))).into_response();
        let headers = response.headers_mut();
        for (name, value) in [
            (header::LINK, link),
            (header::ALLOW, allow),
            (header::CONTENT_RANGE, content_range),
        ] {
            if let Some(value) = value.and_then(|v| HeaderValue::from_str(&v).ok()) {
                headers.insert(name, value);
            }
        }
        response
    }
}

impl From<ResourceError> for LdpError {
    fn from(value: ResourceError) -> Self {
        match value {
            ResourceError::NotFound(id) => LdpError::NotFound(id.into_string()),
            ResourceError::UnsupportedInteractionModel(model) => {
                LdpError::UnsupportedInteractionModel(model.to_string())
            }
            ResourceError::Backend(message) => LdpError::Backend(message),
        }
    }
}

impl From<BinaryError> for LdpError {
    fn from(value: BinaryError) -> Self {
        match value {
            BinaryError::RangeNotSatisfiable { size, .. } => LdpError::RangeNotSatisfiable { size },
            other => LdpError::Backend(other.to_string()),
        }
    }
}

impl From<IoError> for LdpError {
    fn from(value: IoError) -> Self {
        match value {
            IoError::UnsupportedUpdate(_) => LdpError::BadRequest(value.to_string()),
            other => LdpError::BadRequest(format!("unreadable RDF: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(LdpError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(LdpError::Gone("x".into()).status_code(), StatusCode::GONE);
        assert_eq!(
            LdpError::UnsupportedInteractionModel("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(LdpError::PreconditionFailed.status_code(), StatusCode::PRECONDITION_FAILED);
    }

    #[test]
    fn test_unsupported_model_links_constraint() {
        let response = LdpError::UnsupportedInteractionModel("ldp:Foo".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let link = response.headers().get(header::LINK).unwrap().to_str().unwrap();
        assert!(link.contains(trellis::UNSUPPORTED_INTERACTION_MODEL));
        assert!(link.contains(ldp::CONSTRAINED_BY));
    }

    #[test]
    fn test_not_modified_has_no_body_headers() {
        let response = LdpError::NotModified {
            etag: "W/\"abc\"".into(),
            modified: Utc::now(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers().get(header::ETAG).unwrap(), "W/\"abc\"");
        assert!(response.headers().get(header::LAST_MODIFIED).is_some());
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let response = LdpError::MethodNotAllowed {
            allow: vec!["GET", "HEAD", "OPTIONS"],
        }
        .into_response();
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET,HEAD,OPTIONS");
    }
}
