use axum::{
    body::Body,
    extract::State,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http_body_util::{BodyExt, Limited};
use tracing::{debug, warn};

use super::error::LdpError;
use super::request::TrellisRequest;
use super::state::AppState;
use crate::handlers::{self, READ_ONLY_METHODS, Verb};

/// Entry point for every LDP route.
///
/// Validates the request against the read-only views (mementos and
/// TimeMaps), buffers the body within the configured limit and dispatches
/// to the verb handler.
pub async fn ldp_handler(State(state): State<AppState>, request: TrellisRequest, body: Body) -> Response {
    let verb = Verb::from_method(&request.method);
    let result = match verb {
        Some(verb) => serve(&state, verb, &request, body).await,
        None => Err(LdpError::MethodNotAllowed {
            allow: READ_ONLY_METHODS.to_vec(),
        }),
    };

    let mutating = verb.is_some_and(Verb::is_mutating);
    match result {
        Ok(builder) => {
            state.metrics.request_served(mutating);
            builder.into_response()
        }
        Err(err) => {
            state.metrics.request_failed();
            if err.status_code().is_server_error() {
                warn!(path = %request.path, error = %err, "Request failed");
            } else {
                debug!(path = %request.path, error = %err, "Request rejected");
            }
            err.into_response()
        }
    }
}

async fn serve(
    state: &AppState,
    verb: Verb,
    request: &TrellisRequest,
    body: Body,
) -> Result<handlers::ResponseBuilder, LdpError> {
    if request.version.is_some() && request.version().is_none() {
        return Err(LdpError::BadRequest(format!(
            "invalid version: {}",
            request.version.as_deref().unwrap_or_default()
        )));
    }
    if verb.is_mutating() && (request.version.is_some() || request.is_timemap()) {
        return Err(LdpError::MethodNotAllowed {
            allow: READ_ONLY_METHODS.to_vec(),
        });
    }

    let limit = usize::try_from(state.config.server.max_payload_bytes).unwrap_or(usize::MAX);
    let body = read_body(body, limit).await?;
    handlers::handle(verb, request, &state.services, body).await
}

/// Buffer the request body, rejecting it once it exceeds `limit` bytes.
///
/// Decompression is handled by `RequestDecompressionLayer` before this point.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, LdpError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.is::<http_body_util::LengthLimitError>() => Err(LdpError::PayloadTooLarge(limit)),
        Err(err) => Err(LdpError::BadRequest(format!("unreadable body: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let body = read_body(Body::from("hello"), 10).await.unwrap();
        assert_eq!(body, Bytes::from("hello"));
    }

    #[tokio::test]
    async fn test_read_body_over_limit() {
        let err = read_body(Body::from("hello world"), 4).await.unwrap_err();
        assert!(matches!(err, LdpError::PayloadTooLarge(4)));
    }
}
