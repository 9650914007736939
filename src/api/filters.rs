//! Request filters applied around every LDP route.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::headers::ON_BEHALF_OF;
use super::request::Principal;
use super::state::AppState;
use crate::config::{CacheConfig, CorsConfig};
use crate::model::Session;
use crate::rdf::vocab::trellis;

/// Attach a [`Session`] for the authenticated principal.
///
/// The principal comes from a [`Principal`] extension set by an outer layer,
/// else from the configured trusted header. Administrators may act for
/// another agent with `On-Behalf-Of`.
pub async fn agent_filter(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let principal = request
        .extensions()
        .get::<Principal>()
        .map(|p| p.0.clone())
        .or_else(|| {
            let name = state.config.auth.principal_header.as_deref()?;
            header_str(request.headers(), name).map(str::to_string)
        });

    let agents = &state.services.agents;
    let agent = agents.as_agent(principal.as_deref());
    let delegate = header_str(request.headers(), ON_BEHALF_OF).map(str::to_string);

    let session = match delegate {
        Some(delegate) if agent == trellis::ADMINISTRATOR_AGENT => {
            let on_behalf = agents.as_agent(Some(&delegate));
            debug!(agent = %agent, on_behalf = %on_behalf, "Delegated request");
            Session::new(on_behalf).with_delegate(agent)
        }
        Some(_) => {
            debug!(agent = %agent, "Ignoring On-Behalf-Of from non-administrator");
            Session::new(agent)
        }
        None => Session::new(agent),
    };

    request.extensions_mut().insert(session);
    next.run(request).await
}

/// Answer CORS preflights and decorate simple cross-origin responses.
pub async fn cors_filter(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let cors = &state.config.cors;
    if !cors.enabled {
        return next.run(request).await;
    }
    let Some(origin) = header_str(request.headers(), header::ORIGIN.as_str())
        .filter(|o| origin_allowed(cors, o))
        .map(str::to_string)
    else {
        return next.run(request).await;
    };

    let preflight_method = header_str(request.headers(), header::ACCESS_CONTROL_REQUEST_METHOD.as_str());
    if request.method() == Method::OPTIONS {
        if let Some(method) = preflight_method {
            if !cors.allow_methods.iter().any(|m| m.eq_ignore_ascii_case(method)) {
                debug!(%origin, method, "Rejected CORS preflight");
                return StatusCode::NO_CONTENT.into_response();
            }
            let mut response = StatusCode::NO_CONTENT.into_response();
            let headers = response.headers_mut();
            allow_origin(cors, headers, &origin);
            set(headers, header::ACCESS_CONTROL_ALLOW_METHODS, &cors.allow_methods.join(","));
            set(headers, header::ACCESS_CONTROL_ALLOW_HEADERS, &cors.allow_headers.join(","));
            set(headers, header::ACCESS_CONTROL_MAX_AGE, &cors.max_age.to_string());
            return response;
        }
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    allow_origin(cors, headers, &origin);
    if !cors.expose_headers.is_empty() {
        set(headers, header::ACCESS_CONTROL_EXPOSE_HEADERS, &cors.expose_headers.join(","));
    }
    response
}

/// Add `Cache-Control` to successful GET and HEAD responses.
pub async fn cache_control_filter(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let safe = request.method() == Method::GET || request.method() == Method::HEAD;
    let mut response = next.run(request).await;
    if safe && response.status().is_success() && !response.headers().contains_key(header::CACHE_CONTROL) {
        let value = cache_control(&state.config.cache);
        set(response.headers_mut(), header::CACHE_CONTROL, &value);
    }
    response
}

fn cache_control(cache: &CacheConfig) -> String {
    if cache.no_cache {
        return "no-cache".to_string();
    }
    let mut value = format!("max-age={}", cache.max_age);
    if cache.must_revalidate {
        value.push_str(", must-revalidate");
    }
    value
}

fn origin_allowed(cors: &CorsConfig, origin: &str) -> bool {
    cors.allow_origin.iter().any(|o| o == "*" || o == origin)
}

fn allow_origin(cors: &CorsConfig, headers: &mut HeaderMap, origin: &str) {
    let wildcard = cors.allow_origin.iter().any(|o| o == "*");
    // A credentialed response must name the origin.
    let value = if wildcard && !cors.allow_credentials { "*" } else { origin };
    set(headers, header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    if cors.allow_credentials {
        set(headers, header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true");
    }
    if value != "*" {
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
}

fn set(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_control_value() {
        assert_eq!(cache_control(&CacheConfig::default()), "max-age=86400, must-revalidate");

        let no_cache = CacheConfig {
            no_cache: true,
            ..CacheConfig::default()
        };
        assert_eq!(cache_control(&no_cache), "no-cache");
    }

    #[test]
    fn test_origin_matching() {
        let mut cors = CorsConfig::default();
        assert!(origin_allowed(&cors, "https://app.example"));

        cors.allow_origin = vec!["https://app.example".to_string()];
        assert!(origin_allowed(&cors, "https://app.example"));
        assert!(!origin_allowed(&cors, "https://other.example"));
    }

    #[test]
    fn test_credentialed_origin_is_echoed() {
        let cors = CorsConfig::default();
        let mut headers = HeaderMap::new();
        allow_origin(&cors, &mut headers, "https://app.example");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }
}
