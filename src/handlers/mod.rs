//! LDP verb handlers.
//!
//! Each verb has a handler struct that resolves the target, checks the
//! request against it and then performs the read or write. Shared steps live
//! in two layers:
//!
//! - [`BaseLdpHandler`] resolves the resource, checks its interaction model,
//!   evaluates conditional headers and translates identifiers.
//! - [`MutatingLdpHandler`] adds audit records, paired persistence calls,
//!   constraint checks, memento snapshots and event emission.
//!
//! [`handle`] dispatches a [`TrellisRequest`] to the right verb.

pub mod base;
pub mod delete;
pub mod get;
pub mod mutating;
pub mod options;
pub mod patch;
pub mod post;
pub mod put;
pub mod response;

use axum::http::Method;
use bytes::Bytes;
use tracing::debug;

use crate::api::LdpError;
use crate::api::request::TrellisRequest;
use crate::services::ServiceBundler;

pub use base::{BaseLdpHandler, EntityTag, READ_ONLY_METHODS, allowed_methods};
pub use delete::DeleteHandler;
pub use get::GetHandler;
pub use mutating::{AuditKind, MutatingLdpHandler};
pub use patch::PatchHandler;
pub use post::PostHandler;
pub use put::PutHandler;
pub use response::ResponseBuilder;

/// The HTTP methods the LDP surface serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn from_method(method: &Method) -> Option<Self> {
        Some(match *method {
            Method::GET => Verb::Get,
            Method::HEAD => Verb::Head,
            Method::OPTIONS => Verb::Options,
            Method::POST => Verb::Post,
            Method::PUT => Verb::Put,
            Method::PATCH => Verb::Patch,
            Method::DELETE => Verb::Delete,
            _ => return None,
        })
    }

    pub fn is_mutating(self) -> bool {
        matches!(self, Verb::Post | Verb::Put | Verb::Patch | Verb::Delete)
    }
}

pub async fn handle(
    verb: Verb,
    request: &TrellisRequest,
    services: &ServiceBundler,
    body: Bytes,
) -> Result<ResponseBuilder, LdpError> {
    debug!(?verb, path = %request.path, "Dispatching request");
    match verb {
        Verb::Get => get::handle(request, services, false).await,
        Verb::Head => get::handle(request, services, true).await,
        Verb::Options => options::handle(request, services).await,
        Verb::Post => post::handle(request, services, body).await,
        Verb::Put => put::handle(request, services, body).await,
        Verb::Patch => patch::handle(request, services, body).await,
        Verb::Delete => delete::handle(request, services).await,
    }
}
