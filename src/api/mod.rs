//! HTTP surface: request extraction, header parsing, error mapping, filters
//! and the axum application.

mod error;
pub mod filters;
pub mod headers;
pub mod models;
pub mod request;
mod server;
pub mod services;
pub mod state;

pub use error::LdpError;
pub use request::{Principal, TrellisRequest};
pub use server::{build_services, initialize_root, router, run};
pub use state::AppState;
