pub mod api;
pub mod config;
pub mod handlers;
pub mod model;
pub mod observability;
pub mod rdf;
pub mod services;
pub mod store;
