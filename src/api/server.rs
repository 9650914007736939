use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, http::Method, middleware, routing::any};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::error::LdpError;
use super::filters::{agent_filter, cache_control_filter, cors_filter};
use super::request::TrellisRequest;
use super::services::ldp_handler;
use super::state::AppState;
use crate::config::{Config, StorageBackend};
use crate::handlers::{AuditKind, MutatingLdpHandler};
use crate::model::{InteractionModel, Metadata, ResourceLookup, Session, TRELLIS_DATA_PREFIX};
use crate::rdf::{Dataset, Iri, vocab::trellis};
use crate::services::{
    BinaryService, DefaultAgentService, EventService, LoggingEventService, MementoService,
    NoopEventService, ObjectStoreBinaryService, ResourceService, ServiceBundler,
};
use crate::store::{FjallStore, MemoryStore};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The LDP application: every path is a resource.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(ldp_handler))
        .route("/{*path}", any(ldp_handler))
        .layer(middleware::from_fn_with_state(state.clone(), agent_filter))
        .layer(middleware::from_fn_with_state(state.clone(), cache_control_filter))
        .layer(middleware::from_fn_with_state(state.clone(), cors_filter))
        // Transparently decompress gzip request bodies
        .layer(RequestDecompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wire the configured stores into a service bundle.
pub fn build_services(config: &Config) -> Result<ServiceBundler, AnyError> {
    let (resources, mementos): (Arc<dyn ResourceService>, Arc<dyn MementoService>) =
        match config.storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory resource store");
                let store = Arc::new(MemoryStore::new());
                (store.clone() as Arc<dyn ResourceService>, store as Arc<dyn MementoService>)
            }
            StorageBackend::Fjall => {
                info!(path = %config.storage.path.display(), "Opening Fjall store");
                let store = Arc::new(
                    FjallStore::open(&config.storage.path)
                        .map_err(|e| format!("Failed to open Fjall store: {e}"))?,
                );
                (store.clone() as Arc<dyn ResourceService>, store as Arc<dyn MementoService>)
            }
        };

    let binaries: Arc<dyn BinaryService> = match &config.storage.binary_path {
        Some(path) => {
            info!(path = %path.display(), "Using local binary storage");
            Arc::new(
                ObjectStoreBinaryService::local(path)
                    .map_err(|e| format!("Failed to open binary storage: {e}"))?,
            )
        }
        None => Arc::new(ObjectStoreBinaryService::in_memory()),
    };

    let events: Arc<dyn EventService> = if config.events.enabled {
        Arc::new(LoggingEventService::new())
    } else {
        Arc::new(NoopEventService)
    };

    let agents = DefaultAgentService::new(config.auth.admin_users.iter().cloned());
    Ok(ServiceBundler::new(resources, mementos, binaries, events).with_agents(Arc::new(agents)))
}

/// Create the root container if it does not exist yet.
pub async fn initialize_root(services: &ServiceBundler, base_url: &str) -> Result<bool, LdpError> {
    let root = Iri::new(TRELLIS_DATA_PREFIX);
    if services.resources.get(&root).await? != ResourceLookup::Missing {
        return Ok(false);
    }

    let request = TrellisRequest::builder()
        .method(Method::PUT)
        .base_url(base_url)
        .session(Session::new(Iri::new(trellis::ADMINISTRATOR_AGENT)))
        .build();
    let handler = MutatingLdpHandler::new(&request, services);
    let metadata = Metadata::builder()
        .identifier(root.clone())
        .interaction_model(InteractionModel::BasicContainer)
        .build();
    let immutable = handler.audit_quads(AuditKind::Creation, &root);
    handler.create(metadata, Dataset::new(), immutable).await?;
    info!(identifier = %root, "Initialized root container");
    Ok(true)
}

pub async fn run(address: SocketAddr, config: Config) -> Result<(), AnyError> {
    let services = build_services(&config)?;

    if config.server.initialize_root {
        let base_url = config
            .server
            .base_url
            .clone()
            .unwrap_or_else(|| format!("http://{address}/"));
        initialize_root(&services, &base_url)
            .await
            .map_err(|e| format!("Failed to initialize root container: {e}"))?;
    }

    let state = AppState::new(config, services);
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "Trellis LDP server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
