//! Collaborator contracts consumed by the handlers, and their default implementations.

pub mod agent;
pub mod audit;
pub mod binary;
pub mod constraint;
pub mod etag;
pub mod event;
pub mod io;
pub mod memento;
pub mod resource;

use std::sync::Arc;

pub use agent::{AgentService, DefaultAgentService};
pub use audit::{AuditService, DefaultAuditService};
pub use binary::{BinaryError, BinaryService, ObjectStoreBinaryService};
pub use constraint::{ConstraintService, ConstraintViolation, LdpConstraintService};
pub use etag::{DefaultEtagGenerator, EtagGenerator};
pub use event::{
    ActivityStreamSerializer, Event, EventError, EventService, LoggingEventService,
    NoopEventService,
};
pub use io::{DefaultIoService, IoService, RdfSyntax};
pub use memento::{MementoService, TimemapGenerator};
pub use resource::{ResourceError, ResourceService};

/// Every collaborator a handler may call, passed by reference into each handler.
#[derive(Clone)]
pub struct ServiceBundler {
    pub resources: Arc<dyn ResourceService>,
    pub mementos: Arc<dyn MementoService>,
    pub binaries: Arc<dyn BinaryService>,
    pub events: Arc<dyn EventService>,
    pub audit: Arc<dyn AuditService>,
    pub io: Arc<dyn IoService>,
    pub agents: Arc<dyn AgentService>,
    pub constraints: Vec<Arc<dyn ConstraintService>>,
    pub etags: Arc<dyn EtagGenerator>,
    pub timemaps: TimemapGenerator,
}

impl ServiceBundler {
    /// Bundle the stateful services with default audit, IO, agent,
    /// constraint and ETag implementations.
    pub fn new(
        resources: Arc<dyn ResourceService>,
        mementos: Arc<dyn MementoService>,
        binaries: Arc<dyn BinaryService>,
        events: Arc<dyn EventService>,
    ) -> Self {
        Self {
            resources,
            mementos,
            binaries,
            events,
            audit: Arc::new(DefaultAuditService),
            io: Arc::new(DefaultIoService),
            agents: Arc::new(DefaultAgentService::default()),
            constraints: vec![Arc::new(LdpConstraintService)],
            etags: Arc::new(DefaultEtagGenerator),
            timemaps: TimemapGenerator::new(),
        }
    }

    pub fn with_agents(mut self, agents: Arc<dyn AgentService>) -> Self {
        self.agents = agents;
        self
    }
}
