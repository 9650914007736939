//! Recording fakes shared by the handler tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use trellis::model::{InteractionModel, Metadata, Resource, ResourceLookup};
use trellis::rdf::{Dataset, Iri};
use trellis::services::resource::Result;
use trellis::services::{
    Event, EventError, EventService, ObjectStoreBinaryService, ResourceError, ResourceService,
    ServiceBundler,
};
use trellis::store::MemoryStore;

/// A write made against [`RecordingResourceService`].
#[derive(Debug, Clone)]
pub enum Call {
    Create(Metadata, Dataset),
    Replace(Metadata, Dataset),
    Delete(Metadata),
    Add(Iri, Dataset),
}

/// Serves fixed lookups and records every write.
#[derive(Default)]
pub struct RecordingResourceService {
    lookups: Mutex<HashMap<Iri, ResourceLookup>>,
    calls: Mutex<Vec<Call>>,
    fail_add: AtomicBool,
    fail_delete: AtomicBool,
}

impl RecordingResourceService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, identifier: &str, lookup: ResourceLookup) -> Self {
        self.lookups
            .lock()
            .unwrap()
            .insert(Iri::new(identifier), lookup);
        self
    }

    /// Make every `add` call fail.
    pub fn failing_add(self) -> Self {
        self.fail_add.store(true, Ordering::SeqCst);
        self
    }

    /// Make every `delete` call fail.
    pub fn failing_delete(self) -> Self {
        self.fail_delete.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ResourceService for RecordingResourceService {
    async fn get(&self, identifier: &Iri) -> Result<ResourceLookup> {
        Ok(self
            .lookups
            .lock()
            .unwrap()
            .get(identifier)
            .cloned()
            .unwrap_or(ResourceLookup::Missing))
    }

    async fn create(&self, metadata: Metadata, dataset: Dataset) -> Result<()> {
        self.record(Call::Create(metadata, dataset));
        Ok(())
    }

    async fn replace(&self, metadata: Metadata, dataset: Dataset) -> Result<()> {
        self.record(Call::Replace(metadata, dataset));
        Ok(())
    }

    async fn delete(&self, metadata: Metadata) -> Result<()> {
        self.record(Call::Delete(metadata));
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(ResourceError::Backend("resource store unavailable".to_string()));
        }
        Ok(())
    }

    async fn add(&self, identifier: &Iri, dataset: Dataset) -> Result<()> {
        self.record(Call::Add(identifier.clone(), dataset));
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(ResourceError::Backend("audit store unavailable".to_string()));
        }
        Ok(())
    }
}

/// Keeps every emitted event, optionally rejecting each delivery after recording it.
#[derive(Default)]
pub struct RecordingEventService {
    events: Mutex<Vec<Event>>,
    fail: AtomicBool,
}

impl RecordingEventService {
    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventService for RecordingEventService {
    async fn emit(&self, event: &Event) -> std::result::Result<(), EventError> {
        self.events.lock().unwrap().push(event.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(EventError::Delivery("broker unreachable".to_string()));
        }
        Ok(())
    }
}

pub struct Fixture {
    pub resources: Arc<RecordingResourceService>,
    pub events: Arc<RecordingEventService>,
    pub services: ServiceBundler,
}

impl Fixture {
    pub fn new(resources: RecordingResourceService) -> Self {
        Self::with_events(resources, RecordingEventService::default())
    }

    pub fn with_events(resources: RecordingResourceService, events: RecordingEventService) -> Self {
        let resources = Arc::new(resources);
        let events = Arc::new(events);
        let services = ServiceBundler::new(
            resources.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(ObjectStoreBinaryService::in_memory()),
            events.clone(),
        );
        Self {
            resources,
            events,
            services,
        }
    }
}

/// A live resource at `identifier` holding `quads`.
pub fn resource(identifier: &str, model: InteractionModel, quads: Dataset) -> ResourceLookup {
    let metadata = Metadata::builder()
        .identifier(Iri::new(identifier))
        .interaction_model(model)
        .build();
    ResourceLookup::Found(Resource::from_metadata(&metadata, quads, Utc::now()))
}
