//! Activity-stream notifications for resource changes.
//!
//! Delivery is best-effort: callers log a failed [`EventService::emit`] and
//! carry on.

use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use uuid::Uuid;

use crate::rdf::Iri;
use crate::rdf::vocab::activity_streams as as_;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A Create/Update/Delete notification.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct Event {
    #[builder(default = Iri::new(format!("urn:uuid:{}", Uuid::new_v4())))]
    pub identifier: Iri,
    #[builder(default)]
    pub agents: Vec<Iri>,
    pub target: Iri,
    #[builder(default)]
    pub types: Vec<Iri>,
    #[builder(default)]
    pub target_types: Vec<Iri>,
    #[builder(default = Utc::now())]
    pub created: DateTime<Utc>,
    pub inbox: Option<Iri>,
}

#[async_trait]
pub trait EventService: Send + Sync {
    async fn emit(&self, event: &Event) -> Result<(), EventError>;
}

/// Serializes events as Activity Streams JSON-LD.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityStreamSerializer;

impl ActivityStreamSerializer {
    pub fn to_value(&self, event: &Event) -> Value {
        let compact = |iri: &Iri| {
            iri.as_str()
                .strip_prefix(as_::NS)
                .unwrap_or(iri.as_str())
                .to_string()
        };

        let mut object = json!({
            "id": event.target.as_str(),
            "type": event.target_types.iter().map(Iri::as_str).collect::<Vec<_>>(),
        });
        if let Some(inbox) = &event.inbox {
            object["inbox"] = json!(inbox.as_str());
        }

        json!({
            "@context": as_::CONTEXT,
            "id": event.identifier.as_str(),
            "type": event.types.iter().map(compact).collect::<Vec<_>>(),
            "actor": event.agents.iter().map(Iri::as_str).collect::<Vec<_>>(),
            "object": object,
            "published": event.created.to_rfc3339(),
        })
    }

    pub fn serialize(&self, event: &Event) -> Result<String, EventError> {
        Ok(serde_json::to_string(&self.to_value(event))?)
    }
}

/// Writes each event to the log as a JSON-LD line.
#[derive(Debug, Default)]
pub struct LoggingEventService {
    serializer: ActivityStreamSerializer,
    emitted: AtomicU64,
}

impl LoggingEventService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EventService for LoggingEventService {
    async fn emit(&self, event: &Event) -> Result<(), EventError> {
        let payload = self.serializer.serialize(event)?;
        self.emitted.fetch_add(1, Ordering::Relaxed);
        tracing::info!(target: "trellis::events", target_resource = %event.target, %payload, "Event emitted");
        Ok(())
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventService;

#[async_trait]
impl EventService for NoopEventService {
    async fn emit(&self, _event: &Event) -> Result<(), EventError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::vocab::{ldp, trellis};

    fn delete_event() -> Event {
        Event::builder()
            .target(Iri::new("http://example.org/resource"))
            .agents(vec![Iri::new(trellis::ADMINISTRATOR_AGENT)])
            .types(vec![Iri::new(as_::DELETE)])
            .target_types(vec![Iri::new(ldp::RDF_SOURCE)])
            .build()
    }

    #[test]
    fn serializes_activity_stream_json() {
        let value = ActivityStreamSerializer.to_value(&delete_event());

        assert_eq!(value["@context"], as_::CONTEXT);
        assert_eq!(value["type"], json!(["Delete"]));
        assert_eq!(value["object"]["id"], "http://example.org/resource");
        assert_eq!(value["object"]["type"], json!([ldp::RDF_SOURCE]));
        assert!(value["id"].as_str().unwrap().starts_with("urn:uuid:"));
        assert!(value["object"].get("inbox").is_none());
    }

    #[tokio::test]
    async fn logging_service_counts_events() {
        let svc = LoggingEventService::new();
        svc.emit(&delete_event()).await.unwrap();
        svc.emit(&delete_event()).await.unwrap();
        assert_eq!(svc.emitted(), 2);
    }

    #[test]
    fn events_get_distinct_identifiers() {
        assert_ne!(delete_event().identifier, delete_event().identifier);
    }
}
