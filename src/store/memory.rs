use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use super::{Record, StoreError, containment, member_of, membership, server_managed};
use crate::model::{Metadata, Resource, ResourceLookup, container_of};
use crate::rdf::{Dataset, Iri};
use crate::services::memento::{memento_time, select_memento};
use crate::services::resource::Result;
use crate::services::{MementoService, ResourceService};

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<Iri, Record>,
    audit: BTreeMap<Iri, Dataset>,
    mementos: BTreeMap<Iri, BTreeMap<DateTime<Utc>, Resource>>,
}

impl State {
    fn live(&self, identifier: &Iri) -> Option<&Resource> {
        match self.records.get(identifier) {
            Some(Record::Live(resource)) => Some(resource),
            _ => None,
        }
    }

    fn children(&self, identifier: &Iri) -> Vec<&Resource> {
        self.records
            .values()
            .filter_map(|record| match record {
                Record::Live(r) if r.container.as_ref() == Some(identifier) => Some(r),
                _ => None,
            })
            .collect()
    }

    fn assemble(&self, stored: &Resource) -> Resource {
        let mut resource = stored.clone();
        let id = &stored.identifier;

        if let Some(audit) = self.audit.get(id) {
            resource.quads.extend(audit.iter().cloned());
        }
        resource.quads.extend(server_managed(stored));

        if stored.interaction_model.is_container() {
            let children = self.children(id);
            resource
                .quads
                .extend(containment(id, children.iter().map(|c| &c.identifier)));
        }

        for record in self.records.values() {
            if let Record::Live(container) = record {
                if container.membership_resource.as_ref() == Some(id) {
                    let children: Vec<Resource> =
                        self.children(&container.identifier).into_iter().cloned().collect();
                    resource.quads.extend(membership(container, &children));
                }
            }
        }

        if let Some(parent) = stored.container.as_ref().and_then(|p| self.live(p)) {
            resource.quads.extend(member_of(id, parent));
        }
        resource
    }

    fn touch(&mut self, identifier: &Iri) {
        if let Some(Record::Live(resource)) = self.records.get_mut(identifier) {
            resource.modified = Utc::now();
        }
    }
}

/// In-process resource and memento store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::result::Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> std::result::Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }

    fn store(&self, metadata: Metadata, dataset: Dataset, touch_parent: bool) -> Result<()> {
        let resource = Resource::from_metadata(&metadata, dataset, Utc::now());
        let mut state = self.write()?;
        let parent = metadata
            .container
            .clone()
            .or_else(|| container_of(&metadata.identifier));
        state
            .records
            .insert(metadata.identifier.clone(), Record::Live(resource));
        if touch_parent {
            if let Some(parent) = parent {
                state.touch(&parent);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceService for MemoryStore {
    async fn get(&self, identifier: &Iri) -> Result<ResourceLookup> {
        let state = self.read()?;
        Ok(match state.records.get(identifier) {
            None => ResourceLookup::Missing,
            Some(Record::Deleted { .. }) => ResourceLookup::Deleted,
            Some(Record::Live(resource)) => ResourceLookup::Found(state.assemble(resource)),
        })
    }

    async fn create(&self, metadata: Metadata, dataset: Dataset) -> Result<()> {
        debug!(identifier = %metadata.identifier, model = %metadata.interaction_model, "Creating resource");
        self.store(metadata, dataset, true)
    }

    async fn replace(&self, metadata: Metadata, dataset: Dataset) -> Result<()> {
        debug!(identifier = %metadata.identifier, "Replacing resource");
        self.store(metadata, dataset, false)
    }

    async fn delete(&self, metadata: Metadata) -> Result<()> {
        debug!(identifier = %metadata.identifier, "Deleting resource");
        let mut state = self.write()?;
        state.records.insert(
            metadata.identifier.clone(),
            Record::Deleted {
                modified: Utc::now(),
            },
        );
        if let Some(parent) = metadata.container.or_else(|| container_of(&metadata.identifier)) {
            state.touch(&parent);
        }
        Ok(())
    }

    async fn add(&self, identifier: &Iri, dataset: Dataset) -> Result<()> {
        let mut state = self.write()?;
        state
            .audit
            .entry(identifier.clone())
            .or_default()
            .extend(dataset);
        Ok(())
    }
}

#[async_trait]
impl MementoService for MemoryStore {
    async fn put(&self, resource: &Resource) -> Result<()> {
        let mut state = self.write()?;
        state
            .mementos
            .entry(resource.identifier.clone())
            .or_default()
            .insert(memento_time(resource.modified), resource.clone());
        Ok(())
    }

    async fn get(&self, identifier: &Iri, time: DateTime<Utc>) -> Result<ResourceLookup> {
        let state = self.read()?;
        let Some(versions) = state.mementos.get(identifier) else {
            return Ok(ResourceLookup::Missing);
        };
        let times: BTreeSet<_> = versions.keys().copied().collect();
        Ok(select_memento(&times, time)
            .and_then(|t| versions.get(&t))
            .map_or(ResourceLookup::Missing, |r| ResourceLookup::Found(r.clone())))
    }

    async fn mementos(&self, identifier: &Iri) -> Result<BTreeSet<DateTime<Utc>>> {
        let state = self.read()?;
        Ok(state
            .mementos
            .get(identifier)
            .map(|versions| versions.keys().copied().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InteractionModel;
    use crate::rdf::vocab::{ldp, trellis};
    use crate::rdf::{Literal, Quad, Term};

    fn metadata(id: &str, model: InteractionModel) -> Metadata {
        let identifier = Iri::new(id);
        Metadata::builder()
            .container(container_of(&identifier).unwrap_or_else(|| Iri::new("trellis:data/")))
            .identifier(identifier)
            .interaction_model(model)
            .build()
    }

    fn user_triple(id: &str) -> Dataset {
        [Quad::new(
            Iri::new(trellis::PREFER_USER_MANAGED),
            Iri::new(id),
            Iri::new("http://purl.org/dc/terms/title"),
            Literal::simple("A title"),
        )]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn lookup_sentinels() {
        let store = MemoryStore::new();
        let id = Iri::new("trellis:data/resource");
        assert_eq!(ResourceService::get(&store, &id).await.unwrap(), ResourceLookup::Missing);

        store
            .create(metadata("trellis:data/resource", InteractionModel::RdfSource), user_triple("trellis:data/resource"))
            .await
            .unwrap();
        assert!(ResourceService::get(&store, &id).await.unwrap().exists());

        store
            .delete(metadata("trellis:data/resource", InteractionModel::RdfSource))
            .await
            .unwrap();
        assert_eq!(ResourceService::get(&store, &id).await.unwrap(), ResourceLookup::Deleted);
    }

    #[tokio::test]
    async fn containers_list_children() {
        let store = MemoryStore::new();
        store
            .create(metadata("trellis:data/c", InteractionModel::BasicContainer), Dataset::new())
            .await
            .unwrap();
        store
            .create(metadata("trellis:data/c/child", InteractionModel::RdfSource), Dataset::new())
            .await
            .unwrap();

        let container = ResourceService::get(&store, &Iri::new("trellis:data/c"))
            .await
            .unwrap()
            .found()
            .unwrap();
        let contains: Vec<_> = container
            .stream()
            .filter(|q| q.predicate == ldp::CONTAINS)
            .collect();
        assert_eq!(contains.len(), 1);
        assert_eq!(contains[0].object, Term::iri("trellis:data/c/child"));
    }

    #[tokio::test]
    async fn audit_data_is_appended() {
        let store = MemoryStore::new();
        let id = Iri::new("trellis:data/r");
        store
            .create(metadata("trellis:data/r", InteractionModel::RdfSource), Dataset::new())
            .await
            .unwrap();
        let audit: Dataset = [Quad::new(
            Iri::new(trellis::PREFER_AUDIT),
            id.clone(),
            Iri::new("http://www.w3.org/ns/prov#wasGeneratedBy"),
            Iri::new("trellis:bnode/1"),
        )]
        .into_iter()
        .collect();
        store.add(&id, audit).await.unwrap();

        let resource = ResourceService::get(&store, &id).await.unwrap().found().unwrap();
        assert_eq!(
            resource
                .stream()
                .filter(|q| q.graph == trellis::PREFER_AUDIT)
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn mementos_are_listed_and_selected() {
        let store = MemoryStore::new();
        let id = Iri::new("trellis:data/r");
        store
            .create(metadata("trellis:data/r", InteractionModel::RdfSource), Dataset::new())
            .await
            .unwrap();
        let resource = ResourceService::get(&store, &id).await.unwrap().found().unwrap();
        MementoService::put(&store, &resource).await.unwrap();

        let times = store.mementos(&id).await.unwrap();
        assert_eq!(times.len(), 1);
        let time = *times.iter().next().unwrap();
        let memento = MementoService::get(&store, &id, time).await.unwrap();
        assert!(memento.exists());
        assert_eq!(
            MementoService::get(&store, &Iri::new("trellis:data/other"), time)
                .await
                .unwrap(),
            ResourceLookup::Missing
        );
    }
}
