//! Fjall-backed resource and memento persistence.
//!
//! Partition layout:
//! - `resources`: {identifier} -> Record (JSON)
//! - `audit`: {identifier}\0{uuid} -> Dataset (JSON), append-only
//! - `children`: {container}\0{child} -> empty
//! - `membership`: {membership resource}\0{container} -> empty
//! - `mementos`: {identifier}\0{epoch seconds:020} -> Resource (JSON)

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{Result as StoreResult, StoreError};
use super::{Record, containment, member_of, membership, server_managed};
use crate::model::{InteractionModel, Metadata, Resource, ResourceLookup, container_of};
use crate::rdf::{Dataset, Iri};
use crate::services::memento::{memento_time, select_memento};
use crate::services::resource::Result;
use crate::services::{MementoService, ResourceService};

const SEPARATOR: u8 = 0;

fn compound_key(left: &str, right: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(left.len() + right.len() + 1);
    key.extend_from_slice(left.as_bytes());
    key.push(SEPARATOR);
    key.extend_from_slice(right.as_bytes());
    key
}

fn prefix_key(left: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(left.len() + 1);
    key.extend_from_slice(left.as_bytes());
    key.push(SEPARATOR);
    key
}

fn key_suffix(key: &[u8], prefix_len: usize) -> StoreResult<String> {
    let suffix = key
        .get(prefix_len..)
        .ok_or_else(|| StoreError::InvalidKey(String::from_utf8_lossy(key).into_owned()))?;
    String::from_utf8(suffix.to_vec())
        .map_err(|_| StoreError::InvalidKey(String::from_utf8_lossy(key).into_owned()))
}

/// Durable store over an embedded Fjall keyspace.
#[derive(Clone)]
pub struct FjallStore {
    keyspace: Keyspace,
    resources: PartitionHandle,
    audit: PartitionHandle,
    children: PartitionHandle,
    membership: PartitionHandle,
    mementos: PartitionHandle,
}

impl FjallStore {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        info!("Opening Fjall store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let resources = keyspace.open_partition("resources", PartitionCreateOptions::default())?;
        let audit = keyspace.open_partition("audit", PartitionCreateOptions::default())?;
        let children = keyspace.open_partition("children", PartitionCreateOptions::default())?;
        let membership = keyspace.open_partition("membership", PartitionCreateOptions::default())?;
        let mementos = keyspace.open_partition("mementos", PartitionCreateOptions::default())?;

        info!("Fjall store opened successfully");
        Ok(Self {
            keyspace,
            resources,
            audit,
            children,
            membership,
            mementos,
        })
    }

    /// Persist all pending writes to disk.
    pub fn persist(&self) -> StoreResult<()> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    fn record(&self, identifier: &Iri) -> StoreResult<Option<Record>> {
        match self.resources.get(identifier.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn live(&self, identifier: &Iri) -> StoreResult<Option<Resource>> {
        Ok(match self.record(identifier)? {
            Some(Record::Live(resource)) => Some(resource),
            _ => None,
        })
    }

    fn scan_suffixes(&self, partition: &PartitionHandle, left: &str) -> StoreResult<Vec<String>> {
        let prefix = prefix_key(left);
        let mut out = Vec::new();
        for item in partition.prefix(&prefix) {
            let (key, _) = item?;
            out.push(key_suffix(&key, prefix.len())?);
        }
        Ok(out)
    }

    fn live_children(&self, container: &Iri) -> StoreResult<Vec<Resource>> {
        let mut out = Vec::new();
        for child in self.scan_suffixes(&self.children, container.as_str())? {
            if let Some(resource) = self.live(&Iri::new(child))? {
                out.push(resource);
            }
        }
        Ok(out)
    }

    fn assemble(&self, stored: Resource) -> StoreResult<Resource> {
        let mut resource = stored.clone();
        let id = &stored.identifier;

        for item in self.audit.prefix(prefix_key(id.as_str())) {
            let (_, value) = item?;
            let dataset: Dataset = serde_json::from_slice(&value)?;
            resource.quads.extend(dataset);
        }
        resource.quads.extend(server_managed(&stored));

        if stored.interaction_model.is_container() {
            let children = self.live_children(id)?;
            resource
                .quads
                .extend(containment(id, children.iter().map(|c| &c.identifier)));
        }

        for container_id in self.scan_suffixes(&self.membership, id.as_str())? {
            let container_id = Iri::new(container_id);
            if let Some(container) = self.live(&container_id)? {
                if container.membership_resource.as_ref() == Some(id) {
                    let children = self.live_children(&container_id)?;
                    resource.quads.extend(membership(&container, &children));
                }
            }
        }

        if let Some(parent) = stored.container.as_ref() {
            if let Some(parent) = self.live(parent)? {
                resource.quads.extend(member_of(id, &parent));
            }
        }
        Ok(resource)
    }

    fn touch_resource(&self, identifier: &Iri) -> StoreResult<()> {
        if let Some(mut resource) = self.live(identifier)? {
            resource.modified = Utc::now();
            self.resources
                .insert(identifier.as_str(), serde_json::to_vec(&Record::Live(resource))?)?;
        }
        Ok(())
    }

    fn write(&self, metadata: Metadata, dataset: Dataset, touch_parent: bool) -> StoreResult<()> {
        let parent = metadata
            .container
            .clone()
            .or_else(|| container_of(&metadata.identifier));
        let resource = Resource::from_metadata(&metadata, dataset, Utc::now());
        let id = metadata.identifier.as_str();

        let mut batch = self.keyspace.batch();
        batch.insert(&self.resources, id, serde_json::to_vec(&Record::Live(resource))?);
        if let Some(parent) = &parent {
            batch.insert(&self.children, compound_key(parent.as_str(), id), Vec::<u8>::new());
        }
        if matches!(
            metadata.interaction_model,
            InteractionModel::DirectContainer | InteractionModel::IndirectContainer
        ) {
            if let Some(target) = &metadata.membership_resource {
                batch.insert(&self.membership, compound_key(target.as_str(), id), Vec::<u8>::new());
            }
        }
        batch.commit()?;

        if touch_parent {
            if let Some(parent) = &parent {
                self.touch_resource(parent)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceService for FjallStore {
    async fn get(&self, identifier: &Iri) -> Result<ResourceLookup> {
        Ok(match self.record(identifier)? {
            None => ResourceLookup::Missing,
            Some(Record::Deleted { .. }) => ResourceLookup::Deleted,
            Some(Record::Live(resource)) => ResourceLookup::Found(self.assemble(resource)?),
        })
    }

    async fn create(&self, metadata: Metadata, dataset: Dataset) -> Result<()> {
        debug!(identifier = %metadata.identifier, model = %metadata.interaction_model, "Creating resource");
        Ok(self.write(metadata, dataset, true)?)
    }

    async fn replace(&self, metadata: Metadata, dataset: Dataset) -> Result<()> {
        debug!(identifier = %metadata.identifier, "Replacing resource");
        Ok(self.write(metadata, dataset, false)?)
    }

    async fn delete(&self, metadata: Metadata) -> Result<()> {
        debug!(identifier = %metadata.identifier, "Deleting resource");
        let tombstone = Record::Deleted {
            modified: Utc::now(),
        };
        self.resources
            .insert(metadata.identifier.as_str(), serde_json::to_vec(&tombstone).map_err(StoreError::from)?)
            .map_err(StoreError::from)?;
        if let Some(parent) = metadata.container.or_else(|| container_of(&metadata.identifier)) {
            self.touch_resource(&parent)?;
        }
        Ok(())
    }

    async fn add(&self, identifier: &Iri, dataset: Dataset) -> Result<()> {
        let key = compound_key(identifier.as_str(), &Uuid::now_v7().to_string());
        let value = serde_json::to_vec(&dataset).map_err(StoreError::from)?;
        self.audit.insert(key, value).map_err(StoreError::from)?;
        Ok(())
    }
}

#[async_trait]
impl MementoService for FjallStore {
    async fn put(&self, resource: &Resource) -> Result<()> {
        let time = memento_time(resource.modified);
        let key = compound_key(
            resource.identifier.as_str(),
            &format!("{:020}", time.timestamp()),
        );
        let value = serde_json::to_vec(resource).map_err(StoreError::from)?;
        self.mementos.insert(key, value).map_err(StoreError::from)?;
        debug!(identifier = %resource.identifier, %time, "Stored memento");
        Ok(())
    }

    async fn get(&self, identifier: &Iri, time: DateTime<Utc>) -> Result<ResourceLookup> {
        let times = self.mementos(identifier).await?;
        let Some(selected) = select_memento(&times, time) else {
            return Ok(ResourceLookup::Missing);
        };
        let key = compound_key(identifier.as_str(), &format!("{:020}", selected.timestamp()));
        match self.mementos.get(key).map_err(StoreError::from)? {
            Some(value) => {
                let resource = serde_json::from_slice(&value).map_err(StoreError::from)?;
                Ok(ResourceLookup::Found(resource))
            }
            None => Ok(ResourceLookup::Missing),
        }
    }

    async fn mementos(&self, identifier: &Iri) -> Result<BTreeSet<DateTime<Utc>>> {
        let mut times = BTreeSet::new();
        for suffix in self.scan_suffixes(&self.mementos, identifier.as_str())? {
            let secs: i64 = suffix
                .parse()
                .map_err(|_| StoreError::InvalidKey(suffix.clone()))?;
            if let Some(time) = Utc.timestamp_opt(secs, 0).single() {
                times.insert(time);
            }
        }
        Ok(times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::vocab::{ldp, trellis};
    use crate::rdf::{Literal, Quad};
    use tempfile::TempDir;

    fn create_test_store() -> (FjallStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FjallStore::open(temp_dir.path().join("resources")).unwrap();
        (store, temp_dir)
    }

    fn metadata(id: &str, model: InteractionModel) -> Metadata {
        let identifier = Iri::new(id);
        Metadata::builder()
            .maybe_container(container_of(&identifier))
            .identifier(identifier)
            .interaction_model(model)
            .build()
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let (store, _temp) = create_test_store();
        let id = Iri::new("trellis:data/resource");
        let data: Dataset = [Quad::new(
            Iri::new(trellis::PREFER_USER_MANAGED),
            id.clone(),
            Iri::new("http://purl.org/dc/terms/title"),
            Literal::simple("A title"),
        )]
        .into_iter()
        .collect();

        store
            .create(metadata("trellis:data/resource", InteractionModel::RdfSource), data)
            .await
            .unwrap();
        let resource = ResourceService::get(&store, &id).await.unwrap().found().unwrap();
        assert_eq!(resource.interaction_model, InteractionModel::RdfSource);
        assert_eq!(resource.graph(trellis::PREFER_USER_MANAGED).len(), 1);

        store
            .delete(metadata("trellis:data/resource", InteractionModel::RdfSource))
            .await
            .unwrap();
        assert_eq!(
            ResourceService::get(&store, &id).await.unwrap(),
            ResourceLookup::Deleted
        );
    }

    #[tokio::test]
    async fn test_children_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resources");
        {
            let store = FjallStore::open(&path).unwrap();
            store
                .create(metadata("trellis:data/", InteractionModel::BasicContainer), Dataset::new())
                .await
                .unwrap();
            store
                .create(metadata("trellis:data/child", InteractionModel::RdfSource), Dataset::new())
                .await
                .unwrap();
            store.persist().unwrap();
        }

        let store = FjallStore::open(&path).unwrap();
        let root = ResourceService::get(&store, &Iri::new("trellis:data/"))
            .await
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(
            root.stream().filter(|q| q.predicate == ldp::CONTAINS).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_audit_and_mementos() {
        let (store, _temp) = create_test_store();
        let id = Iri::new("trellis:data/r");
        store
            .create(metadata("trellis:data/r", InteractionModel::RdfSource), Dataset::new())
            .await
            .unwrap();

        let audit: Dataset = [Quad::new(
            Iri::new(trellis::PREFER_AUDIT),
            id.clone(),
            Iri::new("http://www.w3.org/ns/prov#wasGeneratedBy"),
            Iri::new("trellis:bnode/x"),
        )]
        .into_iter()
        .collect();
        store.add(&id, audit.clone()).await.unwrap();
        store.add(&id, audit).await.unwrap();

        let resource = ResourceService::get(&store, &id).await.unwrap().found().unwrap();
        assert_eq!(resource.graph(trellis::PREFER_AUDIT).len(), 1);

        MementoService::put(&store, &resource).await.unwrap();
        let times = store.mementos(&id).await.unwrap();
        assert_eq!(times.len(), 1);
        let memento = MementoService::get(&store, &id, Utc::now()).await.unwrap();
        assert_eq!(memento.found().unwrap().identifier, id);
    }
}
