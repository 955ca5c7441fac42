// In-memory document store. Default backend for the binary and the test
// harness; documents live in kind-partitioned ordered maps so queries see
// stable key order, matching the behavior the pagination helper relies on.
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use super::{Datastore, DatastoreError, Entity, Key, Kind, Query};

#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<Kind, BTreeMap<i64, Value>>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn lock_poisoned() -> DatastoreError {
        DatastoreError::Backend("store lock poisoned".to_string())
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn get(&self, key: &Key) -> Result<Option<Entity>, DatastoreError> {
        let documents = self.documents.read().map_err(|_| Self::lock_poisoned())?;
        let data = documents
            .get(&key.kind)
            .and_then(|kind| kind.get(&key.id))
            .cloned();
        Ok(data.map(|data| Entity { key: *key, data }))
    }

    async fn insert(&self, kind: Kind, data: Value) -> Result<Key, DatastoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut documents = self.documents.write().map_err(|_| Self::lock_poisoned())?;
        documents.entry(kind).or_default().insert(id, data);
        Ok(Key::new(kind, id))
    }

    async fn update(&self, key: &Key, data: Value) -> Result<(), DatastoreError> {
        let mut documents = self.documents.write().map_err(|_| Self::lock_poisoned())?;
        let kind = documents
            .get_mut(&key.kind)
            .ok_or(DatastoreError::Missing(*key))?;
        match kind.get_mut(&key.id) {
            Some(slot) => {
                *slot = data;
                Ok(())
            }
            None => Err(DatastoreError::Missing(*key)),
        }
    }

    async fn delete(&self, key: &Key) -> Result<(), DatastoreError> {
        let mut documents = self.documents.write().map_err(|_| Self::lock_poisoned())?;
        let kind = documents
            .get_mut(&key.kind)
            .ok_or(DatastoreError::Missing(*key))?;
        kind.remove(&key.id)
            .map(|_| ())
            .ok_or(DatastoreError::Missing(*key))
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Entity>, DatastoreError> {
        let documents = self.documents.read().map_err(|_| Self::lock_poisoned())?;
        let empty = BTreeMap::new();
        let kind = documents.get(&query.kind).unwrap_or(&empty);

        let matches = kind.iter().filter(|(_, data)| match &query.filter {
            Some(filter) => data.get(&filter.property) == Some(&filter.value),
            None => true,
        });

        let limited: Vec<Entity> = match query.limit {
            Some(limit) => matches
                .skip(query.offset)
                .take(limit)
                .map(|(id, data)| Entity {
                    key: Key::new(query.kind, *id),
                    data: data.clone(),
                })
                .collect(),
            None => matches
                .skip(query.offset)
                .map(|(id, data)| Entity {
                    key: Key::new(query.kind, *id),
                    data: data.clone(),
                })
                .collect(),
        };

        Ok(limited)
    }
}
