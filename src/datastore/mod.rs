// Document store collaborator seam.
//
// The backing store is a schemaless, kind-partitioned document store that
// guarantees atomicity at the single-document level only. Nothing above this
// trait may assume joins or multi-document transactions.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod memory;

pub use memory::MemoryStore;

/// Named grouping of documents in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Boat,
    Load,
    User,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Boat => "Boat",
            Kind::Load => "Load",
            Kind::User => "User",
        }
    }

    /// Lowercase singular, used in id-style client messages.
    pub fn singular(&self) -> &'static str {
        match self {
            Kind::Boat => "boat",
            Kind::Load => "load",
            Kind::User => "user",
        }
    }

    /// URL collection segment for self links.
    pub fn collection(&self) -> &'static str {
        match self {
            Kind::Boat => "boats",
            Kind::Load => "loads",
            Kind::User => "users",
        }
    }
}

/// Store-assigned identity of a document. Two keys denote the same entity
/// iff both the numeric id and the kind match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub kind: Kind,
    pub id: i64,
}

impl Key {
    pub fn new(kind: Kind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn same_entity(&self, other: &Key) -> bool {
        self.id == other.id && self.kind == other.kind
    }
}

/// A stored document plus its key.
#[derive(Debug, Clone)]
pub struct Entity {
    pub key: Key,
    pub data: Value,
}

/// Equality filter on a single document property.
#[derive(Debug, Clone)]
pub struct PropertyFilter {
    pub property: String,
    pub value: Value,
}

/// Filtered, offset-limited query against one kind.
#[derive(Debug, Clone)]
pub struct Query {
    pub kind: Kind,
    pub filter: Option<PropertyFilter>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Query {
    pub fn kind(kind: Kind) -> Self {
        Self { kind, filter: None, offset: 0, limit: None }
    }

    pub fn filter(mut self, property: impl Into<String>, value: Value) -> Self {
        self.filter = Some(PropertyFilter { property: property.into(), value });
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    #[error("no {} document with id {}", .0.kind.as_str(), .0.id)]
    Missing(Key),
    #[error("datastore backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait Datastore: Send + Sync {
    /// Key-based lookup. `Ok(None)` when the key resolves to no document.
    async fn get(&self, key: &Key) -> Result<Option<Entity>, DatastoreError>;

    /// Inserts a new document and returns its store-assigned key.
    async fn insert(&self, kind: Kind, data: Value) -> Result<Key, DatastoreError>;

    /// Replaces the document at `key`. Fails with `Missing` if absent.
    async fn update(&self, key: &Key, data: Value) -> Result<(), DatastoreError>;

    /// Deletes the document at `key`. Fails with `Missing` if absent.
    async fn delete(&self, key: &Key) -> Result<(), DatastoreError>;

    /// Runs a filtered, offset-limited query in key order.
    async fn run_query(&self, query: &Query) -> Result<Vec<Entity>, DatastoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_by_id_and_kind() {
        let a = Key::new(Kind::Boat, 7);
        let b = Key::new(Kind::Boat, 7);
        let c = Key::new(Kind::Boat, 8);
        let d = Key::new(Kind::Load, 7);

        assert!(a.same_entity(&b));
        assert!(!a.same_entity(&c));
        assert!(!a.same_entity(&d));
    }

    #[test]
    fn key_serializes_with_kind_tag() {
        let key = Key::new(Kind::Load, 12);
        let v = serde_json::to_value(key).unwrap();
        assert_eq!(v, serde_json::json!({"kind": "Load", "id": 12}));
    }
}
