use serde_json::{json, Value};

use crate::datastore::{Entity, Key};

use super::ModelError;

/// A registered end-user. `sub` is the identity provider's stable subject
/// identifier and is the primary identity; one document exists per distinct
/// `sub`, created at signup and never updated afterwards.
#[derive(Debug, Clone)]
pub struct User {
    pub key: Option<Key>,
    pub sub: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn new(sub: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            key: None,
            sub: sub.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn from_entity(entity: &Entity) -> Result<Self, ModelError> {
        let bad = || ModelError::BadStoredDocument("User");
        let doc = entity.data.as_object().ok_or_else(bad)?;
        let field = |name: &str| -> Result<String, ModelError> {
            Ok(doc.get(name).and_then(Value::as_str).ok_or_else(bad)?.to_string())
        };

        Ok(Self {
            key: Some(entity.key),
            sub: field("sub")?,
            first_name: field("firstName")?,
            last_name: field("lastName")?,
        })
    }

    pub fn to_doc(&self) -> Value {
        json!({
            "sub": self.sub,
            "firstName": self.first_name,
            "lastName": self.last_name,
        })
    }

    pub fn to_api(&self, base: &str) -> Value {
        let id = self.key.map(|k| k.id);
        json!({
            "id": id,
            "sub": self.sub,
            "firstName": self.first_name,
            "lastName": self.last_name,
            "self": id.map(|id| format!("{}/users/{}", base, id)),
        })
    }
}
