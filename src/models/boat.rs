use serde_json::{json, Map, Value};

use crate::datastore::{Entity, Key};

use super::{coerce_int, string_is_valid, value_as_text, ModelError};

/// A boat document. `owner` is fixed from the authenticated subject at
/// creation and is never client-writable; `loads` holds keys of Loads whose
/// `carrier` points back at this boat.
#[derive(Debug, Clone)]
pub struct Boat {
    pub key: Option<Key>,
    pub name: String,
    pub boat_type: String,
    /// `None` marks a non-numeric inbound value, rejected by `validate`.
    pub length: Option<i64>,
    pub owner: String,
    pub loads: Vec<Key>,
}

impl Boat {
    pub const REQUIRED_FIELDS: [&'static str; 3] = ["name", "type", "length"];

    /// Builds a new boat from an inbound request body. Fails only on absent
    /// required fields; per-field validity is checked by [`Boat::validate`].
    pub fn from_payload(body: &Map<String, Value>, owner: &str) -> Result<Self, ModelError> {
        if !Self::REQUIRED_FIELDS.iter().all(|f| body.contains_key(*f)) {
            return Err(ModelError::MissingRequiredFields);
        }

        Ok(Self {
            key: None,
            name: value_as_text(&body["name"]),
            boat_type: value_as_text(&body["type"]),
            length: coerce_int(&body["length"]),
            owner: owner.to_string(),
            loads: Vec::new(),
        })
    }

    /// Rehydrates a boat from its stored document.
    pub fn from_entity(entity: &Entity) -> Result<Self, ModelError> {
        let bad = || ModelError::BadStoredDocument("Boat");
        let doc = entity.data.as_object().ok_or_else(bad)?;

        let loads = match doc.get("loads") {
            Some(v) => serde_json::from_value(v.clone()).map_err(|_| bad())?,
            None => Vec::new(),
        };

        Ok(Self {
            key: Some(entity.key),
            name: doc.get("name").and_then(Value::as_str).ok_or_else(bad)?.to_string(),
            boat_type: doc.get("type").and_then(Value::as_str).ok_or_else(bad)?.to_string(),
            length: doc.get("length").and_then(Value::as_i64),
            owner: doc.get("owner").and_then(Value::as_str).ok_or_else(bad)?.to_string(),
            loads,
        })
    }

    /// Applies the body keys that exist on the model; extraneous keys were
    /// rejected by request-shape validation and are ignored here. Returns
    /// `false` when no applicable key is present. Integers are re-coerced on
    /// every assignment so stale text can never survive an update.
    pub fn update_fields(&mut self, body: &Map<String, Value>) -> bool {
        let mut applied = false;

        if let Some(v) = body.get("name") {
            self.name = value_as_text(v);
            applied = true;
        }
        if let Some(v) = body.get("type") {
            self.boat_type = value_as_text(v);
            applied = true;
        }
        if let Some(v) = body.get("length") {
            self.length = coerce_int(v);
            applied = true;
        }

        applied
    }

    /// Full-replacement semantics for PUT: every required field must be
    /// present or nothing is mutated.
    pub fn update_all_fields(&mut self, body: &Map<String, Value>) -> bool {
        if !Self::REQUIRED_FIELDS.iter().all(|f| body.contains_key(*f)) {
            return false;
        }
        self.update_fields(body)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !string_is_valid(&self.name) {
            return Err(ModelError::InvalidName);
        }
        if !string_is_valid(&self.boat_type) {
            return Err(ModelError::InvalidType);
        }
        if self.length.is_none() {
            return Err(ModelError::InvalidLength);
        }
        Ok(())
    }

    /// Store document shape.
    pub fn to_doc(&self) -> Value {
        json!({
            "name": self.name,
            "type": self.boat_type,
            "length": self.length,
            "owner": self.owner,
            "loads": self.loads,
        })
    }

    /// Wire shape. Loads expand to `{id, self}` summaries built from the
    /// stored keys; the full nested entities are never inlined.
    pub fn to_api(&self, base: &str) -> Value {
        let id = self.key.map(|k| k.id);
        let loads: Vec<Value> = self
            .loads
            .iter()
            .map(|k| json!({"id": k.id, "self": format!("{}/loads/{}", base, k.id)}))
            .collect();

        json!({
            "id": id,
            "name": self.name,
            "type": self.boat_type,
            "length": self.length,
            "owner": self.owner,
            "loads": loads,
            "self": id.map(|id| format!("{}/boats/{}", base, id)),
        })
    }

    /// Summary used when this boat appears as a load's carrier.
    pub fn carrier_summary(&self, base: &str) -> Value {
        let id = self.key.map(|k| k.id);
        json!({
            "id": id,
            "name": self.name,
            "self": id.map(|id| format!("{}/boats/{}", base, id)),
        })
    }
}
