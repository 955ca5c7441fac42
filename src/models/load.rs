use serde_json::{json, Map, Value};

use crate::datastore::{Entity, Key};

use super::{coerce_int, value_as_text, Boat, ModelError};

/// A load document. `carrier` is the key of the boat currently holding the
/// load, or `None` while unassigned; it is only ever written through the
/// relationship operations, never from client input.
#[derive(Debug, Clone)]
pub struct Load {
    pub key: Option<Key>,
    /// `None` marks a non-numeric inbound value, rejected by `validate`.
    pub volume: Option<i64>,
    pub content: String,
    pub creation_date: String,
    pub carrier: Option<Key>,
}

impl Load {
    pub const REQUIRED_FIELDS: [&'static str; 3] = ["volume", "content", "creation_date"];

    pub fn from_payload(body: &Map<String, Value>) -> Result<Self, ModelError> {
        if !Self::REQUIRED_FIELDS.iter().all(|f| body.contains_key(*f)) {
            return Err(ModelError::MissingRequiredFields);
        }

        Ok(Self {
            key: None,
            volume: coerce_int(&body["volume"]),
            content: value_as_text(&body["content"]),
            creation_date: value_as_text(&body["creation_date"]),
            carrier: None,
        })
    }

    pub fn from_entity(entity: &Entity) -> Result<Self, ModelError> {
        let bad = || ModelError::BadStoredDocument("Load");
        let doc = entity.data.as_object().ok_or_else(bad)?;

        let carrier = match doc.get("carrier") {
            None | Some(Value::Null) => None,
            Some(v) => Some(serde_json::from_value(v.clone()).map_err(|_| bad())?),
        };

        Ok(Self {
            key: Some(entity.key),
            volume: doc.get("volume").and_then(Value::as_i64),
            content: doc.get("content").and_then(Value::as_str).ok_or_else(bad)?.to_string(),
            creation_date: doc
                .get("creation_date")
                .and_then(Value::as_str)
                .ok_or_else(bad)?
                .to_string(),
            carrier,
        })
    }

    /// Same partial-update contract as [`Boat::update_fields`]: only keys
    /// that exist on the model apply, `false` when none do, and `volume` is
    /// re-coerced on every assignment.
    pub fn update_fields(&mut self, body: &Map<String, Value>) -> bool {
        let mut applied = false;

        if let Some(v) = body.get("volume") {
            self.volume = coerce_int(v);
            applied = true;
        }
        if let Some(v) = body.get("content") {
            self.content = value_as_text(v);
            applied = true;
        }
        if let Some(v) = body.get("creation_date") {
            self.creation_date = value_as_text(v);
            applied = true;
        }

        applied
    }

    pub fn update_all_fields(&mut self, body: &Map<String, Value>) -> bool {
        if !Self::REQUIRED_FIELDS.iter().all(|f| body.contains_key(*f)) {
            return false;
        }
        self.update_fields(body)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.volume.is_none() {
            return Err(ModelError::InvalidVolume);
        }
        Ok(())
    }

    pub fn to_doc(&self) -> Value {
        json!({
            "volume": self.volume,
            "content": self.content,
            "creation_date": self.creation_date,
            "carrier": self.carrier,
        })
    }

    /// Wire shape. The carrier expands to an `{id, name, self}` summary of
    /// the boat, which the caller fetches; a dangling or absent carrier
    /// serializes as null.
    pub fn to_api(&self, base: &str, carrier: Option<&Boat>) -> Value {
        let id = self.key.map(|k| k.id);
        json!({
            "id": id,
            "volume": self.volume,
            "carrier": carrier.map(|boat| boat.carrier_summary(base)),
            "content": self.content,
            "creation_date": self.creation_date,
            "self": id.map(|id| format!("{}/loads/{}", base, id)),
        })
    }

    /// Wire shape without the carrier, used inside a boat's load listing.
    pub fn to_api_without_carrier(&self, base: &str) -> Value {
        let id = self.key.map(|k| k.id);
        json!({
            "id": id,
            "volume": self.volume,
            "content": self.content,
            "creation_date": self.creation_date,
            "self": id.map(|id| format!("{}/loads/{}", base, id)),
        })
    }
}
