// Shared handler plumbing: canonical-link context, id screening, body
// shape checks and the pagination sentinel.
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use serde_json::{json, Map, Value};

use crate::datastore::{Key, Kind};
use crate::error::ApiError;

/// Enough of the inbound request to compute canonical `self` links:
/// `{protocol}://{host}`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub base: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let proto = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::bad_request("The request is missing a Host header."))?;

        Ok(Self { base: format!("{proto}://{host}") })
    }
}

impl RequestContext {
    pub fn self_url(&self, key: &Key) -> String {
        format!("{}/{}/{}", self.base, key.kind.collection(), key.id)
    }

    pub fn page_url(&self, kind: Kind, page: u32) -> String {
        format!("{}/{}?page={}", self.base, kind.collection(), page)
    }
}

/// Screens a path id parameter; anything that is not a positive integer is
/// a client error, not a lookup miss.
pub fn parse_id(raw: &str, kind: Kind) -> Result<Key, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .map(|id| Key::new(kind, id))
        .ok_or_else(|| {
            ApiError::bad_request(format!("The {0}_id you specified is not valid.", kind.singular()))
        })
}

/// Requires a JSON object body and folds any UPPERCASE keys to lowercase.
pub fn object_body(body: Value) -> Result<Map<String, Value>, ApiError> {
    let map = match body {
        Value::Object(map) => map,
        _ => return Err(ApiError::bad_request("The request body must be a JSON object.")),
    };
    Ok(map.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect())
}

/// Rejects bodies carrying properties outside the endpoint's allow-list,
/// e.g. an attempt to write `id` or `owner` directly.
pub fn reject_extra_keys(body: &Map<String, Value>, allowed: &[&str]) -> Result<(), ApiError> {
    for key in body.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(ApiError::bad_request(format!(
                "{key} is not a valid property for this endpoint. Check your request body for extra attributes."
            )));
        }
    }
    Ok(())
}

/// The `{"next": url}` sentinel appended to a paginated listing when a
/// following page exists. Clients filter it out of the item sequence.
pub fn next_sentinel(url: String) -> Value {
    json!({ "next": url })
}

/// Collection-level PUT/PATCH handler.
pub async fn collection_not_allowed() -> ApiError {
    ApiError::method_not_allowed("GET, POST")
}
