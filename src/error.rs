// HTTP API error taxonomy.
//
// Every failure is resolved at the route-handler boundary into one of these
// variants and serialized to the uniform `{"Error": "<message>"}` body. Only
// genuinely unexpected faults (store or identity-provider unavailable) map
// to 5xx; nothing crashes the process.
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

use crate::datastore::DatastoreError;
use crate::models::ModelError;
use crate::relationship::LinkError;

#[derive(Debug)]
pub enum ApiError {
    // 400
    BadRequest(String),
    // 401
    Unauthorized(String),
    // 403
    Forbidden(String),
    // 404
    NotFound(String),
    // 405, with the allowed methods for the Allow header
    MethodNotAllowed { allow: &'static str },
    // 406
    NotAcceptable(String),
    // 415
    UnsupportedMediaType(String),
    // 500
    Internal(String),
    // 502
    BadGateway(String),
    // 503
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::NotAcceptable(msg)
            | ApiError::UnsupportedMediaType(msg)
            | ApiError::Internal(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
            ApiError::MethodNotAllowed { .. } => "This endpoint does not support that method.",
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "Error": self.message() })
    }
}

// Static constructors, handler-side shorthand.
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn method_not_allowed(allow: &'static str) -> Self {
        ApiError::MethodNotAllowed { allow }
    }

    pub fn not_acceptable(message: impl Into<String>) -> Self {
        ApiError::NotAcceptable(message.into())
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        ApiError::UnsupportedMediaType(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<DatastoreError> for ApiError {
    fn from(err: DatastoreError) -> Self {
        match err {
            DatastoreError::Missing(key) => {
                let singular = key.kind.singular();
                ApiError::not_found(format!("No {singular} with this {singular}_id exists"))
            }
            DatastoreError::Backend(msg) => {
                tracing::error!("datastore backend error: {msg}");
                ApiError::service_unavailable("The datastore is temporarily unavailable.")
            }
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::BadStoredDocument(kind) => {
                tracing::error!("stored {kind} document has an unexpected shape");
                ApiError::internal("An error occurred while processing your request.")
            }
            client_fault => ApiError::bad_request(client_fault.to_string()),
        }
    }
}

impl From<LinkError> for ApiError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::MissingBoth | LinkError::MissingBoat | LinkError::MissingLoad => {
                ApiError::not_found(err.to_string())
            }
            LinkError::AlreadyOnThisBoat
            | LinkError::AlreadyOnAnotherBoat
            | LinkError::NotOnThisBoat
            | LinkError::NotOwner => ApiError::forbidden(err.to_string()),
            LinkError::Store(e) => e.into(),
            LinkError::BadDocument(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        match self {
            ApiError::MethodNotAllowed { allow } => {
                (status, [(header::ALLOW, allow)], Json(self.to_json())).into_response()
            }
            _ => (status, Json(self.to_json())).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::{Key, Kind};

    #[test]
    fn missing_key_maps_to_route_style_not_found() {
        let err: ApiError = DatastoreError::Missing(Key::new(Kind::Boat, 9)).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "No boat with this boat_id exists");
    }

    #[test]
    fn link_conflicts_map_to_forbidden() {
        let err: ApiError = LinkError::AlreadyOnAnotherBoat.into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.message(),
            "The specified load has already been assigned to another boat."
        );
    }

    #[test]
    fn error_body_uses_the_uniform_shape() {
        let err = ApiError::bad_request("nope");
        assert_eq!(err.to_json(), json!({"Error": "nope"}));
    }
}
