// Content negotiation: the API speaks JSON on both sides of the wire.
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::middleware::Next;
use axum::response::Response;
use axum::{async_trait, http::header, Json};
use serde_json::Value;

use crate::error::ApiError;

const ACCEPT_MSG: &str = "This endpoint only supports a Content-Type of application/json, please check your HTTP Accept headers.";
const MEDIA_TYPE_MSG: &str = "This endpoint only supports a Content-Type of application/json.";
const BAD_JSON_MSG: &str = "A Content-Type of application/json was specified in the header but there was a Syntax Error in the body of the request.";

/// Rejects requests whose Accept header cannot take a JSON response with
/// 406. A missing Accept header is rejected too, matching the documented
/// behavior of the endpoints this replaces.
pub async fn require_json_accept(request: Request, next: Next) -> Result<Response, ApiError> {
    let acceptable = request
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(accepts_json);

    if !acceptable {
        return Err(ApiError::not_acceptable(ACCEPT_MSG));
    }
    Ok(next.run(request).await)
}

fn accepts_json(accept: &str) -> bool {
    accept.split(',').any(|part| {
        let media_type = part.split(';').next().unwrap_or("").trim();
        media_type.eq_ignore_ascii_case("application/json")
            || media_type.eq_ignore_ascii_case("application/*")
            || media_type == "*/*"
    })
}

/// JSON request body with the error taxonomy applied: a non-JSON
/// Content-Type is 415, a syntactically broken body is 400, both with the
/// uniform error shape instead of axum's default rejections.
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(match rejection {
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::unsupported_media_type(MEDIA_TYPE_MSG)
                }
                JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
                    ApiError::bad_request(BAD_JSON_MSG)
                }
                _ => ApiError::bad_request("The request body could not be read."),
            }),
        }
    }
}
