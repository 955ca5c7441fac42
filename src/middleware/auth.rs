// Bearer-token middleware.
//
// Every request is tagged with an `AuthContext` extension; routes decide
// what level of access they require. The per-request state machine:
// no Authorization header, or a header that is not a two-part Bearer pair,
// means no token; an extracted token is verified against the provider's
// keys; a verified subject is then checked against the User collection for
// registration. A token that is not decodable at all fails the request with
// 400 instead of degrading to unauthenticated.
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::json;

use crate::auth::VerifyOutcome;
use crate::datastore::{Kind, Query};
use crate::error::ApiError;
use crate::state::AppState;

pub const UNAUTHENTICATED_MSG: &str = "A valid JWT is required to access this endpoint.";
pub const UNREGISTERED_MSG: &str = "You must register before using this endpoint.";

/// Authenticated-identity tag attached to every request.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    /// A well-formed `Bearer <token>` pair was presented (whether or not it
    /// verified). Lets listing routes distinguish "no token" from "bad
    /// token".
    pub token_presented: bool,
    pub authenticated: bool,
    pub sub: Option<String>,
    pub is_registered: bool,
}

impl AuthContext {
    /// The verified subject, or 401.
    pub fn subject(&self) -> Result<&str, ApiError> {
        match (&self.sub, self.authenticated) {
            (Some(sub), true) => Ok(sub),
            _ => Err(ApiError::unauthorized(UNAUTHENTICATED_MSG)),
        }
    }

    /// The verified subject of a registered user; 401 or 403 otherwise.
    pub fn registered_subject(&self) -> Result<&str, ApiError> {
        let sub = self.subject()?;
        if !self.is_registered {
            return Err(ApiError::forbidden(UNREGISTERED_MSG));
        }
        Ok(sub)
    }
}

pub async fn verify_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let mut ctx = AuthContext::default();

    if let Some(token) = extract_bearer(request.headers()) {
        ctx.token_presented = true;

        match state.verifier.verify(&token).await {
            VerifyOutcome::Valid { sub } => {
                ctx.authenticated = true;
                ctx.sub = Some(sub);
            }
            VerifyOutcome::Invalid => {}
            VerifyOutcome::Malformed => {
                return Err(ApiError::bad_request("The JWT you submitted was invalid."));
            }
            VerifyOutcome::ProviderUnavailable => {
                return Err(ApiError::bad_gateway(
                    "The identity provider could not be reached to verify the JWT.",
                ));
            }
        }

        if let Some(sub) = &ctx.sub {
            let query = Query::kind(Kind::User).filter("sub", json!(sub)).limit(1);
            let matches = state.store.run_query(&query).await?;
            ctx.is_registered = !matches.is_empty();
        }
    }

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Extracts the credentials of a two-part `Bearer <token>` header pair,
/// matching the scheme case-insensitively. Anything else is treated as no
/// token at all.
fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, credentials]
            if scheme.eq_ignore_ascii_case("bearer") && !credentials.is_empty() =>
        {
            Some((*credentials).to_string())
        }
        _ => None,
    }
}
