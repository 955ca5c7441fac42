// User routes and the OAuth web flow.
//
// `/users/login` and `/users/signup` serve double duty: hit without a
// `code` query parameter they redirect the browser to the provider's
// consent screen, and the provider redirects back to the same route with
// the code. The outcome lands back on the front page with a query flag the
// front end turns into a banner: `?e=1` for signing up twice, `?e=2` for
// logging in before signing up.
use std::collections::HashMap;

use axum::extract::{Path, Query as QueryParams, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::oauth::Profile;
use crate::datastore::{Kind, Query};
use crate::error::ApiError;
use crate::models::User;
use crate::state::AppState;

use super::utils::{parse_id, RequestContext};

const MISSING_USER_MSG: &str = "No user with this user_id exists";

fn redirect(location: String) -> Response {
    (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response()
}

/// Public listing of every registered user, with the total count appended
/// as a `{"totalUsers": n}` sentinel.
pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Value>, ApiError> {
    let entities = state.store.run_query(&Query::kind(Kind::User)).await?;

    let mut items: Vec<Value> = entities
        .iter()
        .map(|e| Ok(User::from_entity(e)?.to_api(&ctx.base)))
        .collect::<Result<_, ApiError>>()?;
    let total = items.len();
    items.push(json!({ "totalUsers": total }));

    Ok(Json(Value::Array(items)))
}

pub async fn fetch(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let key = parse_id(&user_id, Kind::User)?;
    let entity = state
        .store
        .get(&key)
        .await?
        .ok_or_else(|| ApiError::not_found(MISSING_USER_MSG))?;
    Ok(Json(User::from_entity(&entity)?.to_api(&ctx.base)))
}

/// Completes the consent round-trip: code for token, token for profile.
async fn profile_for_code(
    state: &AppState,
    code: &str,
    redirect_uri: &str,
) -> Result<Profile, ApiError> {
    let token = state.oauth.exchange_code(code, redirect_uri).await?;
    Ok(state.oauth.fetch_profile(&token.access_token).await?)
}

async fn registered_user(state: &AppState, sub: &str) -> Result<Option<User>, ApiError> {
    let query = Query::kind(Kind::User).filter("sub", json!(sub)).limit(1);
    let matches = state.store.run_query(&query).await?;
    match matches.first() {
        Some(entity) => Ok(Some(User::from_entity(entity)?)),
        None => Ok(None),
    }
}

fn consent_redirect(state: &AppState, redirect_uri: &str) -> Result<Response, ApiError> {
    let anti_forgery = Uuid::new_v4().simple().to_string();
    let url = state
        .oauth
        .authorization_url(redirect_uri, &anti_forgery)
        .map_err(|e| {
            tracing::error!(error = %e, "could not build consent-screen url");
            ApiError::internal("An error occurred while processing your request.")
        })?;
    Ok(redirect(url.into()))
}

pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let redirect_uri = format!("{}/users/login", ctx.base);
    let Some(code) = params.get("code") else {
        return consent_redirect(&state, &redirect_uri);
    };

    let profile = profile_for_code(&state, code, &redirect_uri).await?;
    match registered_user(&state, &profile.sub).await? {
        Some(_) => Ok(redirect("/".to_string())),
        // logging in without having signed up
        None => Ok(redirect("/?e=2".to_string())),
    }
}

pub async fn signup(
    State(state): State<AppState>,
    ctx: RequestContext,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let redirect_uri = format!("{}/users/signup", ctx.base);
    let Some(code) = params.get("code") else {
        return consent_redirect(&state, &redirect_uri);
    };

    let profile = profile_for_code(&state, code, &redirect_uri).await?;
    if registered_user(&state, &profile.sub).await?.is_some() {
        // already signed up
        return Ok(redirect("/?e=1".to_string()));
    }

    let user = User::new(
        profile.sub,
        profile.given_name.unwrap_or_default(),
        profile.family_name.unwrap_or_default(),
    );
    state.store.insert(Kind::User, user.to_doc()).await?;
    Ok(redirect("/".to_string()))
}
