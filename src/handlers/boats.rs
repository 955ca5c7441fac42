// Boat routes. Every boat is owned by the authenticated subject that
// created it; all single-boat routes are owner-scoped.
use std::collections::HashMap;

use axum::extract::{Path, Query as QueryParams, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use serde_json::{json, Value};

use crate::datastore::{Key, Kind, Query};
use crate::error::ApiError;
use crate::middleware::auth::{AuthContext, UNAUTHENTICATED_MSG};
use crate::middleware::content::JsonBody;
use crate::models::{Boat, Load};
use crate::pagination::{page_number, paginate};
use crate::relationship;
use crate::state::AppState;

use super::utils::{object_body, parse_id, reject_extra_keys, RequestContext};

const MISSING_BOAT_MSG: &str = "No boat with this boat_id exists";
const NOT_OWNER_MSG: &str = "You do not own this boat.";
const DUPLICATE_NAME_MSG: &str = "A boat with this name already exists.";
const NO_VALID_ATTRIBUTES_MSG: &str = "The request object contains no valid attributes.";
const MISSING_ATTRIBUTES_MSG: &str =
    "The request object is missing at least one of the required attributes";

/// Fetches a boat or 404s with the route-style message.
async fn fetch_boat(state: &AppState, key: Key) -> Result<Boat, ApiError> {
    let entity = state
        .store
        .get(&key)
        .await?
        .ok_or_else(|| ApiError::not_found(MISSING_BOAT_MSG))?;
    Ok(Boat::from_entity(&entity)?)
}

/// Fetches a boat the requester must own.
async fn fetch_owned_boat(state: &AppState, key: Key, sub: &str) -> Result<Boat, ApiError> {
    let boat = fetch_boat(state, key).await?;
    if boat.owner != sub {
        return Err(ApiError::forbidden(NOT_OWNER_MSG));
    }
    Ok(boat)
}

/// Boat names are unique across all owners. `exclude` skips the boat being
/// renamed so an unchanged name does not collide with itself.
async fn name_is_taken(
    state: &AppState,
    name: &str,
    exclude: Option<Key>,
) -> Result<bool, ApiError> {
    let query = Query::kind(Kind::Boat).filter("name", json!(name));
    let matches = state.store.run_query(&query).await?;
    Ok(matches
        .iter()
        .any(|e| exclude.map_or(true, |k| !e.key.same_entity(&k))))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ctx: RequestContext,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let sub = auth.registered_subject()?.to_string();
    let body = object_body(body)?;
    reject_extra_keys(&body, &Boat::REQUIRED_FIELDS)?;

    let mut boat = Boat::from_payload(&body, &sub)?;
    boat.validate()?;
    if name_is_taken(&state, &boat.name, None).await? {
        return Err(ApiError::forbidden(DUPLICATE_NAME_MSG));
    }

    let key = state.store.insert(Kind::Boat, boat.to_doc()).await?;
    boat.key = Some(key);

    Ok((StatusCode::CREATED, Json(boat.to_api(&ctx.base))).into_response())
}

/// Owner-scoped listing for an authenticated caller, public listing for an
/// anonymous one. A well-formed token that failed verification is 401, not
/// a silent fallback to the public view.
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ctx: RequestContext,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    if auth.token_presented && !auth.authenticated {
        return Err(ApiError::unauthorized(UNAUTHENTICATED_MSG));
    }

    let mut query = Query::kind(Kind::Boat);
    if let Ok(sub) = auth.subject() {
        query = query.filter("owner", json!(sub));
    }

    let page = page_number(params.get("page").map(String::as_str));
    let page_size = state.config.pagination.boats_page_size;
    let results = paginate(state.store.as_ref(), &query, page, page_size).await?;

    let mut items: Vec<Value> = results
        .entities
        .iter()
        .map(|e| Ok(Boat::from_entity(e)?.to_api(&ctx.base)))
        .collect::<Result<_, ApiError>>()?;
    if results.has_next {
        items.push(super::utils::next_sentinel(ctx.page_url(Kind::Boat, page + 1)));
    }

    Ok(Json(Value::Array(items)))
}

pub async fn fetch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ctx: RequestContext,
    Path(boat_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let sub = auth.subject()?.to_string();
    let key = parse_id(&boat_id, Kind::Boat)?;

    let boat = fetch_owned_boat(&state, key, &sub).await?;
    Ok(Json(boat.to_api(&ctx.base)))
}

pub async fn patch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ctx: RequestContext,
    Path(boat_id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    let sub = auth.subject()?.to_string();
    let key = parse_id(&boat_id, Kind::Boat)?;
    let body = object_body(body)?;
    reject_extra_keys(&body, &Boat::REQUIRED_FIELDS)?;

    let mut boat = fetch_owned_boat(&state, key, &sub).await?;
    if !boat.update_fields(&body) {
        return Err(ApiError::bad_request(NO_VALID_ATTRIBUTES_MSG));
    }
    boat.validate()?;
    if name_is_taken(&state, &boat.name, Some(key)).await? {
        return Err(ApiError::forbidden(DUPLICATE_NAME_MSG));
    }

    state.store.update(&key, boat.to_doc()).await?;
    Ok(Json(boat.to_api(&ctx.base)))
}

/// Full replacement. Succeeds with 303 See Other pointing at the updated
/// boat rather than echoing the representation.
pub async fn replace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ctx: RequestContext,
    Path(boat_id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let sub = auth.subject()?.to_string();
    let key = parse_id(&boat_id, Kind::Boat)?;
    let body = object_body(body)?;
    reject_extra_keys(&body, &Boat::REQUIRED_FIELDS)?;

    let mut boat = fetch_owned_boat(&state, key, &sub).await?;
    if !boat.update_all_fields(&body) {
        return Err(ApiError::bad_request(MISSING_ATTRIBUTES_MSG));
    }
    boat.validate()?;
    if name_is_taken(&state, &boat.name, Some(key)).await? {
        return Err(ApiError::forbidden(DUPLICATE_NAME_MSG));
    }

    state.store.update(&key, boat.to_doc()).await?;
    Ok((
        StatusCode::SEE_OTHER,
        [(header::LOCATION, ctx.self_url(&key))],
    )
        .into_response())
}

/// Deletes a boat after clearing the carrier on every load it holds. If any
/// carrier write fails the boat is kept so the relationship stays
/// repairable, and the whole request reports the store outage.
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(boat_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let sub = auth.subject()?.to_string();
    let key = parse_id(&boat_id, Kind::Boat)?;

    let boat = fetch_owned_boat(&state, key, &sub).await?;
    let report = relationship::cascade_unlink_all(state.store.as_ref(), &boat).await;
    if !report.failures.is_empty() {
        return Err(ApiError::service_unavailable(
            "The datastore is temporarily unavailable.",
        ));
    }

    state.store.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn attach_load(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((boat_id, load_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let sub = auth.subject()?.to_string();
    let boat_key = parse_id(&boat_id, Kind::Boat)?;
    let load_key = parse_id(&load_id, Kind::Load)?;

    relationship::link(state.store.as_ref(), boat_key, load_key, &sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn detach_load(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((boat_id, load_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let sub = auth.subject()?.to_string();
    let boat_key = parse_id(&boat_id, Kind::Boat)?;
    let load_key = parse_id(&load_id, Kind::Load)?;

    relationship::unlink(state.store.as_ref(), boat_key, load_key, &sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Public view of the loads on one boat. Loads whose documents have gone
/// missing under the boat's feet are skipped rather than failing the
/// listing.
pub async fn list_loads(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(boat_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let key = parse_id(&boat_id, Kind::Boat)?;
    let entity = state
        .store
        .get(&key)
        .await?
        .ok_or_else(|| ApiError::not_found("The specified boat does not exist."))?;
    let boat = Boat::from_entity(&entity)?;

    let mut loads = Vec::new();
    for load_key in &boat.loads {
        if let Some(entity) = state.store.get(load_key).await? {
            loads.push(Load::from_entity(&entity)?.to_api_without_carrier(&ctx.base));
        }
    }

    Ok(Json(Value::Array(loads)))
}
