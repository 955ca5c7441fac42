// Load routes. Loads have no owner: reads are public, mutations require an
// authenticated caller but no ownership check.
use std::collections::HashMap;

use axum::extract::{Path, Query as QueryParams, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use serde_json::Value;

use crate::datastore::{Key, Kind, Query};
use crate::error::ApiError;
use crate::middleware::auth::AuthContext;
use crate::middleware::content::JsonBody;
use crate::models::{Boat, Load};
use crate::pagination::{page_number, paginate};
use crate::relationship;
use crate::state::AppState;

use super::utils::{object_body, parse_id, reject_extra_keys, RequestContext};

const MISSING_LOAD_MSG: &str = "No load with this load_id exists";
const NO_VALID_ATTRIBUTES_MSG: &str = "The request object contains no valid attributes.";
const MISSING_ATTRIBUTES_MSG: &str =
    "The request object is missing at least one of the required attributes";

async fn fetch_load(state: &AppState, key: Key) -> Result<Load, ApiError> {
    let entity = state
        .store
        .get(&key)
        .await?
        .ok_or_else(|| ApiError::not_found(MISSING_LOAD_MSG))?;
    Ok(Load::from_entity(&entity)?)
}

/// Expands a load's carrier key to the `{id, name, self}` boat summary. A
/// carrier pointing at a deleted boat renders as null; the dangling key is
/// the documented repair window of the two-document link.
async fn carrier_of(state: &AppState, load: &Load) -> Result<Option<Boat>, ApiError> {
    let Some(carrier_key) = load.carrier else {
        return Ok(None);
    };
    match state.store.get(&carrier_key).await? {
        Some(entity) => Ok(Some(Boat::from_entity(&entity)?)),
        None => Ok(None),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ctx: RequestContext,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    auth.subject()?;
    let body = object_body(body)?;
    reject_extra_keys(&body, &Load::REQUIRED_FIELDS)?;

    let mut load = Load::from_payload(&body)?;
    load.validate()?;

    let key = state.store.insert(Kind::Load, load.to_doc()).await?;
    load.key = Some(key);

    Ok((StatusCode::CREATED, Json(load.to_api(&ctx.base, None))).into_response())
}

pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let page = page_number(params.get("page").map(String::as_str));
    let page_size = state.config.pagination.loads_page_size;
    let query = Query::kind(Kind::Load);
    let results = paginate(state.store.as_ref(), &query, page, page_size).await?;

    let mut items = Vec::with_capacity(results.entities.len() + 1);
    for entity in &results.entities {
        let load = Load::from_entity(entity)?;
        let carrier = carrier_of(&state, &load).await?;
        items.push(load.to_api(&ctx.base, carrier.as_ref()));
    }
    if results.has_next {
        items.push(super::utils::next_sentinel(ctx.page_url(Kind::Load, page + 1)));
    }

    Ok(Json(Value::Array(items)))
}

pub async fn fetch(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(load_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let key = parse_id(&load_id, Kind::Load)?;
    let load = fetch_load(&state, key).await?;
    let carrier = carrier_of(&state, &load).await?;
    Ok(Json(load.to_api(&ctx.base, carrier.as_ref())))
}

pub async fn patch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ctx: RequestContext,
    Path(load_id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    auth.subject()?;
    let key = parse_id(&load_id, Kind::Load)?;
    let body = object_body(body)?;
    reject_extra_keys(&body, &Load::REQUIRED_FIELDS)?;

    let mut load = fetch_load(&state, key).await?;
    if !load.update_fields(&body) {
        return Err(ApiError::bad_request(NO_VALID_ATTRIBUTES_MSG));
    }
    load.validate()?;

    state.store.update(&key, load.to_doc()).await?;
    let carrier = carrier_of(&state, &load).await?;
    Ok(Json(load.to_api(&ctx.base, carrier.as_ref())))
}

pub async fn replace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ctx: RequestContext,
    Path(load_id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    auth.subject()?;
    let key = parse_id(&load_id, Kind::Load)?;
    let body = object_body(body)?;
    reject_extra_keys(&body, &Load::REQUIRED_FIELDS)?;

    let mut load = fetch_load(&state, key).await?;
    if !load.update_all_fields(&body) {
        return Err(ApiError::bad_request(MISSING_ATTRIBUTES_MSG));
    }
    load.validate()?;

    state.store.update(&key, load.to_doc()).await?;
    Ok((
        StatusCode::SEE_OTHER,
        [(header::LOCATION, ctx.self_url(&key))],
    )
        .into_response())
}

/// Deletes a load, first removing it from its carrier's `loads` sequence.
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(load_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    auth.subject()?;
    let key = parse_id(&load_id, Kind::Load)?;

    let load = fetch_load(&state, key).await?;
    relationship::detach_from_carrier(state.store.as_ref(), &load).await?;

    state.store.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}
