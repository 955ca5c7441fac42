mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{error_message, spawn_app};

#[tokio::test]
async fn create_requires_authentication_but_not_registration() {
    let app = spawn_app().await;
    let payload = json!({"volume": 12, "content": "Fish", "creation_date": "2021-05-27"});

    let (status, body) = app.request(Method::POST, "/loads", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        error_message(&body),
        "A valid JWT is required to access this endpoint."
    );

    // any verified subject may create loads, signed up or not
    let (status, body) = app
        .request(Method::POST, "/loads", Some("token-new"), Some(payload))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["volume"], json!(12));
    assert_eq!(body["carrier"], json!(null));
    let id = body["id"].as_i64().unwrap();
    assert_eq!(body["self"], json!(format!("http://api.test/loads/{id}")));
}

#[tokio::test]
async fn create_validates_the_body() {
    let app = spawn_app().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/loads",
            Some("token-u1"),
            Some(json!({"volume": 12, "content": "Fish"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&body),
        "The request object is missing at least one of the required attributes"
    );

    let (status, body) = app
        .request(
            Method::POST,
            "/loads",
            Some("token-u1"),
            Some(json!({"volume": "a lot", "content": "Fish", "creation_date": "2021-05-27"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&body),
        "The load volume is invalid. Volumes must be an integer."
    );
}

#[tokio::test]
async fn reads_are_public() {
    let app = spawn_app().await;
    let key = app.seed_load("Fish").await;

    let (status, body) = app
        .request(Method::GET, &format!("/loads/{}", key.id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], json!("Fish"));
    assert_eq!(body["carrier"], json!(null));

    let (status, body) = app.request(Method::GET, "/loads/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "No load with this load_id exists");

    let (status, body) = app.request(Method::GET, "/loads/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "The load_id you specified is not valid.");
}

#[tokio::test]
async fn linking_updates_both_sides_of_the_relationship() {
    let app = spawn_app().await;
    let boat = app.seed_boat("Sea Witch", "u1").await;
    let load = app.seed_load("Fish").await;
    let link_path = format!("/boats/{}/loads/{}", boat.id, load.id);

    let (status, _) = app.request(Method::PUT, &link_path, Some("token-u1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .request(Method::GET, &format!("/loads/{}", load.id), None, None)
        .await;
    assert_eq!(
        body["carrier"],
        json!({
            "id": boat.id,
            "name": "Sea Witch",
            "self": format!("http://api.test/boats/{}", boat.id)
        })
    );

    let (_, body) = app
        .request(Method::GET, &format!("/boats/{}", boat.id), Some("token-u1"), None)
        .await;
    assert_eq!(
        body["loads"],
        json!([{"id": load.id, "self": format!("http://api.test/loads/{}", load.id)}])
    );
}

#[tokio::test]
async fn a_load_is_carried_by_at_most_one_boat() {
    let app = spawn_app().await;
    let first = app.seed_boat("First", "u1").await;
    let second = app.seed_boat("Second", "u1").await;
    let load = app.seed_load("Fish").await;

    let path = format!("/boats/{}/loads/{}", first.id, load.id);
    let (status, _) = app.request(Method::PUT, &path, Some("token-u1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.request(Method::PUT, &path, Some("token-u1"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        error_message(&body),
        "The specified load has already been assigned to this boat."
    );

    let other = format!("/boats/{}/loads/{}", second.id, load.id);
    let (status, body) = app.request(Method::PUT, &other, Some("token-u1"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        error_message(&body),
        "The specified load has already been assigned to another boat."
    );
}

#[tokio::test]
async fn only_the_owner_manages_a_boats_loads() {
    let app = spawn_app().await;
    let boat = app.seed_boat("Sea Witch", "u1").await;
    let load = app.seed_load("Fish").await;
    let path = format!("/boats/{}/loads/{}", boat.id, load.id);

    let (status, body) = app.request(Method::PUT, &path, Some("token-u2"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_message(&body), "You do not own this boat.");
}

#[tokio::test]
async fn link_reports_missing_entities_precisely() {
    let app = spawn_app().await;
    let boat = app.seed_boat("Sea Witch", "u1").await;
    let load = app.seed_load("Fish").await;

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/boats/999/loads/{}", load.id),
            Some("token-u1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "The specified boat does not exist");

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/boats/{}/loads/999", boat.id),
            Some("token-u1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "The specified load does not exist");

    let (status, body) = app
        .request(Method::PUT, "/boats/999/loads/999", Some("token-u1"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "The specified boat and load does not exist");
}

#[tokio::test]
async fn unlink_restores_both_sides() {
    let app = spawn_app().await;
    let boat = app.seed_boat("Sea Witch", "u1").await;
    let other = app.seed_boat("Other", "u1").await;
    let load = app.seed_load("Fish").await;
    let path = format!("/boats/{}/loads/{}", boat.id, load.id);
    app.request(Method::PUT, &path, Some("token-u1"), None).await;

    // wrong boat
    let (status, body) = app
        .request(
            Method::DELETE,
            &format!("/boats/{}/loads/{}", other.id, load.id),
            Some("token-u1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_message(&body), "The specified load is not on this boat.");

    let (status, _) = app.request(Method::DELETE, &path, Some("token-u1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .request(Method::GET, &format!("/loads/{}", load.id), None, None)
        .await;
    assert_eq!(body["carrier"], json!(null));
    let (_, body) = app
        .request(Method::GET, &format!("/boats/{}", boat.id), Some("token-u1"), None)
        .await;
    assert_eq!(body["loads"], json!([]));
}

#[tokio::test]
async fn deleting_a_boat_frees_its_loads() {
    let app = spawn_app().await;
    let boat = app.seed_boat("Sea Witch", "u1").await;
    let load = app.seed_load("Fish").await;
    let path = format!("/boats/{}/loads/{}", boat.id, load.id);
    app.request(Method::PUT, &path, Some("token-u1"), None).await;

    let (status, _) = app
        .request(Method::DELETE, &format!("/boats/{}", boat.id), Some("token-u1"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .request(Method::GET, &format!("/loads/{}", load.id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["carrier"], json!(null));
}

#[tokio::test]
async fn deleting_a_load_edits_its_carrier() {
    let app = spawn_app().await;
    let boat = app.seed_boat("Sea Witch", "u1").await;
    let load = app.seed_load("Fish").await;
    let path = format!("/boats/{}/loads/{}", boat.id, load.id);
    app.request(Method::PUT, &path, Some("token-u1"), None).await;

    let (status, _) = app
        .request(Method::DELETE, &format!("/loads/{}", load.id), Some("token-u1"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .request(Method::GET, &format!("/boats/{}", boat.id), Some("token-u1"), None)
        .await;
    assert_eq!(body["loads"], json!([]));

    let (status, _) = app
        .request(Method::DELETE, &format!("/loads/{}", load.id), Some("token-u1"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn a_boats_load_listing_is_public() {
    let app = spawn_app().await;
    let boat = app.seed_boat("Sea Witch", "u1").await;
    let load = app.seed_load("Fish").await;
    app.request(
        Method::PUT,
        &format!("/boats/{}/loads/{}", boat.id, load.id),
        Some("token-u1"),
        None,
    )
    .await;

    let (status, body) = app
        .request(Method::GET, &format!("/boats/{}/loads", boat.id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    // a bare array, not an object wrapper
    let loads = body.as_array().unwrap();
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0]["content"], json!("Fish"));
    // nested summaries carry no carrier back-reference
    assert!(loads[0].get("carrier").is_none());

    // a boat with nothing aboard lists as an empty array
    let empty = app.seed_boat("Empty", "u1").await;
    let (status, body) = app
        .request(Method::GET, &format!("/boats/{}/loads", empty.id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = app.request(Method::GET, "/boats/999/loads", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "The specified boat does not exist.");
}

#[tokio::test]
async fn patch_and_put_follow_the_boat_update_contract() {
    let app = spawn_app().await;
    let load = app.seed_load("Fish").await;
    let path = format!("/loads/{}", load.id);

    let (status, body) = app
        .request(Method::PATCH, &path, Some("token-u1"), Some(json!({"volume": 20})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["volume"], json!(20));
    assert_eq!(body["content"], json!("Fish"));

    let (status, body) = app
        .request(Method::PUT, &path, Some("token-u1"), Some(json!({"volume": 25})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&body),
        "The request object is missing at least one of the required attributes"
    );

    let (status, _) = app
        .request(
            Method::PUT,
            &path,
            Some("token-u1"),
            Some(json!({"volume": 25, "content": "Tuna", "creation_date": "2021-06-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (_, body) = app.request(Method::GET, &path, None, None).await;
    assert_eq!(body["content"], json!("Tuna"));
}
