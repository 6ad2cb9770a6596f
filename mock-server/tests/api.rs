use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, APP_ID, AUTH_KEY, REST_API_KEY};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, key: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Basic {key}"))
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Basic {REST_API_KEY}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn create(app: &Router, body: Value) -> Value {
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/notifications", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// --- apps ---

#[tokio::test]
async fn get_app_returns_the_configured_app() {
    let resp = app()
        .oneshot(get(&format!("/apps/{APP_ID}"), AUTH_KEY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["id"], APP_ID);
}

#[tokio::test]
async fn get_app_unknown_id_is_404() {
    let resp = app()
        .oneshot(get("/apps/00000000-0000-0000-0000-000000000000", AUTH_KEY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["errors"][0], "Could not find app");
}

#[tokio::test]
async fn get_app_rejects_the_rest_key() {
    let resp = app()
        .oneshot(get(&format!("/apps/{APP_ID}"), REST_API_KEY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// --- notifications ---

#[tokio::test]
async fn create_notification_counts_test_segment() {
    let body = create(
        &app(),
        json!({
            "app_id": APP_ID,
            "included_segments": ["Test"],
            "contents": {"en": "Hi", "es": "Hola"}
        }),
    )
    .await;
    assert_eq!(body["recipients"], 1);
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn create_notification_without_english_is_400() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/notifications",
            &json!({"app_id": APP_ID, "included_segments": ["All"], "contents": {"es": "Hola"}}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_notification_wrong_app_is_400() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/notifications",
            &json!({"app_id": "other", "contents": {"en": "Hi"}}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["errors"][0], "app_id not found");
}

#[tokio::test]
async fn create_notification_with_no_match_reports_unsubscribed() {
    let body = create(
        &app(),
        json!({"app_id": APP_ID, "include_player_ids": ["nobody"], "contents": {"en": "Hi"}}),
    )
    .await;
    assert_eq!(body["recipients"], 0);
    assert_eq!(body["id"], "");
}

#[tokio::test]
async fn list_view_and_cancel_notifications() {
    let app = app();
    let first = create(
        &app,
        json!({"app_id": APP_ID, "included_segments": ["All"], "contents": {"en": "one"}}),
    )
    .await;
    create(
        &app,
        json!({"app_id": APP_ID, "included_segments": ["All"], "contents": {"en": "two"}}),
    )
    .await;

    let resp = app
        .clone()
        .oneshot(get(&format!("/notifications?limit=1&app_id={APP_ID}"), REST_API_KEY))
        .await
        .unwrap();
    let page = body_json(resp).await;
    assert_eq!(page["total_count"], 2);
    assert_eq!(page["limit"], 1);
    assert_eq!(page["notifications"][0]["contents"]["en"], "two");

    let id = first["id"].as_str().unwrap();
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/notifications/{id}?app_id={APP_ID}"))
                .header(http::header::AUTHORIZATION, format!("Basic {REST_API_KEY}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["success"], true);

    let resp = app
        .oneshot(get(&format!("/notifications/{id}?app_id={APP_ID}"), REST_API_KEY))
        .await
        .unwrap();
    let detail = body_json(resp).await;
    assert_eq!(detail["id"], id);
    assert_eq!(detail["canceled"], true);
}

#[tokio::test]
async fn list_notifications_filters_by_kind() {
    let app = app();
    create(
        &app,
        json!({"app_id": APP_ID, "included_segments": ["All"], "contents": {"en": "api"}}),
    )
    .await;
    let resp = app
        .oneshot(get(&format!("/notifications?kind=0&app_id={APP_ID}"), REST_API_KEY))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["total_count"], 0);
}

#[tokio::test]
async fn list_notifications_bad_offset_is_400() {
    let resp = app()
        .oneshot(get(&format!("/notifications?offset=text&app_id={APP_ID}"), REST_API_KEY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_notification_is_404() {
    let resp = app()
        .oneshot(get(
            &format!("/notifications/00000000-0000-0000-0000-000000000000?app_id={APP_ID}"),
            REST_API_KEY,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- players ---

#[tokio::test]
async fn list_players_pages() {
    let resp = app()
        .oneshot(get(&format!("/players?limit=2&app_id={APP_ID}"), REST_API_KEY))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["players"].as_array().unwrap().len(), 2);
    assert_eq!(body["total_count"], 3);
}

#[tokio::test]
async fn list_players_requires_app_id() {
    let resp = app()
        .oneshot(get("/players", REST_API_KEY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_player_by_id() {
    let resp = app()
        .oneshot(get(
            &format!("/players/107a32d0-371e-4aff-a5bf-65991e3dd47b?app_id={APP_ID}"),
            REST_API_KEY,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["identifier"], "fcm-token-0001");
}

#[tokio::test]
async fn get_player_unknown_is_404() {
    let resp = app()
        .oneshot(get(&format!("/players/missing?app_id={APP_ID}"), REST_API_KEY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
