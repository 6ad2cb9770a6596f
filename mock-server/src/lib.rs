//! In-memory emulation of the push provider's REST endpoints.
//!
//! Covers the routes the client uses: app lookup, notification create,
//! cancel, list and detail, device list and detail. Authorization is checked
//! the way the provider does it (`Basic <key>`, raw key), and failures are
//! reported with the provider's `{"errors": [...]}` body.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const APP_ID: &str = "5eb5a37e-b458-11e3-ac11-000c2940e62c";
pub const AUTH_KEY: &str = "mock-user-auth-key";
pub const REST_API_KEY: &str = "mock-rest-api-key";

const NOTIFICATION_PAGE: usize = 50;
const PLAYER_PAGE: usize = 300;
/// `kind` of notifications created through the API.
const KIND_API: u8 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub identifier: String,
    pub device_type: u8,
    pub language: String,
    pub session_count: u32,
    /// Set for devices registered as test devices; they form the `Test` segment.
    #[serde(default)]
    pub test_type: Option<u8>,
    #[serde(default)]
    pub external_user_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub app_id: String,
    pub kind: u8,
    pub contents: Value,
    #[serde(default)]
    pub headings: Option<Value>,
    #[serde(default)]
    pub subtitle: Option<Value>,
    #[serde(default)]
    pub send_after: Option<Value>,
    pub recipients: usize,
    pub canceled: bool,
}

/// Keys and seed data the emulated app starts with.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub app_id: String,
    pub auth_key: String,
    pub rest_api_key: String,
    pub players: Vec<Player>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            app_id: APP_ID.to_string(),
            auth_key: AUTH_KEY.to_string(),
            rest_api_key: REST_API_KEY.to_string(),
            players: seed_players(),
        }
    }
}

pub fn seed_players() -> Vec<Player> {
    let player = |id: &str, identifier: &str, test_type: Option<u8>, external: Option<&str>| Player {
        id: id.to_string(),
        identifier: identifier.to_string(),
        device_type: 1,
        language: "en".to_string(),
        session_count: 3,
        test_type,
        external_user_id: external.map(str::to_string),
    };
    vec![
        player("107a32d0-371e-4aff-a5bf-65991e3dd47b", "fcm-token-0001", Some(1), Some("customer-17")),
        player("2a9c4f6e-1b3d-4e5f-8a7b-9c0d1e2f3a4b", "fcm-token-0002", None, Some("customer-42")),
        player("3b0d5a7f-2c4e-4f60-9b8c-0d1e2f3a4b5c", "fcm-token-0003", None, None),
    ]
}

struct Inner {
    config: MockConfig,
    notifications: RwLock<Vec<Notification>>,
}

type Db = Arc<Inner>;

type Failure = (StatusCode, Json<Value>);

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let db: Db = Arc::new(Inner {
        config,
        notifications: RwLock::new(Vec::new()),
    });
    Router::new()
        .route("/apps/{id}", get(get_app))
        .route("/notifications", get(list_notifications).post(create_notification))
        .route(
            "/notifications/{id}",
            get(get_notification).delete(cancel_notification),
        )
        .route("/players", get(list_players))
        .route("/players/{id}", get(get_player))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

#[derive(Deserialize)]
pub struct AppQuery {
    pub app_id: Option<String>,
}

#[derive(Deserialize)]
pub struct NotificationListQuery {
    pub app_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub kind: Option<u8>,
}

#[derive(Deserialize)]
pub struct PlayerListQuery {
    pub app_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

fn failure(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "errors": [message] })))
}

fn authorize(headers: &HeaderMap, key: &str) -> Result<(), Failure> {
    let expected = format!("Basic {key}");
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(given) if given == expected => Ok(()),
        _ => Err(failure(
            StatusCode::FORBIDDEN,
            "Please include a case-sensitive header of Authorization: Basic <YOUR-REST-API-KEY-HERE> with a valid REST API key.",
        )),
    }
}

fn require_app(db: &Db, app_id: Option<&str>) -> Result<(), Failure> {
    match app_id {
        None => Err(failure(StatusCode::BAD_REQUEST, "app_id not found. You must specify an app_id.")),
        Some(id) if id == db.config.app_id => Ok(()),
        Some(_) => Err(failure(StatusCode::BAD_REQUEST, "app_id not found")),
    }
}

async fn get_app(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    authorize(&headers, &db.config.auth_key)?;
    if id != db.config.app_id {
        return Err(failure(StatusCode::NOT_FOUND, "Could not find app"));
    }
    Ok(Json(json!({
        "id": db.config.app_id,
        "name": "Mock App",
        "players": db.config.players.len(),
        "messageable_players": db.config.players.len(),
    })))
}

async fn create_notification(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Result<Json<Value>, Failure> {
    authorize(&headers, &db.config.rest_api_key)?;
    require_app(&db, input.get("app_id").and_then(Value::as_str))?;

    let Some(contents) = input.get("contents").filter(|c| c.get("en").is_some()) else {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "Message Notifications must have English language content",
        ));
    };

    let recipients = count_recipients(&db.config.players, &input);
    if recipients == 0 {
        return Ok(Json(json!({
            "id": "",
            "recipients": 0,
            "errors": ["All included players are not subscribed"],
        })));
    }

    let notification = Notification {
        id: Uuid::new_v4(),
        app_id: db.config.app_id.clone(),
        kind: KIND_API,
        contents: contents.clone(),
        headings: input.get("headings").cloned(),
        subtitle: input.get("subtitle").cloned(),
        send_after: input.get("send_after").cloned(),
        recipients,
        canceled: false,
    };
    tracing::debug!(id = %notification.id, recipients, "notification created");
    db.notifications.write().await.push(notification.clone());

    Ok(Json(json!({
        "id": notification.id,
        "recipients": recipients,
        "external_id": null,
    })))
}

fn count_recipients(players: &[Player], input: &Value) -> usize {
    let listed = |key: &str| -> Option<Vec<String>> {
        input.get(key)?.as_array().map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
    };

    if let Some(ids) = listed("include_player_ids") {
        return players.iter().filter(|p| ids.contains(&p.id)).count();
    }
    if let Some(ids) = listed("include_external_user_ids") {
        return players
            .iter()
            .filter(|p| p.external_user_id.as_ref().is_some_and(|e| ids.contains(e)))
            .count();
    }
    match listed("included_segments") {
        Some(segments) if segments.iter().any(|s| s == "All" || s == "Subscribed Users") => players.len(),
        Some(segments) if segments.iter().any(|s| s == "Test") => {
            players.iter().filter(|p| p.test_type.is_some()).count()
        }
        _ => 0,
    }
}

async fn list_notifications(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Value>, Failure> {
    authorize(&headers, &db.config.rest_api_key)?;
    require_app(&db, query.app_id.as_deref())?;

    let limit = query.limit.unwrap_or(NOTIFICATION_PAGE);
    let offset = query.offset.unwrap_or(0);
    let notifications = db.notifications.read().await;
    let matching: Vec<&Notification> = notifications
        .iter()
        .rev()
        .filter(|n| query.kind.map_or(true, |kind| n.kind == kind))
        .collect();
    let page: Vec<&Notification> = matching.iter().skip(offset).take(limit).copied().collect();

    Ok(Json(json!({
        "total_count": matching.len(),
        "offset": offset,
        "limit": limit,
        "notifications": page,
    })))
}

async fn get_notification(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<AppQuery>,
) -> Result<Json<Notification>, Failure> {
    authorize(&headers, &db.config.rest_api_key)?;
    require_app(&db, query.app_id.as_deref())?;

    let notifications = db.notifications.read().await;
    notifications
        .iter()
        .find(|n| n.id.to_string() == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Notification not found"))
}

async fn cancel_notification(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<AppQuery>,
) -> Result<Json<Value>, Failure> {
    authorize(&headers, &db.config.rest_api_key)?;
    require_app(&db, query.app_id.as_deref())?;

    let mut notifications = db.notifications.write().await;
    let notification = notifications
        .iter_mut()
        .find(|n| n.id.to_string() == id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Notification not found"))?;
    notification.canceled = true;
    Ok(Json(json!({ "success": true })))
}

async fn list_players(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<PlayerListQuery>,
) -> Result<Json<Value>, Failure> {
    authorize(&headers, &db.config.rest_api_key)?;
    require_app(&db, query.app_id.as_deref())?;

    let limit = query.limit.unwrap_or(PLAYER_PAGE).min(PLAYER_PAGE);
    let offset = query.offset.unwrap_or(0);
    let page: Vec<&Player> = db.config.players.iter().skip(offset).take(limit).collect();

    Ok(Json(json!({
        "total_count": db.config.players.len(),
        "offset": offset,
        "limit": limit,
        "players": page,
    })))
}

async fn get_player(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<AppQuery>,
) -> Result<Json<Player>, Failure> {
    authorize(&headers, &db.config.rest_api_key)?;
    require_app(&db, query.app_id.as_deref())?;

    db.config
        .players
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "No user with this id found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_serializes_to_json() {
        let notification = Notification {
            id: Uuid::nil(),
            app_id: APP_ID.to_string(),
            kind: KIND_API,
            contents: json!({"en": "Hi", "es": "Hola"}),
            headings: None,
            subtitle: None,
            send_after: None,
            recipients: 1,
            canceled: false,
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["contents"]["es"], "Hola");
        assert_eq!(json["canceled"], false);
    }

    #[test]
    fn test_segment_counts_test_devices_only() {
        let players = seed_players();
        let input = json!({"included_segments": ["Test"]});
        assert_eq!(count_recipients(&players, &input), 1);
    }

    #[test]
    fn all_segment_counts_every_device() {
        let players = seed_players();
        assert_eq!(count_recipients(&players, &json!({"included_segments": ["All"]})), 3);
    }

    #[test]
    fn explicit_ids_count_known_devices() {
        let players = seed_players();
        let input = json!({"include_player_ids": ["107a32d0-371e-4aff-a5bf-65991e3dd47b", "unknown"]});
        assert_eq!(count_recipients(&players, &input), 1);

        let input = json!({"include_external_user_ids": ["customer-17", "customer-42"]});
        assert_eq!(count_recipients(&players, &input), 2);
    }

    #[test]
    fn no_targeting_reaches_nobody() {
        assert_eq!(count_recipients(&seed_players(), &json!({"contents": {"en": "x"}})), 0);
    }

    #[test]
    fn player_defaults_optional_fields() {
        let player: Player = serde_json::from_str(
            r#"{"id":"p","identifier":"t","device_type":0,"language":"es","session_count":1}"#,
        )
        .unwrap();
        assert!(player.test_type.is_none());
        assert!(player.external_user_id.is_none());
    }
}
