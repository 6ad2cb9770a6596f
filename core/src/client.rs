//! Stateless HTTP request builder and response parser for the push API.
//!
//! # Design
//! `OneSignalClient` holds only the base URL and the validated credentials and
//! carries no mutable state between calls. Each operation has a `build_*`
//! method that validates input, maps it to the wire format and produces an
//! `HttpRequest`; `parse_response` / `parse_is_valid` consume the
//! `HttpResponse`. Nothing here performs I/O.

use serde_json::{Map, Value};
use url::Url;

use crate::error::{ApiError, ProviderError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::mapper;
use crate::types::{ApiResponse, Credentials, Message, Targets};
use crate::validation::{self, Schema, ValidationError};

pub const DEFAULT_BASE_URL: &str = "https://onesignal.com/api/v1";

/// Page size requested by `build_view_notifications` when no options are given.
pub const DEFAULT_NOTIFICATION_LIMIT: u32 = 10;

#[derive(Debug, Clone)]
pub struct OneSignalClient {
    base_url: Url,
    credentials: Credentials,
}

impl OneSignalClient {
    pub fn new(credentials: Credentials) -> Result<Self, ValidationError> {
        Self::with_base_url(DEFAULT_BASE_URL, credentials)
    }

    /// Like `new`, against another host (a proxy or a local mock).
    pub fn with_base_url(base_url: &str, credentials: Credentials) -> Result<Self, ValidationError> {
        credentials.validate()?;
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ValidationError::invalid("baseUrl", "must be a valid URL"))?;
        Ok(Self {
            base_url,
            credentials,
        })
    }

    pub fn app_id(&self) -> &str {
        &self.credentials.app_id
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn build_get_app(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoint(&["apps", self.app_id()], &[]),
            headers: vec![authorization(&self.credentials.auth_key)],
            body: None,
        }
    }

    /// `message` is either `{en, es}` or `{heading, subtitle?, content}`.
    /// `options` is a free-form object merged into the payload; its optional
    /// `targets` member selects recipients (default: the `Test` segment).
    pub fn build_send_notification(
        &self,
        message: &Value,
        options: Option<&Value>,
    ) -> Result<HttpRequest, ApiError> {
        validation::validate(message, validation::message_schema(message))?;
        let message: Message = decode(message, "message")?;

        let mut extra = match options {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(options)) => options.clone(),
            Some(_) => return Err(ValidationError::invalid("options", "must be an object").into()),
        };

        let targets = match extra.shift_remove("targets") {
            None | Some(Value::Null) => None,
            Some(raw) => {
                validation::validate(&raw, &validation::TARGETS)?;
                Some(decode::<Targets>(&raw, "targets")?)
            }
        };

        let payload = mapper::merge_payload(
            extra,
            mapper::map_targets(targets.as_ref()),
            mapper::map_message(&message),
            self.app_id(),
        );

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint(&["notifications"], &[]),
            headers: vec![
                authorization(&self.credentials.rest_api_key),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body: Some(Value::Object(payload).to_string()),
        })
    }

    pub fn build_cancel_notification(&self, notification_id: &str) -> Result<HttpRequest, ApiError> {
        validation::validate_required_string(notification_id, "notification_id")?;
        Ok(self.rest_request(HttpMethod::Delete, &["notifications", notification_id], self.app_query()))
    }

    /// `options` may hold `limit`, `offset` and `kind`; other keys are passed
    /// through. Without options the first `DEFAULT_NOTIFICATION_LIMIT` are requested.
    pub fn build_view_notifications(&self, options: Option<&Value>) -> Result<HttpRequest, ApiError> {
        let query = match options {
            None | Some(Value::Null) => vec![
                ("limit".to_string(), DEFAULT_NOTIFICATION_LIMIT.to_string()),
                ("app_id".to_string(), self.app_id().to_string()),
            ],
            Some(options) => self.list_query(options, &validation::NOTIFICATION_LIST)?,
        };
        Ok(self.rest_request(HttpMethod::Get, &["notifications"], query))
    }

    pub fn build_view_notification(&self, notification_id: &str) -> Result<HttpRequest, ApiError> {
        validation::validate_required_string(notification_id, "notification_id")?;
        Ok(self.rest_request(HttpMethod::Get, &["notifications", notification_id], self.app_query()))
    }

    /// `options` may hold `limit` and `offset`. The provider applies its own
    /// page size when none is given.
    pub fn build_view_devices(&self, options: Option<&Value>) -> Result<HttpRequest, ApiError> {
        let query = match options {
            None | Some(Value::Null) => self.app_query(),
            Some(options) => self.list_query(options, &validation::DEVICE_LIST)?,
        };
        Ok(self.rest_request(HttpMethod::Get, &["players"], query))
    }

    pub fn build_view_device(&self, player_id: &str) -> Result<HttpRequest, ApiError> {
        validation::validate_required_string(player_id, "player_id")?;
        Ok(self.rest_request(HttpMethod::Get, &["players", player_id], self.app_query()))
    }

    /// Pass a 2xx response through; map anything else to an `ApiError`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<ApiResponse, ApiError> {
        check_status(&response)?;
        Ok(ApiResponse::from(response))
    }

    /// Interpret the reply to `build_get_app`: `true` when the app exists and
    /// is the configured one, `false` when the provider reports 404.
    pub fn parse_is_valid(&self, response: HttpResponse) -> Result<bool, ApiError> {
        match self.parse_response(response) {
            Ok(app) => Ok(app
                .body
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| id == self.app_id())),
            Err(ApiError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn rest_request(&self, method: HttpMethod, segments: &[&str], query: Vec<(String, String)>) -> HttpRequest {
        HttpRequest {
            method,
            url: self.endpoint(segments, &query),
            headers: vec![authorization(&self.credentials.rest_api_key)],
            body: None,
        }
    }

    fn app_query(&self) -> Vec<(String, String)> {
        vec![("app_id".to_string(), self.app_id().to_string())]
    }

    /// Caller options in their original order, then the configured `app_id`.
    fn list_query(&self, options: &Value, schema: &Schema) -> Result<Vec<(String, String)>, ValidationError> {
        validation::validate(options, schema)?;
        let mut query: Vec<(String, String)> = options
            .as_object()
            .into_iter()
            .flatten()
            .filter(|(key, value)| !value.is_null() && key.as_str() != "app_id")
            .map(|(key, value)| (key.clone(), mapper::query_value(value)))
            .collect();
        query.extend(self.app_query());
        Ok(query)
    }

    fn endpoint(&self, segments: &[&str], query: &[(String, String)]) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.set_query(Some(&mapper::build_query_string(query.iter().map(|(k, v)| (k, v)))));
        }
        url.into()
    }
}

/// The provider expects the raw key after `Basic`, not a base64 pair.
fn authorization(key: &str) -> (String, String) {
    ("authorization".to_string(), format!("Basic {key}"))
}

fn decode<T: serde::de::DeserializeOwned>(value: &Value, field: &str) -> Result<T, ValidationError> {
    serde_json::from_value(value.clone()).map_err(|e| ValidationError::new(field, format!("\"{field}\" {e}")))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let provider = ProviderError::from_body(&response.body);
    if response.status == 404 {
        return Err(ApiError::NotFound { provider });
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
        provider,
    })
}
