//! Request model and response wrapper for the push API.
//!
//! # Design
//! Callers may hand the client loosely-shaped JSON (validated field by field)
//! or build these types directly and convert them with `serde_json::to_value`.
//! After validation the client deserializes into these types, so the mapper
//! only ever sees well-formed input.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::http::HttpResponse;
use crate::validation::{self, ValidationError};

pub const AUTH_KEY_ENV: &str = "ONESIGNAL_AUTH_KEY";
pub const REST_API_KEY_ENV: &str = "ONESIGNAL_REST_API_KEY";
pub const APP_ID_ENV: &str = "ONESIGNAL_APP_ID";

/// The three keys the provider issues. Checked once when a client is built.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub auth_key: String,
    pub rest_api_key: String,
    pub app_id: String,
}

impl Credentials {
    pub fn new(
        auth_key: impl Into<String>,
        rest_api_key: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            auth_key: auth_key.into(),
            rest_api_key: rest_api_key.into(),
            app_id: app_id.into(),
        }
    }

    /// Read `ONESIGNAL_AUTH_KEY`, `ONESIGNAL_REST_API_KEY` and
    /// `ONESIGNAL_APP_ID`. Unset variables become empty strings, which
    /// `validate` then reports by field name.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self::new(var(AUTH_KEY_ENV), var(REST_API_KEY_ENV), var(APP_ID_ENV))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let value = json!({
            "authKey": self.auth_key,
            "restApiKey": self.rest_api_key,
            "appId": self.app_id,
        });
        validation::validate(&value, &validation::CREDENTIALS)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_key", &"<redacted>")
            .field("rest_api_key", &"<redacted>")
            .field("app_id", &self.app_id)
            .finish()
    }
}

/// One text in both supported locales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    pub es: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, es: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            es: es.into(),
        }
    }
}

/// Notification text. Both historical shapes are accepted; the structured
/// one carries a heading and optional subtitle next to the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Structured {
        heading: LocalizedText,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtitle: Option<LocalizedText>,
        content: LocalizedText,
    },
    Flat(LocalizedText),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Segments,
    Users,
    Externals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSelection {
    #[serde(rename = "type")]
    pub kind: TargetKind,
    pub value: Vec<String>,
}

/// Who receives a notification. `filters` only applies to segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    pub to: TargetSelection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Value>>,
}

impl Targets {
    pub fn segments<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::of(TargetKind::Segments, names)
    }

    pub fn users<S: Into<String>>(player_ids: impl IntoIterator<Item = S>) -> Self {
        Self::of(TargetKind::Users, player_ids)
    }

    pub fn externals<S: Into<String>>(external_ids: impl IntoIterator<Item = S>) -> Self {
        Self::of(TargetKind::Externals, external_ids)
    }

    pub fn with_filters(mut self, filters: Vec<Value>) -> Self {
        self.filters = Some(filters);
        self
    }

    fn of<S: Into<String>>(kind: TargetKind, value: impl IntoIterator<Item = S>) -> Self {
        Self {
            to: TargetSelection {
                kind,
                value: value.into_iter().map(Into::into).collect(),
            },
            filters: None,
        }
    }
}

/// A successful provider reply, passed through untouched.
///
/// `body` is the parsed JSON, `Value::String` holding the raw text when the
/// body is not JSON, or `Value::Null` when it is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl From<HttpResponse> for ApiResponse {
    fn from(response: HttpResponse) -> Self {
        let body = if response.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response.body).unwrap_or(Value::String(response.body))
        };
        Self {
            status: response.status,
            headers: response.headers,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_deserializes_either_shape() {
        let flat: Message = serde_json::from_value(json!({"en": "Hi", "es": "Hola"})).unwrap();
        assert_eq!(flat, Message::Flat(LocalizedText::new("Hi", "Hola")));

        let structured: Message = serde_json::from_value(json!({
            "heading": {"en": "T", "es": "T"},
            "content": {"en": "B", "es": "C"}
        }))
        .unwrap();
        assert!(matches!(structured, Message::Structured { subtitle: None, .. }));
    }

    #[test]
    fn targets_serialize_with_wire_type_names() {
        let targets = Targets::externals(["crm-17"]);
        let value = serde_json::to_value(&targets).unwrap();
        assert_eq!(value, json!({"to": {"type": "externals", "value": ["crm-17"]}}));
    }

    #[test]
    fn credentials_use_camel_case_and_hide_keys() {
        let creds = Credentials::new("auth", "rest", "5eb5a37e-b458-11e3-ac11-000c2940e62c");
        let value = serde_json::to_value(&creds).unwrap();
        assert_eq!(value["restApiKey"], "rest");

        let debug = format!("{creds:?}");
        assert!(!debug.contains("auth\""));
        assert!(debug.contains("<redacted>"));
    }

    // Sole test that touches the ONESIGNAL_* variables.
    #[test]
    fn credentials_load_from_env_and_fail_on_unset_keys() {
        std::env::set_var(AUTH_KEY_ENV, "env-auth");
        std::env::set_var(REST_API_KEY_ENV, "env-rest");
        std::env::set_var(APP_ID_ENV, "5eb5a37e-b458-11e3-ac11-000c2940e62c");
        let creds = Credentials::from_env();
        assert_eq!(creds, Credentials::new("env-auth", "env-rest", "5eb5a37e-b458-11e3-ac11-000c2940e62c"));
        assert!(crate::OneSignalClient::new(creds).is_ok());

        std::env::remove_var(AUTH_KEY_ENV);
        let creds = Credentials::from_env();
        assert_eq!(creds.auth_key, "");
        let err = crate::OneSignalClient::new(creds).unwrap_err();
        assert_eq!(err.field, "authKey");
        assert_eq!(err.to_string(), "\"authKey\" is required");

        std::env::remove_var(REST_API_KEY_ENV);
        std::env::remove_var(APP_ID_ENV);
    }

    #[test]
    fn response_body_falls_back_to_raw_text() {
        let json_body = ApiResponse::from(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"id":"abc"}"#.to_string(),
        });
        assert_eq!(json_body.body["id"], "abc");

        let raw = ApiResponse::from(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "OK".to_string(),
        });
        assert_eq!(raw.body, Value::String("OK".to_string()));

        let empty = ApiResponse::from(HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        });
        assert!(empty.body.is_null());
    }
}
