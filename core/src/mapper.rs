//! Translation from the request model to the provider's wire format.
//!
//! Every function here is pure and total over validated input.

use serde_json::{json, Map, Value};
use url::form_urlencoded;

use crate::types::{LocalizedText, Message, TargetKind, Targets};

/// Segment used when a notification names no recipients, so that a missing
/// target never broadcasts to every subscriber.
pub const DEFAULT_SEGMENT: &str = "Test";

pub fn map_message(message: &Message) -> Map<String, Value> {
    let mut fields = Map::new();
    match message {
        Message::Structured {
            heading,
            subtitle,
            content,
        } => {
            fields.insert("headings".to_string(), locales(heading));
            if let Some(subtitle) = subtitle {
                fields.insert("subtitle".to_string(), locales(subtitle));
            }
            fields.insert("contents".to_string(), locales(content));
        }
        Message::Flat(text) => {
            fields.insert("contents".to_string(), locales(text));
        }
    }
    fields
}

pub fn map_targets(targets: Option<&Targets>) -> Map<String, Value> {
    let mut fields = Map::new();
    let Some(targets) = targets else {
        fields.insert("included_segments".to_string(), json!([DEFAULT_SEGMENT]));
        return fields;
    };

    let value = json!(targets.to.value);
    match targets.to.kind {
        TargetKind::Segments => {
            fields.insert("included_segments".to_string(), value);
            if let Some(filters) = &targets.filters {
                fields.insert("filters".to_string(), Value::Array(filters.clone()));
            }
        }
        TargetKind::Users => {
            fields.insert("include_player_ids".to_string(), value);
        }
        TargetKind::Externals => {
            fields.insert("include_external_user_ids".to_string(), value);
        }
    }
    fields
}

/// Build the notification body. Later layers overwrite earlier ones on key
/// collision: `extra` < `targets` < `message` < `app_id`.
pub fn merge_payload(
    extra: Map<String, Value>,
    targets: Map<String, Value>,
    message: Map<String, Value>,
    app_id: &str,
) -> Map<String, Value> {
    let mut payload = extra;
    payload.extend(targets);
    payload.extend(message);
    payload.insert("app_id".to_string(), Value::String(app_id.to_string()));
    payload
}

/// `key=value` pairs joined by `&`, in the given order, form-urlencoded.
pub fn build_query_string<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key.as_ref(), value.as_ref());
    }
    serializer.finish()
}

pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}

/// Render a JSON option value for a query string. Strings are used as-is,
/// anything else in its JSON text form.
pub fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn locales(text: &LocalizedText) -> Value {
    json!({"en": text.en, "es": text.es})
}
