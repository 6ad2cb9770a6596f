//! Declarative input validation.
//!
//! # Design
//! A `Schema` is a static table of `Field` descriptors plus pairing rules,
//! interpreted by the single `validate` routine over a `serde_json::Value`.
//! Nested objects reuse the same routine and report dotted paths
//! (`heading.es`, `to.type`). The first failure wins; fields are checked in
//! declaration order after the pairing rules.

use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Input rejected before any request was built.
///
/// `Display` yields `message`, which always names the offending field, e.g.
/// `"es" is required` or `"offset" must be a number`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("\"{field}\" is required");
        Self { field, message }
    }

    /// `"<field>" <expectation>`, e.g. `invalid("limit", "must be a number")`.
    pub fn invalid(field: impl Into<String>, expectation: &str) -> Self {
        let field = field.into();
        let message = format!("\"{field}\" {expectation}");
        Self { field, message }
    }
}

/// Expected shape of a single field.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    /// Non-empty string. An empty string counts as missing.
    String,
    Number,
    /// String in GUID format.
    Guid,
    OneOf(&'static [&'static str]),
    NumberOneOf(&'static [i64]),
    /// Non-empty array of strings.
    StringList,
    ObjectList,
    Object(&'static Schema),
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub required: bool,
    pub kind: Kind,
}

impl Field {
    pub const fn required(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            required: true,
            kind,
        }
    }

    pub const fn optional(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            required: false,
            kind,
        }
    }
}

/// Validation rules for one JSON object.
#[derive(Debug)]
pub struct Schema {
    /// Label used when the value itself is not an object.
    pub name: &'static str,
    pub fields: &'static [Field],
    /// `(a, b)`: when `a` is present, `b` is required.
    pub pairs: &'static [(&'static str, &'static str)],
}

pub const TARGET_TYPES: &[&str] = &["segments", "users", "externals"];
pub const NOTIFICATION_KINDS: &[i64] = &[0, 1, 3];

pub static CREDENTIALS: Schema = Schema {
    name: "credentials",
    fields: &[
        Field::required("authKey", Kind::String),
        Field::required("restApiKey", Kind::String),
        Field::required("appId", Kind::Guid),
    ],
    pairs: &[],
};

static LOCALES: Schema = Schema {
    name: "locales",
    fields: &[
        Field::required("en", Kind::String),
        Field::required("es", Kind::String),
    ],
    pairs: &[("en", "es"), ("es", "en")],
};

/// `{en, es}`: the plain single-text message shape.
pub static FLAT_MESSAGE: Schema = Schema {
    name: "message",
    fields: &[
        Field::required("en", Kind::String),
        Field::required("es", Kind::String),
    ],
    pairs: &[("en", "es")],
};

/// `{heading, subtitle?, content}`, each a `{en, es}` pair.
pub static STRUCTURED_MESSAGE: Schema = Schema {
    name: "message",
    fields: &[
        Field::required("heading", Kind::Object(&LOCALES)),
        Field::optional("subtitle", Kind::Object(&LOCALES)),
        Field::required("content", Kind::Object(&LOCALES)),
    ],
    pairs: &[],
};

static TARGET_SELECTION: Schema = Schema {
    name: "to",
    fields: &[
        Field::required("type", Kind::OneOf(TARGET_TYPES)),
        Field::required("value", Kind::StringList),
    ],
    pairs: &[],
};

pub static TARGETS: Schema = Schema {
    name: "targets",
    fields: &[
        Field::required("to", Kind::Object(&TARGET_SELECTION)),
        Field::optional("filters", Kind::ObjectList),
    ],
    pairs: &[],
};

pub static NOTIFICATION_LIST: Schema = Schema {
    name: "options",
    fields: &[
        Field::optional("limit", Kind::Number),
        Field::optional("offset", Kind::Number),
        Field::optional("kind", Kind::NumberOneOf(NOTIFICATION_KINDS)),
    ],
    pairs: &[],
};

pub static DEVICE_LIST: Schema = Schema {
    name: "options",
    fields: &[
        Field::optional("limit", Kind::Number),
        Field::optional("offset", Kind::Number),
    ],
    pairs: &[],
};

/// Check `value` against `schema`. Never performs I/O.
pub fn validate(value: &Value, schema: &Schema) -> Result<(), ValidationError> {
    validate_at(value, schema, None)
}

/// Reject an empty identifier with `"<field>" is required`.
pub fn validate_required_string(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Pick the message schema matching the shape the caller used.
pub fn message_schema(message: &Value) -> &'static Schema {
    let structured = message
        .as_object()
        .is_some_and(|m| ["heading", "subtitle", "content"].iter().any(|k| m.contains_key(*k)));
    if structured {
        &STRUCTURED_MESSAGE
    } else {
        &FLAT_MESSAGE
    }
}

fn validate_at(value: &Value, schema: &Schema, prefix: Option<&str>) -> Result<(), ValidationError> {
    let object = value
        .as_object()
        .ok_or_else(|| ValidationError::invalid(prefix.unwrap_or(schema.name), "must be an object"))?;

    for (anchor, peer) in schema.pairs {
        if is_present(object, anchor) && !is_present(object, peer) {
            return Err(ValidationError::required(path(prefix, peer)));
        }
    }

    for field in schema.fields {
        let field_path = path(prefix, field.name);
        match object.get(field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    return Err(ValidationError::required(field_path));
                }
            }
            Some(v) => check_kind(v, field, &field_path)?,
        }
    }
    Ok(())
}

fn check_kind(value: &Value, field: &Field, field_path: &str) -> Result<(), ValidationError> {
    match field.kind {
        Kind::String => match value {
            Value::String(s) if s.is_empty() && field.required => Err(ValidationError::required(field_path)),
            Value::String(_) => Ok(()),
            _ => Err(ValidationError::invalid(field_path, "must be a string")),
        },
        Kind::Number => match value {
            Value::Number(_) => Ok(()),
            _ => Err(ValidationError::invalid(field_path, "must be a number")),
        },
        Kind::Guid => match value {
            Value::String(s) if s.is_empty() => Err(ValidationError::required(field_path)),
            Value::String(s) if is_hyphenated_guid(s) => Ok(()),
            Value::String(_) => Err(ValidationError::invalid(field_path, "must be a valid GUID")),
            _ => Err(ValidationError::invalid(field_path, "must be a string")),
        },
        Kind::OneOf(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => Ok(()),
            _ => Err(ValidationError::invalid(
                field_path,
                &format!("must be one of [{}]", allowed.join(", ")),
            )),
        },
        Kind::NumberOneOf(allowed) => match value.as_i64() {
            Some(n) if allowed.contains(&n) => Ok(()),
            _ if !value.is_number() => Err(ValidationError::invalid(field_path, "must be a number")),
            _ => {
                let listed: Vec<String> = allowed.iter().map(i64::to_string).collect();
                Err(ValidationError::invalid(
                    field_path,
                    &format!("must be one of [{}]", listed.join(", ")),
                ))
            }
        },
        Kind::StringList => match value.as_array() {
            Some(items) if !items.iter().all(Value::is_string) => {
                Err(ValidationError::invalid(field_path, "must be an array of strings"))
            }
            Some(items) if items.is_empty() => {
                Err(ValidationError::invalid(field_path, "must contain at least 1 items"))
            }
            Some(_) => Ok(()),
            None => Err(ValidationError::invalid(field_path, "must be an array of strings")),
        },
        Kind::ObjectList => match value.as_array() {
            Some(items) if items.iter().all(Value::is_object) => Ok(()),
            _ => Err(ValidationError::invalid(field_path, "must be an array of objects")),
        },
        Kind::Object(nested) => validate_at(value, nested, Some(field_path)),
    }
}

/// Only the 36-character `8-4-4-4-12` form; ids end up verbatim in URL paths.
fn is_hyphenated_guid(s: &str) -> bool {
    s.len() == 36 && Uuid::parse_str(s).is_ok()
}

fn is_present(object: &Map<String, Value>, key: &str) -> bool {
    !matches!(object.get(key), None | Some(Value::Null))
}

fn path(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}.{name}"),
        None => name.to_string(),
    }
}
