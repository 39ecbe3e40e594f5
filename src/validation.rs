//! Request body validation for the todo routes.
//!
//! Bodies are parsed into a [`serde_json::Value`] first and then checked field
//! by field, so a single request reports every violated rule at once. Unknown
//! fields are ignored and never reach the store.

use serde_json::{Map, Value};
use std::fmt;

use crate::models::{NewTodo, TodoChanges};

pub const TITLE_MIN_LEN: usize = 3;
pub const DESCRIPTION_MIN_LEN: usize = 15;

/// A single rule a request body broke
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("body must be a JSON object")]
    NotAnObject,
    #[error("body is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("`{field}` is required")]
    Missing { field: &'static str },
    #[error("`{field}` must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("`{field}` must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
}

/// Every violation found in one request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
        write!(f, "validation failed: {}", messages.join("; "))
    }
}

impl std::error::Error for ValidationError {}

impl From<Violation> for ValidationError {
    fn from(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

/// Parse raw request bytes; an empty body is treated as `{}`
pub fn parse_body(bytes: &[u8]) -> Result<Value, ValidationError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes).map_err(|e| Violation::MalformedJson(e.to_string()).into())
}

/// Check a body against the create profile: every field required
pub fn validate_create(body: &Value) -> Result<NewTodo, ValidationError> {
    let fields = as_object(body)?;
    let mut violations = Vec::new();

    let title = required(
        fields,
        "title",
        |v| string_field(v, "title", TITLE_MIN_LEN),
        &mut violations,
    );
    let description = required(
        fields,
        "description",
        |v| string_field(v, "description", DESCRIPTION_MIN_LEN),
        &mut violations,
    );
    let completed = required(fields, "completed", |v| bool_field(v, "completed"), &mut violations);

    match (title, description, completed) {
        (Some(title), Some(description), Some(completed)) if violations.is_empty() => Ok(NewTodo {
            title,
            description,
            completed,
        }),
        _ => Err(ValidationError { violations }),
    }
}

/// Check a body against the update profile: every field optional, but a
/// present field (including an explicit `null`) must pass the create rule
pub fn validate_update(body: &Value) -> Result<TodoChanges, ValidationError> {
    let fields = as_object(body)?;
    let mut violations = Vec::new();

    let title = optional(
        fields,
        "title",
        |v| string_field(v, "title", TITLE_MIN_LEN),
        &mut violations,
    );
    let description = optional(
        fields,
        "description",
        |v| string_field(v, "description", DESCRIPTION_MIN_LEN),
        &mut violations,
    );
    let completed = optional(fields, "completed", |v| bool_field(v, "completed"), &mut violations);

    if violations.is_empty() {
        Ok(TodoChanges {
            title,
            description,
            completed,
        })
    } else {
        Err(ValidationError { violations })
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationError> {
    body.as_object().ok_or_else(|| Violation::NotAnObject.into())
}

fn required<T>(
    fields: &Map<String, Value>,
    field: &'static str,
    check: impl Fn(&Value) -> Result<T, Violation>,
    violations: &mut Vec<Violation>,
) -> Option<T> {
    match fields.get(field) {
        None => {
            violations.push(Violation::Missing { field });
            None
        }
        Some(value) => check(value).map_err(|v| violations.push(v)).ok(),
    }
}

fn optional<T>(
    fields: &Map<String, Value>,
    field: &'static str,
    check: impl Fn(&Value) -> Result<T, Violation>,
    violations: &mut Vec<Violation>,
) -> Option<T> {
    let value = fields.get(field)?;
    check(value).map_err(|v| violations.push(v)).ok()
}

fn string_field(value: &Value, field: &'static str, min: usize) -> Result<String, Violation> {
    let s = value.as_str().ok_or(Violation::WrongType {
        field,
        expected: "string",
    })?;
    if s.chars().count() < min {
        return Err(Violation::TooShort { field, min });
    }
    Ok(s.to_string())
}

fn bool_field(value: &Value, field: &'static str) -> Result<bool, Violation> {
    value.as_bool().ok_or(Violation::WrongType {
        field,
        expected: "boolean",
    })
}
