//! Payload envelopes and field-level validation.
//!
//! Request bodies wrap their payload in a resource key (`{"doctors": {...}}`).
//! Validators collect every failure into [`FieldErrors`] instead of stopping at
//! the first one, so clients see all problems in a single `400`.

use axum::Json;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use super::error::ApiError;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_BLANK: &str = "This field may not be blank.";
pub const MSG_NULL: &str = "This field may not be null.";
pub const MSG_NO_DATA: &str = "No data provided";

/// Per-field error messages keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// Nest another error map under `field` (used for the `profile` object).
    pub fn nest(&mut self, field: &str, nested: FieldErrors) {
        for (key, messages) in nested.0 {
            for message in messages {
                self.add(&format!("{field}.{key}"), message);
            }
        }
    }

    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Returns `value` when no error was recorded.
    ///
    /// # Errors
    /// Returns the collected errors otherwise.
    pub fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Wrap the errors in their resource envelope as a `400` response.
    #[must_use]
    pub fn into_envelope(self, key: &str) -> ApiError {
        multi_envelope(vec![(key, self)])
    }
}

/// Pull `key` out of the request body and deserialize it.
///
/// # Errors
/// Missing/`null` envelopes report `No data provided`; type mismatches report the
/// deserializer message under `non_field_errors`.
pub fn take_part<T: DeserializeOwned>(body: &mut Value, key: &str) -> Result<T, FieldErrors> {
    let data = body
        .as_object_mut()
        .and_then(|object| object.remove(key))
        .filter(|value| !value.is_null());
    let Some(data) = data else {
        return Err(FieldErrors::single(NON_FIELD_ERRORS, MSG_NO_DATA));
    };
    if !data.is_object() {
        return Err(FieldErrors::single(
            NON_FIELD_ERRORS,
            "Invalid data. Expected a dictionary.",
        ));
    }
    serde_json::from_value(data).map_err(|err| FieldErrors::single(NON_FIELD_ERRORS, err.to_string()))
}

/// [`take_part`] for single-envelope endpoints, mapping failures to a `400`.
///
/// # Errors
/// See [`take_part`].
pub fn take_envelope<T: DeserializeOwned>(mut body: Value, key: &str) -> Result<T, ApiError> {
    take_part(&mut body, key).map_err(|errors| errors.into_envelope(key))
}

/// Build `{"a": errors_a, "b": errors_b}` for multi-part payloads.
#[must_use]
pub fn multi_envelope(parts: Vec<(&str, FieldErrors)>) -> ApiError {
    let mut object = Map::new();
    for (key, errors) in parts {
        object.insert(key.to_string(), json!(errors));
    }
    ApiError::Validation(Value::Object(object))
}

/// Request body as JSON; a missing or unparsable body becomes `null`, which
/// [`take_part`] reports as `No data provided`.
#[must_use]
pub fn payload_body(payload: Option<Json<Value>>) -> Value {
    payload.map_or(Value::Null, |Json(body)| body)
}

/// Wrap a response payload in its resource key.
///
/// # Errors
/// Returns an internal error if `value` cannot be serialized.
pub fn envelope<T: Serialize>(key: &str, value: T) -> Result<Value, ApiError> {
    let value = serde_json::to_value(value).map_err(|err| ApiError::Internal(err.into()))?;
    let mut object = Map::new();
    object.insert(key.to_string(), value);
    Ok(Value::Object(object))
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`.
///
/// # Errors
/// Propagates the inner deserializer error.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parse a primary key path segment.
///
/// # Errors
/// Returns `400` for non-numeric or non-positive ids.
pub fn parse_pk(raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::BadRequest("Invalid id.")),
    }
}

/// Required text field; trims surrounding whitespace.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_len: Option<usize>,
) -> Option<String> {
    let Some(value) = value else {
        errors.add(field, MSG_REQUIRED);
        return None;
    };
    checked_text(errors, field, value, max_len)
}

/// Optional text field for partial updates; present values obey the same rules.
pub fn optional_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_len: Option<usize>,
) -> Option<String> {
    value.and_then(|value| checked_text(errors, field, value, max_len))
}

/// Optional text that may legitimately be blank (names, addresses on doctors).
pub fn blankable_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_len: usize,
) -> Option<String> {
    let value = value?.trim().to_string();
    if value.chars().count() > max_len {
        errors.add(field, max_length_message(max_len));
        return None;
    }
    Some(value)
}

fn checked_text(
    errors: &mut FieldErrors,
    field: &str,
    value: String,
    max_len: Option<usize>,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, MSG_BLANK);
        return None;
    }
    if let Some(max_len) = max_len {
        if trimmed.chars().count() > max_len {
            errors.add(field, max_length_message(max_len));
            return None;
        }
    }
    Some(trimmed.to_string())
}

#[must_use]
pub fn max_length_message(max_len: usize) -> String {
    format!("Ensure this field has no more than {max_len} characters.")
}

/// Lightweight email sanity check used before persisting accounts.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Usernames: letters, digits and `@ . + - _`.
#[must_use]
pub fn valid_username(username: &str) -> bool {
    Regex::new(r"^[\w.@+-]+$").is_ok_and(|re| re.is_match(username))
}
