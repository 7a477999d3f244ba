//! Field-by-field decoding of JSON request bodies.
//!
//! A typed decode stops at the first bad value. Bodies here are objects of
//! optional fields, so each key can be decoded on its own and every
//! malformed field reported with its own message.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{FieldErrors, HrError, HrResult, NON_FIELD_ERRORS, Violations};

/// A request body made only of optional fields.
pub trait FieldwiseBody: DeserializeOwned {
    /// Message for `value` found in `field` when it has the wrong shape.
    fn invalid_value(field: &str, value: &Value) -> String;
}

/// Decodes `raw` into `T`, reporting every malformed field as a
/// validation error.
pub fn decode_body<T: FieldwiseBody>(raw: Value) -> HrResult<T> {
    let fields = match raw {
        Value::Object(fields) => fields,
        other => {
            return Err(non_field(format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_kind(&other)
            )));
        }
    };

    let err = match serde_json::from_value::<T>(Value::Object(fields.clone())) {
        Ok(body) => return Ok(body),
        Err(err) => err,
    };

    let mut violations = Violations::default();
    for (field, value) in &fields {
        let single = Map::from_iter([(field.clone(), value.clone())]);
        if serde_json::from_value::<T>(Value::Object(single)).is_err() {
            violations.push(field, T::invalid_value(field, value));
        }
    }
    violations.finish()?;

    tracing::debug!(error = %err, "body rejected without a single offending field");
    Err(non_field("Invalid data."))
}

fn non_field(message: impl Into<String>) -> HrError {
    HrError::Validation(FieldErrors::from([(
        NON_FIELD_ERRORS.to_owned(),
        vec![message.into()],
    )]))
}

/// Names the JSON type of `value` for messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Message for a malformed reference to another record by id.
pub(crate) fn invalid_reference(value: &Value) -> String {
    match value {
        Value::String(text) => format!("Invalid pk \"{text}\" - object does not exist."),
        other => format!(
            "Incorrect type. Expected pk value, received {}.",
            json_kind(other)
        ),
    }
}

pub(crate) const NOT_A_STRING: &str = "Not a valid string.";
