//! Response decoding.
//!
//! Every endpoint answers with a JSON *string* whose content is the actual
//! JSON payload, so bodies are parsed twice. An object carrying an
//! `exception` key is an application error, whichever layer it shows up in.

use crate::error::ApiError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a response body into `T`.
///
/// `operation` names the call in error messages (`cannot <operation>: ...`).
pub fn decode_response<T: DeserializeOwned>(
    operation: &'static str,
    body: &str,
) -> Result<T, ApiError> {
    let outer: Value = parse(operation, body)?;
    check_exception(operation, &outer)?;

    let payload = match outer {
        Value::String(inner) => {
            let inner: Value = parse(operation, &inner)?;
            check_exception(operation, &inner)?;
            inner
        }
        // Already a plain JSON document.
        other => other,
    };

    serde_json::from_value(payload).map_err(|source| ApiError::Decode { operation, source })
}

fn parse(operation: &'static str, text: &str) -> Result<Value, ApiError> {
    serde_json::from_str(text).map_err(|source| ApiError::Decode { operation, source })
}

fn check_exception(operation: &'static str, value: &Value) -> Result<(), ApiError> {
    let Some(exception) = value.get("exception") else {
        return Ok(());
    };
    let message = match exception {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    log::error!("cannot {operation}: {message}");
    Err(ApiError::Application { operation, message })
}

/// Wrap a payload the way the server does, for fakes and fixtures.
pub fn encode_response(payload: &Value) -> String {
    Value::String(payload.to_string()).to_string()
}
