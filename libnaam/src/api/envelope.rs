//! Response envelopes and `ApiResult`
//!
//! The backend wraps payloads in one of two shapes:
//!
//! ```text
//! { "status": "success", "data": ..., "message": "..." }
//! { "success": true,     "data": ..., "message": "..." }
//! ```
//!
//! and a few endpoints return a bare array. `parse` folds all of them
//! into `Envelope`, so nothing above this module looks at raw shape.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Outcome of one API call
///
/// Read paths hand this to the caller instead of an empty collection, so
/// "no data" and "request failed" stay distinguishable. `unwrap_or_default`
/// recovers the old empty-collection fallback where a screen wants it.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<T> {
    Success(T),
    Failure(ApiError),
}

impl<T> ApiResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            ApiResult::Success(value) => Some(value),
            ApiResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ApiResult::Success(_) => None,
            ApiResult::Failure(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            ApiResult::Success(value) => Ok(value),
            ApiResult::Failure(e) => Err(e),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResult<U> {
        match self {
            ApiResult::Success(value) => ApiResult::Success(f(value)),
            ApiResult::Failure(e) => ApiResult::Failure(e),
        }
    }

    pub fn unwrap_or(self, fallback: T) -> T {
        self.ok().unwrap_or(fallback)
    }

    pub fn as_ref(&self) -> ApiResult<&T> {
        match self {
            ApiResult::Success(value) => ApiResult::Success(value),
            ApiResult::Failure(e) => ApiResult::Failure(e.clone()),
        }
    }
}

impl<T: Default> ApiResult<T> {
    /// The empty fallback (`[]`, empty record) on failure
    pub fn unwrap_or_default(self) -> T {
        self.ok().unwrap_or_default()
    }
}

impl<T> From<Result<T, ApiError>> for ApiResult<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => ApiResult::Success(value),
            Err(e) => ApiResult::Failure(e),
        }
    }
}

/// Acknowledgement from an action endpoint (no payload of interest)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub message: Option<String>,
}

/// `{success, message}` view of an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: Option<String>,
    /// Why a failed action failed
    #[serde(skip)]
    pub error: Option<ApiError>,
}

impl ApiResult<Ack> {
    pub fn into_outcome(self) -> ActionOutcome {
        match self {
            ApiResult::Success(ack) => ActionOutcome {
                success: true,
                message: ack.message,
                error: None,
            },
            ApiResult::Failure(e) => ActionOutcome {
                success: false,
                message: Some(e.user_message()),
                error: Some(e),
            },
        }
    }
}

/// A successfully unwrapped response
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub data: Value,
    pub message: Option<String>,
}

impl Envelope {
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        decode_value(self.data)
    }

    pub fn ack(self) -> Ack {
        Ack {
            message: self.message,
        }
    }

    /// Decode a list that may arrive bare, under one of `keys`, or as a
    /// single object
    pub fn decode_list<T: DeserializeOwned>(self, keys: &[&str]) -> Result<Vec<T>, ApiError> {
        decode_list(self.data, keys)
    }
}

fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

pub fn decode_list<T: DeserializeOwned>(data: Value, keys: &[&str]) -> Result<Vec<T>, ApiError> {
    match data {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => decode_value::<Vec<T>>(data),
        Value::Object(mut obj) => {
            if let Some(inner) = keys.iter().find_map(|k| obj.remove(*k)) {
                return decode_list(inner, &[]);
            }
            if obj.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![decode_value::<T>(Value::Object(obj))?])
        }
        other => Err(ApiError::Decode(format!("expected a list, got {}", other))),
    }
}

fn message_of(body: &Value) -> Option<String> {
    ["message", "error", "msg"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

/// Turn an HTTP status and body into an `Envelope` or an `ApiError`
///
/// 401 handling (session invalidation) is the caller's job; here it is
/// just another non-2xx status.
pub fn parse(status: StatusCode, body: &[u8]) -> Result<Envelope, ApiError> {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();

    if !status.is_success() {
        let message = parsed
            .as_ref()
            .and_then(message_of)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_default();
        return Err(ApiError::Status {
            code: status.as_u16(),
            message,
        });
    }

    let body = match parsed {
        Some(value) => value,
        None if body.iter().all(u8::is_ascii_whitespace) => Value::Null,
        None => {
            return Err(ApiError::Decode(format!(
                "response is not JSON ({} bytes)",
                body.len()
            )))
        }
    };

    let Value::Object(ref obj) = body else {
        // Bare array or scalar: no envelope at all
        return Ok(Envelope {
            data: body,
            message: None,
        });
    };

    let message = message_of(&body);
    let succeeded = match (obj.get("status"), obj.get("success")) {
        (Some(Value::String(s)), _) => {
            Some(matches!(s.to_lowercase().as_str(), "success" | "ok"))
        }
        (_, Some(Value::Bool(b))) => Some(*b),
        _ => None,
    };

    match succeeded {
        Some(false) => Err(ApiError::Rejected(message.unwrap_or_default())),
        Some(true) => Ok(Envelope {
            data: obj.get("data").cloned().unwrap_or(Value::Null),
            message,
        }),
        None => Ok(Envelope {
            data: obj.get("data").cloned().unwrap_or(body),
            message,
        }),
    }
}
