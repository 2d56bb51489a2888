//! Response envelope.

use kgraph_core::{ErrorCode, KgError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&KgError> for ErrorBody {
    fn from(err: &KgError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// One reply per request. Exactly one of `data` and `error` is present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(err: &KgError) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(ErrorBody::from(err)),
        }
    }

    /// The error code, if this is a failure.
    pub fn code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }
}

impl<T: Serialize> From<kgraph_core::Result<T>> for Response {
    fn from(result: kgraph_core::Result<T>) -> Self {
        match result.and_then(|value| {
            serde_json::to_value(value).map_err(|e| KgError::Storage(e.to_string()))
        }) {
            Ok(data) => Self::success(data),
            Err(err) => Self::failure(&err),
        }
    }
}
