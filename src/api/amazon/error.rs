//! Classification of Selling Partner API failures

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::token::TokenError;
use crate::api::resilience::Retryable;

const RATE_LIMIT_CODES: &[&str] = &["QuotaExceeded", "TooManyRequests", "RequestThrottled"];
const AUTH_CODES: &[&str] = &[
    "Unauthorized",
    "AccessDenied",
    "InvalidAccessKeyId",
    "InvalidAccessToken",
    "ExpiredAccessToken",
    "InvalidSignature",
    "Forbidden",
];
const INVALID_PARAMETER_CODES: &[&str] = &["InvalidInput", "InvalidParameterValue", "BadRequest", "MissingParameter"];
const NOT_FOUND_CODES: &[&str] = &["NotFound", "ResourceNotFound"];
const RETRYABLE_TYPES: &[&str] = &["InternalFailure", "ServiceUnavailable"];
const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

const RATE_LIMIT_MESSAGE: &str = "rate limit";
const AUTH_MESSAGE: &str = "unauthorized";

/// Code used for failures that never reached the API
pub const TRANSPORT_ERROR_CODE: &str = "TransportError";
pub const MALFORMED_RESPONSE_CODE: &str = "MalformedResponse";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpApiErrorKind {
    RateLimit,
    Auth,
    InvalidParameter,
    NotFound,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpApiError {
    /// HTTP status, 0 when no response was received
    pub status: u16,
    pub code: String,
    /// Provider error type, when the response carried one
    pub error_type: Option<String>,
    pub message: String,
    pub details: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    code: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
    details: Option<Value>,
}

impl SpApiError {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            error_type: None,
            message: message.into(),
            details: None,
            request_id: None,
        }
    }

    /// Build from an error response. The first entry of the `errors` array
    /// wins; bodies in any other shape keep their raw text as the message.
    pub fn from_response(status: u16, body: &str, request_id: Option<String>) -> Self {
        let entry = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.errors.into_iter().next());

        let mut error = match entry {
            Some(entry) => Self {
                status,
                code: entry.code.unwrap_or_else(|| format!("HTTP{}", status)),
                error_type: entry.error_type.filter(|t| !t.trim().is_empty()),
                message: entry.message.unwrap_or_default(),
                details: entry.details.and_then(|d| match d {
                    Value::Null => None,
                    Value::String(s) if s.is_empty() => None,
                    Value::String(s) => Some(s),
                    other => Some(other.to_string()),
                }),
                request_id: None,
            },
            None => Self::new(status, format!("HTTP{}", status), body.trim()),
        };

        error.request_id = request_id;
        error
    }

    pub fn transport(error: &reqwest::Error) -> Self {
        let mut e = Self::new(0, TRANSPORT_ERROR_CODE, error.to_string());
        e.error_type = Some("transport".to_string());
        e
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        let mut e = Self::new(0, MALFORMED_RESPONSE_CODE, message);
        e.error_type = Some("malformed".to_string());
        e
    }

    fn code_in(&self, codes: &[&str]) -> bool {
        codes.iter().any(|c| c.eq_ignore_ascii_case(&self.code))
    }

    fn type_in(&self, types: &[&str]) -> bool {
        let provider_type = self.error_type.as_deref().unwrap_or(&self.code);
        types.iter().any(|t| t.eq_ignore_ascii_case(provider_type))
    }

    fn message_contains(&self, needle: &str) -> bool {
        self.message.to_ascii_lowercase().contains(needle)
    }

    pub fn is_rate_limit(&self) -> bool {
        self.status == 429 || self.code_in(RATE_LIMIT_CODES) || self.message_contains(RATE_LIMIT_MESSAGE)
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self.status, 401 | 403) || self.code_in(AUTH_CODES) || self.message_contains(AUTH_MESSAGE)
    }

    pub fn is_invalid_parameter(&self) -> bool {
        self.status == 400 || self.code_in(INVALID_PARAMETER_CODES)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404 || self.code_in(NOT_FOUND_CODES)
    }

    /// Rate limits, transient server statuses, transient provider types and
    /// failures that never reached the API
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limit()
            || RETRYABLE_STATUSES.contains(&self.status)
            || self.type_in(RETRYABLE_TYPES)
            || self.code == TRANSPORT_ERROR_CODE
    }

    /// Classification in priority order: a 429 carrying an auth code is still a rate limit
    pub fn kind(&self) -> SpApiErrorKind {
        if self.is_rate_limit() {
            SpApiErrorKind::RateLimit
        } else if self.is_auth_error() {
            SpApiErrorKind::Auth
        } else if self.is_invalid_parameter() {
            SpApiErrorKind::InvalidParameter
        } else if self.is_not_found() {
            SpApiErrorKind::NotFound
        } else {
            SpApiErrorKind::Generic
        }
    }

    pub fn user_message(&self) -> String {
        match self.kind() {
            SpApiErrorKind::RateLimit => {
                "Amazon is rate limiting requests. Please wait a moment and try again.".to_string()
            }
            SpApiErrorKind::Auth => {
                "Amazon rejected the credentials. Check the SP-API configuration and try again.".to_string()
            }
            SpApiErrorKind::InvalidParameter => format!("Amazon rejected the request: {}", self.message),
            SpApiErrorKind::NotFound => "The requested Amazon resource was not found.".to_string(),
            SpApiErrorKind::Generic => format!("Amazon SP-API request failed: {}", self.message),
        }
    }
}

impl SpApiErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpApiErrorKind::RateLimit => "rate_limit",
            SpApiErrorKind::Auth => "auth",
            SpApiErrorKind::InvalidParameter => "invalid_parameter",
            SpApiErrorKind::NotFound => "not_found",
            SpApiErrorKind::Generic => "generic",
        }
    }
}

impl fmt::Display for SpApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status == 0 {
            write!(f, "SP-API {}: {}", self.code, self.message)?;
        } else {
            write!(f, "SP-API {} ({}): {}", self.code, self.status, self.message)?;
        }
        if let Some(details) = &self.details {
            write!(f, " [{}]", details)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request id {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for SpApiError {}

impl Retryable for SpApiError {
    fn is_retryable(&self) -> bool {
        SpApiError::is_retryable(self)
    }
}

impl From<TokenError> for SpApiError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Transport(e) => SpApiError::transport(&e),
            other => SpApiError::new(401, "Unauthorized", other.to_string()),
        }
    }
}
