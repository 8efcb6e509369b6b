//! Error type shared by every Stannp operation.

use serde::{Deserialize, Deserializer, Serialize};

/// Error returned by the Stannp client.
///
/// The same shape is used for local failures (URL building, transport,
/// decoding, temp files) and for errors reported by the provider. Provider
/// errors carry the real HTTP status in `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("stannp api error (code {code}): {message}")]
pub struct ApiError {
    /// HTTP-like status code.
    #[serde(default, deserialize_with = "lenient_code")]
    pub code: u16,
    /// Human readable description of the failure.
    #[serde(rename = "error", alias = "message", default)]
    pub message: String,
    /// Always `false` for errors surfaced to callers.
    #[serde(default)]
    pub success: bool,
}

impl ApiError {
    /// Build an error with the given code and message.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            success: false,
        }
    }

    /// A local failure (transport, decoding, filesystem): code 500.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    /// A precondition failure detected before any network call: code 400.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }
}

/// Provider bodies sometimes carry a code that is not a status; the real
/// status replaces it anyway, so anything unusable becomes 0.
fn lenient_code<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let code = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_u64().and_then(|c| u16::try_from(c).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(code.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_body_decodes() {
        let err: ApiError =
            serde_json::from_str(r#"{"success":false,"error":"Invalid API key"}"#).unwrap();
        assert_eq!(err.code, 0);
        assert_eq!(err.message, "Invalid API key");
        assert!(!err.success);
    }

    #[test]
    fn message_alias_is_accepted() {
        let err: ApiError = serde_json::from_str(r#"{"code":42,"message":"nope"}"#).unwrap();
        assert_eq!(err, ApiError::new(42, "nope"));
    }

    #[test]
    fn unusable_code_does_not_lose_message() {
        let err: ApiError =
            serde_json::from_str(r#"{"code":"E_AUTH","error":"Invalid API key"}"#).unwrap();
        assert_eq!(err, ApiError::new(0, "Invalid API key"));

        let err: ApiError = serde_json::from_str(r#"{"code":"404","error":"gone"}"#).unwrap();
        assert_eq!(err.code, 404);
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = ApiError::bad_request("bad pdf url");
        assert_eq!(err.to_string(), "stannp api error (code 400): bad pdf url");
    }
}
