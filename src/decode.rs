//! Status-driven decoding of provider responses.
//!
//! | status      | outcome                                              |
//! |-------------|------------------------------------------------------|
//! | `200..300`  | body decoded into the success type                   |
//! | `<200`, `300..400` | `ApiError` 500, "unexpected status code [N]"  |
//! | `>=400`     | body decoded as `ApiError`, `code` forced to status  |
//!
//! Exactly one decode attempt is made per call.

use crate::models::ProviderResponse;
use crate::{ApiError, Result};
use serde::de::DeserializeOwned;

/// Decode a provider response body according to its HTTP status.
///
/// # Errors
/// Returns an [`ApiError`] when the status is outside the success range, when
/// the body does not decode, or when a 2xx envelope reports `success: false`.
pub fn decode_response<T>(status: u16, body: &[u8]) -> Result<T>
where
    T: DeserializeOwned + ProviderResponse,
{
    match status {
        200..=299 => {
            let value: T = serde_json::from_slice(body).map_err(|e| {
                tracing::warn!(status, error = %e, "failed to decode success body");
                ApiError::internal(format!(
                    "error decoding response [{}]: {e}",
                    String::from_utf8_lossy(body)
                ))
            })?;
            if value.success() {
                Ok(value)
            } else {
                // A 2xx envelope with success=false still carries the provider's message.
                let reported = serde_json::from_slice::<ApiError>(body)
                    .map(|e| e.message)
                    .unwrap_or_default();
                let message = if reported.is_empty() {
                    "provider reported success=false".to_string()
                } else {
                    reported
                };
                Err(ApiError::internal(message))
            }
        }
        400.. => Err(error_for_status(status, body)),
        _ => Err(unexpected_status(status)),
    }
}

/// Build the error for a response with a status of 400 or above.
///
/// The body's own `code` is ignored in favour of the real status. When the
/// body is not a provider error document the status is still kept.
pub fn error_for_status(status: u16, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ApiError>(body) {
        Ok(mut err) => {
            err.code = status;
            err.success = false;
            tracing::warn!(status, message = %err.message, "provider reported an error");
            err
        }
        Err(e) => {
            tracing::warn!(status, error = %e, "failed to decode error body");
            ApiError::new(
                status,
                format!(
                    "error decoding error response [{}]: {e}",
                    String::from_utf8_lossy(body)
                ),
            )
        }
    }
}

pub(crate) fn unexpected_status(status: u16) -> ApiError {
    ApiError::internal(format!("unexpected status code [{status}]"))
}
