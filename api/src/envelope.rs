//! The backend's `{success, data, message}` response envelope.
//!
//! Decoded into a discriminated `Result` at this boundary so callers can
//! never read a failure payload as data.

use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Split the duck-typed envelope into success-with-data or a typed error.
    ///
    /// `success: true` with a missing `data` field is a decode error except
    /// for unit payloads, which callers request as [`Envelope<()>`] via
    /// [`Envelope::into_ack`].
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Server {
                status: None,
                message: self
                    .message
                    .unwrap_or_else(|| "request failed".to_owned()),
            });
        }
        self.data
            .ok_or_else(|| ApiError::Decode("missing data field in successful response".to_owned()))
    }
}

impl Envelope<serde_json::Value> {
    /// For endpoints whose success carries no payload we care about
    /// (logout, resend, statement dispatch).
    pub fn into_ack(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Server {
                status: None,
                message: self
                    .message
                    .unwrap_or_else(|| "request failed".to_owned()),
            })
        }
    }

    /// The server message attached to a failure body, if any.
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_yields_data() {
        let env: Envelope<Vec<u8>> =
            serde_json::from_str(r#"{"success": true, "data": [1, 2, 3]}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn failure_cannot_be_read_as_data() {
        let env: Envelope<Vec<u8>> =
            serde_json::from_str(r#"{"success": false, "data": [1], "message": "nope"}"#).unwrap();
        let err = env.into_result().unwrap_err();
        assert_eq!(err.message(), "nope");
    }

    #[test]
    fn success_without_data_is_a_decode_error_for_typed_reads() {
        let env: Envelope<Vec<u8>> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(env.into_result(), Err(ApiError::Decode(_))));
    }

    #[test]
    fn ack_ignores_payload() {
        let ok: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"success": true, "message": "sent"}"#).unwrap();
        assert!(ok.into_ack().is_ok());

        let bad: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"success": false, "message": "limit reached"}"#).unwrap();
        assert_eq!(bad.into_ack().unwrap_err().message(), "limit reached");
    }
}
