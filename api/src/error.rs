//! Error taxonomy for the API client.
//!
//! Four failure families cross this boundary: connectivity, authentication
//! (never retried; prompts session teardown), validation (shown inline),
//! and everything else the server reports (shown as a dismissible message).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable response was received.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// 401, a missing/expired token, or an explicit authentication-required
    /// condition. Callers must tear down the session instead of retrying.
    #[error("{message}")]
    Auth {
        status: Option<u16>,
        message: String,
    },

    /// A 4xx the server explained; shown inline next to the offending field.
    #[error("{message}")]
    Validation { status: u16, message: String },

    /// Server-side or business-rule failure carrying the server's message.
    /// `status` is absent when the envelope reported `success: false` on a
    /// 2xx response.
    #[error("{message}")]
    Server {
        status: Option<u16>,
        message: String,
    },

    /// The body did not match the expected envelope or payload shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            status: None,
            message: message.into(),
        }
    }

    /// True for failures that must terminate the session.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// HTTP status, when one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::Server { status, .. } => *status,
            Self::Validation { status, .. } => Some(*status),
            Self::Network(_) | Self::Decode(_) => None,
        }
    }

    /// Human-readable message for the UI. The server's own wording is
    /// preferred; an auth failure with no explanation gets a generic one.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Auth { message, .. } if message.trim().is_empty() => {
                "authentication required".to_owned()
            }
            _ => self.to_string(),
        }
    }

    /// Classify a non-2xx response by status + server-provided message.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::Auth {
                status: Some(status),
                message,
            },
            400..=499 => Self::Validation { status, message },
            _ => Self::Server {
                status: Some(status),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err)
        }
    }
}
