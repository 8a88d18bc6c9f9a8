//! HTTP client for the back-office API.
//!
//! # Architecture
//!
//! [`ApiClient`] owns the base URL, the static application key, and a
//! [`TokenSource`] injected by the session layer. Endpoint methods are
//! grouped per resource:
//!
//! - [`auth`] - login, two-factor verification, recovery, profile
//! - [`accounts`] - virtual accounts
//! - [`transactions`] - transaction history and statement dispatch
//! - [`payouts`] - payouts, approval workflow, bank/account helpers
//! - [`users`] - user management, roles, audit trail
//!
//! # Retry semantics
//!
//! Reads go through [`retry::send_with_retry`] with bounded exponential
//! backoff; writes and the whole auth surface are one-shot. A 401 is never
//! retried anywhere: it converts to [`ApiError::Auth`] and the session
//! layer tears the session down.
//!
//! # Response envelope
//!
//! Every response body is `{success, data, message}`; [`envelope`] decodes
//! it into a discriminated `Result` so failure payloads cannot be read as
//! data, even on a 200.

pub mod accounts;
pub mod auth;
pub mod client;
pub mod envelope;
pub mod error;
pub mod payouts;
pub mod retry;
pub mod transactions;
pub mod users;

pub use auth::{LoginOutcome, SessionPayload};
pub use client::{http_client, ApiClient, StaticToken, TokenSource};
pub use envelope::Envelope;
pub use error::ApiError;
pub use retry::{RetryConfig, RetryOutcome};
