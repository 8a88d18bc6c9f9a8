//! Core domain types for Backdesk.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.
//!
//! All entities mirror resources owned by the remote back-office API; nothing in this
//! crate computes new canonical state for server-owned data.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod account;
mod auth;
mod bank;
mod ids;
mod money;
mod page;
mod payout;
mod transaction;
mod user;
mod validate;

pub use account::{NewAccount, VirtualAccount};
pub use auth::{
    mask_email, mask_phone, AuthTokens, Credentials, DeliveryChannel, OtpChallenge, OtpCode,
    OtpCodeError,
};
pub use bank::{rank_banks, Bank, MAX_BANK_RESULTS};
pub use ids::{AccountId, ChallengeId, PayoutId, TransactionId, UserId};
pub use money::{Amount, AmountParseError};
pub use page::{Page, PageRequest};
pub use payout::{
    ApprovalStatus, NewPayout, Payout, PayoutStatus, RejectReason, RejectReasonError,
    ResolvedAccount, MIN_REJECT_REASON_LEN,
};
pub use transaction::{ExportFormat, StatementRequest, Transaction, TransactionType};
pub use user::{
    permission_description, AuditLogEntry, NewUser, Profile, Role, User, UserStatus,
};
pub use validate::{is_valid_email, PasswordStrength};
