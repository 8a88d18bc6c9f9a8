//! Events delivered from spawned API tasks back to the app.
//!
//! Every async operation sends exactly one event on completion; the app
//! drains the channel each tick on the UI thread, so all state mutation
//! stays single-threaded.

use chrono::{DateTime, Utc};

use backdesk_api::{ApiError, LoginOutcome, SessionPayload};
use backdesk_types::{
    AccountId, AuditLogEntry, AuthTokens, Bank, OtpChallenge, Page, PageRequest, Payout, PayoutId,
    Profile, ResolvedAccount, Role, Transaction, TransactionId, User, UserId, VirtualAccount,
};

use crate::resolver::ResolutionKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutAction {
    Approve,
    Reject,
}

impl PayoutAction {
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
        }
    }
}

#[derive(Debug)]
pub enum AppEvent {
    // Session lifecycle
    LoginFinished(Result<LoginOutcome, ApiError>),
    OtpVerified {
        challenge: OtpChallenge,
        result: Result<SessionPayload, ApiError>,
    },
    OtpResent(Result<Option<DateTime<Utc>>, ApiError>),
    PasswordResetRequested(Result<(), ApiError>),
    PasswordResetCompleted(Result<(), ApiError>),
    /// Background token refresh for a session restored from disk.
    SessionRefreshed(Result<AuthTokens, ApiError>),
    LoggedOut,

    // Reads
    PayoutsLoaded {
        page: PageRequest,
        result: Result<Page<Payout>, ApiError>,
    },
    TransactionsLoaded {
        page: PageRequest,
        result: Result<Page<Transaction>, ApiError>,
    },
    AccountsLoaded {
        page: PageRequest,
        result: Result<Page<VirtualAccount>, ApiError>,
    },
    UsersLoaded {
        page: PageRequest,
        result: Result<Page<User>, ApiError>,
    },
    PayoutDetailLoaded {
        id: PayoutId,
        result: Result<Payout, ApiError>,
    },
    TransactionDetailLoaded {
        id: TransactionId,
        result: Result<Transaction, ApiError>,
    },
    AccountDetailLoaded {
        id: AccountId,
        result: Result<VirtualAccount, ApiError>,
    },
    BanksLoaded(Result<Vec<Bank>, ApiError>),
    RolesLoaded(Result<Vec<Role>, ApiError>),
    AuditLogsLoaded(Result<Vec<AuditLogEntry>, ApiError>),
    ProfileLoaded(Result<Profile, ApiError>),

    // Writes
    PayoutCreated(Result<Payout, ApiError>),
    PayoutActioned {
        id: PayoutId,
        action: PayoutAction,
        result: Result<(), ApiError>,
    },
    AccountCreated(Result<VirtualAccount, ApiError>),
    UserCreated(Result<User, ApiError>),
    UserStatusUpdated {
        id: UserId,
        result: Result<(), ApiError>,
    },
    StatementRequested(Result<(), ApiError>),

    // Account resolution (debounced)
    AccountResolved {
        key: ResolutionKey,
        result: Result<ResolvedAccount, ApiError>,
    },
}
