//! Session lifecycle.
//!
//! Authentication state is a single explicit machine:
//!
//! ```text
//! Anonymous -> Authenticating -> Authenticated
//!                  \-> OtpRequired -> OtpVerifying -> Authenticated
//! Authenticated -> Anonymous   (logout, expiry, 401)
//! ```
//!
//! [`transition`] is a pure function over `(state, event)`; illegal pairs
//! keep the current state and log. [`SessionStore`] wraps the machine,
//! mirrors it to disk, and is the [`TokenSource`] injected into the API
//! client, so nothing else in the app ever touches raw tokens.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use backdesk_api::TokenSource;
use backdesk_types::{AuthTokens, OtpChallenge, Profile};

use crate::storage::SessionStorage;

/// What gets written to `session.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub tokens: AuthTokens,
    pub profile: Profile,
    pub saved_at: DateTime<Utc>,
}

impl PersistedSession {
    /// Expiry is decided from server-issued timestamps at the moment of
    /// use. `expires_in` without `expires_at` is anchored to `saved_at`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if let Some(expires_at) = self.tokens.expires_at {
            return now >= expires_at;
        }
        if let Some(secs) = self.tokens.expires_in {
            return now >= self.saved_at + Duration::seconds(secs);
        }
        // No expiry information: trust the token until the server 401s.
        false
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Anonymous,
    /// Credentials submitted, waiting on the server.
    Authenticating,
    /// A two-factor challenge is pending user input.
    OtpRequired(OtpChallenge),
    /// A code was submitted, waiting on verification.
    OtpVerifying(OtpChallenge),
    Authenticated(PersistedSession),
}

impl SessionState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticating => "authenticating",
            Self::OtpRequired(_) => "otp_required",
            Self::OtpVerifying(_) => "otp_verifying",
            Self::Authenticated(_) => "authenticated",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    LoginSubmitted,
    LoginFailed,
    ChallengeIssued(OtpChallenge),
    OtpSubmitted,
    /// Wrong or expired code; back to the challenge for another try.
    OtpRejected,
    Established(PersistedSession),
    /// Token expiry or a 401 from any endpoint.
    Expired,
    LoggedOut,
    /// The user backed out of the two-factor screen.
    ChallengeAbandoned,
}

/// Pure transition function. Illegal `(state, event)` pairs are ignored.
#[must_use]
pub fn transition(state: SessionState, event: &SessionEvent) -> SessionState {
    use SessionEvent as E;
    use SessionState as S;

    match (state, event) {
        (S::Anonymous, E::LoginSubmitted) => S::Authenticating,
        (S::Authenticating, E::LoginFailed) => S::Anonymous,
        // A resend re-issues the challenge with a fresh deadline, so the
        // event is also legal while one is already pending.
        (S::Authenticating | S::OtpRequired(_), E::ChallengeIssued(challenge)) => {
            S::OtpRequired(challenge.clone())
        }
        (S::OtpRequired(challenge), E::OtpSubmitted) => S::OtpVerifying(challenge),
        (S::OtpVerifying(challenge), E::OtpRejected) => S::OtpRequired(challenge),
        // Establishment is legal from login (no 2FA), verification,
        // restore-from-disk (anonymous), and while already signed in,
        // where a background token refresh re-establishes in place.
        (
            S::Authenticating | S::OtpVerifying(_) | S::Anonymous | S::Authenticated(_),
            E::Established(session),
        ) => S::Authenticated(session.clone()),
        (S::OtpRequired(_) | S::OtpVerifying(_), E::ChallengeAbandoned) => S::Anonymous,
        (_, E::Expired | E::LoggedOut) => S::Anonymous,
        (state, event) => {
            tracing::warn!(state = state.name(), ?event, "ignoring illegal session transition");
            state
        }
    }
}

/// Shared, persistent session state.
///
/// Cloning shares the underlying state; the store is handed to the API
/// client as its [`TokenSource`] and to the app for transitions.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    storage: SessionStorage,
}

impl SessionStore {
    /// Restore state from disk: a live saved session wins, then a live
    /// saved challenge, else anonymous. Expired leftovers are cleared.
    pub fn restore(storage: SessionStorage, now: DateTime<Utc>) -> Self {
        let state = if let Some(session) = storage.load_session() {
            if session.is_expired(now) {
                tracing::info!("saved session expired; clearing");
                storage.clear_all();
                SessionState::Anonymous
            } else {
                storage.clear_challenge();
                SessionState::Authenticated(session)
            }
        } else if let Some(challenge) = storage.load_challenge() {
            if challenge.is_expired(now) {
                storage.clear_challenge();
                SessionState::Anonymous
            } else {
                SessionState::OtpRequired(challenge)
            }
        } else {
            SessionState::Anonymous
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            storage,
        }
    }

    /// Apply an event and mirror the resulting state to disk.
    pub fn apply(&self, event: &SessionEvent) -> SessionState {
        let mut guard = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = transition(std::mem::take(&mut *guard), event);
        self.persist(&next);
        *guard = next.clone();
        next
    }

    fn persist(&self, state: &SessionState) {
        match state {
            SessionState::Authenticated(session) => {
                if let Err(e) = self.storage.save_session(session) {
                    tracing::warn!("failed to persist session: {e}");
                }
                self.storage.clear_challenge();
            }
            SessionState::OtpRequired(challenge) => {
                if let Err(e) = self.storage.save_challenge(challenge) {
                    tracing::warn!("failed to persist challenge: {e}");
                }
            }
            SessionState::Anonymous => self.storage.clear_all(),
            SessionState::Authenticating | SessionState::OtpVerifying(_) => {}
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The signed-in profile, if authenticated.
    #[must_use]
    pub fn profile(&self) -> Option<Profile> {
        match self.snapshot() {
            SessionState::Authenticated(session) => Some(session.profile),
            _ => None,
        }
    }

    /// Merge later profile data (e.g. from the profile endpoint) into the
    /// authenticated session and re-persist it.
    pub fn merge_profile(&self, update: Profile) {
        let mut guard = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let SessionState::Authenticated(session) = &mut *guard {
            session.profile.merge(update);
            if let Err(e) = self.storage.save_session(session) {
                tracing::warn!("failed to persist merged profile: {e}");
            }
        }
    }
}

impl TokenSource for SessionStore {
    /// Expiry is re-checked on every token read, so a request issued
    /// after the deadline fails locally instead of sending a dead token.
    fn bearer_token(&self) -> Option<String> {
        match &*self.state.read().ok()? {
            SessionState::Authenticated(session) if !session.is_expired(Utc::now()) => {
                Some(session.tokens.token.clone())
            }
            _ => None,
        }
    }
}
