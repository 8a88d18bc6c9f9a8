//! The application orchestrator.
//!
//! [`App`] owns every piece of state the TUI renders: session, caches,
//! screen routing, and the status line. All async work is spawned onto
//! tokio and reports back through the event channel; [`App::tick`]
//! drains it on the UI thread, so nothing here needs locking beyond the
//! session store.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::future::{AbortHandle, Abortable};
use tokio::sync::mpsc;

use backdesk_api::{ApiClient, ApiError, LoginOutcome};
use backdesk_types::{
    is_valid_email, AccountId, NewAccount, NewPayout, NewUser, OtpChallenge, OtpCode, PageRequest,
    PayoutId, RejectReason, StatementRequest, TransactionId, UserId, UserStatus,
};

use crate::cache::Caches;
use crate::config::Settings;
use crate::events::{AppEvent, PayoutAction};
use crate::resolver::AccountResolver;
use crate::session::{PersistedSession, SessionEvent, SessionState, SessionStore};
use crate::storage::{data_dir, SessionStorage};

/// Client-side cooldown between OTP resend requests, in seconds.
const RESEND_COOLDOWN_SECS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Otp,
    ForgotPassword,
    ResetPassword,
    Dashboard(Tab),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Payouts,
    Transactions,
    Accounts,
    Users,
    AuditLogs,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Payouts,
        Tab::Transactions,
        Tab::Accounts,
        Tab::Users,
        Tab::AuditLogs,
    ];

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Payouts => "Payouts",
            Self::Transactions => "Transactions",
            Self::Accounts => "Accounts",
            Self::Users => "Users",
            Self::AuditLogs => "Audit Logs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

/// Page cursors, one per paginated tab.
#[derive(Debug, Clone, Copy)]
pub struct PageCursors {
    pub payouts: PageRequest,
    pub transactions: PageRequest,
    pub accounts: PageRequest,
    pub users: PageRequest,
}

impl PageCursors {
    fn new(page_size: u32) -> Self {
        let first = PageRequest::first(page_size);
        Self {
            payouts: first,
            transactions: first,
            accounts: first,
            users: first,
        }
    }
}

pub struct App {
    pub settings: Settings,
    client: Arc<ApiClient>,
    pub session: SessionStore,
    pub caches: Caches,
    pub resolver: AccountResolver,

    pub screen: Screen,
    pub cursors: PageCursors,
    pub status: Option<StatusLine>,
    /// Number of writes awaiting a response; the TUI shows a spinner.
    pub pending_writes: usize,
    pub should_quit: bool,
    /// Resend is rate-limited client-side after each issued challenge.
    resend_blocked_until: Option<DateTime<Utc>>,

    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    /// Wire up storage, restore any saved session, and build the API
    /// client with the session store as its token source.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let storage = SessionStorage::open(data_dir(settings.data_dir.as_deref()))?;
        let session = SessionStore::restore(storage, Utc::now());

        let client = Arc::new(ApiClient::new(
            settings.base_url.clone(),
            settings.api_key.clone(),
            Arc::new(session.clone()),
        ));

        let screen = match session.snapshot() {
            SessionState::Authenticated(_) => Screen::Dashboard(Tab::Payouts),
            SessionState::OtpRequired(_) => Screen::Otp,
            _ => Screen::Login,
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        // A restored session may be close to expiry; exchange the saved
        // token for a fresh one in the background.
        if let SessionState::Authenticated(saved) = session.snapshot() {
            let client = client.clone();
            let tx = events_tx.clone();
            tokio::spawn(async move {
                let result = client.refresh(&saved.tokens.token).await;
                let _ = tx.send(AppEvent::SessionRefreshed(result));
            });
        }

        Ok(Self {
            cursors: PageCursors::new(settings.page_size),
            settings,
            client,
            session,
            caches: Caches::default(),
            resolver: AccountResolver::default(),
            screen,
            status: None,
            pending_writes: 0,
            should_quit: false,
            resend_blocked_until: None,
            events_tx,
            events_rx,
        })
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(StatusLine {
            kind,
            text: text.into(),
        });
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// The active two-factor challenge, if the session is at that stage.
    #[must_use]
    pub fn challenge(&self) -> Option<OtpChallenge> {
        match self.session.snapshot() {
            SessionState::OtpRequired(c) | SessionState::OtpVerifying(c) => Some(c),
            _ => None,
        }
    }

    /// Seconds until another code may be requested (0 when allowed).
    #[must_use]
    pub fn resend_wait_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.resend_blocked_until
            .map_or(0, |until| (until - now).num_seconds().max(0))
    }

    // ---- session actions -------------------------------------------------

    pub fn submit_login(&mut self, email: &str, password: &str) {
        if !is_valid_email(email) {
            self.set_status(StatusKind::Error, "enter a valid email address");
            return;
        }
        if password.is_empty() {
            self.set_status(StatusKind::Error, "password is required");
            return;
        }

        self.session.apply(&SessionEvent::LoginSubmitted);
        self.clear_status();

        let credentials = backdesk_types::Credentials {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.login(&credentials).await;
            let _ = tx.send(AppEvent::LoginFinished(result));
        });
    }

    /// Returns true when a verification request was dispatched; the
    /// caller clears the entered code so a rejection never leaves it
    /// on screen.
    pub fn submit_otp(&mut self, input: &str) -> bool {
        let Some(challenge) = self.challenge() else {
            return false;
        };
        if challenge.is_expired(Utc::now()) {
            self.set_status(StatusKind::Error, "code expired; request a new one");
            return false;
        }
        let code = match OtpCode::new(input) {
            Ok(code) => code,
            Err(e) => {
                self.set_status(StatusKind::Error, e.to_string());
                return false;
            }
        };

        self.session.apply(&SessionEvent::OtpSubmitted);
        self.clear_status();

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.verify_otp(&challenge, &code).await;
            let _ = tx.send(AppEvent::OtpVerified { challenge, result });
        });
        true
    }

    pub fn resend_otp(&mut self) {
        let Some(challenge) = self.challenge() else {
            return;
        };
        let wait = self.resend_wait_seconds(Utc::now());
        if wait > 0 {
            self.set_status(
                StatusKind::Error,
                format!("wait {wait}s before requesting another code"),
            );
            return;
        }
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.resend_otp(&challenge.challenge_id).await;
            let _ = tx.send(AppEvent::OtpResent(result));
        });
    }

    pub fn abandon_challenge(&mut self) {
        self.session.apply(&SessionEvent::ChallengeAbandoned);
        self.resend_blocked_until = None;
        self.screen = Screen::Login;
        self.clear_status();
    }

    fn start_resend_cooldown(&mut self) {
        self.resend_blocked_until = Some(Utc::now() + chrono::Duration::seconds(RESEND_COOLDOWN_SECS));
    }

    pub fn submit_forgot_password(&mut self, email: &str) {
        if !is_valid_email(email) {
            self.set_status(StatusKind::Error, "enter a valid email address");
            return;
        }
        let email = email.to_owned();
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.forgot_password(&email).await;
            let _ = tx.send(AppEvent::PasswordResetRequested(result));
        });
    }

    pub fn submit_reset_password(&mut self, token: &str, email: &str, new_password: &str) {
        let strength = backdesk_types::PasswordStrength::check(new_password);
        if !strength.is_valid() {
            self.set_status(
                StatusKind::Error,
                "password needs 8+ characters with upper, lower, and a digit",
            );
            return;
        }
        let (token, email, new_password) =
            (token.to_owned(), email.to_owned(), new_password.to_owned());
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.reset_password(&token, &email, &new_password).await;
            let _ = tx.send(AppEvent::PasswordResetCompleted(result));
        });
    }

    /// Local state is torn down immediately; the server call is
    /// best-effort and its failure only gets a log line.
    pub fn logout(&mut self) {
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = client.logout().await {
                tracing::warn!("server-side logout failed: {e}");
            }
            let _ = tx.send(AppEvent::LoggedOut);
        });
        self.teardown_session();
        self.set_status(StatusKind::Info, "signed out");
    }

    fn teardown_session(&mut self) {
        self.session.apply(&SessionEvent::LoggedOut);
        self.caches.clear_all();
        self.resolver.reset();
        self.resend_blocked_until = None;
        self.screen = Screen::Login;
    }

    /// Any 401 from any endpoint lands here: session gone, caches gone,
    /// back to login.
    fn expire_session(&mut self) {
        self.session.apply(&SessionEvent::Expired);
        self.caches.clear_all();
        self.resolver.reset();
        self.resend_blocked_until = None;
        self.screen = Screen::Login;
        self.set_status(StatusKind::Error, "session expired; please sign in again");
    }

    // ---- data loading ----------------------------------------------------

    /// Start fetches for whatever the current screen needs and is not
    /// fresh. Coalescing lives in the caches, so calling this every tick
    /// is cheap.
    pub fn ensure_data(&mut self) {
        if !self.session.snapshot().is_authenticated() {
            return;
        }
        let Screen::Dashboard(tab) = self.screen else {
            return;
        };

        if self.caches.profile.begin_fetch(&()) {
            let client = self.client.clone();
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(AppEvent::ProfileLoaded(client.profile().await));
            });
        }

        match tab {
            Tab::Payouts => {
                let page = self.cursors.payouts;
                if self.caches.payout_pages.begin_fetch(&page) {
                    let client = self.client.clone();
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = client.list_payouts(page).await;
                        let _ = tx.send(AppEvent::PayoutsLoaded { page, result });
                    });
                }
            }
            Tab::Transactions => {
                let page = self.cursors.transactions;
                if self.caches.transaction_pages.begin_fetch(&page) {
                    let client = self.client.clone();
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = client.list_transactions(page).await;
                        let _ = tx.send(AppEvent::TransactionsLoaded { page, result });
                    });
                }
            }
            Tab::Accounts => {
                let page = self.cursors.accounts;
                if self.caches.account_pages.begin_fetch(&page) {
                    let client = self.client.clone();
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = client.list_accounts(page).await;
                        let _ = tx.send(AppEvent::AccountsLoaded { page, result });
                    });
                }
            }
            Tab::Users => {
                let page = self.cursors.users;
                if self.caches.user_pages.begin_fetch(&page) {
                    let client = self.client.clone();
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = client.list_users(page).await;
                        let _ = tx.send(AppEvent::UsersLoaded { page, result });
                    });
                }
                if self.caches.roles.begin_fetch(&()) {
                    let client = self.client.clone();
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let _ = tx.send(AppEvent::RolesLoaded(client.roles_permissions().await));
                    });
                }
            }
            Tab::AuditLogs => {
                if self.caches.audit_logs.begin_fetch(&()) {
                    let client = self.client.clone();
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let _ = tx.send(AppEvent::AuditLogsLoaded(client.audit_logs().await));
                    });
                }
            }
        }
    }

    /// Fetch one payout's detail row (opened from the list). The list
    /// row stays on screen while the detail loads.
    pub fn ensure_payout_detail(&mut self, id: &PayoutId) {
        if self.caches.payout_details.begin_fetch(id) {
            let id = id.clone();
            let client = self.client.clone();
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let result = client.get_payout(&id).await;
                let _ = tx.send(AppEvent::PayoutDetailLoaded { id, result });
            });
        }
    }

    /// Fetch one transaction's detail row (opened from the list).
    pub fn ensure_transaction_detail(&mut self, id: &TransactionId) {
        if self.caches.transaction_details.begin_fetch(id) {
            let id = id.clone();
            let client = self.client.clone();
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let result = client.get_transaction(&id).await;
                let _ = tx.send(AppEvent::TransactionDetailLoaded { id, result });
            });
        }
    }

    /// Fetch one virtual account's detail row (opened from the list).
    pub fn ensure_account_detail(&mut self, id: &AccountId) {
        if self.caches.account_details.begin_fetch(id) {
            let id = id.clone();
            let client = self.client.clone();
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let result = client.get_account(&id).await;
                let _ = tx.send(AppEvent::AccountDetailLoaded { id, result });
            });
        }
    }

    /// The create-payout form needs the bank directory; fetched on open.
    pub fn ensure_banks(&mut self) {
        if self.caches.banks.begin_fetch(&()) {
            let client = self.client.clone();
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(AppEvent::BanksLoaded(client.provider_banks().await));
            });
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.screen = Screen::Dashboard(tab);
    }

    pub fn next_page(&mut self, tab: Tab) {
        match tab {
            Tab::Payouts => {
                if self
                    .caches
                    .payout_pages
                    .get(&self.cursors.payouts)
                    .is_some_and(backdesk_types::Page::has_next)
                {
                    self.cursors.payouts = self.cursors.payouts.next();
                }
            }
            Tab::Transactions => {
                if self
                    .caches
                    .transaction_pages
                    .get(&self.cursors.transactions)
                    .is_some_and(backdesk_types::Page::has_next)
                {
                    self.cursors.transactions = self.cursors.transactions.next();
                }
            }
            Tab::Accounts => {
                if self
                    .caches
                    .account_pages
                    .get(&self.cursors.accounts)
                    .is_some_and(backdesk_types::Page::has_next)
                {
                    self.cursors.accounts = self.cursors.accounts.next();
                }
            }
            Tab::Users => {
                if self
                    .caches
                    .user_pages
                    .get(&self.cursors.users)
                    .is_some_and(backdesk_types::Page::has_next)
                {
                    self.cursors.users = self.cursors.users.next();
                }
            }
            Tab::AuditLogs => {}
        }
    }

    pub fn previous_page(&mut self, tab: Tab) {
        match tab {
            Tab::Payouts => self.cursors.payouts = self.cursors.payouts.previous(),
            Tab::Transactions => self.cursors.transactions = self.cursors.transactions.previous(),
            Tab::Accounts => self.cursors.accounts = self.cursors.accounts.previous(),
            Tab::Users => self.cursors.users = self.cursors.users.previous(),
            Tab::AuditLogs => {}
        }
    }

    // ---- writes ----------------------------------------------------------

    pub fn approve_payout(&mut self, id: PayoutId) {
        self.spawn_payout_action(id, PayoutAction::Approve, None);
    }

    pub fn reject_payout(&mut self, id: PayoutId, reason: RejectReason) {
        self.spawn_payout_action(id, PayoutAction::Reject, Some(reason));
    }

    fn spawn_payout_action(
        &mut self,
        id: PayoutId,
        action: PayoutAction,
        reason: Option<RejectReason>,
    ) {
        self.pending_writes += 1;
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = match (&action, &reason) {
                (PayoutAction::Reject, Some(reason)) => client.reject_payout(&id, reason).await,
                _ => client.approve_payout(&id).await,
            };
            let _ = tx.send(AppEvent::PayoutActioned { id, action, result });
        });
    }

    pub fn create_payout(&mut self, payout: NewPayout) {
        self.pending_writes += 1;
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppEvent::PayoutCreated(client.create_payout(&payout).await));
        });
    }

    pub fn create_account(&mut self, account: NewAccount) {
        self.pending_writes += 1;
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppEvent::AccountCreated(
                client.create_account(&account).await,
            ));
        });
    }

    pub fn create_user(&mut self, user: NewUser) {
        self.pending_writes += 1;
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppEvent::UserCreated(client.create_user(&user).await));
        });
    }

    pub fn toggle_user_status(&mut self, id: UserId, current: UserStatus) {
        self.pending_writes += 1;
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.update_user_status(&id, current.toggled()).await;
            let _ = tx.send(AppEvent::UserStatusUpdated { id, result });
        });
    }

    pub fn request_statement(&mut self, request: StatementRequest) {
        if request.end_date < request.start_date {
            self.set_status(StatusKind::Error, "end date must not precede start date");
            return;
        }
        if !is_valid_email(&request.email) {
            self.set_status(StatusKind::Error, "enter a valid delivery email");
            return;
        }
        self.pending_writes += 1;
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppEvent::StatementRequested(
                client.request_statement(&request).await,
            ));
        });
    }

    // ---- account resolution ---------------------------------------------

    pub fn resolution_input_changed(&mut self, account_number: &str, bank_code: &str) {
        self.resolver
            .input_changed(account_number, bank_code, Instant::now());
    }

    fn poll_resolver(&mut self, now: Instant) {
        let Some(key) = self.resolver.take_due(now) else {
            return;
        };
        let (abort, registration) = AbortHandle::new_pair();
        self.resolver.request_started(key.clone(), abort);

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let fut = async {
                client
                    .resolve_account(&key.account_number, &key.bank_code)
                    .await
            };
            if let Ok(result) = Abortable::new(fut, registration).await {
                let _ = tx.send(AppEvent::AccountResolved { key, result });
            }
        });
    }

    // ---- tick ------------------------------------------------------------

    /// One frame of work: fire due resolutions, drain finished tasks,
    /// kick off any fetches the current screen needs.
    pub fn tick(&mut self) {
        self.poll_resolver(Instant::now());
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
        self.ensure_data();
    }

    #[allow(clippy::too_many_lines)]
    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::LoginFinished(Ok(LoginOutcome::ChallengeRequired(challenge))) => {
                self.session
                    .apply(&SessionEvent::ChallengeIssued(challenge.clone()));
                self.start_resend_cooldown();
                self.screen = Screen::Otp;
                self.set_status(
                    StatusKind::Info,
                    format!("verification code sent to {}", challenge.masked_contact()),
                );
            }
            AppEvent::LoginFinished(Ok(LoginOutcome::Authenticated(payload))) => {
                self.establish_session(payload.tokens, payload.profile);
            }
            AppEvent::LoginFinished(Err(e)) => {
                self.session.apply(&SessionEvent::LoginFailed);
                self.set_status(StatusKind::Error, e.message());
            }
            AppEvent::OtpVerified { result: Ok(payload), .. } => {
                self.establish_session(payload.tokens, payload.profile);
            }
            AppEvent::OtpVerified { result: Err(e), .. } => {
                self.session.apply(&SessionEvent::OtpRejected);
                self.set_status(StatusKind::Error, e.message());
            }
            AppEvent::OtpResent(Ok(new_expiry)) => {
                if let Some(expires_at) = new_expiry {
                    if let SessionState::OtpRequired(mut challenge) = self.session.snapshot() {
                        challenge.expires_at = expires_at;
                        self.session
                            .apply(&SessionEvent::ChallengeIssued(challenge));
                    }
                }
                self.start_resend_cooldown();
                self.set_status(StatusKind::Success, "a new code is on its way");
            }
            AppEvent::OtpResent(Err(e)) => self.fail(&e),
            AppEvent::PasswordResetRequested(Ok(())) => {
                self.screen = Screen::ResetPassword;
                self.set_status(
                    StatusKind::Success,
                    "check your email for the reset code",
                );
            }
            AppEvent::PasswordResetRequested(Err(e)) => self.fail(&e),
            AppEvent::PasswordResetCompleted(Ok(())) => {
                self.screen = Screen::Login;
                self.set_status(StatusKind::Success, "password updated; sign in");
            }
            AppEvent::PasswordResetCompleted(Err(e)) => self.fail(&e),
            AppEvent::SessionRefreshed(Ok(tokens)) => {
                if let SessionState::Authenticated(session) = self.session.snapshot() {
                    self.session.apply(&SessionEvent::Established(PersistedSession {
                        tokens,
                        profile: session.profile,
                        saved_at: Utc::now(),
                    }));
                }
            }
            AppEvent::SessionRefreshed(Err(e)) => {
                // The old token keeps working until the server 401s; only
                // an auth rejection here ends the session early.
                if e.is_auth() {
                    self.fail(&e);
                } else {
                    tracing::warn!("token refresh failed: {}", e.message());
                }
            }
            AppEvent::LoggedOut => {}

            AppEvent::PayoutsLoaded { page, result } => match result {
                Ok(data) => self.caches.payout_pages.complete(page, data),
                Err(e) => {
                    self.caches.payout_pages.fail(&page);
                    self.fail(&e);
                }
            },
            AppEvent::TransactionsLoaded { page, result } => match result {
                Ok(data) => self.caches.transaction_pages.complete(page, data),
                Err(e) => {
                    self.caches.transaction_pages.fail(&page);
                    self.fail(&e);
                }
            },
            AppEvent::AccountsLoaded { page, result } => match result {
                Ok(data) => self.caches.account_pages.complete(page, data),
                Err(e) => {
                    self.caches.account_pages.fail(&page);
                    self.fail(&e);
                }
            },
            AppEvent::UsersLoaded { page, result } => match result {
                Ok(data) => self.caches.user_pages.complete(page, data),
                Err(e) => {
                    self.caches.user_pages.fail(&page);
                    self.fail(&e);
                }
            },
            AppEvent::PayoutDetailLoaded { id, result } => match result {
                Ok(payout) => self.caches.payout_details.complete(id, payout),
                Err(e) => {
                    self.caches.payout_details.fail(&id);
                    self.fail(&e);
                }
            },
            AppEvent::TransactionDetailLoaded { id, result } => match result {
                Ok(transaction) => self.caches.transaction_details.complete(id, transaction),
                Err(e) => {
                    self.caches.transaction_details.fail(&id);
                    self.fail(&e);
                }
            },
            AppEvent::AccountDetailLoaded { id, result } => match result {
                Ok(account) => self.caches.account_details.complete(id, account),
                Err(e) => {
                    self.caches.account_details.fail(&id);
                    self.fail(&e);
                }
            },
            AppEvent::BanksLoaded(result) => match result {
                Ok(banks) => self.caches.banks.complete((), banks),
                Err(e) => {
                    self.caches.banks.fail(&());
                    self.fail(&e);
                }
            },
            AppEvent::RolesLoaded(result) => match result {
                Ok(roles) => self.caches.roles.complete((), roles),
                Err(e) => {
                    self.caches.roles.fail(&());
                    self.fail(&e);
                }
            },
            AppEvent::AuditLogsLoaded(result) => match result {
                Ok(logs) => self.caches.audit_logs.complete((), logs),
                Err(e) => {
                    self.caches.audit_logs.fail(&());
                    self.fail(&e);
                }
            },
            AppEvent::ProfileLoaded(result) => match result {
                Ok(profile) => {
                    self.session.merge_profile(profile.clone());
                    self.caches.profile.complete((), profile);
                }
                Err(e) => {
                    self.caches.profile.fail(&());
                    self.fail(&e);
                }
            },

            AppEvent::PayoutCreated(result) => {
                self.write_done();
                match result {
                    Ok(payout) => {
                        self.caches.after_payout_write(Some(&payout.id));
                        self.set_status(StatusKind::Success, "payout created");
                    }
                    Err(e) => self.fail(&e),
                }
            }
            AppEvent::PayoutActioned { id, action, result } => {
                self.write_done();
                match result {
                    Ok(()) => {
                        self.caches.after_payout_write(Some(&id));
                        self.set_status(
                            StatusKind::Success,
                            format!("payout {}", action.past_tense()),
                        );
                    }
                    Err(e) => self.fail(&e),
                }
            }
            AppEvent::AccountCreated(result) => {
                self.write_done();
                match result {
                    Ok(account) => {
                        self.caches.after_account_create();
                        self.set_status(
                            StatusKind::Success,
                            format!("account {} created", account.account_number),
                        );
                    }
                    Err(e) => self.fail(&e),
                }
            }
            AppEvent::UserCreated(result) => {
                self.write_done();
                match result {
                    Ok(user) => {
                        self.caches.after_user_write();
                        self.set_status(
                            StatusKind::Success,
                            format!("user {} created", user.email),
                        );
                    }
                    Err(e) => self.fail(&e),
                }
            }
            AppEvent::UserStatusUpdated { result, .. } => {
                self.write_done();
                match result {
                    Ok(()) => {
                        self.caches.after_user_write();
                        self.set_status(StatusKind::Success, "user status updated");
                    }
                    Err(e) => self.fail(&e),
                }
            }
            AppEvent::StatementRequested(result) => {
                self.write_done();
                match result {
                    Ok(()) => self.set_status(
                        StatusKind::Success,
                        "statement requested; it will arrive by email",
                    ),
                    Err(e) => self.fail(&e),
                }
            }

            AppEvent::AccountResolved { key, result } => {
                self.resolver
                    .request_finished(&key, result.map_err(|e| e.message()));
            }
        }
    }

    fn establish_session(
        &mut self,
        tokens: backdesk_types::AuthTokens,
        profile: backdesk_types::Profile,
    ) {
        self.session.apply(&SessionEvent::Established(PersistedSession {
            tokens,
            profile,
            saved_at: Utc::now(),
        }));
        self.screen = Screen::Dashboard(Tab::Payouts);
        self.clear_status();
    }

    fn write_done(&mut self) {
        self.pending_writes = self.pending_writes.saturating_sub(1);
    }

    /// Shared error sink: auth errors tear the session down, everything
    /// else becomes a status-line message.
    fn fail(&mut self, error: &ApiError) {
        if error.is_auth() && self.session.snapshot().is_authenticated() {
            self.expire_session();
        } else {
            self.set_status(StatusKind::Error, error.message());
        }
    }
}
