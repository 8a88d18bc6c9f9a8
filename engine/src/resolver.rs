//! Debounced, abortable account-name resolution.
//!
//! As the user types a beneficiary account number, resolution waits for a
//! 500ms pause before hitting the network. Each keystroke resets the
//! timer and aborts any request already in flight, so a response for an
//! earlier, shorter input can never overwrite the result for the current
//! one.

use std::time::{Duration, Instant};

use futures_util::future::AbortHandle;

use backdesk_types::ResolvedAccount;

pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Minimum account-number length before resolution is attempted.
pub const MIN_ACCOUNT_NUMBER_LEN: usize = 10;

/// Input pair a resolution is keyed by. A result is only accepted if its
/// key still matches the current input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionKey {
    pub account_number: String,
    pub bank_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResolutionState {
    #[default]
    Idle,
    /// Debounce window open; no request sent yet.
    Waiting,
    /// Request in flight.
    Resolving,
    Resolved(ResolvedAccount),
    Failed(String),
}

/// Debounce and in-flight bookkeeping for the create-payout form.
#[derive(Default)]
pub struct AccountResolver {
    state: ResolutionState,
    pending: Option<(ResolutionKey, Instant)>,
    in_flight: Option<(ResolutionKey, AbortHandle)>,
}

impl AccountResolver {
    #[must_use]
    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    /// Called on every edit of the account number or bank selection.
    ///
    /// Incomplete input clears everything; complete input opens a fresh
    /// debounce window and aborts any request for the previous input.
    pub fn input_changed(&mut self, account_number: &str, bank_code: &str, now: Instant) {
        self.abort_in_flight();

        if account_number.chars().count() < MIN_ACCOUNT_NUMBER_LEN || bank_code.is_empty() {
            self.pending = None;
            self.state = ResolutionState::Idle;
            return;
        }

        let key = ResolutionKey {
            account_number: account_number.to_owned(),
            bank_code: bank_code.to_owned(),
        };
        self.pending = Some((key, now + DEBOUNCE));
        self.state = ResolutionState::Waiting;
    }

    /// If the debounce window has closed, take the key to resolve.
    /// The caller spawns the request and hands back its [`AbortHandle`]
    /// via [`AccountResolver::request_started`].
    pub fn take_due(&mut self, now: Instant) -> Option<ResolutionKey> {
        let due = matches!(&self.pending, Some((_, deadline)) if now >= *deadline);
        if !due {
            return None;
        }
        let (key, _) = self.pending.take()?;
        self.state = ResolutionState::Resolving;
        Some(key)
    }

    pub fn request_started(&mut self, key: ResolutionKey, abort: AbortHandle) {
        self.in_flight = Some((key, abort));
    }

    /// Accept a result only when it answers the request still in flight;
    /// anything else is a late response for input that no longer exists.
    pub fn request_finished(
        &mut self,
        key: &ResolutionKey,
        result: Result<ResolvedAccount, String>,
    ) {
        let current = matches!(&self.in_flight, Some((in_flight, _)) if in_flight == key);
        if !current {
            tracing::debug!("dropping stale account resolution result");
            return;
        }
        self.in_flight = None;
        self.state = match result {
            Ok(resolved) => ResolutionState::Resolved(resolved),
            Err(message) => ResolutionState::Failed(message),
        };
    }

    /// Reset to idle (form closed or submitted).
    pub fn reset(&mut self) {
        self.abort_in_flight();
        self.pending = None;
        self.state = ResolutionState::Idle;
    }

    fn abort_in_flight(&mut self) {
        if let Some((_, handle)) = self.in_flight.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::AbortHandle;

    fn resolved() -> ResolvedAccount {
        ResolvedAccount {
            account_number: "0123456789".to_owned(),
            account_name: "ACME SUPPLIES LTD".to_owned(),
            bank_code: None,
        }
    }

    #[test]
    fn waits_out_the_debounce_window() {
        let mut resolver = AccountResolver::default();
        let start = Instant::now();

        resolver.input_changed("0123456789", "058", start);
        assert_eq!(*resolver.state(), ResolutionState::Waiting);
        assert!(resolver.take_due(start + Duration::from_millis(499)).is_none());

        let key = resolver.take_due(start + DEBOUNCE).expect("due");
        assert_eq!(key.account_number, "0123456789");
        assert_eq!(*resolver.state(), ResolutionState::Resolving);
    }

    #[test]
    fn each_edit_resets_the_timer() {
        let mut resolver = AccountResolver::default();
        let start = Instant::now();

        resolver.input_changed("0123456789", "058", start);
        let later = start + Duration::from_millis(400);
        resolver.input_changed("0123456780", "058", later);

        // The first deadline has passed, but the edit moved it.
        assert!(resolver.take_due(start + DEBOUNCE).is_none());
        assert!(resolver.take_due(later + DEBOUNCE).is_some());
    }

    #[test]
    fn incomplete_input_goes_idle() {
        let mut resolver = AccountResolver::default();
        let now = Instant::now();
        resolver.input_changed("0123456789", "058", now);
        resolver.input_changed("01234", "058", now);
        assert_eq!(*resolver.state(), ResolutionState::Idle);
        assert!(resolver.take_due(now + DEBOUNCE).is_none());
    }

    #[test]
    fn new_input_aborts_the_inflight_request() {
        let mut resolver = AccountResolver::default();
        let now = Instant::now();
        resolver.input_changed("0123456789", "058", now);
        let key = resolver.take_due(now + DEBOUNCE).expect("due");

        let (handle, _registration) = AbortHandle::new_pair();
        resolver.request_started(key.clone(), handle.clone());

        resolver.input_changed("0123456780", "058", now + DEBOUNCE);
        assert!(handle.is_aborted());

        // The aborted request's result must be ignored even if it lands.
        resolver.request_finished(&key, Ok(resolved()));
        assert_eq!(*resolver.state(), ResolutionState::Waiting);
    }

    #[test]
    fn matching_result_is_accepted() {
        let mut resolver = AccountResolver::default();
        let now = Instant::now();
        resolver.input_changed("0123456789", "058", now);
        let key = resolver.take_due(now + DEBOUNCE).expect("due");

        let (handle, _registration) = AbortHandle::new_pair();
        resolver.request_started(key.clone(), handle);
        resolver.request_finished(&key, Ok(resolved()));

        assert!(matches!(resolver.state(), ResolutionState::Resolved(r) if r.account_name == "ACME SUPPLIES LTD"));
    }

    #[test]
    fn failure_keeps_the_message_for_display() {
        let mut resolver = AccountResolver::default();
        let now = Instant::now();
        resolver.input_changed("0123456789", "058", now);
        let key = resolver.take_due(now + DEBOUNCE).expect("due");

        let (handle, _registration) = AbortHandle::new_pair();
        resolver.request_started(key.clone(), handle);
        resolver.request_finished(&key, Err("could not resolve account".to_owned()));

        assert_eq!(
            *resolver.state(),
            ResolutionState::Failed("could not resolve account".to_owned())
        );
    }
}
