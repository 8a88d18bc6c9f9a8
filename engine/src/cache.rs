//! Read cache with TTLs, request coalescing, and write-driven invalidation.
//!
//! Rules:
//!
//! - A fresh entry is served without a request.
//! - A stale entry (TTL elapsed, or invalidated by a write) is still
//!   served while a background refetch runs, so lists never blank out.
//! - At most one fetch per key is in flight; concurrent interest
//!   coalesces onto it.
//! - Writes invalidate exactly the keys they affect; invalidation marks
//!   entries stale without dropping the rows.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::time::{Duration, Instant};

use backdesk_types::{
    AccountId, AuditLogEntry, Bank, Page, PageRequest, Payout, PayoutId, Profile, Role,
    Transaction, TransactionId, User, VirtualAccount,
};

/// TTLs per resource class, matching how quickly each one goes stale in
/// practice: approval queues churn, bank directories do not.
pub mod ttl {
    use std::time::Duration;

    pub const PAYOUTS: Duration = Duration::from_secs(30);
    pub const USERS: Duration = Duration::from_secs(30);
    pub const AUDIT_LOGS: Duration = Duration::from_secs(30);
    pub const TRANSACTIONS: Duration = Duration::from_secs(120);
    pub const ACCOUNTS: Duration = Duration::from_secs(300);
    pub const BANKS: Duration = Duration::from_secs(300);
    pub const ROLES: Duration = Duration::from_secs(300);
    pub const PROFILE: Duration = Duration::from_secs(900);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// Present but past its TTL or explicitly invalidated.
    Stale,
    Missing,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    fetched_at: Instant,
    invalidated: bool,
}

/// One keyed cache with a fixed TTL.
#[derive(Debug)]
pub struct Cache<K, V> {
    ttl: Duration,
    entries: HashMap<K, Entry<V>>,
    in_flight: HashSet<K>,
}

impl<K: Eq + Hash + Clone, V> Cache<K, V> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
            in_flight: HashSet::new(),
        }
    }

    /// The cached value, fresh or stale. Stale data is intentionally
    /// served while a refetch is pending.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|e| &e.value)
    }

    #[must_use]
    pub fn freshness(&self, key: &K) -> Freshness {
        match self.entries.get(key) {
            None => Freshness::Missing,
            Some(e) if e.invalidated || e.fetched_at.elapsed() >= self.ttl => Freshness::Stale,
            Some(_) => Freshness::Fresh,
        }
    }

    /// Whether a fetch should be started for this key right now.
    /// False while fresh and false while another fetch is in flight.
    #[must_use]
    pub fn needs_fetch(&self, key: &K) -> bool {
        self.freshness(key) != Freshness::Fresh && !self.in_flight.contains(key)
    }

    /// Claim the fetch for a key. Returns false when the key is fresh or
    /// a fetch is already running; callers that get false do nothing.
    pub fn begin_fetch(&mut self, key: &K) -> bool {
        if !self.needs_fetch(key) {
            return false;
        }
        self.in_flight.insert(key.clone());
        true
    }

    /// Store a fetched value and release the in-flight claim.
    pub fn complete(&mut self, key: K, value: V) {
        self.in_flight.remove(&key);
        self.entries.insert(
            key,
            Entry {
                value,
                fetched_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    /// Release the in-flight claim after a failed fetch, keeping any
    /// previous value on screen.
    pub fn fail(&mut self, key: &K) {
        self.in_flight.remove(key);
    }

    /// Mark one key stale without dropping its rows.
    pub fn invalidate(&mut self, key: &K) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.invalidated = true;
        }
    }

    /// Mark every entry stale (e.g. any payout page after an approval).
    pub fn invalidate_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.invalidated = true;
        }
    }

    /// Drop everything, cached rows included. Used at logout.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.in_flight.clear();
    }
}

/// All caches, one per resource class.
pub struct Caches {
    pub payout_pages: Cache<PageRequest, Page<Payout>>,
    pub payout_details: Cache<PayoutId, Payout>,
    pub transaction_pages: Cache<PageRequest, Page<Transaction>>,
    pub transaction_details: Cache<TransactionId, Transaction>,
    pub account_pages: Cache<PageRequest, Page<VirtualAccount>>,
    pub account_details: Cache<AccountId, VirtualAccount>,
    pub user_pages: Cache<PageRequest, Page<User>>,
    pub banks: Cache<(), Vec<Bank>>,
    pub roles: Cache<(), Vec<Role>>,
    pub audit_logs: Cache<(), Vec<AuditLogEntry>>,
    pub profile: Cache<(), Profile>,
}

impl Default for Caches {
    fn default() -> Self {
        Self {
            payout_pages: Cache::new(ttl::PAYOUTS),
            payout_details: Cache::new(ttl::PAYOUTS),
            transaction_pages: Cache::new(ttl::TRANSACTIONS),
            transaction_details: Cache::new(ttl::TRANSACTIONS),
            account_pages: Cache::new(ttl::ACCOUNTS),
            account_details: Cache::new(ttl::ACCOUNTS),
            user_pages: Cache::new(ttl::USERS),
            banks: Cache::new(ttl::BANKS),
            roles: Cache::new(ttl::ROLES),
            audit_logs: Cache::new(ttl::AUDIT_LOGS),
            profile: Cache::new(ttl::PROFILE),
        }
    }
}

impl Caches {
    /// Approve/reject/create touched a payout: every payout page and the
    /// affected detail row are now stale. Nothing else is.
    pub fn after_payout_write(&mut self, id: Option<&PayoutId>) {
        self.payout_pages.invalidate_all();
        if let Some(id) = id {
            self.payout_details.invalidate(id);
        }
    }

    /// A new virtual account also shows up as transactions later, but
    /// only the account list is invalidated now; transactions keep their
    /// own TTL.
    pub fn after_account_create(&mut self) {
        self.account_pages.invalidate_all();
    }

    /// User creation or a status toggle: user pages and the audit trail.
    pub fn after_user_write(&mut self) {
        self.user_pages.invalidate_all();
        self.audit_logs.invalidate(&());
    }

    /// Full teardown at logout; cached data must not leak across sessions.
    pub fn clear_all(&mut self) {
        self.payout_pages.clear();
        self.payout_details.clear();
        self.transaction_pages.clear();
        self.transaction_details.clear();
        self.account_pages.clear();
        self.account_details.clear();
        self.user_pages.clear();
        self.banks.clear();
        self.roles.clear();
        self.audit_logs.clear();
        self.profile.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u32) -> PageRequest {
        PageRequest::new(n, 20)
    }

    #[test]
    fn fresh_entries_are_served_without_fetch() {
        let mut cache: Cache<PageRequest, Vec<u8>> = Cache::new(Duration::from_secs(60));
        assert!(cache.begin_fetch(&page(1)));
        cache.complete(page(1), vec![1, 2]);

        assert_eq!(cache.freshness(&page(1)), Freshness::Fresh);
        assert!(!cache.needs_fetch(&page(1)));
        assert_eq!(cache.get(&page(1)), Some(&vec![1, 2]));
    }

    #[test]
    fn concurrent_interest_coalesces_onto_one_fetch() {
        let mut cache: Cache<PageRequest, Vec<u8>> = Cache::new(Duration::from_secs(60));
        assert!(cache.begin_fetch(&page(1)));
        // Second claim for the same key is refused while the first runs.
        assert!(!cache.begin_fetch(&page(1)));
        // A different key fetches independently.
        assert!(cache.begin_fetch(&page(2)));

        cache.complete(page(1), vec![1]);
        assert!(!cache.needs_fetch(&page(1)));
    }

    #[test]
    fn stale_data_is_kept_while_refetching() {
        let mut cache: Cache<PageRequest, Vec<u8>> = Cache::new(Duration::ZERO);
        cache.complete(page(1), vec![1, 2, 3]);

        // TTL zero: immediately stale, but the rows are still there.
        assert_eq!(cache.freshness(&page(1)), Freshness::Stale);
        assert_eq!(cache.get(&page(1)), Some(&vec![1, 2, 3]));
        assert!(cache.begin_fetch(&page(1)));
        assert_eq!(cache.get(&page(1)), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn failed_fetch_releases_claim_and_keeps_value() {
        let mut cache: Cache<PageRequest, Vec<u8>> = Cache::new(Duration::ZERO);
        cache.complete(page(1), vec![9]);
        assert!(cache.begin_fetch(&page(1)));
        cache.fail(&page(1));

        assert_eq!(cache.get(&page(1)), Some(&vec![9]));
        // The next tick can try again.
        assert!(cache.begin_fetch(&page(1)));
    }

    #[test]
    fn invalidation_marks_stale_without_dropping_rows() {
        let mut cache: Cache<PageRequest, Vec<u8>> = Cache::new(Duration::from_secs(600));
        cache.complete(page(1), vec![1]);
        cache.invalidate(&page(1));

        assert_eq!(cache.freshness(&page(1)), Freshness::Stale);
        assert_eq!(cache.get(&page(1)), Some(&vec![1]));
    }

    #[test]
    fn payout_write_invalidates_pages_and_detail_only() {
        let mut caches = Caches::default();
        caches.payout_pages.begin_fetch(&page(1));
        caches.transaction_pages.begin_fetch(&page(1));

        let payout_page = Page {
            items: Vec::<Payout>::new(),
            page: 1,
            page_size: 20,
            total: None,
            total_pages: None,
        };
        let tx_page = Page {
            items: Vec::<Transaction>::new(),
            page: 1,
            page_size: 20,
            total: None,
            total_pages: None,
        };
        caches.payout_pages.complete(page(1), payout_page);
        caches.transaction_pages.complete(page(1), tx_page);

        caches.after_payout_write(Some(&PayoutId::from("po-1")));

        assert_eq!(caches.payout_pages.freshness(&page(1)), Freshness::Stale);
        assert_eq!(
            caches.transaction_pages.freshness(&page(1)),
            Freshness::Fresh
        );
    }

    #[test]
    fn logout_drops_everything() {
        let mut caches = Caches::default();
        caches.banks.complete(
            (),
            vec![Bank {
                bank_name: "GTBank".to_owned(),
                bank_code: "058".to_owned(),
            }],
        );
        caches.clear_all();
        assert_eq!(caches.banks.freshness(&()), Freshness::Missing);
    }
}
