//! Application engine: everything between the API client and the TUI.
//!
//! - [`config`] - TOML settings and env overrides
//! - [`storage`] - owner-only session files with atomic writes
//! - [`session`] - the authentication state machine and token source
//! - [`cache`] - TTL'd read cache with coalescing and invalidation
//! - [`resolver`] - debounced, abortable account-name resolution
//! - [`events`] / [`app`] - the orchestrator the TUI drives

pub mod app;
pub mod cache;
pub mod config;
pub mod events;
pub mod resolver;
pub mod session;
pub mod storage;

pub use app::{App, PageCursors, Screen, StatusKind, StatusLine, Tab};
pub use cache::{Cache, Caches, Freshness};
pub use config::{BackdeskConfig, ConfigError, Settings};
pub use events::{AppEvent, PayoutAction};
pub use resolver::{AccountResolver, ResolutionKey, ResolutionState};
pub use session::{transition, PersistedSession, SessionEvent, SessionState, SessionStore};
pub use storage::SessionStorage;
