//! Credential pool for Gemini browser-session cookies
//!
//! Manages multiple browser-session accounts with pluggable selection
//! (round-robin, random, least-recently-used), per-cookie health tracking,
//! and failover. Each cookie owns at most one lazily created backend session,
//! cached for the process lifetime. The pool is the sole mutator of health
//! state.
//!
//! Cookie lifecycle:
//! 1. Credentials are loaded once at startup from the environment
//!    (`CookieSources`); the pool size is fixed after load
//! 2. `acquire()` selects an available cookie under the requested policy and
//!    returns its cached session, creating it on first use
//! 3. A session-init failure increments the cookie's error count; the third
//!    consecutive failure demotes it to unavailable
//! 4. Any later successful use resets the count and restores availability
//! 5. When no cookie remains available, `acquire()` fails with the last
//!    underlying error
//!
//! The backend is abstracted behind `SessionBackend` so the pool never
//! touches the network in tests.

pub mod backend;
pub mod cookie;
pub mod error;
pub mod pool;
pub mod sources;

pub use backend::{BackendError, BackendSession, SessionBackend};
pub use cookie::{CookieCredential, CookieSpec};
pub use error::{Error, Result};
pub use pool::{CookiePool, CookieStatus, Policy, PoolStatus};
pub use sources::CookieSources;
