//! Pool state machine and cookie selection
//!
//! The pool owns the ordered cookie list (load order, fixed for the process
//! lifetime) and a rotation cursor. Selection filters to available cookies
//! first; the cursor indexes the filtered subset at the moment of each call,
//! not a fixed ring, so fairness under changing availability is approximate.
//! Inherited behavior, reproduced deliberately.
//!
//! Failover is an explicit bounded loop: a cookie whose session init fails is
//! marked and not retried within the same call, so an `acquire` finishes in
//! at most N attempts for N cookies.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::RngExt;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, BackendSession, SessionBackend};
use crate::cookie::{CookieCredential, CookieSpec};
use crate::error::{Error, Result};

/// Cookie selection policy. Unrecognized tags fall back to round-robin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    #[default]
    RoundRobin,
    Random,
    LeastRecentlyUsed,
}

impl Policy {
    /// Parse a policy tag.
    pub fn from_tag(tag: &str) -> Policy {
        match tag {
            "round_robin" => Policy::RoundRobin,
            "random" => Policy::Random,
            "least_recently_used" => Policy::LeastRecentlyUsed,
            _ => Policy::RoundRobin,
        }
    }

    /// Policy label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Policy::RoundRobin => "round_robin",
            Policy::Random => "random",
            Policy::LeastRecentlyUsed => "least_recently_used",
        }
    }
}

/// Point-in-time pool snapshot for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub total_cookies: usize,
    pub available_cookies: usize,
    pub cookies: Vec<CookieStatus>,
}

/// One cookie's health, without its secrets.
#[derive(Debug, Clone, Serialize)]
pub struct CookieStatus {
    pub name: String,
    pub is_available: bool,
    pub error_count: u32,
    pub last_used: u64,
}

/// One cookie plus its lazily created session.
///
/// The `OnceCell` admits a single concurrent initializer per cookie; a failed
/// init caches nothing, so the next use retries creation. The cookie mutex is
/// never held across an await.
struct Slot {
    cookie: Mutex<CookieCredential>,
    session: OnceCell<Arc<dyn BackendSession>>,
}

/// Cookie pool with health tracking and failover.
pub struct CookiePool {
    slots: Vec<Slot>,
    cursor: Mutex<usize>,
    backend: Arc<dyn SessionBackend>,
    init_timeout: Duration,
}

impl CookiePool {
    /// Build the pool from loaded credentials. The pool size is fixed from
    /// here on.
    pub fn new(
        specs: Vec<CookieSpec>,
        backend: Arc<dyn SessionBackend>,
        init_timeout: Duration,
    ) -> Result<Self> {
        if specs.is_empty() {
            return Err(Error::Config("cookie pool cannot be empty".into()));
        }
        let slots: Vec<Slot> = specs
            .into_iter()
            .map(|spec| Slot {
                cookie: Mutex::new(CookieCredential::new(spec)),
                session: OnceCell::new(),
            })
            .collect();
        info!(cookies = slots.len(), "cookie pool initialized");
        Ok(Self {
            slots,
            cursor: Mutex::new(0),
            backend,
            init_timeout,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Select a cookie under `policy` and return its session, creating it on
    /// first use.
    ///
    /// A session-init failure marks the cookie (demotion at the error
    /// threshold) and the loop moves on to the remaining candidates. When no
    /// candidate is left, fails with the last underlying error.
    pub async fn acquire(&self, policy: Policy) -> Result<Arc<dyn BackendSession>> {
        let mut tried = vec![false; self.slots.len()];
        let mut last_error: Option<BackendError> = None;

        loop {
            let filtered: Vec<usize> = (0..self.slots.len())
                .filter(|&i| !tried[i] && self.slots[i].cookie.lock().unwrap().is_available)
                .collect();
            if filtered.is_empty() {
                return Err(match last_error {
                    Some(e) => Error::PoolExhausted(format!("all cookies failed; last error: {e}")),
                    None => Error::PoolExhausted(
                        "no available cookies; all accounts may be rate limited or invalid".into(),
                    ),
                });
            }

            let pick = self.select(policy, &filtered);
            let slot = &self.slots[pick];

            match self.session_for(slot).await {
                Ok(session) => {
                    let mut cookie = slot.cookie.lock().unwrap();
                    cookie.mark_success();
                    debug!(cookie = %cookie.name, policy = policy.label(), "session acquired");
                    return Ok(session);
                }
                Err(e) => {
                    {
                        let mut cookie = slot.cookie.lock().unwrap();
                        cookie.mark_error();
                        warn!(
                            cookie = %cookie.name,
                            error = %e,
                            error_count = cookie.error_count,
                            is_available = cookie.is_available,
                            "session init failed"
                        );
                    }
                    tried[pick] = true;
                    last_error = Some(e);
                }
            }
        }
    }

    /// Pick a slot index from the filtered candidate list.
    fn select(&self, policy: Policy, filtered: &[usize]) -> usize {
        match policy {
            Policy::RoundRobin => {
                let mut cursor = self.cursor.lock().unwrap();
                let idx = *cursor % filtered.len();
                *cursor = (*cursor + 1) % filtered.len();
                filtered[idx]
            }
            Policy::Random => filtered[rand::rng().random_range(0..filtered.len())],
            Policy::LeastRecentlyUsed => {
                // strict comparison keeps the first occurrence on ties
                let mut best = filtered[0];
                let mut best_used = self.slots[best].cookie.lock().unwrap().last_used;
                for &i in &filtered[1..] {
                    let used = self.slots[i].cookie.lock().unwrap().last_used;
                    if used < best_used {
                        best = i;
                        best_used = used;
                    }
                }
                best
            }
        }
    }

    /// Return the slot's cached session, creating it under the init timeout.
    async fn session_for(
        &self,
        slot: &Slot,
    ) -> std::result::Result<Arc<dyn BackendSession>, BackendError> {
        let session = slot
            .session
            .get_or_try_init(|| {
                let (psid, psidts) = {
                    let cookie = slot.cookie.lock().unwrap();
                    (
                        cookie.psid().to_string(),
                        cookie.psidts().map(str::to_string),
                    )
                };
                async move {
                    match tokio::time::timeout(
                        self.init_timeout,
                        self.backend.connect(&psid, psidts.as_deref()),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(BackendError::Init(format!(
                            "session init timed out after {}s",
                            self.init_timeout.as_secs()
                        ))),
                    }
                }
            })
            .await?;
        Ok(session.clone())
    }

    /// Pool snapshot. Pure read; safe to call concurrently with dispatch.
    pub fn status(&self) -> PoolStatus {
        let cookies: Vec<CookieStatus> = self
            .slots
            .iter()
            .map(|slot| {
                let cookie = slot.cookie.lock().unwrap();
                CookieStatus {
                    name: cookie.name.clone(),
                    is_available: cookie.is_available,
                    error_count: cookie.error_count,
                    last_used: cookie.last_used,
                }
            })
            .collect();
        let available = cookies.iter().filter(|c| c.is_available).count();
        PoolStatus {
            total_cookies: cookies.len(),
            available_cookies: available,
            cookies,
        }
    }
}
