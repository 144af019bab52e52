//! Cookie credential records
//!
//! One record per browser-session account: the cookie pair plus health
//! state. Health transitions are narrow on purpose: `error_count` grows only
//! through `mark_error`, availability is lost exactly at the error threshold,
//! and only `mark_success` restores it.

use common::Secret;

/// Consecutive failures before a cookie is demoted to unavailable.
pub const MAX_ERRORS: u32 = 3;

/// A parsed credential from configuration, before pool construction.
#[derive(Debug, Clone)]
pub struct CookieSpec {
    /// `__Secure-1PSID` cookie value.
    pub psid: String,
    /// Optional `__Secure-1PSIDTS` companion.
    pub psidts: Option<String>,
    /// Display name; derived from the PSID prefix when absent or empty.
    pub name: Option<String>,
}

/// One account's session identity and health state.
pub struct CookieCredential {
    pub name: String,
    psid: Secret<String>,
    psidts: Option<Secret<String>>,
    pub is_available: bool,
    pub error_count: u32,
    pub max_errors: u32,
    /// Unix millis of the last successful use; 0 = never used.
    pub last_used: u64,
}

impl CookieCredential {
    pub fn new(spec: CookieSpec) -> Self {
        let psid = Secret::new(spec.psid);
        let name = match spec.name {
            Some(name) if !name.is_empty() => name,
            _ => format!("Account-{}", psid.prefix()),
        };
        Self {
            name,
            psid,
            psidts: spec.psidts.filter(|ts| !ts.is_empty()).map(Secret::new),
            is_available: true,
            error_count: 0,
            max_errors: MAX_ERRORS,
            last_used: 0,
        }
    }

    pub fn psid(&self) -> &str {
        self.psid.expose()
    }

    pub fn psidts(&self) -> Option<&str> {
        self.psidts.as_ref().map(|ts| ts.expose().as_str())
    }

    /// Record a failed use. Demotes the cookie once the threshold is reached.
    pub fn mark_error(&mut self) {
        self.error_count += 1;
        if self.error_count >= self.max_errors {
            self.is_available = false;
        }
    }

    /// Record a successful use. Always restores availability.
    pub fn mark_success(&mut self) {
        self.error_count = 0;
        self.is_available = true;
        self.last_used = now_millis();
    }
}

pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
