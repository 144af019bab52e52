//! Environment-sourced credential loading
//!
//! Three origins, merged in fixed precedence order:
//! 1. the legacy single slot `SECURE_1PSID` / `SECURE_1PSIDTS`
//! 2. `COOKIES_JSON`, a JSON array of `{secure_1psid, secure_1psidts?, name?}`
//! 3. numbered slots `COOKIE_1_PSID`, `COOKIE_2_PSID`, ... scanned until the
//!    first missing PSID; slots past a gap are silently ignored
//!
//! All matches are appended in origin order; duplicates across origins are
//! not deduplicated. A malformed `COOKIES_JSON` is logged and skipped; only
//! an empty merged result is fatal.

use serde::Deserialize;
use tracing::{info, warn};

use crate::cookie::CookieSpec;

/// One entry of the `COOKIES_JSON` array.
#[derive(Debug, Deserialize)]
struct JsonCookie {
    secure_1psid: String,
    #[serde(default)]
    secure_1psidts: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Raw credential origins, in merge order.
#[derive(Debug, Default)]
pub struct CookieSources {
    pub legacy_psid: Option<String>,
    pub legacy_psidts: Option<String>,
    pub cookies_json: Option<String>,
    pub numbered: Vec<CookieSpec>,
}

impl CookieSources {
    /// Snapshot the three origins from the process environment.
    pub fn from_env() -> Self {
        let mut numbered = Vec::new();
        let mut slot = 1u32;
        loop {
            let Some(psid) = env_var(&format!("COOKIE_{slot}_PSID")) else {
                break;
            };
            numbered.push(CookieSpec {
                psid,
                psidts: env_var(&format!("COOKIE_{slot}_PSIDTS")),
                name: Some(
                    env_var(&format!("COOKIE_{slot}_NAME"))
                        .unwrap_or_else(|| format!("Account-{slot}")),
                ),
            });
            slot += 1;
        }

        Self {
            legacy_psid: env_var("SECURE_1PSID"),
            legacy_psidts: env_var("SECURE_1PSIDTS"),
            cookies_json: env_var("COOKIES_JSON"),
            numbered,
        }
    }

    /// Merge the origins into one ordered credential list.
    ///
    /// Fails only when the merged result is empty.
    pub fn into_specs(self) -> common::Result<Vec<CookieSpec>> {
        let mut specs = Vec::new();

        if let Some(psid) = self.legacy_psid {
            specs.push(CookieSpec {
                psid,
                psidts: self.legacy_psidts,
                name: Some("Primary Account".into()),
            });
        }

        if let Some(json) = self.cookies_json {
            match serde_json::from_str::<Vec<JsonCookie>>(&json) {
                Ok(entries) => {
                    for (i, entry) in entries.into_iter().enumerate() {
                        specs.push(CookieSpec {
                            psid: entry.secure_1psid,
                            psidts: entry.secure_1psidts,
                            name: Some(
                                entry.name.unwrap_or_else(|| format!("Account-{}", i + 1)),
                            ),
                        });
                    }
                }
                Err(e) => warn!(error = %e, "ignoring malformed COOKIES_JSON"),
            }
        }

        specs.extend(self.numbered);

        if specs.is_empty() {
            return Err(common::Error::Config(
                "no cookies configured; set SECURE_1PSID, COOKIES_JSON, or COOKIE_1_PSID".into(),
            ));
        }

        info!(cookies = specs.len(), "loaded cookie credentials");
        Ok(specs)
    }
}

/// Read an env var, treating empty values as unset.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}
