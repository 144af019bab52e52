//! Browser-session client for the Gemini web app
//!
//! Talks to the same private endpoints the gemini.google.com frontend uses,
//! authenticating with the `__Secure-1PSID` / `__Secure-1PSIDTS` cookies of a
//! logged-in browser session. This crate is a standalone library with no
//! dependency on the gateway binary; it can be tested and used independently.
//!
//! Session flow:
//! 1. `GeminiClient::connect()` fetches the app shell with the session cookies
//!    and scrapes the `SNlM0e` anti-CSRF token
//! 2. `GeminiClient::generate()` posts a batchexecute envelope carrying the
//!    prompt and the token, then decodes the framed response
//!
//! There is no official contract behind any of this: Google can (and does)
//! rotate the wire format, so decode failures are surfaced as typed errors
//! rather than panics.

pub mod client;
pub mod constants;
pub mod error;
pub mod model;

pub use client::GeminiClient;
pub use error::{Error, Result};
pub use model::Model;
