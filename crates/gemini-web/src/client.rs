//! Session handshake and content generation
//!
//! A `GeminiClient` is one materialized browser session: a reqwest client
//! carrying the account's cookies plus the scraped `SNlM0e` token. Sessions
//! are cheap to use but expensive to establish (a full app-shell fetch), so
//! callers cache them per credential.

use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use tracing::debug;

use crate::constants::{APP_URL, BACKEND_BUILD, GENERATE_URL, MODEL_HEADER, USER_AGENT};
use crate::error::{Error, Result};
use crate::model::Model;

/// A live session against the Gemini web frontend.
pub struct GeminiClient {
    http: reqwest::Client,
    access_token: String,
}

impl GeminiClient {
    /// Establish a session from browser cookies.
    ///
    /// Fetches the app shell and scrapes the `SNlM0e` anti-CSRF token. A
    /// missing token means the cookies are expired or invalid (the page
    /// serves the logged-out shell in that case).
    pub async fn connect(psid: &str, psidts: Option<&str>) -> Result<Self> {
        let http = build_http_client(psid, psidts)?;

        let response = http
            .get(APP_URL)
            .send()
            .await
            .map_err(|e| Error::Http(format!("app shell request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Auth(format!("app shell returned {status}")));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("reading app shell failed: {e}")))?;

        let access_token = extract_access_token(&html).ok_or_else(|| {
            Error::Auth("no access token in app shell; cookies are expired or invalid".into())
        })?;

        debug!("session established");
        Ok(Self { http, access_token })
    }

    /// Generate content for a prompt with the given model.
    ///
    /// Returns the first candidate's text. The response is a server-framed
    /// stream, but the final frame carries the complete text, which is all
    /// the frontend (and we) use.
    pub async fn generate(&self, prompt: &str, model: Model) -> Result<String> {
        let envelope = build_generate_envelope(prompt);

        let mut request = self
            .http
            .post(GENERATE_URL)
            .query(&[("bl", BACKEND_BUILD), ("rt", "c")])
            .form(&[
                ("f.req", envelope.as_str()),
                ("at", self.access_token.as_str()),
            ]);
        if let Some(blob) = model.routing_header() {
            request = request.header(MODEL_HEADER, blob);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(format!("generate request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(Error::Auth(format!("generate rejected ({status}): {body}")));
            }
            return Err(Error::Api(format!("generate returned {status}: {body}")));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("reading generate response failed: {e}")))?;

        parse_generate_response(&raw)
    }
}

/// Build the reqwest client carrying the session cookies.
fn build_http_client(psid: &str, psidts: Option<&str>) -> Result<reqwest::Client> {
    let mut cookie = format!("__Secure-1PSID={psid}");
    if let Some(ts) = psidts {
        cookie.push_str("; __Secure-1PSIDTS=");
        cookie.push_str(ts);
    }

    let mut cookie_value = HeaderValue::from_str(&cookie)
        .map_err(|_| Error::Auth("cookie value contains invalid characters".into()))?;
    cookie_value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, cookie_value);

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .map_err(|e| Error::Http(format!("building HTTP client: {e}")))
}

/// Scrape the `SNlM0e` token out of the app shell HTML.
fn extract_access_token(html: &str) -> Option<String> {
    let marker = "\"SNlM0e\":\"";
    let start = html.find(marker)? + marker.len();
    let rest = &html[start..];
    let end = rest.find('"')?;
    let token = &rest[..end];
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Build the `f.req` envelope: a doubly-encoded JSON array, prompt innermost.
fn build_generate_envelope(prompt: &str) -> String {
    let inner = serde_json::json!([[prompt], serde_json::Value::Null, serde_json::Value::Null]);
    serde_json::json!([serde_json::Value::Null, inner.to_string()]).to_string()
}

/// Decode a batchexecute response down to the candidate text.
///
/// Framing: an anti-JSON prefix line (`)]}'`), then alternating length and
/// payload lines. The payload of interest is the first `[[...]]` frame; its
/// `[0][2]` element is an embedded JSON string whose `[4]` element holds the
/// candidate list, each candidate's text at `[1][0]`.
fn parse_generate_response(raw: &str) -> Result<String> {
    let payload = raw
        .lines()
        .find(|line| line.trim_start().starts_with("[["))
        .ok_or_else(|| Error::Parse("no payload frame in response".into()))?;

    let outer: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| Error::Parse(format!("payload frame is not JSON: {e}")))?;

    let embedded = outer
        .get(0)
        .and_then(|v| v.get(2))
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Parse("missing embedded response body".into()))?;

    let body: serde_json::Value = serde_json::from_str(embedded)
        .map_err(|e| Error::Parse(format!("embedded body is not JSON: {e}")))?;

    let text = body
        .get(4)
        .and_then(|candidates| candidates.get(0))
        .and_then(|candidate| candidate.get(1))
        .and_then(|parts| parts.get(0))
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Parse("response contains no candidates".into()))?;

    Ok(text.to_string())
}
