//! Endpoints and wire constants for the Gemini web frontend

/// App shell page; serves the `SNlM0e` token to logged-in sessions.
pub const APP_URL: &str = "https://gemini.google.com/app";

/// batchexecute endpoint the frontend posts generation requests to.
pub const GENERATE_URL: &str =
    "https://gemini.google.com/_/BardChatUi/data/assistant.lamda.BardFrontendService/StreamGenerate";

/// A desktop browser user agent. The endpoint rejects obviously non-browser
/// clients.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// `bl` query parameter: the frontend build the request claims to come from.
pub const BACKEND_BUILD: &str = "boq_assistant-bard-web-server_20240625.13_p0";

/// Header carrying the per-model routing blob (see `Model::routing_header`).
pub(crate) const MODEL_HEADER: &str = "x-goog-ext-525001261-jspb";
