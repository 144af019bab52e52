//! Model table for the Gemini web frontend
//!
//! These are the aliases the gateway advertises; each maps to the routing
//! blob the frontend sends in the `x-goog-ext-525001261-jspb` header. The
//! blobs are opaque frontend identifiers, not documented anywhere; they come
//! from observing the web app and break when Google retires a model.

/// A selectable Gemini model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Gemini25Pro,
    Gemini25Flash,
    Gemini20Flash,
    Gemini20FlashThinking,
    Gemini25ExpAdvanced,
    Gemini20ExpAdvanced,
}

impl Model {
    /// Every model the gateway serves, in advertisement order.
    pub const ALL: [Model; 6] = [
        Model::Gemini25Pro,
        Model::Gemini25Flash,
        Model::Gemini20Flash,
        Model::Gemini20FlashThinking,
        Model::Gemini25ExpAdvanced,
        Model::Gemini20ExpAdvanced,
    ];

    /// The OpenAI-style model id clients use.
    pub fn alias(&self) -> &'static str {
        match self {
            Model::Gemini25Pro => "gemini-2.5-pro",
            Model::Gemini25Flash => "gemini-2.5-flash",
            Model::Gemini20Flash => "gemini-2.0-flash",
            Model::Gemini20FlashThinking => "gemini-2.0-flash-thinking",
            Model::Gemini25ExpAdvanced => "gemini-2.5-exp-advanced",
            Model::Gemini20ExpAdvanced => "gemini-2.0-exp-advanced",
        }
    }

    /// Look up a model by its alias. `None` for unknown ids.
    pub fn from_alias(alias: &str) -> Option<Model> {
        Model::ALL.iter().copied().find(|m| m.alias() == alias)
    }

    /// Per-model routing blob for the frontend header.
    ///
    /// `None` means the account's default model; no header is sent.
    pub(crate) fn routing_header(&self) -> Option<&'static str> {
        match self {
            Model::Gemini25Pro => Some(r#"[1,null,null,null,"2525e3954d185b3c"]"#),
            Model::Gemini25Flash => Some(r#"[1,null,null,null,"35609594dbe934d8"]"#),
            Model::Gemini20Flash => None,
            Model::Gemini20FlashThinking => Some(r#"[1,null,null,null,"9c17b1863f581b8a"]"#),
            Model::Gemini25ExpAdvanced => Some(r#"[1,null,null,null,"203e6bb81620bcfe"]"#),
            Model::Gemini20ExpAdvanced => Some(r#"[1,null,null,null,"b1e46a6037e6aa9f"]"#),
        }
    }
}
