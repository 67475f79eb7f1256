//! API key handling.
//!
//! The key is carried as an explicit value from the submission down to the
//! engine call; nothing here touches the process environment except
//! [`ApiKey::from_env`], which only reads.

use std::fmt;

/// Environment variable the CLI and server fall back to.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// A provider API key. `Debug` and `Display` never reveal the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, returning `None` for empty or whitespace-only input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Read the key from `GEMINI_API_KEY`, if set and non-empty.
    pub fn from_env() -> Option<Self> {
        std::env::var(GEMINI_API_KEY_VAR).ok().and_then(Self::new)
    }

    /// The raw key, for building the outgoing request.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}
