//! Secret wrapper for sensitive values
//!
//! Session cookies grant full account access, so they must never reach logs
//! or Debug output. The wrapper zeroizes the inner value on drop.

use std::fmt;
use zeroize::Zeroize;

/// Sensitive value - redacted in Debug/Display/logs
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    /// Create a new secret value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Short non-sensitive label derived from the value's leading characters.
    ///
    /// Used for default account names; 8 characters of a session cookie are
    /// not enough to reconstruct it.
    pub fn prefix(&self) -> String {
        self.0.chars().take(8).collect()
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_redacts_debug() {
        let secret = Secret::new(String::from("g.a000abc-session-cookie"));
        let debug = format!("{:?}", secret);
        assert_eq!(debug, "[REDACTED]");
        assert!(!debug.contains("session-cookie"));
    }

    #[test]
    fn test_secret_exposes_value() {
        let secret = Secret::new(String::from("g.a000abc-session-cookie"));
        assert_eq!(secret.expose(), "g.a000abc-session-cookie");
    }

    #[test]
    fn test_prefix_is_eight_chars() {
        let secret = Secret::new(String::from("g.a000abcdefghij"));
        assert_eq!(secret.prefix(), "g.a000ab");
    }

    #[test]
    fn test_prefix_of_short_value_is_whole_value() {
        let secret = Secret::new(String::from("abc"));
        assert_eq!(secret.prefix(), "abc");
    }
}
