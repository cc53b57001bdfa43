//! Redaction wrapper for upstream key material
//!
//! Pool keys travel through Debug output, tracing fields, and error
//! messages on several paths; wrapping them makes accidental leakage a type
//! error rather than a code-review hope. The inner value is zeroized on
//! drop so a spent key does not linger in freed memory.

use std::fmt;
use zeroize::Zeroize;

/// A sensitive value. Debug and Display both print `[REDACTED]`; the only
/// way at the plaintext is an explicit [`Secret::expose`] call.
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// The plaintext. Hand it straight to the store or the upstream client,
    /// never to a formatter.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
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
    fn debug_and_display_redact_key_material() {
        let key = Secret::new(String::from("sk-live-4f9a"));
        assert_eq!(format!("{key:?}"), "[REDACTED]");
        assert_eq!(format!("{key}"), "[REDACTED]");
    }

    #[test]
    fn expose_returns_the_plaintext() {
        let key = Secret::new(String::from("sk-live-4f9a"));
        assert_eq!(key.expose(), "sk-live-4f9a");
    }

    #[test]
    fn redaction_survives_derived_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Lease {
            key: Secret<String>,
        }
        let lease = Lease {
            key: Secret::new(String::from("sk-live-4f9a")),
        };
        let debug = format!("{lease:?}");
        assert!(!debug.contains("sk-live-4f9a"), "got: {debug}");
    }
}
