//! Session token handling.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Opaque bearer or refresh token.
///
/// The value is wiped on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken {
    value: String,
}

impl SecretToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken(**redacted**)")?;
        Ok(())
    }
}

impl Drop for SecretToken {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

impl Serialize for SecretToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for SecretToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let token = SecretToken::new("eyJhbGciOiJIUzI1NiJ9.secret");

        let printed = format!("{token:?}");

        assert!(!printed.contains("secret"), "token leaked: {printed}");
        assert_eq!(token.expose(), "eyJhbGciOiJIUzI1NiJ9.secret");
    }

    #[test]
    fn serializes_as_plain_string() -> Result<(), serde_json::Error> {
        let token = SecretToken::new("abc");

        assert_eq!(serde_json::to_string(&token)?, "\"abc\"");

        let parsed: SecretToken = serde_json::from_str("\"xyz\"")?;

        assert_eq!(parsed.expose(), "xyz");

        Ok(())
    }
}
