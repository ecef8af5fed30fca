//! Auth data models.

use jiff::Timestamp;
use scancart::uuids::TypedUuid;
use serde::{Deserialize, Serialize};

use crate::auth::SecretToken;

/// User UUID
pub type UserUuid = TypedUuid<User>;

/// Authenticated user, as returned by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User identifier, the key row-level security policies check.
    #[serde(rename = "id")]
    pub uuid: UserUuid,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// Signed-in session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: SecretToken,

    #[serde(default)]
    pub refresh_token: Option<SecretToken>,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Expiry as Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,

    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Whether the access token is past its expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now.as_second() >= expires_at)
    }
}

/// Result of a sign-up request.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// The account is active and a session was issued.
    SignedIn(Session),

    /// The account exists but must be confirmed (e.g. by email) first.
    ConfirmationRequired(User),
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn session_from_token_response() -> TestResult {
        let session: Session = serde_json::from_str(
            r#"{
                "access_token": "jwt",
                "token_type": "bearer",
                "expires_in": 3600,
                "expires_at": 1700000000,
                "refresh_token": "refresh",
                "user": {
                    "id": "0190f5a4-7c3e-7b7a-8f4e-2b9d6c1a0e11",
                    "email": "shopper@example.com",
                    "aud": "authenticated"
                }
            }"#,
        )?;

        assert_eq!(session.user.email.as_deref(), Some("shopper@example.com"));
        assert!(session.is_expired(Timestamp::from_second(1_700_000_000)?));
        assert!(!session.is_expired(Timestamp::from_second(1_699_999_999)?));

        Ok(())
    }
}
