//! Auth service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    auth::{AuthServiceError, Session, SessionStorage, SignUpOutcome, User},
    rest::RestClient,
};

/// Auth against the backend's hosted auth service, with the session kept in
/// [`SessionStorage`] between runs.
#[derive(Debug, Clone)]
pub struct RestAuthService {
    rest: RestClient,
    storage: SessionStorage,
}

impl RestAuthService {
    #[must_use]
    pub fn new(rest: RestClient, storage: SessionStorage) -> Self {
        Self { rest, storage }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(Session),
    User(User),
}

fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, AuthServiceError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(AuthServiceError::MissingRequiredData(field));
    }

    Ok(trimmed)
}

#[async_trait]
impl AuthService for RestAuthService {
    #[tracing::instrument(
        name = "auth.service.sign_up",
        skip(self, password),
        err
    )]
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthServiceError> {
        let email = require(email, "email")?;
        let password = require(password, "password")?;

        let response: SignUpResponse = self
            .rest
            .auth_post(
                "signup",
                &[],
                &json!({ "email": email, "password": password }),
            )
            .await?;

        match response {
            SignUpResponse::Session(session) => {
                self.storage.save(&session)?;

                info!(user = %session.user.uuid, "signed up");

                Ok(SignUpOutcome::SignedIn(session))
            }
            SignUpResponse::User(user) => {
                info!(user = %user.uuid, "signed up, confirmation required");

                Ok(SignUpOutcome::ConfirmationRequired(user))
            }
        }
    }

    #[tracing::instrument(
        name = "auth.service.sign_in_with_password",
        skip(self, password),
        err
    )]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthServiceError> {
        let email = require(email, "email")?;
        let password = require(password, "password")?;

        let session: Session = self
            .rest
            .auth_post(
                "token",
                &[("grant_type", "password".to_string())],
                &json!({ "email": email, "password": password }),
            )
            .await?;

        self.storage.save(&session)?;

        info!(user = %session.user.uuid, "signed in");

        Ok(session)
    }

    #[tracing::instrument(
        name = "auth.service.sign_out",
        skip(self),
        err
    )]
    async fn sign_out(&self) -> Result<(), AuthServiceError> {
        if let Some(session) = self.storage.load()? {
            let result = self
                .rest
                .with_access_token(session.access_token)
                .auth_post_empty("logout")
                .await;

            if let Err(error) = result {
                warn!("server-side sign out failed, clearing local session anyway: {error}");
            }
        }

        self.storage.clear()?;

        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthServiceError> {
        let Some(session) = self.storage.load()? else {
            return Ok(None);
        };

        if session.is_expired(Timestamp::now()) {
            info!(user = %session.user.uuid, "stored session expired");

            self.storage.clear()?;

            return Ok(None);
        }

        Ok(Some(session))
    }

    async fn current_user(&self) -> Result<Option<User>, AuthServiceError> {
        let Some(session) = self.current_session().await? else {
            return Ok(None);
        };

        let result: Result<User, _> = self
            .rest
            .with_access_token(session.access_token)
            .auth_get("user")
            .await;

        match result {
            Ok(user) => Ok(Some(user)),
            Err(error) if error.is_access_denied() => {
                warn!("stored session rejected by backend: {error}");

                self.storage.clear()?;

                Ok(None)
            }
            Err(error) => Err(error.into()),
        }
    }
}

/// Auth used when no backend is configured: there is never a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAuthService;

#[async_trait]
impl AuthService for OfflineAuthService {
    async fn sign_up(&self, _email: &str, _password: &str) -> Result<SignUpOutcome, AuthServiceError> {
        Err(AuthServiceError::Unavailable)
    }

    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<Session, AuthServiceError> {
        Err(AuthServiceError::Unavailable)
    }

    async fn sign_out(&self) -> Result<(), AuthServiceError> {
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthServiceError> {
        Ok(None)
    }

    async fn current_user(&self) -> Result<Option<User>, AuthServiceError> {
        Ok(None)
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new account with email and password.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthServiceError>;

    /// Sign in with email and password, persisting the session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthServiceError>;

    /// End the current session locally and on the backend.
    async fn sign_out(&self) -> Result<(), AuthServiceError>;

    /// The persisted, unexpired session, if any.
    async fn current_session(&self) -> Result<Option<Session>, AuthServiceError>;

    /// The user the backend associates with the current session.
    async fn current_user(&self) -> Result<Option<User>, AuthServiceError>;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use testresult::TestResult;

    use super::*;
    use crate::{
        auth::{SecretToken, UserUuid},
        rest::RestConfig,
        retry::RetryPolicy,
        storage::FileStore,
    };

    fn service(dir: &std::path::Path) -> (RestAuthService, SessionStorage) {
        let storage = SessionStorage::new(
            Arc::new(FileStore::private(dir.join("secure"))),
            Arc::new(FileStore::new(dir.join("general"))),
        );

        let rest = RestClient::new(
            RestConfig {
                url: "http://127.0.0.1:9".to_string(),
                anon_key: SecretToken::new("anon"),
            },
            RetryPolicy::none(),
        );

        (RestAuthService::new(rest, storage.clone()), storage)
    }

    fn session(expires_at: Option<i64>) -> Session {
        Session {
            access_token: SecretToken::new("jwt"),
            refresh_token: None,
            token_type: "bearer".to_string(),
            expires_at,
            user: User {
                uuid: UserUuid::new(),
                email: None,
                created_at: None,
            },
        }
    }

    #[tokio::test]
    async fn blank_credentials_are_rejected_before_any_request() -> TestResult {
        let dir = tempfile::tempdir()?;
        let (auth, _storage) = service(dir.path());

        let result = auth.sign_in_with_password("  ", "secret").await;

        assert!(
            matches!(result, Err(AuthServiceError::MissingRequiredData("email"))),
            "got {result:?}"
        );

        let result = auth.sign_up("shopper@example.com", "").await;

        assert!(
            matches!(result, Err(AuthServiceError::MissingRequiredData("password"))),
            "got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn current_session_returns_unexpired_session() -> TestResult {
        let dir = tempfile::tempdir()?;
        let (auth, storage) = service(dir.path());
        let stored = session(Some(Timestamp::now().as_second() + 3600));

        storage.save(&stored)?;

        let current = auth.current_session().await?;

        assert_eq!(current.map(|s| s.user), Some(stored.user));

        Ok(())
    }

    #[tokio::test]
    async fn expired_session_is_discarded() -> TestResult {
        let dir = tempfile::tempdir()?;
        let (auth, storage) = service(dir.path());

        storage.save(&session(Some(1)))?;

        assert!(auth.current_session().await?.is_none());
        assert!(storage.load()?.is_none(), "expired session should be cleared");

        Ok(())
    }

    #[tokio::test]
    async fn sign_out_clears_session_even_when_backend_unreachable() -> TestResult {
        let dir = tempfile::tempdir()?;
        let (auth, storage) = service(dir.path());

        storage.save(&session(None))?;

        auth.sign_out().await?;

        assert!(storage.load()?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn offline_auth_never_has_a_session() -> TestResult {
        let auth = OfflineAuthService;

        assert!(auth.current_session().await?.is_none());
        assert!(matches!(
            auth.sign_in_with_password("a@b.c", "pw").await,
            Err(AuthServiceError::Unavailable)
        ));

        Ok(())
    }
}
