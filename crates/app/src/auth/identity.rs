//! Who the cart belongs to.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::warn;
use uuid::Uuid;

use crate::auth::{AuthService, SecretToken, Session, UserUuid};

/// Owner of carts created while nobody is signed in.
pub const DEMO_USER_UUID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);

/// Identity cart operations run as.
#[derive(Debug, Clone)]
pub enum Identity {
    /// A signed-in user; requests carry their access token.
    Authenticated { session: Session },

    /// Nobody is signed in; carts are owned by a fixed placeholder user.
    Anonymous { user_uuid: UserUuid },
}

impl Identity {
    /// The anonymous identity owned by [`DEMO_USER_UUID`].
    #[must_use]
    pub fn anonymous() -> Self {
        Self::Anonymous {
            user_uuid: UserUuid::from_uuid(DEMO_USER_UUID),
        }
    }

    #[must_use]
    pub fn user_uuid(&self) -> UserUuid {
        match self {
            Self::Authenticated { session } => session.user.uuid,
            Self::Anonymous { user_uuid } => *user_uuid,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&SecretToken> {
        match self {
            Self::Authenticated { session } => Some(&session.access_token),
            Self::Anonymous { .. } => None,
        }
    }
}

/// Identity resolver.
#[automock]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// The identity to use for this run. Never fails: problems resolving a
    /// session fall back to [`Identity::Anonymous`].
    async fn resolve(&self) -> Identity;
}

/// Resolves the identity from the persisted session.
#[derive(Clone)]
pub struct SessionIdentityResolver {
    auth: Arc<dyn AuthService>,
}

impl SessionIdentityResolver {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl IdentityResolver for SessionIdentityResolver {
    async fn resolve(&self) -> Identity {
        match self.auth.current_session().await {
            Ok(Some(session)) => Identity::Authenticated { session },
            Ok(None) => Identity::anonymous(),
            Err(error) => {
                warn!("could not read session, continuing anonymously: {error}");

                Identity::anonymous()
            }
        }
    }
}
