//! Test Helpers

use scancart::fixtures::Fixture;

use crate::{
    auth::{SecretToken, Session, User, UserUuid},
    domain::products::Product,
};

/// A product from the `groceries` fixture set.
pub(crate) fn product(name: &str) -> Product {
    Fixture::from_set("groceries")
        .expect("Failed to load fixtures")
        .product(name)
        .expect("Fixture product should exist")
        .clone()
}

/// A signed-in session for a fresh user.
pub(crate) fn session() -> Session {
    Session {
        access_token: SecretToken::new("jwt"),
        refresh_token: None,
        token_type: "bearer".to_string(),
        expires_at: None,
        user: User {
            uuid: UserUuid::new(),
            email: Some("shopper@example.com".to_string()),
            created_at: None,
        },
    }
}
