//! Scancart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    classifier::{is_food, normalize_label},
    fixtures::{Fixture, FixtureError},
    matcher::{Match, MatchStrategy, find_match, find_product},
    products::{Product, ProductUuid},
    uuids::TypedUuid,
};
