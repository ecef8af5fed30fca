//! Recognition results.

use std::fmt;

use scancart::matcher::MatchStrategy;

use crate::{
    domain::products::Product,
    recognition::{Candidate, CandidateSource},
};

/// A catalog product resolved from a vision label.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedItem {
    pub product: Product,

    /// The candidate label that resolved.
    pub label: String,

    pub source: CandidateSource,

    pub strategy: MatchStrategy,

    /// Internal score of the candidate; not for display.
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecognizedItem {
    Matched(MatchedItem),

    /// No candidate label resolved to a catalog product.
    NotInDatabase,
}

impl RecognizedItem {
    /// Display name of the sentinel item.
    pub const NOT_IN_DATABASE: &str = "Not in database";

    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Matched(item) => &item.product.name,
            Self::NotInDatabase => Self::NOT_IN_DATABASE,
        }
    }

    #[must_use]
    pub fn product(&self) -> Option<&Product> {
        match self {
            Self::Matched(item) => Some(&item.product),
            Self::NotInDatabase => None,
        }
    }
}

impl fmt::Display for RecognizedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

static NOT_IN_DATABASE: RecognizedItem = RecognizedItem::NotInDatabase;

/// Outcome of one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    /// Always exactly one item.
    pub items: Vec<RecognizedItem>,

    /// Candidates in the order they were considered.
    pub candidates: Vec<Candidate>,

    /// Whether the fixed sample annotations stood in for a failed vision call.
    pub used_sample: bool,
}

impl Recognition {
    /// The single recognized item.
    #[must_use]
    pub fn item(&self) -> &RecognizedItem {
        self.items.first().unwrap_or(&NOT_IN_DATABASE)
    }
}
