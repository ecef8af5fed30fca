//! Product Matcher
//!
//! Maps a single vision label onto at most one catalog product. Strategies are
//! tried in a fixed order and the first one that yields a candidate wins:
//!
//! 1. [`MatchStrategy::Exact`]: normalized label equals normalized name.
//! 2. [`MatchStrategy::Containment`]: one contains the other. Names contained
//!    in the label are preferred, then the name closest in length to the label.
//! 3. [`MatchStrategy::Word`]: for multi-word labels, the first product whose
//!    name contains any significant word of the label.
//! 4. [`MatchStrategy::Category`]: labels mentioning "fruit" or "vegetable"
//!    fall back to the first product of that category.
//!
//! Remaining ties are broken by catalog order, which is whatever order the
//! backend returned the snapshot in.

use std::fmt;

use smallvec::SmallVec;

use crate::{classifier::normalize_label, products::Product};

/// Words that carry no product identity on their own.
pub const STOPWORDS: &[&str] = &[
    "food", "fresh", "ripe", "juicy", "sweet", "natural", "product", "item",
];

/// Words of this many characters or fewer are ignored by the word strategy.
pub const MIN_WORD_LEN: usize = 3;

/// Strategy that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Normalized label and name are equal
    Exact,

    /// Label and name contain one another
    Containment,

    /// A significant label word occurs in the name
    Word,

    /// Category fallback for generic fruit/vegetable labels
    Category,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exact => "exact",
            Self::Containment => "containment",
            Self::Word => "word",
            Self::Category => "category",
        })
    }
}

/// A resolved catalog product and how it was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    /// Matched product
    pub product: &'a Product,

    /// Strategy that found it
    pub strategy: MatchStrategy,
}

/// Find the best catalog match for a label, or `None`.
pub fn find_match<'a>(label: &str, catalog: &'a [Product]) -> Option<Match<'a>> {
    let label = normalize_label(label);

    if label.is_empty() {
        return None;
    }

    let names: Vec<(String, &Product)> = catalog
        .iter()
        .map(|product| (normalize_label(&product.name), product))
        .filter(|(name, _)| !name.is_empty())
        .collect();

    exact(&label, &names)
        .map(|product| (product, MatchStrategy::Exact))
        .or_else(|| containment(&label, &names).map(|p| (p, MatchStrategy::Containment)))
        .or_else(|| by_word(&label, &names).map(|p| (p, MatchStrategy::Word)))
        .or_else(|| by_category(&label, catalog).map(|p| (p, MatchStrategy::Category)))
        .map(|(product, strategy)| Match { product, strategy })
}

/// Convenience wrapper returning only the product.
pub fn find_product<'a>(label: &str, catalog: &'a [Product]) -> Option<&'a Product> {
    find_match(label, catalog).map(|found| found.product)
}

fn exact<'a>(label: &str, names: &[(String, &'a Product)]) -> Option<&'a Product> {
    names
        .iter()
        .find(|(name, _)| name == label)
        .map(|(_, product)| *product)
}

fn containment<'a>(label: &str, names: &[(String, &'a Product)]) -> Option<&'a Product> {
    names
        .iter()
        .filter_map(|(name, product)| {
            let name_in_label = label.contains(name.as_str());

            if !name_in_label && !name.contains(label) {
                return None;
            }

            let distance = name.chars().count().abs_diff(label.chars().count());

            Some(((!name_in_label, distance), *product))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, product)| product)
}

fn by_word<'a>(label: &str, names: &[(String, &'a Product)]) -> Option<&'a Product> {
    let words: SmallVec<[String; 4]> = label
        .split_whitespace()
        .map(normalize_label)
        .collect();

    if words.len() < 2 {
        return None;
    }

    let significant: SmallVec<[String; 4]> = words
        .into_iter()
        .filter(|word| word.chars().count() > MIN_WORD_LEN && !STOPWORDS.contains(&word.as_str()))
        .collect();

    if significant.is_empty() {
        return None;
    }

    names
        .iter()
        .find(|(name, _)| significant.iter().any(|word| name.contains(word.as_str())))
        .map(|(_, product)| *product)
}

fn by_category<'a>(label: &str, catalog: &'a [Product]) -> Option<&'a Product> {
    let category = if label.contains("fruit") {
        "fruit"
    } else if label.contains("vegetable") {
        "vegetable"
    } else {
        return None;
    };

    catalog.iter().find(|product| {
        product
            .category
            .as_deref()
            .is_some_and(|c| normalize_label(c) == category)
    })
}
