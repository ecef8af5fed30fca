//! Label Classifier
//!
//! Decides whether a free-text vision label names something edible and
//! normalizes labels and product names into a common form for matching.

/// Tokens whose presence anywhere in a lower-cased label marks it as food.
pub const FOOD_KEYWORDS: &[&str] = &[
    // Fruit
    "fruit",
    "apple",
    "banana",
    "orange",
    "grape",
    "lemon",
    "lime",
    "mango",
    "pear",
    "peach",
    "plum",
    "cherry",
    "berry",
    "melon",
    "pineapple",
    "kiwi",
    "avocado",
    "apricot",
    "coconut",
    "papaya",
    "citrus",
    "tangerine",
    "pomegranate",
    // Vegetables
    "vegetable",
    "tomato",
    "potato",
    "carrot",
    "onion",
    "garlic",
    "lettuce",
    "cabbage",
    "broccoli",
    "cauliflower",
    "spinach",
    "cucumber",
    "pepper",
    "zucchini",
    "eggplant",
    "mushroom",
    "celery",
    "corn",
    "bean",
    "pea",
    "squash",
    "pumpkin",
    "radish",
    "kale",
    "leaf vegetable",
    "produce",
    // Dairy & eggs
    "milk",
    "cheese",
    "yogurt",
    "yoghurt",
    "butter",
    "cream",
    "egg",
    "dairy",
    // Bakery & grains
    "bread",
    "baguette",
    "bagel",
    "croissant",
    "muffin",
    "cake",
    "cookie",
    "biscuit",
    "cereal",
    "rice",
    "pasta",
    "noodle",
    "flour",
    "oat",
    // Meat & fish
    "meat",
    "beef",
    "pork",
    "chicken",
    "sausage",
    "bacon",
    "ham",
    "fish",
    "salmon",
    "tuna",
    "seafood",
    // Pantry, snacks & drinks
    "chocolate",
    "candy",
    "snack",
    "chip",
    "nut",
    "honey",
    "jam",
    "sauce",
    "juice",
    "soda",
    "water",
    "coffee",
    "tea",
    "food",
    "ingredient",
    "natural foods",
    "whole food",
    "staple food",
];

/// Labels that end in "s" but must not lose it during normalization.
pub const PLURAL_EXCEPTIONS: &[&str] = &[
    "grapes",
    "chips",
    "peas",
    "oats",
    "greens",
    "sprouts",
    "hummus",
    "asparagus",
    "citrus",
    "molasses",
    "lentils",
    "beans",
    "nuts",
    "cookies",
    "noodles",
];

/// Returns `true` when any food keyword occurs in the label.
///
/// This is a plain substring test, not a word match: "Speaker" (pea),
/// "Hammer" (ham), "Boat" (oat) and "Price" (rice) all count as food. Such
/// labels only reach the matcher, which rejects them unless a product
/// resolves.
pub fn is_food(label: &str) -> bool {
    let label = label.to_lowercase();

    FOOD_KEYWORDS.iter().any(|keyword| label.contains(keyword))
}

/// Lower-case, trim, and strip a single trailing "s".
///
/// The "s" is kept when the final word is in [`PLURAL_EXCEPTIONS`], ends in
/// "ss", or is a single character.
pub fn normalize_label(label: &str) -> String {
    let normalized = label.trim().to_lowercase();

    let last_word = normalized.rsplit(' ').next().unwrap_or_default();

    let keep = last_word.len() <= 1
        || last_word.ends_with("ss")
        || PLURAL_EXCEPTIONS.contains(&last_word);

    if keep {
        return normalized;
    }

    match normalized.strip_suffix('s') {
        Some(stripped) => stripped.to_string(),
        None => normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn food_labels_are_recognised_by_substring() {
        assert!(is_food("Granny Smith apple"));
        assert!(is_food("BANANA"));
        assert!(is_food("Local food"));
        assert!(is_food("Plum tomato"));
    }

    #[test]
    fn non_food_labels_are_rejected() {
        assert!(!is_food("Table"));
        assert!(!is_food("Smartphone"));
        assert!(!is_food("Sky"));
        assert!(!is_food(""));
    }

    #[test]
    fn keywords_match_inside_unrelated_words() {
        for label in ["Speaker", "Hammer", "Boat", "Coat", "Steam", "Price", "Corner"] {
            assert!(is_food(label), "{label} contains a food keyword");
        }
    }

    #[test]
    fn normalize_strips_simple_plurals() {
        assert_eq!(normalize_label("Apples"), "apple");
        assert_eq!(normalize_label("  Bananas "), "banana");
        assert_eq!(normalize_label("Granny Smith apples"), "granny smith apple");
    }

    #[test]
    fn normalize_keeps_exception_plurals() {
        assert_eq!(normalize_label("Grapes"), "grapes");
        assert_eq!(normalize_label("Chips"), "chips");
        assert_eq!(normalize_label("Red grapes"), "red grapes");
        assert_eq!(normalize_label("Brussels sprouts"), "brussels sprouts");
        assert_eq!(normalize_label("Mixed nuts"), "mixed nuts");
    }

    #[test]
    fn only_the_last_word_is_checked() {
        assert_eq!(normalize_label("Grapes juices"), "grapes juice");
        assert_eq!(normalize_label("Swiss rolls"), "swiss roll");
    }

    #[test]
    fn normalize_leaves_double_s_and_singulars_alone() {
        assert_eq!(normalize_label("Swiss"), "swiss");
        assert_eq!(normalize_label("Apple"), "apple");
        assert_eq!(normalize_label("s"), "s");
        assert_eq!(normalize_label(""), "");
    }

    #[test]
    fn normalization_is_not_lemmatization() {
        assert_eq!(normalize_label("Tomatoes"), "tomatoe");
        assert_ne!(normalize_label("Tomatoes"), normalize_label("tomato"));
    }
}
