//! Name derivation: slugs and default variation names

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Name of the first variation added to a draft
pub const CONTROL_VARIATION: &str = "Control";

/// Slug used as both feature flag id and tracking key
///
/// Lowercases the trimmed name and collapses every whitespace run into `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    WHITESPACE_RUN
        .replace_all(&name.trim().to_lowercase(), "-")
        .into_owned()
}

/// Name for the next variation added to a draft
///
/// `Control` first, then the first free `Variation A`, `Variation B`, ...
#[must_use]
pub fn next_variation_name(existing: &[String]) -> String {
    if !existing.iter().any(|name| name == CONTROL_VARIATION) {
        return CONTROL_VARIATION.to_string();
    }
    // At most `existing.len()` candidates can be taken.
    (0u32..)
        .filter_map(|offset| char::from_u32(u32::from(b'A') + offset))
        .map(|letter| format!("Variation {letter}"))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or_else(|| format!("Variation {}", existing.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn slug_trims_lowercases_and_hyphenates() {
        assert_eq!(slugify(" My Exp "), "my-exp");
        assert_eq!(slugify("Checkout  Button\tColor"), "checkout-button-color");
        assert_eq!(slugify("single"), "single");
    }

    #[test]
    fn control_comes_first() {
        assert_eq!(next_variation_name(&[]), "Control");
        assert_eq!(
            next_variation_name(&["Variation A".to_string()]),
            "Control"
        );
    }

    #[test]
    fn fills_first_free_letter() {
        let names = vec![
            "Control".to_string(),
            "Variation A".to_string(),
            "Variation C".to_string(),
        ];
        assert_eq!(next_variation_name(&names), "Variation B");
    }

    #[test]
    fn continues_past_z() {
        let mut names = vec!["Control".to_string()];
        names.extend((b'A'..=b'Z').map(|c| format!("Variation {}", c as char)));
        assert_eq!(next_variation_name(&names), "Variation [");
    }

    proptest! {
        #[test]
        fn prop_slug_has_no_whitespace(name in "\\PC{0,40}") {
            let slug = slugify(&name);
            prop_assert!(!slug.chars().any(char::is_whitespace));
        }

        #[test]
        fn prop_next_name_is_fresh(count in 0usize..30) {
            let mut names = Vec::new();
            for _ in 0..count {
                let next = next_variation_name(&names);
                prop_assert!(!names.contains(&next));
                names.push(next);
            }
        }
    }
}
