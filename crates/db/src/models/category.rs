//! Category tags attached to recipes.

/// Tags the catalog UI offers. Stored recipes may still carry other tags.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "slané",
    "sladké",
    "cukroví",
    "vánoční",
    "buchty",
    "koláče",
    "dorty",
    "polévky",
    "hlavní jídla",
    "saláty",
    "omáčky",
    "pomazánky",
    "nápoje",
];

pub fn is_known_category(tag: &str) -> bool {
    KNOWN_CATEGORIES.contains(&tag)
}

/// Returns the tags of `categories` that are not in [`KNOWN_CATEGORIES`]
pub fn unknown_categories(categories: &[String]) -> Vec<&str> {
    categories
        .iter()
        .map(String::as_str)
        .filter(|tag| !is_known_category(tag))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories() {
        assert!(is_known_category("vánoční"));
        assert!(is_known_category("hlavní jídla"));
        assert!(!is_known_category("Vánoční"));
        assert!(!is_known_category("krémy"));
    }

    #[test]
    fn test_unknown_categories() {
        let tags = vec![
            "sladké".to_string(),
            "krémy".to_string(),
            "saláty".to_string(),
        ];
        assert_eq!(unknown_categories(&tags), vec!["krémy"]);
    }
}
