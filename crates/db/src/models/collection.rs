use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// One of the JSON files recipes are partitioned into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
    Salty,
    Sweet,
    Christmas,
    SoupsAndCreams,
}

impl Collection {
    /// Load order of the catalog
    pub const ALL: [Collection; 4] = [
        Collection::Salty,
        Collection::Sweet,
        Collection::Christmas,
        Collection::SoupsAndCreams,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Collection::Salty => "saltyRecipes.json",
            Collection::Sweet => "sweetRecipes.json",
            Collection::Christmas => "christmasRecipes.json",
            Collection::SoupsAndCreams => "soupsAndCreamsRecipes.json",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_all_matches_declaration_order() {
        let declared: Vec<Collection> = Collection::iter().collect();
        assert_eq!(declared, Collection::ALL.to_vec());
    }

    #[test]
    fn test_file_names_are_distinct() {
        let mut names: Vec<&str> = Collection::ALL.iter().map(|c| c.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
        assert_eq!(Collection::SoupsAndCreams.file_name(), "soupsAndCreamsRecipes.json");
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(Collection::SoupsAndCreams.to_string(), "soups_and_creams");
        assert_eq!(Collection::from_str("christmas").unwrap(), Collection::Christmas);
        assert!(Collection::from_str("desserts").is_err());
    }
}
