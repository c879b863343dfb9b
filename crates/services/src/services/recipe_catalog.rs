//! In-memory view over all loaded recipes, with search, filtering and variant grouping.

use std::collections::{BTreeSet, HashSet};

use db::models::recipe::Recipe;
use once_cell::sync::Lazy;
use regex::Regex;

// "Bábovka - varianta 2", "Bábovka varianta 3 (bez lepku)"
static VARIANT_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*[-–—:]?\s*varianta\s*\d+.*$").unwrap());
static VARIANT_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)varianta\s*(\d+)").unwrap());

/// Title with any trailing "varianta N" marker removed.
///
/// Recipes sharing a base title are variants of the same dish.
pub fn base_title(title: &str) -> String {
    VARIANT_SUFFIX.replace(title, "").trim().to_string()
}

pub fn variant_number(title: &str) -> Option<u32> {
    VARIANT_NUMBER
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Short label for a variant chip: "Varianta N", or the full title when unnumbered
pub fn variant_label(title: &str) -> String {
    match variant_number(title) {
        Some(n) => format!("Varianta {n}"),
        None => title.to_string(),
    }
}

/// Snapshot of every collection, concatenated in load order
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
}

impl RecipeCatalog {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    pub fn all(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    /// Recipes tagged with any of `tags`; all recipes when `tags` is empty
    pub fn by_categories(&self, tags: &[String]) -> Vec<&Recipe> {
        if tags.is_empty() {
            return self.recipes.iter().collect();
        }
        self.recipes
            .iter()
            .filter(|r| r.has_any_category(tags))
            .collect()
    }

    /// Case-insensitive substring match on title or description
    pub fn search(&self, query: &str) -> Vec<&Recipe> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.recipes.iter().collect();
        }
        self.recipes
            .iter()
            .filter(|r| matches_query(r, &needle))
            .collect()
    }

    /// [`Self::search`] and [`Self::by_categories`] combined; inactive filters are skipped
    pub fn filter(&self, query: &str, tags: &[String]) -> Vec<&Recipe> {
        let needle = query.trim().to_lowercase();
        self.recipes
            .iter()
            .filter(|r| needle.is_empty() || matches_query(r, &needle))
            .filter(|r| tags.is_empty() || r.has_any_category(tags))
            .collect()
    }

    /// Distinct tags in use, sorted
    pub fn all_categories(&self) -> Vec<String> {
        self.recipes
            .iter()
            .flat_map(|r| r.categories.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every recipe with the same base title, `recipe` included
    pub fn variants<'a>(&'a self, recipe: &'a Recipe) -> Vec<&'a Recipe> {
        let base = base_title(&recipe.title);
        let variants: Vec<&Recipe> = self
            .recipes
            .iter()
            .filter(|r| base_title(&r.title) == base)
            .collect();
        if variants.iter().any(|r| r.id == recipe.id) {
            variants
        } else {
            // recipe is not part of this snapshot
            let mut with_self = vec![recipe];
            with_self.extend(variants);
            with_self
        }
    }

    pub fn has_variants(&self, recipe: &Recipe) -> bool {
        self.variants(recipe).len() > 1
    }

    /// First recipe of every base title, in load order
    pub fn grouped(&self) -> Vec<&Recipe> {
        let mut seen = HashSet::new();
        self.recipes
            .iter()
            .filter(|r| seen.insert(base_title(&r.title)))
            .collect()
    }
}

fn matches_query(recipe: &Recipe, needle: &str) -> bool {
    recipe.title.to_lowercase().contains(needle)
        || recipe
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}
