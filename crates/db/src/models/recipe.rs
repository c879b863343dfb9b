use std::borrow::Cow;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utils::text::slugify;

/// Image file name used when a recipe has none
pub const DEFAULT_IMAGE: &str = "default-image.webp";

/// A named block of ingredients, e.g. "Těsto" or "Náplň"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

impl IngredientGroup {
    pub fn new(name: Option<String>, items: Vec<String>) -> Self {
        Self { name, items }
    }
}

/// Ingredients of a recipe. Older records carry a flat list, newer ones named groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingredients {
    Flat(Vec<String>),
    Grouped(Vec<IngredientGroup>),
}

impl Default for Ingredients {
    fn default() -> Self {
        Ingredients::Flat(Vec::new())
    }
}

impl Ingredients {
    /// Picks the populated shape. Non-empty groups win over the flat list.
    pub fn resolve(flat: Option<Vec<String>>, groups: Option<Vec<IngredientGroup>>) -> Self {
        match groups {
            Some(groups) if !groups.is_empty() => Ingredients::Grouped(groups),
            _ => Ingredients::Flat(flat.unwrap_or_default()),
        }
    }
}

/// Who the recipe came from. Free text beyond the usual family members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Author {
    Maminka,
    Babicka,
    Sousedka,
    Other(String),
}

impl From<String> for Author {
    fn from(value: String) -> Self {
        match value.as_str() {
            "maminka" => Author::Maminka,
            "babička" => Author::Babicka,
            "sousedka" => Author::Sousedka,
            _ => Author::Other(value),
        }
    }
}

impl From<Author> for String {
    fn from(author: Author) -> Self {
        match author {
            Author::Maminka => "maminka".to_string(),
            Author::Babicka => "babička".to_string(),
            Author::Sousedka => "sousedka".to_string(),
            Author::Other(name) => name,
        }
    }
}

/// On-disk shape of a recipe, shared by every collection file.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipeRecord {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    description: Option<String>,
    image: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    ingredients: Option<Vec<String>>,
    ingredient_groups: Option<Vec<IngredientGroup>>,
    #[serde(default)]
    instructions: Vec<String>,
    prep_time: Option<u32>,
    cook_time: Option<u32>,
    servings: Option<u32>,
    author: Option<Author>,
    created_at: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecipeRecord", into = "RecipeRecord")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub categories: Vec<String>,
    pub ingredients: Ingredients,
    pub instructions: Vec<String>,
    pub prep_time: Option<u32>, // minutes
    pub cook_time: Option<u32>, // minutes
    pub servings: Option<u32>,
    pub author: Option<Author>,
    pub created_at: Option<String>,
    /// Fields this version does not know about, written back untouched
    pub extra: Map<String, Value>,
}

impl From<RecipeRecord> for Recipe {
    fn from(record: RecipeRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            image: record.image,
            categories: record.categories,
            ingredients: Ingredients::resolve(record.ingredients, record.ingredient_groups),
            instructions: record.instructions,
            prep_time: record.prep_time,
            cook_time: record.cook_time,
            servings: record.servings,
            author: record.author,
            created_at: record.created_at,
            extra: record.extra,
        }
    }
}

impl From<Recipe> for RecipeRecord {
    fn from(recipe: Recipe) -> Self {
        let (ingredients, ingredient_groups) = match recipe.ingredients {
            Ingredients::Flat(items) => (Some(items), None),
            Ingredients::Grouped(groups) => (None, Some(groups)),
        };
        Self {
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            image: recipe.image,
            categories: recipe.categories,
            ingredients,
            ingredient_groups,
            instructions: recipe.instructions,
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            servings: recipe.servings,
            author: recipe.author,
            created_at: recipe.created_at,
            extra: recipe.extra,
        }
    }
}

impl Recipe {
    /// Image file name, or [`DEFAULT_IMAGE`] when the recipe has none
    pub fn image_or_default(&self) -> &str {
        match self.image.as_deref() {
            Some(image) if !image.trim().is_empty() => image,
            _ => DEFAULT_IMAGE,
        }
    }

    /// Ingredients as groups. A flat list is presented as a single unnamed group.
    pub fn ingredient_groups(&self) -> Cow<'_, [IngredientGroup]> {
        match &self.ingredients {
            Ingredients::Grouped(groups) => Cow::Borrowed(groups.as_slice()),
            Ingredients::Flat(items) if items.is_empty() => Cow::Borrowed(&[]),
            Ingredients::Flat(items) => Cow::Owned(vec![IngredientGroup::new(None, items.clone())]),
        }
    }

    pub fn has_any_category(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| self.categories.contains(tag))
    }
}

/// Request body for submitting a new recipe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipe {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub ingredients: Option<Vec<String>>,
    pub ingredient_groups: Option<Vec<IngredientGroup>>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub prep_time: Option<u32>,
    pub cook_time: Option<u32>,
    pub servings: Option<u32>,
    pub author: Option<Author>,
    pub created_at: Option<String>,
}

impl CreateRecipe {
    /// True when the draft fills both the flat list and the groups
    pub fn has_both_ingredient_shapes(&self) -> bool {
        let flat = self.ingredients.as_ref().is_some_and(|items| !items.is_empty());
        let grouped = self
            .ingredient_groups
            .as_ref()
            .is_some_and(|groups| !groups.is_empty());
        flat && grouped
    }

    /// Builds the recipe to persist. A blank id is derived from the title and a
    /// missing timestamp is set to now.
    pub fn into_recipe(self) -> Recipe {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => slugify(&self.title),
        };
        let created_at = self
            .created_at
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        Recipe {
            id,
            title: self.title,
            description: self.description,
            image: self.image,
            categories: self.categories,
            ingredients: Ingredients::resolve(self.ingredients, self.ingredient_groups),
            instructions: self.instructions,
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            servings: self.servings,
            author: self.author,
            created_at: Some(created_at),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_flat_ingredients() {
        let recipe: Recipe = serde_json::from_value(json!({
            "id": "babovka",
            "title": "Bábovka",
            "categories": ["sladké"],
            "ingredients": ["mouka", "cukr"],
            "instructions": ["Smíchat", "Upéct"],
            "prepTime": 20,
            "author": "babička"
        }))
        .unwrap();

        assert_eq!(
            recipe.ingredients,
            Ingredients::Flat(vec!["mouka".to_string(), "cukr".to_string()])
        );
        assert_eq!(recipe.prep_time, Some(20));
        assert_eq!(recipe.author, Some(Author::Babicka));
        assert_eq!(recipe.image_or_default(), DEFAULT_IMAGE);
    }

    #[test]
    fn test_groups_win_over_empty_flat_list() {
        let recipe: Recipe = serde_json::from_value(json!({
            "id": "linecke",
            "title": "Linecké",
            "categories": ["cukroví"],
            "ingredients": [],
            "ingredientGroups": [
                { "name": "Těsto", "items": ["mouka", "máslo"] },
                { "items": ["marmeláda"] }
            ],
            "instructions": ["Vykrájet"]
        }))
        .unwrap();

        match &recipe.ingredients {
            Ingredients::Grouped(groups) => {
                assert_eq!(groups.len(), 2);
                assert_eq!(groups[0].name.as_deref(), Some("Těsto"));
                assert_eq!(groups[1].name, None);
            }
            other => panic!("expected grouped ingredients, got {:?}", other),
        }

        let encoded = serde_json::to_value(&recipe).unwrap();
        assert!(encoded.get("ingredients").is_none());
        assert_eq!(encoded["ingredientGroups"][1], json!({ "items": ["marmeláda"] }));
    }

    #[test]
    fn test_encode_omits_absent_fields_and_keeps_unknown_ones() {
        let input = json!({
            "id": "gulas",
            "title": "Guláš",
            "categories": ["slané", "hlavní jídla"],
            "ingredients": ["maso"],
            "instructions": ["Dusit"],
            "rating": 5
        });
        let recipe: Recipe = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(recipe.extra.get("rating"), Some(&json!(5)));

        let encoded = serde_json::to_value(&recipe).unwrap();
        assert_eq!(encoded, input);
    }

    #[test]
    fn test_author_other_round_trips() {
        let author: Author = serde_json::from_value(json!("teta Jarmila")).unwrap();
        assert_eq!(author, Author::Other("teta Jarmila".to_string()));
        assert_eq!(serde_json::to_value(author).unwrap(), json!("teta Jarmila"));
    }

    #[test]
    fn test_image_or_default_ignores_blank() {
        let mut recipe = CreateRecipe {
            title: "Koláč".to_string(),
            image: Some("   ".to_string()),
            ..Default::default()
        }
        .into_recipe();
        assert_eq!(recipe.image_or_default(), DEFAULT_IMAGE);

        recipe.image = Some("kolac.webp".to_string());
        assert_eq!(recipe.image_or_default(), "kolac.webp");
    }

    #[test]
    fn test_flat_list_presented_as_single_group() {
        let recipe = CreateRecipe {
            title: "Polévka".to_string(),
            ingredients: Some(vec!["voda".to_string()]),
            ..Default::default()
        }
        .into_recipe();

        let groups = recipe.ingredient_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, None);
        assert_eq!(groups[0].items, vec!["voda".to_string()]);
    }

    #[test]
    fn test_detects_both_ingredient_shapes() {
        let mut draft = CreateRecipe {
            ingredients: Some(vec!["mouka".to_string()]),
            ingredient_groups: Some(vec![]),
            ..Default::default()
        };
        assert!(!draft.has_both_ingredient_shapes());

        draft.ingredient_groups = Some(vec![IngredientGroup::new(None, vec!["cukr".to_string()])]);
        assert!(draft.has_both_ingredient_shapes());

        draft.ingredients = None;
        assert!(!draft.has_both_ingredient_shapes());
    }

    #[test]
    fn test_into_recipe_derives_missing_id() {
        let recipe = CreateRecipe {
            id: Some("  ".to_string()),
            title: "Švestkový koláč".to_string(),
            ..Default::default()
        }
        .into_recipe();
        assert_eq!(recipe.id, "svestkovy-kolac");
        assert!(recipe.created_at.is_some());

        let recipe = CreateRecipe {
            id: Some("vlastni-id".to_string()),
            title: "Švestkový koláč".to_string(),
            created_at: Some("2024-12-01T10:00:00.000Z".to_string()),
            ..Default::default()
        }
        .into_recipe();
        assert_eq!(recipe.id, "vlastni-id");
        assert_eq!(recipe.created_at.as_deref(), Some("2024-12-01T10:00:00.000Z"));
    }
}
