//! Validates a submitted recipe and appends it to the collection it belongs to.

use db::models::{
    category::unknown_categories,
    collection::Collection,
    recipe::{CreateRecipe, Ingredients, Recipe},
};
use thiserror::Error;
use tracing::{info, warn};

use super::{
    collection_store::{CollectionSnapshot, StoreError},
    recipe_repository::RecipeRepository,
    recipe_router::select_collection,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title is required")]
    MissingTitle,
    #[error("at least one category is required")]
    MissingCategories,
    #[error("at least one instruction step is required")]
    MissingInstructions,
    #[error("at least one ingredient is required")]
    MissingIngredients,
    #[error("ingredient group {position} has no items")]
    EmptyIngredientGroup { position: usize },
    #[error("ingredients and ingredient groups cannot both be filled in")]
    AmbiguousIngredients,
    #[error("id is required")]
    MissingId,
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
}

#[derive(Debug, Error)]
pub enum AddRecipeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("recipe with id \"{id}\" already exists")]
    Duplicate { id: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AddRecipeError {
    /// Caused by the submitted data rather than by storage
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AddRecipeError::Validation(_) | AddRecipeError::Duplicate { .. }
        )
    }
}

/// Checks run in order; the first failure is reported.
pub fn validate(recipe: &Recipe) -> Result<(), ValidationError> {
    if recipe.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if recipe.categories.is_empty() {
        return Err(ValidationError::MissingCategories);
    }
    if recipe.instructions.is_empty() {
        return Err(ValidationError::MissingInstructions);
    }
    match &recipe.ingredients {
        Ingredients::Flat(items) if items.is_empty() => {
            return Err(ValidationError::MissingIngredients);
        }
        Ingredients::Grouped(groups) if groups.is_empty() => {
            return Err(ValidationError::MissingIngredients);
        }
        Ingredients::Grouped(groups) => {
            if let Some(index) = groups.iter().position(|g| g.items.is_empty()) {
                return Err(ValidationError::EmptyIngredientGroup {
                    position: index + 1,
                });
            }
        }
        Ingredients::Flat(_) => {}
    }
    if recipe.id.trim().is_empty() {
        return Err(ValidationError::MissingId);
    }
    for (field, value) in [
        ("prepTime", recipe.prep_time),
        ("cookTime", recipe.cook_time),
        ("servings", recipe.servings),
    ] {
        if value == Some(0) {
            return Err(ValidationError::NotPositive { field });
        }
    }
    Ok(())
}

/// The add-recipe workflow: validate, reject duplicate ids, route, append.
///
/// The duplicate check and the append are not atomic. With the remote backend a
/// concurrent append to the same collection makes the write fail on its stale
/// version token; the failure is returned as is and never retried.
#[derive(Clone)]
pub struct AddRecipeService {
    repository: RecipeRepository,
}

impl AddRecipeService {
    pub fn new(repository: RecipeRepository) -> Self {
        Self { repository }
    }

    /// Accepts a submitted draft. A draft filling both ingredient shapes is
    /// rejected, since only one of them can be stored.
    pub async fn submit(&self, draft: CreateRecipe) -> Result<Recipe, AddRecipeError> {
        let ambiguous = draft.has_both_ingredient_shapes();
        let recipe = draft.into_recipe();
        validate(&recipe)?;
        if ambiguous {
            return Err(ValidationError::AmbiguousIngredients.into());
        }
        self.append(recipe).await
    }

    pub async fn add_recipe(&self, recipe: Recipe) -> Result<Recipe, AddRecipeError> {
        validate(&recipe)?;
        self.append(recipe).await
    }

    async fn append(&self, recipe: Recipe) -> Result<Recipe, AddRecipeError> {

        let unknown = unknown_categories(&recipe.categories);
        if !unknown.is_empty() {
            warn!(recipe_id = %recipe.id, categories = ?unknown, "Recipe uses unrecognized categories");
        }

        let target = select_collection(&recipe.categories);
        let store = self.repository.store();

        let mut target_snapshot = CollectionSnapshot::default();
        for collection in Collection::ALL {
            let snapshot = store.read(collection).await?;
            if snapshot.contains_id(&recipe.id) {
                warn!(
                    recipe_id = %recipe.id,
                    collection = %collection,
                    "Rejected recipe with duplicate id"
                );
                return Err(AddRecipeError::Duplicate { id: recipe.id });
            }
            if collection == target {
                target_snapshot = snapshot;
            }
        }

        target_snapshot.push(&recipe).map_err(StoreError::Encode)?;
        let message = format!("Přidán recept: {}", recipe.title);
        let version = match store.write(target, &target_snapshot, &message).await {
            Ok(version) => version,
            Err(e) => {
                warn!(
                    recipe_id = %recipe.id,
                    collection = %target,
                    backend = %store.backend(),
                    error = %e,
                    "Failed to persist recipe"
                );
                return Err(e.into());
            }
        };
        self.repository.invalidate().await;

        info!(
            recipe_id = %recipe.id,
            collection = %target,
            backend = %store.backend(),
            version = version.as_deref().unwrap_or("-"),
            "Added recipe"
        );
        Ok(recipe)
    }
}
