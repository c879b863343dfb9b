//! Routes for browsing and submitting recipes.

use axum::{
    Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::recipe::{CreateRecipe, IngredientGroup, Recipe};
use serde::{Deserialize, Serialize};
use services::services::recipe_catalog::{base_title, variant_label};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct RecipeQuery {
    #[serde(default)]
    pub q: Option<String>,
    /// Comma-separated category tags
    #[serde(default)]
    pub categories: Option<String>,
}

impl RecipeQuery {
    fn tags(&self) -> Vec<String> {
        self.categories
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A recipe as shown on its detail page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    /// Image file name with the placeholder applied
    pub image_src: String,
    /// Ingredients as sections; a flat list becomes one unnamed section
    pub ingredient_sections: Vec<IngredientGroup>,
}

impl From<Recipe> for RecipeDetail {
    fn from(recipe: Recipe) -> Self {
        Self {
            image_src: recipe.image_or_default().to_string(),
            ingredient_sections: recipe.ingredient_groups().into_owned(),
            recipe,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSummary {
    pub id: String,
    pub title: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeVariants {
    pub base_title: String,
    pub has_variants: bool,
    pub variants: Vec<VariantSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedRecipe {
    pub success: bool,
    pub recipe: Recipe,
}

/// GET /api/recipes?q=&categories=
pub async fn list_recipes(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<RecipeQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Recipe>>>, ApiError> {
    let catalog = deployment.repository().catalog().await?;
    let recipes = catalog
        .filter(query.q.as_deref().unwrap_or_default(), &query.tags())
        .into_iter()
        .cloned()
        .collect();
    Ok(ResponseJson(ApiResponse::success(recipes)))
}

/// GET /api/recipes/grouped
/// One recipe per dish, variants collapsed
pub async fn list_grouped_recipes(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Recipe>>>, ApiError> {
    let catalog = deployment.repository().catalog().await?;
    let recipes = catalog.grouped().into_iter().cloned().collect();
    Ok(ResponseJson(ApiResponse::success(recipes)))
}

/// GET /api/recipes/{id}
pub async fn get_recipe(
    State(deployment): State<DeploymentImpl>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<RecipeDetail>>, ApiError> {
    let recipe = deployment
        .repository()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("recipe \"{id}\" not found")))?;
    Ok(ResponseJson(ApiResponse::success(RecipeDetail::from(recipe))))
}

/// GET /api/recipes/{id}/variants
pub async fn get_recipe_variants(
    State(deployment): State<DeploymentImpl>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<RecipeVariants>>, ApiError> {
    let catalog = deployment.repository().catalog().await?;
    let recipe = catalog
        .get_by_id(&id)
        .ok_or_else(|| ApiError::NotFound(format!("recipe \"{id}\" not found")))?;

    let variants: Vec<VariantSummary> = catalog
        .variants(recipe)
        .into_iter()
        .map(|variant| VariantSummary {
            id: variant.id.clone(),
            title: variant.title.clone(),
            label: variant_label(&variant.title),
        })
        .collect();

    Ok(ResponseJson(ApiResponse::success(RecipeVariants {
        base_title: base_title(&recipe.title),
        has_variants: catalog.has_variants(recipe),
        variants,
    })))
}

/// GET /api/categories
pub async fn list_categories(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<String>>>, ApiError> {
    let catalog = deployment.repository().catalog().await?;
    Ok(ResponseJson(ApiResponse::success(catalog.all_categories())))
}

/// POST /api/recipes
pub async fn create_recipe(
    State(deployment): State<DeploymentImpl>,
    payload: Result<axum::Json<CreateRecipe>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<CreatedRecipe>), ApiError> {
    let axum::Json(payload) = payload?;
    let recipe = deployment.add_recipe().submit(payload).await?;

    Ok((
        StatusCode::CREATED,
        ResponseJson(CreatedRecipe {
            success: true,
            recipe,
        }),
    ))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/grouped", get(list_grouped_recipes))
        .route("/recipes/{id}", get(get_recipe))
        .route("/recipes/{id}/variants", get(get_recipe_variants))
        .route("/categories", get(list_categories))
}
