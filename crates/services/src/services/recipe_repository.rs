//! Loads the recipe collections into a [`RecipeCatalog`].

use std::{sync::Arc, time::Duration};

use db::models::{collection::Collection, recipe::Recipe};
use moka::future::Cache;
use tracing::{debug, warn};

use super::{
    collection_store::{CollectionStore, StoreError},
    recipe_catalog::RecipeCatalog,
};

/// Entry point for reading recipes. Cheap to clone.
#[derive(Clone)]
pub struct RecipeRepository {
    store: Arc<dyn CollectionStore>,
    cache: Option<Cache<(), Arc<RecipeCatalog>>>,
}

impl RecipeRepository {
    /// Reloads every collection on each [`Self::catalog`] call
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store, cache: None }
    }

    /// Reuses a loaded catalog for up to `ttl`, or until [`Self::invalidate`]
    pub fn with_cache_ttl(store: Arc<dyn CollectionStore>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self {
            store,
            cache: Some(cache),
        }
    }

    pub fn store(&self) -> &Arc<dyn CollectionStore> {
        &self.store
    }

    pub async fn catalog(&self) -> Result<Arc<RecipeCatalog>, StoreError> {
        if let Some(cache) = &self.cache {
            if let Some(catalog) = cache.get(&()).await {
                return Ok(catalog);
            }
        }

        let catalog = Arc::new(self.load().await?);
        if let Some(cache) = &self.cache {
            cache.insert((), catalog.clone()).await;
        }
        Ok(catalog)
    }

    /// Drops the cached catalog so the next read sees the stores again
    pub async fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&()).await;
        }
    }

    pub async fn get_all(&self) -> Result<Vec<Recipe>, StoreError> {
        Ok(self.catalog().await?.all().to_vec())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Recipe>, StoreError> {
        Ok(self.catalog().await?.get_by_id(id).cloned())
    }

    async fn load(&self) -> Result<RecipeCatalog, StoreError> {
        let mut recipes = Vec::new();
        for collection in Collection::ALL {
            let snapshot = match self.store.read(collection).await {
                Ok(snapshot) => snapshot,
                // Browsing tolerates a corrupt file; the add workflow does not
                Err(e @ StoreError::Malformed { .. }) => {
                    warn!(error = %e, "Malformed collection, treating it as empty");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let loaded = snapshot.recipes(collection);
            debug!(
                collection = %collection,
                records = snapshot.records.len(),
                recipes = loaded.len(),
                "Loaded collection"
            );
            recipes.extend(loaded);
        }
        let catalog = RecipeCatalog::new(recipes);
        debug!(recipes = catalog.len(), "Loaded recipe catalog");
        Ok(catalog)
    }
}
