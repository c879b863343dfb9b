use std::sync::Arc;

use services::services::{
    add_recipe::AddRecipeService,
    collection_store::{CollectionStore, LocalCollectionStore, RemoteCollectionStore, StoreBackend},
    config::RecipeStoreConfig,
    content_store::{ContentStoreError, GitHubContentStore},
    recipe_repository::RecipeRepository,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    ContentStore(#[from] ContentStoreError),
}

/// Everything a request handler needs, wired from configuration
#[derive(Clone)]
pub struct Deployment {
    repository: RecipeRepository,
    add_recipe: AddRecipeService,
    backend: StoreBackend,
}

impl Deployment {
    pub fn from_env() -> Result<Self, DeploymentError> {
        Self::new(RecipeStoreConfig::from_env())
    }

    /// Uses the remote content store when it is configured, the data directory otherwise
    pub fn new(config: RecipeStoreConfig) -> Result<Self, DeploymentError> {
        let store: Arc<dyn CollectionStore> = match config.remote {
            Some(remote) => {
                info!(
                    owner = %remote.owner,
                    repo = %remote.repo,
                    branch = %remote.branch,
                    "Using remote content store for recipes"
                );
                let client = GitHubContentStore::new(remote)?;
                Arc::new(RemoteCollectionStore::new(Arc::new(client)))
            }
            None => {
                info!(
                    data_dir = %config.data_dir.display(),
                    "Remote content store not configured, using local recipe files"
                );
                Arc::new(LocalCollectionStore::new(config.data_dir))
            }
        };

        let backend = store.backend();
        let repository = match config.cache_ttl {
            Some(ttl) => RecipeRepository::with_cache_ttl(store, ttl),
            None => RecipeRepository::new(store),
        };

        Ok(Self {
            add_recipe: AddRecipeService::new(repository.clone()),
            repository,
            backend,
        })
    }

    pub fn repository(&self) -> &RecipeRepository {
        &self.repository
    }

    pub fn add_recipe(&self) -> &AddRecipeService {
        &self.add_recipe
    }

    pub fn backend(&self) -> StoreBackend {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use db::models::recipe::CreateRecipe;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_selects_remote_backend_when_configured() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("GITHUB_OWNER", "rodina"),
            ("GITHUB_REPO", "recepty"),
            ("GITHUB_TOKEN", "secret"),
        ]);
        let config = RecipeStoreConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        let deployment = Deployment::new(config).unwrap();
        assert_eq!(deployment.backend(), StoreBackend::Remote);
    }

    #[tokio::test]
    async fn test_local_deployment_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut config = RecipeStoreConfig::local(dir.path());
        config.cache_ttl = Some(Duration::from_secs(60));
        let deployment = Deployment::new(config).unwrap();
        assert_eq!(deployment.backend(), StoreBackend::Local);
        assert!(deployment.repository().catalog().await.unwrap().is_empty());

        let draft = CreateRecipe {
            title: "Bramboráky".to_string(),
            categories: vec!["slané".to_string()],
            ingredients: Some(vec!["brambory".to_string()]),
            instructions: vec!["Usmažit".to_string()],
            ..Default::default()
        }
        .into_recipe();
        deployment.add_recipe().add_recipe(draft).await.unwrap();

        let recipe = deployment
            .repository()
            .get_by_id("bramboraky")
            .await
            .unwrap()
            .expect("recipe saved");
        assert_eq!(recipe.title, "Bramboráky");
        assert!(dir.path().join("saltyRecipes.json").exists());
    }
}
