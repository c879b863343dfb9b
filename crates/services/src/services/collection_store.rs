//! Read/write access to the recipe collection files, locally or through a content store.

use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use db::models::{collection::Collection, recipe::Recipe};
use serde::Deserialize;
use serde_json::Value;
use strum_macros::Display;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::content_store::{ContentStore, ContentStoreError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode collection: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{collection} collection is not a JSON array: {source}")]
    Malformed {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    ContentStore(#[from] ContentStoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    Local,
    Remote,
}

/// Records of one collection plus the revision they were read at.
///
/// Records are kept as raw JSON so entries the [`Recipe`] model cannot read
/// are written back exactly as they were.
#[derive(Debug, Clone, Default)]
pub struct CollectionSnapshot {
    pub records: Vec<Value>,
    /// Only the remote backend tracks revisions
    pub version_token: Option<String>,
}

impl CollectionSnapshot {
    pub fn contains_id(&self, id: &str) -> bool {
        self.records
            .iter()
            .any(|record| record.get("id").and_then(Value::as_str) == Some(id))
    }

    pub fn push(&mut self, recipe: &Recipe) -> Result<(), serde_json::Error> {
        self.records.push(serde_json::to_value(recipe)?);
        Ok(())
    }

    /// Records that decode as recipes. The rest are logged and skipped.
    pub fn recipes(&self, collection: Collection) -> Vec<Recipe> {
        self.records
            .iter()
            .filter_map(|record| match Recipe::deserialize(record) {
                Ok(recipe) => Some(recipe),
                Err(e) => {
                    warn!(
                        collection = %collection,
                        recipe_id = record.get("id").and_then(serde_json::Value::as_str).unwrap_or("-"),
                        error = %e,
                        "Skipping unreadable recipe record"
                    );
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
pub trait CollectionStore: Send + Sync {
    fn backend(&self) -> StoreBackend;

    /// Missing collections read as empty. A local file that is not a JSON
    /// array also reads as empty; a remote one fails with [`StoreError::Malformed`].
    async fn read(&self, collection: Collection) -> Result<CollectionSnapshot, StoreError>;

    /// Replaces the collection with `snapshot.records`. Returns the new version token, if any.
    async fn write(
        &self,
        collection: Collection,
        snapshot: &CollectionSnapshot,
        message: &str,
    ) -> Result<Option<String>, StoreError>;
}

/// Parses a collection file as a JSON array of arbitrary records
pub fn decode_collection(collection: Collection, content: &str) -> Result<Vec<Value>, StoreError> {
    serde_json::from_str(content).map_err(|source| StoreError::Malformed { collection, source })
}

/// Two-space indented JSON array
pub fn encode_collection(records: &[Value]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

/// Collections as files in a local directory
#[derive(Debug, Clone)]
pub struct LocalCollectionStore {
    data_dir: PathBuf,
}

impl LocalCollectionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.file_name())
    }
}

#[async_trait]
impl CollectionStore for LocalCollectionStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Local
    }

    async fn read(&self, collection: Collection) -> Result<CollectionSnapshot, StoreError> {
        let path = self.path_for(collection);
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match decode_collection(collection, &content) {
                Ok(records) => records,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Malformed collection file, treating it as empty"
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Collection file missing, treating it as empty");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read collection file");
                Vec::new()
            }
        };

        Ok(CollectionSnapshot {
            records,
            version_token: None,
        })
    }

    async fn write(
        &self,
        collection: Collection,
        snapshot: &CollectionSnapshot,
        _message: &str,
    ) -> Result<Option<String>, StoreError> {
        let path = self.path_for(collection);
        let content = encode_collection(&snapshot.records)?;

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|source| StoreError::Io {
                path: self.data_dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        info!(
            path = %path.display(),
            records = snapshot.records.len(),
            "Wrote collection file"
        );
        Ok(None)
    }
}

/// Collections as files in a remote [`ContentStore`]
#[derive(Clone)]
pub struct RemoteCollectionStore {
    store: Arc<dyn ContentStore>,
}

impl RemoteCollectionStore {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CollectionStore for RemoteCollectionStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Remote
    }

    async fn read(&self, collection: Collection) -> Result<CollectionSnapshot, StoreError> {
        let file = self.store.get_file(collection.file_name()).await?;
        debug!(
            collection = %collection,
            version = file.version_token.as_deref().unwrap_or("none"),
            "Read collection from content store"
        );
        Ok(CollectionSnapshot {
            records: decode_collection(collection, &file.content)?,
            version_token: file.version_token,
        })
    }

    async fn write(
        &self,
        collection: Collection,
        snapshot: &CollectionSnapshot,
        message: &str,
    ) -> Result<Option<String>, StoreError> {
        let content = encode_collection(&snapshot.records)?;
        let version = self
            .store
            .put_file(
                collection.file_name(),
                &content,
                snapshot.version_token.as_deref(),
                message,
            )
            .await?;
        Ok(Some(version))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use db::models::recipe::CreateRecipe;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::services::content_store::StoredFile;

    /// In-memory content store whose version token changes on every write
    #[derive(Default)]
    pub(crate) struct MemoryContentStore {
        files: Mutex<HashMap<String, (String, u64)>>,
        next_version: Mutex<u64>,
        messages: Mutex<Vec<String>>,
    }

    impl MemoryContentStore {
        pub(crate) fn seed(&self, path: &str, content: &str) {
            let version = self.bump();
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), (content.to_string(), version));
        }

        pub(crate) fn content(&self, path: &str) -> Option<String> {
            self.files.lock().unwrap().get(path).map(|(c, _)| c.clone())
        }

        pub(crate) fn last_message(&self) -> Option<String> {
            self.messages.lock().unwrap().last().cloned()
        }

        fn bump(&self) -> u64 {
            let mut next = self.next_version.lock().unwrap();
            *next += 1;
            *next
        }
    }

    #[async_trait]
    impl ContentStore for MemoryContentStore {
        async fn get_file(&self, path: &str) -> Result<StoredFile, ContentStoreError> {
            Ok(match self.files.lock().unwrap().get(path) {
                Some((content, version)) => StoredFile {
                    content: content.clone(),
                    version_token: Some(version.to_string()),
                },
                None => StoredFile::absent(),
            })
        }

        async fn put_file(
            &self,
            path: &str,
            content: &str,
            expected_version: Option<&str>,
            message: &str,
        ) -> Result<String, ContentStoreError> {
            let current = self
                .files
                .lock()
                .unwrap()
                .get(path)
                .map(|(_, v)| v.to_string());
            if current.as_deref() != expected_version {
                return Err(ContentStoreError::VersionConflict {
                    path: path.to_string(),
                });
            }
            let version = self.bump();
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), (content.to_string(), version));
            self.messages.lock().unwrap().push(message.to_string());
            Ok(version.to_string())
        }
    }

    pub(crate) fn recipe(id: &str, title: &str, categories: &[&str]) -> Recipe {
        CreateRecipe {
            id: Some(id.to_string()),
            title: title.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            ingredients: Some(vec!["mouka".to_string()]),
            instructions: vec!["Upéct".to_string()],
            created_at: Some("2024-01-01T00:00:00.000Z".to_string()),
            ..Default::default()
        }
        .into_recipe()
    }

    pub(crate) fn snapshot(recipes: &[Recipe]) -> CollectionSnapshot {
        let mut snapshot = CollectionSnapshot::default();
        for recipe in recipes {
            snapshot.push(recipe).unwrap();
        }
        snapshot
    }

    /// A sweet collection with one readable record and two the model rejects
    pub(crate) fn mixed_sweet_collection() -> String {
        serde_json::to_string_pretty(&json!([
            {
                "id": "babovka",
                "title": "Bábovka",
                "categories": ["sladké"],
                "ingredients": ["mouka"],
                "instructions": ["Upéct"],
                "prepTime": 7.5
            },
            {
                "id": "pernik",
                "title": "Perník",
                "categories": ["sladké"],
                "ingredients": ["mouka", "med"],
                "instructions": ["Upéct"],
                "servings": "4-6"
            },
            {
                "id": "buchty",
                "title": "Buchty",
                "categories": ["sladké", "buchty"],
                "ingredients": ["mouka", "tvaroh"],
                "instructions": ["Upéct"]
            }
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn test_local_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalCollectionStore::new(dir.path());

        let snapshot = store.read(Collection::Sweet).await.unwrap();
        assert!(snapshot.records.is_empty());
        assert_eq!(snapshot.version_token, None);
    }

    #[tokio::test]
    async fn test_local_malformed_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("saltyRecipes.json"), "{ not json").unwrap();
        let store = LocalCollectionStore::new(dir.path());

        let snapshot = store.read(Collection::Salty).await.unwrap();
        assert!(snapshot.records.is_empty());
    }

    #[tokio::test]
    async fn test_local_write_is_pretty_printed() {
        let dir = TempDir::new().unwrap();
        let store = LocalCollectionStore::new(dir.path().join("nested"));
        let snapshot = snapshot(&[recipe("gulas", "Guláš", &["slané"])]);

        store.write(Collection::Salty, &snapshot, "unused").await.unwrap();

        let written = std::fs::read_to_string(store.path_for(Collection::Salty)).unwrap();
        assert!(written.starts_with("[\n  {\n    \"id\": \"gulas\""));
        assert!(written.contains("\"title\": \"Guláš\""));

        let reread = store.read(Collection::Salty).await.unwrap();
        assert_eq!(reread.records, snapshot.records);
    }

    #[tokio::test]
    async fn test_records_outside_the_model_are_kept_but_not_listed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sweetRecipes.json"), mixed_sweet_collection()).unwrap();
        let store = LocalCollectionStore::new(dir.path());

        let snapshot = store.read(Collection::Sweet).await.unwrap();
        assert_eq!(snapshot.records.len(), 3);
        assert!(snapshot.contains_id("babovka"));
        assert!(snapshot.contains_id("pernik"));

        let ids: Vec<String> = snapshot
            .recipes(Collection::Sweet)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["buchty"]);
    }

    #[tokio::test]
    async fn test_remote_round_trip_tracks_versions() {
        let content_store = Arc::new(MemoryContentStore::default());
        let store = RemoteCollectionStore::new(content_store.clone());

        let empty = store.read(Collection::Christmas).await.unwrap();
        assert!(empty.records.is_empty());
        assert_eq!(empty.version_token, None);

        let snapshot = snapshot(&[recipe("rohlicky", "Vanilkové rohlíčky", &["cukroví"])]);
        let version = store
            .write(Collection::Christmas, &snapshot, "Přidán recept: Vanilkové rohlíčky")
            .await
            .unwrap();
        assert!(version.is_some());

        let reread = store.read(Collection::Christmas).await.unwrap();
        assert_eq!(reread.records, snapshot.records);
        assert_eq!(reread.version_token, version);
    }

    #[tokio::test]
    async fn test_remote_malformed_file_is_an_error() {
        let content_store = Arc::new(MemoryContentStore::default());
        content_store.seed("sweetRecipes.json", "not an array");
        let store = RemoteCollectionStore::new(content_store);

        let err = store.read(Collection::Sweet).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Malformed {
                collection: Collection::Sweet,
                ..
            }
        ));
    }
}
