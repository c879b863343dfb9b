pub mod add_recipe;
pub mod collection_store;
pub mod config;
pub mod content_store;
pub mod recipe_catalog;
pub mod recipe_repository;
pub mod recipe_router;
