pub mod category;
pub mod collection;
pub mod recipe;
