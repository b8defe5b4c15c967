pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod grocery;
pub mod logging;
pub mod selection;
pub mod storage;

pub use domain::recipe::{Category, Ingredient, Recipe, RecipesFile};
pub use error::PlannerError;
pub use grocery::{GroceryItem, GroceryList, aggregate, capitalize_first, format_quantity};
pub use selection::{CatalogStatus, INITIAL_COUNT, SelectionStore};
