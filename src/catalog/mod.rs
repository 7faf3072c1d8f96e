//! Vegetable and recipe data source.
//!
//! The bot and the web API only talk to [`VegetableCatalog`]; production
//! uses [`PgCatalog`], tests and local runs use [`MemoryCatalog`].

pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::MemoryCatalog;
pub use models::{Recipe, RecipeStep, Vegetable, VegetableRef};
pub use postgres::PgCatalog;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait VegetableCatalog: Send + Sync {
    /// All vegetables ordered by name.
    async fn vegetables(&self) -> Result<Vec<VegetableRef>, CatalogError>;

    async fn vegetable(&self, id: i32) -> Result<Option<VegetableRef>, CatalogError>;

    /// Every vegetable with aliases and nutrient data, ordered by name.
    async fn profiles(&self) -> Result<Vec<Vegetable>, CatalogError>;

    /// Up to `limit` recipes of a vegetable, ordered by recipe id.
    async fn recipes(&self, vege_id: i32, limit: usize) -> Result<Vec<Recipe>, CatalogError>;

    /// Every recipe of a vegetable that has at least one step, ordered by
    /// recipe id then step number.
    async fn recipe_steps(&self, vege_id: i32) -> Result<Vec<Recipe>, CatalogError>;

    /// Connectivity check for the health endpoint.
    async fn ping(&self) -> Result<(), CatalogError>;
}
