//! In-memory catalog for tests and database-less local runs.

use super::{CatalogError, Recipe, Vegetable, VegetableCatalog, VegetableRef};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    vegetables: Vec<Vegetable>,
    recipes: HashMap<i32, Vec<Recipe>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vegetable(mut self, vegetable: Vegetable) -> Self {
        self.vegetables.push(vegetable);
        self.vegetables.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }

    pub fn with_recipe(mut self, vege_id: i32, recipe: Recipe) -> Self {
        let recipes = self.recipes.entry(vege_id).or_default();
        recipes.push(recipe);
        recipes.sort_by_key(|r| r.id);
        self
    }
}

#[async_trait]
impl VegetableCatalog for MemoryCatalog {
    async fn vegetables(&self) -> Result<Vec<VegetableRef>, CatalogError> {
        Ok(self
            .vegetables
            .iter()
            .map(|v| VegetableRef {
                id: v.id,
                name: v.name.clone(),
            })
            .collect())
    }

    async fn vegetable(&self, id: i32) -> Result<Option<VegetableRef>, CatalogError> {
        Ok(self
            .vegetables
            .iter()
            .find(|v| v.id == id)
            .map(|v| VegetableRef {
                id: v.id,
                name: v.name.clone(),
            }))
    }

    async fn profiles(&self) -> Result<Vec<Vegetable>, CatalogError> {
        Ok(self.vegetables.clone())
    }

    async fn recipes(&self, vege_id: i32, limit: usize) -> Result<Vec<Recipe>, CatalogError> {
        Ok(self
            .recipes
            .get(&vege_id)
            .map(|r| r.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn recipe_steps(&self, vege_id: i32) -> Result<Vec<Recipe>, CatalogError> {
        Ok(self
            .recipes
            .get(&vege_id)
            .map(|r| r.iter().filter(|r| !r.steps.is_empty()).cloned().collect())
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}
