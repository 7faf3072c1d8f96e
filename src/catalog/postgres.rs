//! PostgreSQL catalog.
//!
//! Queries are plain `sqlx::query` strings so the crate builds without a
//! live database. Table layout lives in `schema.sql`.

use super::{CatalogError, Recipe, RecipeStep, Vegetable, VegetableCatalog, VegetableRef};
use crate::nutrients::{Nutrient, NutrientProfile};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::sync::LazyLock;
use tracing::debug;

/// Kept low: every request is a handful of short reads.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

static PROFILES_SQL: LazyLock<String> = LazyLock::new(|| {
    let columns = Nutrient::ALL
        .iter()
        .map(|n| format!("n.{}", n.key()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"
        SELECT
            v.id,
            v.vege_name,
            COALESCE(
                (SELECT array_agg(a.alias ORDER BY a.alias) FROM vege_alias a WHERE a.vege_id = v.id),
                ARRAY[]::text[]
            ) AS aliases,
            {columns}
        FROM basic_vege v
        LEFT JOIN vege_nutrition n ON n.vege_id = v.id
        ORDER BY v.vege_name
        "#
    )
});

#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a lazily-connecting pool: the server starts even while the
    /// database is down and requests fail individually instead.
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self, CatalogError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(database_url)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl VegetableCatalog for PgCatalog {
    async fn vegetables(&self) -> Result<Vec<VegetableRef>, CatalogError> {
        let rows = sqlx::query("SELECT id, vege_name FROM basic_vege ORDER BY vege_name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(vegetable_ref).collect()
    }

    async fn vegetable(&self, id: i32) -> Result<Option<VegetableRef>, CatalogError> {
        let row = sqlx::query("SELECT id, vege_name FROM basic_vege WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(vegetable_ref).transpose()
    }

    async fn profiles(&self) -> Result<Vec<Vegetable>, CatalogError> {
        let rows = sqlx::query(PROFILES_SQL.as_str())
            .fetch_all(&self.pool)
            .await?;

        let mut vegetables = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut nutrients = NutrientProfile::new();
            for nutrient in Nutrient::ALL {
                nutrients.set(nutrient, row.try_get(nutrient.key())?);
            }

            vegetables.push(Vegetable {
                id: row.try_get("id")?,
                name: row.try_get("vege_name")?,
                aliases: row.try_get("aliases")?,
                nutrients,
            });
        }

        debug!(count = vegetables.len(), "Loaded vegetable profiles");
        Ok(vegetables)
    }

    async fn recipes(&self, vege_id: i32, limit: usize) -> Result<Vec<Recipe>, CatalogError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"
            WITH picked AS (
                SELECT id, recipe
                FROM main_recipe
                WHERE vege_id = $1
                ORDER BY id
                LIMIT $2
            )
            SELECT p.id, p.recipe, rs.step_no, rs.description
            FROM picked p
            LEFT JOIN recipe_steps rs ON rs.recipe_id = p.id
            ORDER BY p.id, rs.step_no
            "#,
        )
        .bind(vege_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_recipe_rows(recipe_rows(&rows)?))
    }

    async fn recipe_steps(&self, vege_id: i32) -> Result<Vec<Recipe>, CatalogError> {
        let rows = sqlx::query(
            r#"
            SELECT mr.id, mr.recipe, rs.step_no, rs.description
            FROM main_recipe mr
            JOIN recipe_steps rs ON rs.recipe_id = mr.id
            WHERE mr.vege_id = $1
            ORDER BY mr.id, rs.step_no
            "#,
        )
        .bind(vege_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_recipe_rows(recipe_rows(&rows)?))
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn vegetable_ref(row: &PgRow) -> Result<VegetableRef, CatalogError> {
    Ok(VegetableRef {
        id: row.try_get("id")?,
        name: row.try_get("vege_name")?,
    })
}

fn recipe_rows(rows: &[PgRow]) -> Result<Vec<RecipeRow>, CatalogError> {
    let rows = rows
        .iter()
        .map(|row| -> Result<RecipeRow, sqlx::Error> {
            Ok(RecipeRow {
                recipe_id: row.try_get("id")?,
                title: row.try_get("recipe")?,
                step_no: row.try_get("step_no")?,
                description: row.try_get("description")?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// One row of the recipe/step join. Step columns are null for recipes that
/// have no steps yet.
#[derive(Debug, Clone)]
pub(crate) struct RecipeRow {
    pub recipe_id: i32,
    pub title: String,
    pub step_no: Option<i32>,
    pub description: Option<String>,
}

/// Fold join rows (ordered by recipe id, step number) into recipes.
pub(crate) fn group_recipe_rows(rows: Vec<RecipeRow>) -> Vec<Recipe> {
    let mut recipes: Vec<Recipe> = Vec::new();

    for row in rows {
        let starts_new = recipes.last().is_none_or(|r| r.id != row.recipe_id);
        if starts_new {
            recipes.push(Recipe {
                id: row.recipe_id,
                title: row.title,
                steps: Vec::new(),
            });
        }

        if let (Some(step_no), Some(description), Some(recipe)) =
            (row.step_no, row.description, recipes.last_mut())
        {
            recipe.steps.push(RecipeStep {
                step_no,
                description,
            });
        }
    }

    recipes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i32, step: Option<i32>, text: Option<&str>) -> RecipeRow {
        RecipeRow {
            recipe_id: id,
            title: format!("recipe-{id}"),
            step_no: step,
            description: text.map(str::to_string),
        }
    }

    #[test]
    fn groups_consecutive_rows_by_recipe() {
        let recipes = group_recipe_rows(vec![
            row(1, Some(1), Some("a")),
            row(1, Some(2), Some("b")),
            row(2, Some(1), Some("c")),
        ]);

        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].steps.len(), 2);
        assert_eq!(recipes[0].steps[1].description, "b");
        assert_eq!(recipes[1].title, "recipe-2");
    }

    #[test]
    fn keeps_recipes_without_steps() {
        let recipes = group_recipe_rows(vec![row(7, None, None)]);
        assert_eq!(recipes.len(), 1);
        assert!(recipes[0].steps.is_empty());
    }

    #[test]
    fn profile_query_selects_every_nutrient() {
        for nutrient in Nutrient::ALL {
            assert!(PROFILES_SQL.contains(&format!("n.{}", nutrient.key())));
        }
    }

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn lists_vegetables_from_database() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let catalog = PgCatalog::connect_lazy(&url, 2).expect("pool creation failed");

        catalog.ping().await.expect("ping failed");
        let vegetables = catalog.vegetables().await.expect("query failed");
        let profiles = catalog.profiles().await.expect("query failed");
        assert_eq!(vegetables.len(), profiles.len());
    }
}
