use crate::api::models::*;
use crate::bot::replies::recipe_image;
use crate::market::{self, VegetableListing};
use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::info;

pub async fn list_vegetables_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<VegetableListing>>, AppError> {
    let vegetables = state.catalog.vegetables().await?;

    let mut rng = rand::thread_rng();
    let listings = vegetables
        .iter()
        .map(|v| {
            let image = state.links.vegetable_image(&v.name);
            market::listing(&mut rng, v, image, false)
        })
        .collect::<Vec<_>>();

    info!(count = listings.len(), "Listed vegetables");
    Ok(Json(listings))
}

pub async fn get_vegetable_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<VegetableListing>, AppError> {
    let vegetable = state
        .catalog
        .vegetable(id)
        .await?
        .ok_or_else(|| AppError::NotFound("找不到蔬菜".to_string()))?;

    let image = state.links.vegetable_image(&vegetable.name);
    let listing = market::listing(&mut rand::thread_rng(), &vegetable, image, true);
    Ok(Json(listing))
}

pub async fn list_recipes_handler(
    State(state): State<AppState>,
    Path(veg_id): Path<i32>,
) -> Result<Response, AppError> {
    let recipes = state.catalog.recipe_steps(veg_id).await?;
    info!(veg_id, found = recipes.len(), "Recipe lookup");

    if recipes.is_empty() {
        return Ok(Json(MessageResponse {
            message: "查無此蔬菜的食譜".to_string(),
        })
        .into_response());
    }

    let items: Vec<RecipeItem> = recipes
        .iter()
        .map(|r| RecipeItem {
            id: r.id,
            title: r.title.clone(),
            instructions: r.instructions(),
            image_url: recipe_image(&r.title),
        })
        .collect();

    Ok(Json(items).into_response())
}
