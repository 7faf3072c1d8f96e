use crate::api::models::AppState;
use crate::api::vegetables::handlers::{get_vegetable_handler, list_recipes_handler, list_vegetables_handler};
use axum::{Router, routing::get};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/vegetables", get(list_vegetables_handler))
        .route("/api/vegetables/{id}", get(get_vegetable_handler))
        .route("/api/recipes/{veg_id}", get(list_recipes_handler))
}
