use crate::api::media::handlers::{csv_handler, image_handler};
use crate::api::models::AppState;
use axum::{Router, routing::get};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/image/{filename}", get(image_handler))
        .route("/api/csv/{filename}", get(csv_handler))
}
