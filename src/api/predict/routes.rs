use crate::api::models::AppState;
use crate::api::predict::handlers::predict_handler;
use axum::{Router, routing::post};

pub fn routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict_handler))
}
