use crate::api::models::AppState;
use crate::api::webhook::handlers::callback_handler;
use axum::{Router, routing::post};

pub fn routes() -> Router<AppState> {
    Router::new().route("/callback", post(callback_handler))
}
