use crate::api::models::*;
use crate::storage::image_key;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tracing::warn;

async fn fetch(state: &AppState, key: &str) -> Result<Vec<u8>, AppError> {
    state.store.get(key).await.map_err(|e| {
        warn!(key, error = %e, "Object fetch failed");
        AppError::NotFound("Not found".to_string())
    })
}

pub async fn image_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let body = fetch(&state, &image_key(&filename)).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], body))
}

pub async fn csv_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let body = fetch(&state, &filename).await?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], body))
}
