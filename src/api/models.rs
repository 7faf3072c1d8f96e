use crate::bot::Bot;
use crate::bot::replies::Links;
use crate::catalog::{CatalogError, VegetableCatalog};
use crate::classifier::Classifier;
use crate::storage::ObjectStore;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn VegetableCatalog>,
    pub store: Arc<dyn ObjectStore>,
    /// `None` when no model service is configured.
    pub classifier: Option<Arc<dyn Classifier>>,
    pub bot: Arc<Bot>,
    pub channel_secret: Arc<str>,
    pub links: Links,
}

/// Request to classify an uploaded photo
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Base64 image; optional so a missing field gets our own message.
    #[serde(default)]
    pub image: Option<String>,
}

/// One recipe on the web frontend
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeItem {
    pub id: i32,
    pub title: String,
    pub instructions: String,
    pub image_url: String,
}

/// Body returned instead of a list when nothing was found
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        AppError::Internal(format!("Catalog query failed: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                error!(message = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorResponse {
            error: status.to_string(),
            message,
        }))
        .into_response()
    }
}
