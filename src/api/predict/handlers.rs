use crate::api::models::*;
use crate::classifier::Prediction;
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::info;

pub async fn predict_handler(
    State(state): State<AppState>,
    request: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Prediction>, AppError> {
    let classifier = state
        .classifier
        .as_ref()
        .ok_or_else(|| AppError::Internal("伺服器初始化失敗，模型未載入。".to_string()))?;

    let Json(request) =
        request.map_err(|e| AppError::BadRequest(format!("請求格式錯誤：{}", e.body_text())))?;

    let encoded = request
        .image
        .ok_or_else(|| AppError::BadRequest("請求格式錯誤，未包含 'image' 欄位".to_string()))?;

    // Browsers send data URLs; keep only the payload.
    let payload = encoded
        .split_once(";base64,")
        .map(|(_, data)| data)
        .unwrap_or(&encoded);
    let image = STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::BadRequest(format!("圖片解碼失敗：{e}")))?;

    let prediction = classifier
        .classify(&image)
        .await
        .map_err(|e| AppError::Internal(format!("預測失敗：{e}")))?;

    info!(label = %prediction.label, confidence = prediction.confidence, "Prediction served");
    Ok(Json(prediction))
}
