pub mod media;
pub mod models;
pub mod predict;
pub mod vegetables;
pub mod webhook;

// Re-exports
pub use models::*;

use axum::{Json, Router, extract::State, routing::get};
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::warn;

// Health handler (simple, keep here)
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, database) = match state.catalog.ping().await {
        Ok(()) => ("healthy", "ok"),
        Err(e) => {
            warn!(error = %e, "Database unreachable");
            ("degraded", "unreachable")
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}

/// Full HTTP surface: JSON API, webhook, and the frontend out of `static_dir`.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    let index = ServeFile::new(static_dir.join("index.html"));

    Router::new()
        .route("/health", get(health_handler))
        .merge(vegetables::routes())
        .merge(media::routes())
        .merge(predict::routes())
        .merge(webhook::routes())
        .route_service("/", index.clone())
        .route_service("/search/{veg_id}", index)
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::replies::Links;
    use crate::bot::{Bot, BotSettings};
    use crate::catalog::{MemoryCatalog, Recipe, RecipeStep, Vegetable};
    use crate::classifier::{Classifier, ClassifierError, Prediction};
    use crate::line::{LineError, Message, Messenger};
    use crate::line::signature::sign;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    const SECRET: &str = "channel-secret";

    #[derive(Default)]
    struct RecordingMessenger {
        replies: Mutex<Vec<(String, Vec<Message>)>>,
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> Result<(), LineError> {
            self.replies.lock().unwrap().push((reply_token.to_string(), messages));
            Ok(())
        }

        async fn content(&self, _message_id: &str) -> Result<Vec<u8>, LineError> {
            Ok(Vec::new())
        }
    }

    struct EchoLength;

    #[async_trait]
    impl Classifier for EchoLength {
        async fn classify(&self, image: &[u8]) -> Result<Prediction, ClassifierError> {
            Ok(Prediction::new(format!("{} bytes", image.len()), 0.75))
        }
    }

    fn links() -> Links {
        Links {
            web_url: "https://veg.example".into(),
            image_base: "https://files.example".into(),
            bucket: "veg-data-bucket".into(),
        }
    }

    fn state(messenger: Arc<RecordingMessenger>, classifier: Option<Arc<dyn Classifier>>) -> AppState {
        let catalog = Arc::new(
            MemoryCatalog::new()
                .with_vegetable(Vegetable::new(4, "山藥"))
                .with_vegetable(Vegetable::new(6, "秋葵"))
                .with_recipe(
                    6,
                    Recipe {
                        id: 31,
                        title: "空食譜".into(),
                        steps: Vec::new(),
                    },
                )
                .with_recipe(
                    4,
                    Recipe {
                        id: 30,
                        title: "山藥排骨湯".into(),
                        steps: vec![
                            RecipeStep { step_no: 1, description: "排骨汆燙".into() },
                            RecipeStep { step_no: 2, description: "加入山藥燉煮".into() },
                        ],
                    },
                ),
        );
        let settings = BotSettings {
            links: links(),
            carousel_limit: 12,
            nutrient_top_n: 10,
            recipe_limit: 10,
            confident_threshold: 0.8,
            plausible_threshold: 0.5,
        };

        AppState {
            catalog: catalog.clone(),
            store: Arc::new(
                MemoryStore::new()
                    .with_object("images/山藥.jpg", vec![0xFF, 0xD8])
                    .with_object("vege.csv", "id,name\n4,山藥\n"),
            ),
            classifier,
            bot: Arc::new(Bot::new(catalog, messenger, settings)),
            channel_secret: Arc::from(SECRET),
            links: links(),
        }
    }

    fn app() -> Router {
        router(state(Arc::default(), None), Path::new("static"))
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_database() {
        let response = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "ok");
    }

    #[tokio::test]
    async fn lists_vegetables_with_display_fields() {
        let response = app().oneshot(get("/api/vegetables")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        let first = &body[0];
        assert_eq!(first["id"], 4);
        assert_eq!(first["name"], "山藥");
        assert_eq!(first["priceHistory"].as_array().unwrap().len(), 30);
        assert!(first.get("imageUrl").is_none());
    }

    #[tokio::test]
    async fn vegetable_detail_and_missing_id() {
        let response = app().oneshot(get("/api/vegetables/4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["imageUrl"], body["image"]);
        assert_eq!(body["description"], "新鮮山藥，營養豐富，是您餐桌上的最佳選擇。");

        let response = app().oneshot(get("/api/vegetables/999")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["message"], "找不到蔬菜");
    }

    #[tokio::test]
    async fn recipes_render_instructions() {
        let body = json(app().oneshot(get("/api/recipes/4")).await.unwrap()).await;
        assert_eq!(body[0]["title"], "山藥排骨湯");
        assert_eq!(body[0]["instructions"], "步驟1. 排骨汆燙\n步驟2. 加入山藥燉煮");
        assert!(body[0]["imageUrl"].as_str().unwrap().starts_with("https://dummyimage.com/"));

        let response = app().oneshot(get("/api/recipes/5")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["message"], "查無此蔬菜的食譜");
    }

    #[tokio::test]
    async fn recipes_without_steps_are_not_listed() {
        let response = app().oneshot(get("/api/recipes/6")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["message"], "查無此蔬菜的食譜");
    }

    #[tokio::test]
    async fn media_from_object_store() {
        let response = app()
            .oneshot(get("/api/image/%E5%B1%B1%E8%97%A5.jpg"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");

        let response = app().oneshot(get("/api/csv/vege.csv")).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");

        let response = app().oneshot(get("/api/image/none.jpg")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["message"], "Not found");
    }

    #[tokio::test]
    async fn predict_requires_model_and_image() {
        let response = app()
            .oneshot(post_json("/predict", serde_json::json!({"image": "AQID"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(response).await["message"], "伺服器初始化失敗，模型未載入。");

        let classifier: Arc<dyn Classifier> = Arc::new(EchoLength);
        let app = router(state(Arc::default(), Some(classifier)), Path::new("static"));

        let response = app
            .clone()
            .oneshot(post_json("/predict", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["message"], "請求格式錯誤，未包含 'image' 欄位");

        let response = app
            .oneshot(post_json(
                "/predict",
                serde_json::json!({"image": "data:image/jpeg;base64,AQID"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["label"], "3 bytes");
        assert_eq!(body["confidence"], 0.75);
    }

    #[tokio::test]
    async fn predict_rejections_use_error_shape() {
        let plain = || {
            Request::builder()
                .method("POST")
                .uri("/predict")
                .body(Body::from("not json"))
                .unwrap()
        };

        let response = app().oneshot(plain()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(response).await["message"], "伺服器初始化失敗，模型未載入。");

        let classifier: Arc<dyn Classifier> = Arc::new(EchoLength);
        let app = router(state(Arc::default(), Some(classifier)), Path::new("static"));

        let response = app.clone().oneshot(plain()).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["error"], "400 Bad Request");
        assert!(body["message"].as_str().unwrap().starts_with("請求格式錯誤"));

        let malformed = Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"image\": "))
            .unwrap();
        let response = app.oneshot(malformed).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json(response).await["message"].is_string());
    }

    #[tokio::test]
    async fn callback_checks_signature() {
        let body = r#"{"destination":"U","events":[]}"#;

        let missing = Request::builder()
            .method("POST")
            .uri("/callback")
            .body(Body::from(body))
            .unwrap();
        assert_eq!(app().oneshot(missing).await.unwrap().status(), StatusCode::BAD_REQUEST);

        let forged = Request::builder()
            .method("POST")
            .uri("/callback")
            .header("x-line-signature", sign("other-secret", body.as_bytes()).unwrap())
            .body(Body::from(body))
            .unwrap();
        assert_eq!(app().oneshot(forged).await.unwrap().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn callback_replies_to_events() {
        let messenger = Arc::new(RecordingMessenger::default());
        let app = router(state(messenger.clone(), None), Path::new("static"));

        let body = r#"{"destination":"U","events":[
            {"type":"message","replyToken":"tok","message":{"id":"1","type":"text","text":"上傳圖片"}}
        ]}"#;
        let request = Request::builder()
            .method("POST")
            .uri("/callback")
            .header("x-line-signature", sign(SECRET, body.as_bytes()).unwrap())
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let text = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&text[..], b"OK");

        let replies = messenger.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, "tok");
    }

    #[tokio::test]
    async fn malformed_webhook_body_is_rejected() {
        let body = "not json";
        let request = Request::builder()
            .method("POST")
            .uri("/callback")
            .header("x-line-signature", sign(SECRET, body.as_bytes()).unwrap())
            .body(Body::from(body))
            .unwrap();
        assert_eq!(app().oneshot(request).await.unwrap().status(), StatusCode::BAD_REQUEST);
    }
}
