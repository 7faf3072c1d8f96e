//! Rich menu layout and provisioning.
//!
//! The menu is a 2500x843 strip split into three tap areas, each sending a
//! fixed text the bot recognizes.

use super::client::LineClient;
use super::message::Action;
use super::LineError;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

pub const UPLOAD_PHOTO: &str = "上傳圖片";
pub const ASK_NUTRIENT: &str = "輸入營養成分";
pub const ASK_INGREDIENT: &str = "輸入現有食材";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RichMenuRequest {
    pub size: Size,
    pub selected: bool,
    pub name: String,
    pub chat_bar_text: String,
    pub areas: Vec<Area>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Area {
    pub bounds: Bounds,
    pub action: Action,
}

impl RichMenuRequest {
    pub fn main_menu() -> Self {
        let area = |x: u32, width: u32, text: &str| Area {
            bounds: Bounds {
                x,
                y: 0,
                width,
                height: 843,
            },
            action: Action::Message {
                label: text.to_string(),
                text: text.to_string(),
            },
        };

        Self {
            size: Size {
                width: 2500,
                height: 843,
            },
            selected: true,
            name: "Main_Menu".to_string(),
            chat_bar_text: "選單".to_string(),
            areas: vec![
                area(0, 833, UPLOAD_PHOTO),
                area(833, 833, ASK_NUTRIENT),
                area(1666, 834, ASK_INGREDIENT),
            ],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("unsupported rich menu image format: {0}")]
    UnsupportedImage(String),

    #[error("failed to read rich menu image {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Line(#[from] LineError),
}

/// Content type accepted for a rich menu image, from its extension.
pub fn image_content_type(path: &Path) -> Result<&'static str, ProvisionError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        _ => Err(ProvisionError::UnsupportedImage(path.display().to_string())),
    }
}

/// Replace every existing rich menu with the main menu and make it the
/// default. Returns the new menu id.
pub async fn provision(client: &LineClient, image_path: &Path) -> Result<String, ProvisionError> {
    let content_type = image_content_type(image_path)?;
    let image = tokio::fs::read(image_path)
        .await
        .map_err(|source| ProvisionError::Io {
            path: image_path.display().to_string(),
            source,
        })?;

    match client.list_rich_menus().await {
        Ok(existing) if existing.is_empty() => info!("No existing rich menus"),
        Ok(existing) => {
            for id in existing {
                match client.delete_rich_menu(&id).await {
                    Ok(()) => info!(rich_menu_id = %id, "Deleted rich menu"),
                    Err(e) => warn!(rich_menu_id = %id, error = %e, "Failed to delete rich menu"),
                }
            }
        }
        Err(e) => warn!(error = %e, "Failed to list existing rich menus"),
    }

    let id = client.create_rich_menu(&RichMenuRequest::main_menu()).await?;
    info!(rich_menu_id = %id, "Created rich menu");

    client.upload_rich_menu_image(&id, image, content_type).await?;
    info!("Uploaded rich menu image");

    client.set_default_rich_menu(&id).await?;
    info!("Set default rich menu");

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineConfig;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn main_menu_spans_full_width() {
        let menu = RichMenuRequest::main_menu();
        let covered: u32 = menu.areas.iter().map(|a| a.bounds.width).sum();
        assert_eq!(covered, menu.size.width);

        let json = serde_json::to_value(&menu).unwrap();
        assert_eq!(json["chatBarText"], "選單");
        assert_eq!(json["areas"][1]["action"]["text"], ASK_NUTRIENT);
        assert_eq!(json["areas"][2]["bounds"]["x"], 1666);
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(image_content_type(Path::new("menu.PNG")).unwrap(), "image/png");
        assert_eq!(image_content_type(Path::new("a/menu.jpeg")).unwrap(), "image/jpeg");
        assert!(matches!(
            image_content_type(Path::new("menu.gif")),
            Err(ProvisionError::UnsupportedImage(_))
        ));
    }

    #[tokio::test]
    async fn provisioning_replaces_existing_menus() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/bot/richmenu/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "richmenus": [{"richMenuId": "old-1"}, {"richMenuId": "old-2"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v2/bot/richmenu/old-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v2/bot/richmenu/old-2"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/richmenu"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"richMenuId": "new-1"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/richmenu/new-1/content"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/user/all/richmenu/new-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("menu.png");
        std::fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();

        let client = LineClient::new(&LineConfig {
            channel_secret: "s".into(),
            channel_access_token: "t".into(),
            api_base: server.uri(),
            data_api_base: server.uri(),
            ..LineConfig::default()
        })
        .unwrap();
        let id = provision(&client, &image).await.unwrap();
        assert_eq!(id, "new-1");
    }

    #[tokio::test]
    async fn rejects_unknown_image_before_calling_api() {
        let client = LineClient::new(&LineConfig::default()).unwrap();
        let err = provision(&client, Path::new("menu.bmp")).await.unwrap_err();
        assert!(matches!(err, ProvisionError::UnsupportedImage(_)));
    }
}
