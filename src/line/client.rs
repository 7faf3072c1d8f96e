//! Messaging API client.

use super::message::{MAX_REPLY_MESSAGES, Message, ReplyMessageRequest};
use super::rich_menu::RichMenuRequest;
use super::{LineError, Messenger};
use crate::config::LineConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct LineClient {
    http: Client,
    access_token: String,
    api_base: String,
    data_api_base: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RichMenuIdResponse {
    rich_menu_id: String,
}

#[derive(Debug, Deserialize)]
struct RichMenuListResponse {
    richmenus: Vec<RichMenuIdResponse>,
}

impl LineClient {
    pub fn new(config: &LineConfig) -> Result<Self, LineError> {
        Self::with_timeout(config, Duration::from_secs(config.timeout_secs))
    }

    /// Every request, content downloads included, gives up after `timeout`.
    pub fn with_timeout(config: &LineConfig, timeout: Duration) -> Result<Self, LineError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: &LineConfig) -> Self {
        Self {
            http,
            access_token: config.channel_access_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            data_api_base: config.data_api_base.trim_end_matches('/').to_string(),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    fn data_api(&self, path: &str) -> String {
        format!("{}{path}", self.data_api_base)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, LineError> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(LineError::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// Reply to an event. Messages past the per-reply maximum are dropped.
    pub async fn reply_message(&self, reply_token: &str, messages: &[Message]) -> Result<(), LineError> {
        let messages = if messages.len() > MAX_REPLY_MESSAGES {
            warn!(count = messages.len(), "Too many reply messages, truncating");
            &messages[..MAX_REPLY_MESSAGES]
        } else {
            messages
        };

        let body = ReplyMessageRequest {
            reply_token,
            messages,
        };
        self.send(self.http.post(self.api("/v2/bot/message/reply")).json(&body))
            .await?;

        debug!(count = messages.len(), "Reply sent");
        Ok(())
    }

    /// Binary content (photo) the user sent.
    pub async fn message_content(&self, message_id: &str) -> Result<Vec<u8>, LineError> {
        let url = self.data_api(&format!("/v2/bot/message/{message_id}/content"));
        let response = self.send(self.http.get(url)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn list_rich_menus(&self) -> Result<Vec<String>, LineError> {
        let response = self
            .send(self.http.get(self.api("/v2/bot/richmenu/list")))
            .await?;
        let list: RichMenuListResponse = response.json().await?;
        Ok(list.richmenus.into_iter().map(|m| m.rich_menu_id).collect())
    }

    pub async fn delete_rich_menu(&self, rich_menu_id: &str) -> Result<(), LineError> {
        self.send(
            self.http
                .delete(self.api(&format!("/v2/bot/richmenu/{rich_menu_id}"))),
        )
        .await?;
        Ok(())
    }

    pub async fn create_rich_menu(&self, menu: &RichMenuRequest) -> Result<String, LineError> {
        let response = self
            .send(self.http.post(self.api("/v2/bot/richmenu")).json(menu))
            .await?;
        let created: RichMenuIdResponse = response.json().await?;
        Ok(created.rich_menu_id)
    }

    pub async fn upload_rich_menu_image(
        &self,
        rich_menu_id: &str,
        image: Vec<u8>,
        content_type: &str,
    ) -> Result<(), LineError> {
        let url = self.data_api(&format!("/v2/bot/richmenu/{rich_menu_id}/content"));
        self.send(
            self.http
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(image),
        )
        .await?;
        Ok(())
    }

    pub async fn set_default_rich_menu(&self, rich_menu_id: &str) -> Result<(), LineError> {
        self.send(
            self.http
                .post(self.api(&format!("/v2/bot/user/all/richmenu/{rich_menu_id}"))),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for LineClient {
    async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> Result<(), LineError> {
        self.reply_message(reply_token, &messages).await
    }

    async fn content(&self, message_id: &str) -> Result<Vec<u8>, LineError> {
        self.message_content(message_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> LineConfig {
        LineConfig {
            channel_secret: "secret".into(),
            channel_access_token: "token".into(),
            api_base: server.uri(),
            data_api_base: format!("{}/", server.uri()),
            ..LineConfig::default()
        }
    }

    fn client(server: &MockServer) -> LineClient {
        LineClient::new(&config(server)).unwrap()
    }

    #[tokio::test]
    async fn slow_api_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/reply"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{}")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = LineClient::with_timeout(&config(&server), Duration::from_millis(200)).unwrap();
        let err = client.reply("r1", vec![Message::text("hi")]).await.unwrap_err();
        assert!(matches!(err, LineError::Http(ref e) if e.is_timeout()));
    }

    #[test]
    fn default_timeout_is_bounded() {
        assert_eq!(LineConfig::default().timeout_secs, 10);
    }

    #[tokio::test]
    async fn reply_posts_token_and_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/reply"))
            .and(header("authorization", "Bearer token"))
            .and(body_partial_json(serde_json::json!({
                "replyToken": "r1",
                "messages": [{"type": "text", "text": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .reply("r1", vec![Message::text("hi")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reply_caps_message_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/reply"))
            .respond_with(|req: &wiremock::Request| {
                let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
                let count = body["messages"].as_array().map(Vec::len).unwrap_or(0);
                ResponseTemplate::new(if count == MAX_REPLY_MESSAGES { 200 } else { 400 })
            })
            .mount(&server)
            .await;

        let messages = (0..7).map(|i| Message::text(i.to_string())).collect();
        client(&server).reply("r", messages).await.unwrap();
    }

    #[tokio::test]
    async fn api_errors_carry_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/reply"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Invalid reply token"))
            .mount(&server)
            .await;

        let err = client(&server)
            .reply("expired", vec![Message::text("x")])
            .await
            .unwrap_err();
        match err {
            LineError::Api { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("Invalid reply token"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn downloads_message_content_from_data_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/bot/message/m1/content"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xd8, 0xff]))
            .mount(&server)
            .await;

        let bytes = client(&server).content("m1").await.unwrap();
        assert_eq!(bytes, vec![0xff, 0xd8, 0xff]);
    }

    #[tokio::test]
    async fn rich_menu_round_trip_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/bot/richmenu/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "richmenus": [{"richMenuId": "old-1", "name": "x"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/richmenu"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"richMenuId": "new-1"})),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(client.list_rich_menus().await.unwrap(), vec!["old-1"]);
        let id = client
            .create_rich_menu(&RichMenuRequest::main_menu())
            .await
            .unwrap();
        assert_eq!(id, "new-1");
    }
}
