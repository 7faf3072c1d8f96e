//! Inbound webhook payload.
//!
//! Unknown event and message kinds deserialize to catch-all variants so a
//! new platform feature never fails the whole delivery.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    Message(MessageEvent),
    Postback(PostbackEvent),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<Source>,
    pub message: MessageContent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text { id: String, text: String },
    Image { id: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostbackEvent {
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<Source>,
    pub postback: Postback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postback {
    pub data: String,
}

impl Event {
    pub fn reply_token(&self) -> Option<&str> {
        match self {
            Event::Message(e) => e.reply_token.as_deref(),
            Event::Postback(e) => e.reply_token.as_deref(),
            Event::Unsupported => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::Message(_) => "message",
            Event::Postback(_) => "postback",
            Event::Unsupported => "unsupported",
        }
    }
}
