//! LINE Messaging API adapter: webhook payloads, signature check, outbound
//! messages and the HTTP client.

pub mod client;
pub mod message;
pub mod rich_menu;
pub mod signature;
pub mod webhook;

pub use client::LineClient;
pub use message::Message;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Messaging API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// What the bot needs from the messaging platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> Result<(), LineError>;

    /// Bytes of a user-sent image.
    async fn content(&self, message_id: &str) -> Result<Vec<u8>, LineError>;
}
