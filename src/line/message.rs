//! Outbound message model in the Messaging API's JSON shape.
//!
//! Only the parts of the flex format the bot renders are modelled: a
//! carousel of bubbles with an image hero, a vertical body and a footer of
//! buttons.

use serde::Serialize;

/// Most bubbles a carousel may hold.
pub const MAX_BUBBLES: usize = 12;
/// Longest accepted `altText`, in characters.
pub const MAX_ALT_TEXT: usize = 400;
/// Most messages one reply may carry.
pub const MAX_REPLY_MESSAGES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text(TextMessage),
    Flex(FlexMessage),
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Message::Text(TextMessage {
            text: text.into(),
            quick_reply: None,
        })
    }

    /// Plain text body, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(t) => Some(&t.text),
            Message::Flex(_) => None,
        }
    }

    pub fn as_flex(&self) -> Option<&FlexMessage> {
        match self {
            Message::Flex(f) => Some(f),
            Message::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessage {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_reply: Option<QuickReply>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickReply {
    pub items: Vec<QuickReplyItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "action")]
pub struct QuickReplyItem {
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Uri {
        label: String,
        uri: String,
    },
    Postback {
        label: String,
        data: String,
        #[serde(rename = "displayText", skip_serializing_if = "Option::is_none")]
        display_text: Option<String>,
    },
    Message {
        label: String,
        text: String,
    },
    Camera {
        label: String,
    },
    CameraRoll {
        label: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexMessage {
    pub alt_text: String,
    pub contents: Carousel,
}

impl FlexMessage {
    /// Carousel message; alt text is cut to the platform limit and the
    /// carousel to [`MAX_BUBBLES`].
    pub fn carousel(alt_text: &str, mut bubbles: Vec<Bubble>) -> Self {
        bubbles.truncate(MAX_BUBBLES);
        Self {
            alt_text: alt_text.chars().take(MAX_ALT_TEXT).collect(),
            contents: Carousel { contents: bubbles },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "carousel")]
pub struct Carousel {
    pub contents: Vec<Bubble>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "bubble")]
pub struct Bubble {
    pub direction: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero: Option<FlexImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<FlexBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<FlexBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Component {
    Box(FlexBox),
    Text(FlexText),
    Image(FlexImage),
    Button(FlexButton),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "box")]
pub struct FlexBox {
    pub layout: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<&'static str>,
    pub contents: Vec<Component>,
}

impl FlexBox {
    pub fn vertical(contents: Vec<Component>) -> Self {
        Self {
            layout: "vertical",
            spacing: None,
            contents,
        }
    }

    pub fn spacing(mut self, spacing: &'static str) -> Self {
        self.spacing = Some(spacing);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "text")]
pub struct FlexText {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub wrap: bool,
}

impl FlexText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: None,
            weight: None,
            color: None,
            margin: None,
            wrap: false,
        }
    }

    pub fn size(mut self, size: &'static str) -> Self {
        self.size = Some(size);
        self
    }

    pub fn bold(mut self) -> Self {
        self.weight = Some("bold");
        self
    }

    pub fn color(mut self, color: &'static str) -> Self {
        self.color = Some(color);
        self
    }

    pub fn margin(mut self, margin: &'static str) -> Self {
        self.margin = Some(margin);
        self
    }

    pub fn wrap(mut self) -> Self {
        self.wrap = true;
        self
    }
}

impl From<FlexText> for Component {
    fn from(text: FlexText) -> Self {
        Component::Text(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "image", rename_all = "camelCase")]
pub struct FlexImage {
    pub url: String,
    pub size: &'static str,
    pub aspect_ratio: &'static str,
    pub aspect_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

impl FlexImage {
    /// Full-width 1.5:1 cover image that opens itself when tapped.
    pub fn hero(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            action: Some(Action::Uri {
                label: "查看圖片".to_string(),
                uri: url.clone(),
            }),
            url,
            size: "full",
            aspect_ratio: "1.5:1",
            aspect_mode: "cover",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "button")]
pub struct FlexButton {
    pub style: &'static str,
    pub height: &'static str,
    pub action: Action,
}

impl FlexButton {
    pub fn link(action: Action) -> Self {
        Self {
            style: "link",
            height: "sm",
            action,
        }
    }
}

impl From<FlexButton> for Component {
    fn from(button: FlexButton) -> Self {
        Component::Button(button)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyMessageRequest<'a> {
    pub reply_token: &'a str,
    pub messages: &'a [Message],
}
