//! Reply assembly: fixed prompts, classification verdicts and the
//! vegetable/recipe carousels.

use crate::catalog::{Recipe, Vegetable};
use crate::classifier::Prediction;
use crate::line::message::{
    Action, Bubble, Component, FlexBox, FlexButton, FlexImage, FlexMessage, FlexText, Message,
    QuickReply, QuickReplyItem, TextMessage,
};
use crate::nutrients::{Nutrient, format_value};
use crate::storage::public_image_url;

/// Nutrients listed on every vegetable card, in canonical order.
pub const CARD_NUTRIENTS: usize = 5;

pub const NO_MATCH: &str = "沒有找到符合條件的營養成分或蔬菜。請檢查您的輸入。";
pub const EMPTY_CAROUSEL: &str = "沒有找到符合條件的蔬菜。";
pub const NO_DETAILS: &str = "未能找到該蔬菜的詳細資訊。";
pub const NO_RECIPES: &str = "找不到相關食譜喔！";
pub const BAD_RECIPE_QUERY: &str = "食譜查詢參數錯誤。";

const SUBTLE: &str = "#aaaaaa";
const BODY: &str = "#555555";

/// URLs the cards link to.
#[derive(Debug, Clone)]
pub struct Links {
    pub web_url: String,
    pub image_base: String,
    pub bucket: String,
}

impl Links {
    pub fn vegetable_image(&self, name: &str) -> String {
        public_image_url(&self.image_base, &self.bucket, name)
    }

    pub fn vegetable_page(&self, id: i32) -> String {
        format!("{}/?section=detail&id={id}", self.web_url.trim_end_matches('/'))
    }

    pub fn recipe_page(&self, id: i32) -> String {
        format!("{}/?section=recipe&id={id}", self.web_url.trim_end_matches('/'))
    }
}

/// Placeholder picture with the recipe title written on it.
pub fn recipe_image(title: &str) -> String {
    format!(
        "https://dummyimage.com/600x400/80c96a/fff&text={}",
        urlencoding::encode(title)
    )
}

pub fn photo_prompt() -> Message {
    Message::Text(TextMessage {
        text: "請選擇拍照或從相簿選擇圖片(請盡量讓背景單純)：".to_string(),
        quick_reply: Some(QuickReply {
            items: vec![
                QuickReplyItem {
                    action: Action::Camera {
                        label: "開啟相機".to_string(),
                    },
                },
                QuickReplyItem {
                    action: Action::CameraRoll {
                        label: "從相簿選擇".to_string(),
                    },
                },
            ],
        }),
    })
}

pub fn nutrient_prompt() -> Message {
    Message::text(
        "請輸入您想查詢的營養成分，例如：蛋白質、維生素C、鐵質\n您也可以輸入蔬菜名稱或別名，例如：高麗菜、大白菜",
    )
}

pub fn ingredient_prompt() -> Message {
    Message::text("請輸入您現有的食材名稱，例如：空心菜、山藥\n我會幫您找出相關的蔬菜資訊與食譜")
}

/// Verdict line for a classification, phrased by how sure the model is.
pub fn verdict(prediction: &Prediction, confident: f64, plausible: f64) -> String {
    let label = &prediction.label;
    let confidence = prediction.confidence;

    let mut text = if confidence >= 1.0 {
        format!("真相只有一個 就是\"{label}\"!!")
    } else if confidence >= confident {
        format!("哼哼 根據我的判斷 它就是\"{label}\"!!")
    } else if confidence >= plausible {
        format!("可能是\"{label}\"   也許讓我再看更清楚的一張")
    } else {
        "歐內該  請提供更清晰的".to_string()
    };

    if confidence >= plausible {
        text.push_str(&format!("\n我有{:.0}%的信心", confidence * 100.0));
    }
    text
}

/// One vegetable card's content; `highlight` is the nutrient the user asked
/// about, shown under the name.
#[derive(Debug, Clone, Copy)]
pub struct VegetableCard<'a> {
    pub vegetable: &'a Vegetable,
    pub highlight: Option<(Nutrient, f64)>,
}

impl<'a> VegetableCard<'a> {
    pub fn plain(vegetable: &'a Vegetable) -> Self {
        Self {
            vegetable,
            highlight: None,
        }
    }
}

fn aliases_line(vegetable: &Vegetable) -> String {
    let aliases: Vec<&str> = vegetable
        .aliases
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();

    if aliases.is_empty() {
        "無別名".to_string()
    } else {
        format!("別名：{}", aliases.join(", "))
    }
}

fn nutrient_block(vegetable: &Vegetable) -> String {
    let lines: Vec<String> = vegetable
        .nutrients
        .iter()
        .take(CARD_NUTRIENTS)
        .map(|(nutrient, value)| {
            format!(
                "{}：{}{}",
                nutrient.display_name(),
                format_value(value),
                nutrient.unit()
            )
        })
        .collect();

    format!("營養資訊(每100 克可食部分)：\n{}", lines.join("\n"))
}

fn vegetable_bubble(card: &VegetableCard<'_>, links: &Links) -> Bubble {
    let vegetable = card.vegetable;

    let mut body: Vec<Component> = vec![
        FlexText::new(vegetable.name.as_str()).bold().size("xl").into(),
        FlexText::new(aliases_line(vegetable))
            .size("sm")
            .color(SUBTLE)
            .wrap()
            .margin("sm")
            .into(),
        FlexText::new(nutrient_block(vegetable))
            .size("sm")
            .color(BODY)
            .wrap()
            .margin("md")
            .into(),
    ];

    if let Some((nutrient, value)) = card.highlight {
        body.insert(
            1,
            FlexText::new(format!(
                "查詢成分：{} {}{}",
                nutrient.display_name(),
                format_value(Some(value)),
                nutrient.unit()
            ))
            .size("md")
            .margin("md")
            .into(),
        );
    }

    let footer = FlexBox::vertical(vec![
        FlexButton::link(Action::Postback {
            label: "查看相關食譜".to_string(),
            data: format!("action=get_recipes&veg_id={}", vegetable.id),
            display_text: Some("為您查詢相關食譜...".to_string()),
        })
        .into(),
        FlexButton::link(Action::Uri {
            label: "前往網站看得更詳細".to_string(),
            uri: links.vegetable_page(vegetable.id),
        })
        .into(),
    ])
    .spacing("sm");

    Bubble {
        direction: "ltr",
        hero: Some(FlexImage::hero(links.vegetable_image(&vegetable.name))),
        body: Some(FlexBox::vertical(body)),
        footer: Some(footer),
    }
}

/// Carousel of vegetable cards, or a plain apology when there is nothing
/// to show.
pub fn vegetable_carousel(cards: &[VegetableCard<'_>], alt_text: &str, links: &Links) -> Message {
    if cards.is_empty() {
        return Message::text(EMPTY_CAROUSEL);
    }

    let bubbles = cards.iter().map(|card| vegetable_bubble(card, links)).collect();
    Message::Flex(FlexMessage::carousel(alt_text, bubbles))
}

fn recipe_bubble(recipe: &Recipe, links: &Links) -> Bubble {
    let steps = recipe
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step.description))
        .collect::<Vec<_>>()
        .join("\n");

    let mut body: Vec<Component> = vec![FlexText::new(recipe.title.as_str()).bold().size("xl").wrap().into()];
    // Flex rejects empty text components.
    if !recipe.summary().is_empty() {
        body.push(
            FlexText::new(recipe.summary())
                .size("sm")
                .color(SUBTLE)
                .wrap()
                .margin("sm")
                .into(),
        );
    }
    body.push(
        FlexText::new(format!("步驟：\n{steps}"))
            .size("sm")
            .color(BODY)
            .wrap()
            .margin("md")
            .into(),
    );

    Bubble {
        direction: "ltr",
        hero: Some(FlexImage::hero(recipe_image(&recipe.title))),
        body: Some(FlexBox::vertical(body)),
        footer: Some(
            FlexBox::vertical(vec![
                FlexButton::link(Action::Uri {
                    label: "前往網站看得更詳細".to_string(),
                    uri: links.recipe_page(recipe.id),
                })
                .into(),
            ])
            .spacing("sm"),
        ),
    }
}

pub fn recipe_carousel(recipes: &[Recipe], links: &Links) -> Message {
    if recipes.is_empty() {
        return Message::text(NO_RECIPES);
    }

    let bubbles = recipes.iter().map(|r| recipe_bubble(r, links)).collect();
    Message::Flex(FlexMessage::carousel("相關食譜", bubbles))
}
