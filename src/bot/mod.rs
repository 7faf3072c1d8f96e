//! Conversation dispatch: turns webhook events into replies.

pub mod replies;

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, VegetableCatalog};
use crate::classifier::{Classifier, ClassifierError};
use crate::config::AppConfig;
use crate::line::rich_menu::{ASK_INGREDIENT, ASK_NUTRIENT, UPLOAD_PHOTO};
use crate::line::webhook::{Event, MessageContent};
use crate::line::{LineError, Message, Messenger};
use crate::recommend::{Recommendation, Recommender};
use replies::{Links, VegetableCard};

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("reply failed: {0}")]
    Line(#[from] LineError),
}

/// Why an image could not be answered; shown to the user.
#[derive(Debug, thiserror::Error)]
enum ImageError {
    #[error("模型未載入")]
    NoClassifier,

    #[error(transparent)]
    Download(#[from] LineError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone)]
pub struct BotSettings {
    pub links: Links,
    pub carousel_limit: usize,
    pub nutrient_top_n: usize,
    pub recipe_limit: usize,
    pub confident_threshold: f64,
    pub plausible_threshold: f64,
}

impl BotSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            links: Links {
                web_url: config.server.web_url.clone(),
                image_base: config.storage.public_url.clone(),
                bucket: config.storage.bucket.clone(),
            },
            carousel_limit: config.bot.carousel_limit,
            nutrient_top_n: config.bot.nutrient_top_n,
            recipe_limit: config.bot.recipe_limit,
            confident_threshold: config.bot.confident_threshold,
            plausible_threshold: config.bot.plausible_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PostbackRequest {
    Recipes(i32),
    BadRecipes,
    Ignored,
}

fn parse_postback(data: &str) -> PostbackRequest {
    let fields: HashMap<String, String> = url::form_urlencoded::parse(data.as_bytes())
        .into_owned()
        .collect();

    match fields.get("action").map(String::as_str) {
        Some("get_recipes") => match fields.get("veg_id").and_then(|id| id.trim().parse().ok()) {
            Some(id) => PostbackRequest::Recipes(id),
            None => PostbackRequest::BadRecipes,
        },
        _ => PostbackRequest::Ignored,
    }
}

pub struct Bot {
    catalog: Arc<dyn VegetableCatalog>,
    recommender: Recommender,
    classifier: Option<Arc<dyn Classifier>>,
    messenger: Arc<dyn Messenger>,
    settings: BotSettings,
}

impl Bot {
    pub fn new(
        catalog: Arc<dyn VegetableCatalog>,
        messenger: Arc<dyn Messenger>,
        settings: BotSettings,
    ) -> Self {
        let recommender = Recommender::new(
            catalog.clone(),
            settings.nutrient_top_n,
            settings.carousel_limit,
        );
        Self {
            catalog,
            recommender,
            classifier: None,
            messenger,
            settings,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Answer one webhook event. Events without a reply token and kinds the
    /// bot does not handle are skipped.
    pub async fn handle_event(&self, event: &Event) -> Result<(), BotError> {
        let Some(reply_token) = event.reply_token() else {
            debug!(kind = event.kind(), "Event without reply token");
            return Ok(());
        };

        let messages = match event {
            Event::Message(message) => match &message.message {
                MessageContent::Text { text, .. } => self.respond_text(text).await?,
                MessageContent::Image { id } => self.respond_image(id).await,
                MessageContent::Other => {
                    debug!("Ignoring unsupported message content");
                    return Ok(());
                }
            },
            Event::Postback(postback) => match self.respond_postback(&postback.postback.data).await? {
                Some(messages) => messages,
                None => return Ok(()),
            },
            Event::Unsupported => return Ok(()),
        };

        self.messenger.reply(reply_token, messages).await?;
        Ok(())
    }

    pub async fn respond_text(&self, text: &str) -> Result<Vec<Message>, CatalogError> {
        let text = text.trim();
        info!(text, "📨 Text message");

        let reply = match text {
            UPLOAD_PHOTO => replies::photo_prompt(),
            ASK_NUTRIENT => replies::nutrient_prompt(),
            ASK_INGREDIENT => replies::ingredient_prompt(),
            query => self.recommend(query).await?,
        };
        Ok(vec![reply])
    }

    async fn recommend(&self, query: &str) -> Result<Message, CatalogError> {
        let links = &self.settings.links;

        let reply = match self.recommender.recommend(query).await? {
            Recommendation::ByNutrient { hits, .. } => {
                let cards: Vec<VegetableCard<'_>> = hits
                    .iter()
                    .map(|hit| VegetableCard {
                        vegetable: &hit.vegetable,
                        highlight: Some((hit.nutrient, hit.value)),
                    })
                    .collect();
                replies::vegetable_carousel(&cards, &format!("為您推薦 {query} 含量最高的蔬菜"), links)
            }
            Recommendation::ByName(vegetables) => {
                let cards: Vec<VegetableCard<'_>> =
                    vegetables.iter().map(VegetableCard::plain).collect();
                replies::vegetable_carousel(&cards, &format!("為您推薦 {query} 相關蔬菜"), links)
            }
            Recommendation::Nothing => Message::text(replies::NO_MATCH),
        };
        Ok(reply)
    }

    /// Classify a user photo. Failures are turned into an apology message.
    pub async fn respond_image(&self, message_id: &str) -> Vec<Message> {
        match self.identify(message_id).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(message_id, error = %e, "Image handling failed");
                vec![Message::text(format!("圖片處理失敗：{e}"))]
            }
        }
    }

    async fn identify(&self, message_id: &str) -> Result<Vec<Message>, ImageError> {
        let classifier = self.classifier.as_ref().ok_or(ImageError::NoClassifier)?;
        let image = self.messenger.content(message_id).await?;
        let prediction = classifier.classify(&image).await?;
        info!(label = %prediction.label, confidence = prediction.confidence, "🔍 Classified photo");

        let settings = &self.settings;
        let verdict = replies::verdict(
            &prediction,
            settings.confident_threshold,
            settings.plausible_threshold,
        );
        let mut messages = vec![Message::text(verdict)];

        if prediction.confidence >= settings.plausible_threshold {
            let found = self.recommender.lookup(&prediction.label).await?;
            if found.is_empty() {
                messages.push(Message::text(replies::NO_DETAILS));
            } else {
                let cards: Vec<VegetableCard<'_>> = found.iter().map(VegetableCard::plain).collect();
                messages.push(replies::vegetable_carousel(
                    &cards,
                    &format!("辨識結果：{}", prediction.label),
                    &settings.links,
                ));
            }
        }
        Ok(messages)
    }

    /// `None` for postback data the bot does not act on.
    pub async fn respond_postback(&self, data: &str) -> Result<Option<Vec<Message>>, CatalogError> {
        let reply = match parse_postback(data) {
            PostbackRequest::Recipes(veg_id) => {
                let recipes = self.catalog.recipes(veg_id, self.settings.recipe_limit).await?;
                info!(veg_id, recipes = recipes.len(), "📖 Recipe lookup");
                replies::recipe_carousel(&recipes, &self.settings.links)
            }
            PostbackRequest::BadRecipes => {
                warn!(data, "Malformed recipe postback");
                Message::text(replies::BAD_RECIPE_QUERY)
            }
            PostbackRequest::Ignored => {
                debug!(data, "Ignoring postback");
                return Ok(None);
            }
        };
        Ok(Some(vec![reply]))
    }
}
