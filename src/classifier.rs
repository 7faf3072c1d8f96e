//! Image classification adapter.
//!
//! The model runs as a separate service. It receives `{"image": <base64>}`
//! and answers with a label and confidence, either as JSON or as the older
//! two-line text report (`預測類別：X` / `信心度：85.00%`).

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ClassifierConfig;

/// Label used when the model's answer cannot be read.
pub const UNKNOWN_LABEL: &str = "未知蔬菜";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    /// Probability of the top label, in [0, 1].
    pub confidence: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence: normalize_confidence(confidence),
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_LABEL, 0.0)
    }

    /// Parse the text report. Anything unreadable becomes [`Prediction::unknown`].
    pub fn from_report(report: &str) -> Self {
        let mut label = None;
        let mut confidence = None;

        for line in report.lines().map(str::trim) {
            if let Some(rest) = line
                .strip_prefix("預測類別：")
                .or_else(|| line.strip_prefix("辨識結果："))
            {
                label = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("信心度：") {
                confidence = rest
                    .trim()
                    .trim_end_matches('%')
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .map(|pct| pct / 100.0);
            }
        }

        match (label, confidence) {
            (Some(label), Some(confidence)) if !label.is_empty() => Self::new(label, confidence),
            _ => {
                warn!(report, "Unreadable classifier report");
                Self::unknown()
            }
        }
    }
}

/// Percentages are scaled down; the result is clamped to [0, 1]. Values a
/// hair above 1 are float noise, not percentages.
fn normalize_confidence(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let value = if value > 1.0 + 1e-6 { value / 100.0 } else { value };
    value.clamp(0.0, 1.0)
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("model service unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model service returned {status}: {body}")]
    Service { status: u16, body: String },
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &[u8]) -> Result<Prediction, ClassifierError>;
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    image: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(alias = "class", alias = "predicted_class", alias = "prediction")]
    label: String,
    #[serde(alias = "score", alias = "probability")]
    confidence: f64,
}

pub struct HttpClassifier {
    http: Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClassifierError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// `None` when no model service is configured.
    pub fn from_config(config: &ClassifierConfig) -> Result<Option<Self>, ClassifierError> {
        config
            .endpoint
            .as_deref()
            .map(|endpoint| Self::new(endpoint, Duration::from_secs(config.timeout_secs)))
            .transpose()
    }

    pub async fn classify_base64(&self, image: &str) -> Result<Prediction, ClassifierError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&PredictRequest { image })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClassifierError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let prediction = match serde_json::from_str::<PredictResponse>(&body) {
            Ok(parsed) => Prediction::new(parsed.label, parsed.confidence),
            Err(_) => Prediction::from_report(&body),
        };
        debug!(label = %prediction.label, confidence = prediction.confidence, "Classified image");
        Ok(prediction)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, image: &[u8]) -> Result<Prediction, ClassifierError> {
        self.classify_base64(&STANDARD.encode(image)).await
    }
}
