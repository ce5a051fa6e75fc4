use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, SkyshiftError};

const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Best-effort query translation. Implementations never fail: on any
/// problem they hand back the input unchanged.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn to_english(&self, text: &str) -> String;
}

/// True when the text contains CJK unified ideographs, which the keyword
/// catalogs do not index well.
pub fn needs_translation(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fa5}').contains(&c))
}

pub struct GoogleTranslator {
    client: reqwest::Client,
}

impl GoogleTranslator {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn translate(&self, text: &str) -> Result<String> {
        let body: Value = self
            .client
            .get(TRANSLATE_URL)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", "en"),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        extract_translation(&body)
            .ok_or_else(|| SkyshiftError::Source("unexpected translation response".into()))
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn to_english(&self, text: &str) -> String {
        match self.translate(text).await {
            Ok(translated) => {
                debug!(original = text, translated = %translated, "query translated");
                translated
            }
            Err(e) => {
                warn!("translation failed, searching with original text: {e}");
                text.to_string()
            }
        }
    }
}

/// The response is nested arrays; the first segment's text sits at
/// `[0][0][0]`.
fn extract_translation(body: &Value) -> Option<String> {
    let text = body.get(0)?.get(0)?.get(0)?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}
