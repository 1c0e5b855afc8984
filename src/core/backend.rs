use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::shared::error::{AppError, AppResult};

const GTX_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Detect/translate RPC seam. A single attempt per call, no retry policy;
/// the dispatcher decides what a failure means.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Detected source language code for the text, or "auto" when the backend
    /// cannot tell.
    async fn detect(&self, text: &str) -> AppResult<String>;

    async fn translate(&self, text: &str, target_lang: &str) -> AppResult<String>;
}

/// Backend over the unofficial Google Translate endpoint (free tier).
/// For production, consider the official Cloud Translation API.
pub struct GoogleTranslateBackend {
    http: Client,
}

impl GoogleTranslateBackend {
    pub fn new() -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("Mozilla/5.0")
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;
        Ok(Self { http })
    }

    async fn fetch(&self, text: &str, target_lang: &str) -> AppResult<Value> {
        let url = format!(
            "{}?client=gtx&sl=auto&tl={}&dt=t&q={}",
            GTX_ENDPOINT,
            target_lang,
            urlencoding::encode(text)
        );
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::Network(format!(
                "Translation API error: {}",
                resp.status()
            )));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to parse API response: {}", e)))
    }
}

#[async_trait]
impl TranslationBackend for GoogleTranslateBackend {
    async fn detect(&self, text: &str) -> AppResult<String> {
        // The endpoint has no dedicated detect call; a throwaway translation to
        // English carries the detected language at index 2.
        let json = self.fetch(text, "en").await?;
        let lang = parse_detected_language(&json);
        debug!("detected language {:?} for {:?}", lang, text);
        Ok(lang)
    }

    async fn translate(&self, text: &str, target_lang: &str) -> AppResult<String> {
        let json = self.fetch(text, target_lang).await?;
        parse_translation(&json)
    }
}

/// The detected language sits at index 2 of the response array; missing or
/// malformed means undetected, not an error.
pub fn parse_detected_language(json: &Value) -> String {
    json.get(2)
        .and_then(|v| v.as_str())
        .unwrap_or("auto")
        .to_string()
}

/// Response shape: `[[["segment", ...], ...], _, "lang"]`. All segments are
/// concatenated in order, empties skipped, separated by single spaces.
pub fn parse_translation(json: &Value) -> AppResult<String> {
    let sentences = json
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| AppError::Validation("Invalid response format".to_string()))?;

    let segments: Vec<&str> = sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .collect();

    Ok(segments.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_translation_joins_segments_with_spaces() {
        let json = json!([[["Hello", "Bonjour"], ["world", "monde"]], null, "fr"]);
        assert_eq!(parse_translation(&json).unwrap(), "Hello world");
    }

    #[test]
    fn test_parse_translation_skips_empty_segments() {
        let json = json!([[["Hello"], [""], ["there"]], null, "fr"]);
        assert_eq!(parse_translation(&json).unwrap(), "Hello there");
    }

    #[test]
    fn test_parse_translation_rejects_malformed_shape() {
        assert!(parse_translation(&json!({"unexpected": true})).is_err());
        assert!(parse_translation(&json!(null)).is_err());
    }

    #[test]
    fn test_parse_detected_language() {
        let json = json!([[["Hallo"]], null, "de"]);
        assert_eq!(parse_detected_language(&json), "de");
    }

    #[test]
    fn test_parse_detected_language_defaults_to_auto() {
        assert_eq!(parse_detected_language(&json!([[["x"]]])), "auto");
        assert_eq!(parse_detected_language(&json!([null, null, 42])), "auto");
    }
}
