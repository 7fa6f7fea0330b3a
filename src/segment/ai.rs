//! AI segmentation collaborator.
//!
//! Provides the [`AiSegmenter`] trait and an implementation against any
//! OpenAI-compatible chat completions endpoint. The model is asked for a
//! JSON array of `{word, romanization, translation}` objects covering the
//! input unit in order.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AiConfig;

/// Instructions used when no prompt override is configured. `{lang}` is
/// replaced with the configured gloss language.
pub const DEFAULT_PROMPT: &str = "Segment the user's text into words as a native reader would. \
Reply with only a JSON array, one object per word in order, each with the keys \
\"word\" (exact text from the input), \"romanization\" (standard phonetic romanization with tone marks, \
empty for punctuation) and \"translation\" (short {lang} gloss, empty for punctuation). \
Concatenating every \"word\" must reproduce the input.";

/// One segmented word as returned by the AI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentTriple {
    pub word: String,
    #[serde(default)]
    pub romanization: String,
    #[serde(default)]
    pub translation: String,
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("no API key configured (set ai.api_key or GLOSSA_API_KEY)")]
    MissingApiKey,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("API rejected credentials")]
    Unauthorized,

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unparseable AI response: {0}")]
    Parse(String),
}

/// Segments a unit of text and glosses each word.
///
/// Callers treat every error as transient: segmentation degrades, it does not fail.
#[async_trait]
pub trait AiSegmenter: Send + Sync {
    async fn segment_unit(
        &self,
        unit: &str,
        prompt_override: Option<&str>,
    ) -> Result<Vec<SegmentTriple>, AiError>;
}

/// Create the AI segmenter from config.
pub fn create_ai_segmenter(config: &AiConfig) -> Result<Box<dyn AiSegmenter>> {
    Ok(Box::new(OpenAiSegmenter::new(config)?))
}

/// `/chat/completions` client.
pub struct OpenAiSegmenter {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
    gloss_language: String,
}

impl OpenAiSegmenter {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            gloss_language: config.gloss_language.clone(),
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl AiSegmenter for OpenAiSegmenter {
    async fn segment_unit(
        &self,
        unit: &str,
        prompt_override: Option<&str>,
    ) -> Result<Vec<SegmentTriple>, AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::MissingApiKey);
        }

        let prompt = match prompt_override {
            Some(p) => p.to_string(),
            None => DEFAULT_PROMPT.replace("{lang}", &self.gloss_language),
        };
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt,
                },
                ChatMessage {
                    role: "user",
                    content: unit,
                },
            ],
        };
        let body = serde_json::to_string(&request).map_err(|e| AiError::Parse(e.to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AiError::RateLimited);
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AiError::Unauthorized);
        }
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AiError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| AiError::Parse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::Parse("response has no message content".into()))?;

        parse_triples(&content)
    }
}

/// Extract the triple array from model output, tolerating code fences or
/// prose around the JSON.
pub fn parse_triples(content: &str) -> Result<Vec<SegmentTriple>, AiError> {
    let start = content
        .find('[')
        .ok_or_else(|| AiError::Parse("no JSON array in response".into()))?;
    let end = content
        .rfind(']')
        .filter(|end| *end > start)
        .ok_or_else(|| AiError::Parse("unterminated JSON array in response".into()))?;

    serde_json::from_str(&content[start..=end]).map_err(|e| AiError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_array() {
        let triples = parse_triples(
            r#"[{"word":"你好","romanization":"nǐ hǎo","translation":"hello"}]"#,
        )
        .unwrap();
        assert_eq!(
            triples,
            vec![SegmentTriple {
                word: "你好".into(),
                romanization: "nǐ hǎo".into(),
                translation: "hello".into(),
            }]
        );
    }

    #[test]
    fn parses_fenced_array_with_missing_fields() {
        let content = "Here you go:\n```json\n[\n {\"word\":\"谢谢\",\"translation\":\"thanks\"},\n {\"word\":\"。\"}\n]\n```";
        let triples = parse_triples(content).unwrap();
        assert_eq!(triples.len(), 2);
        assert_eq!(triples[0].romanization, "");
        assert_eq!(triples[1].word, "。");
        assert_eq!(triples[1].translation, "");
    }

    #[test]
    fn rejects_non_array_output() {
        assert!(matches!(parse_triples("sorry, I can't"), Err(AiError::Parse(_))));
        assert!(matches!(parse_triples("] oops ["), Err(AiError::Parse(_))));
        assert!(matches!(parse_triples("[{\"nope\": 1}]"), Err(AiError::Parse(_))));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_network() {
        let segmenter = OpenAiSegmenter::new(&AiConfig::default()).unwrap();
        let err = segmenter.segment_unit("你好", None).await.unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey));
    }
}
