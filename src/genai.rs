//! Hosted text and image generation.
//!
//! Two trait seams, [`TextGenerator`] and [`ImageGenerator`], with one
//! blocking HTTP implementation ([`OpenAiClient`]) speaking the OpenAI
//! chat-completions and image-generations APIs. Response fields are
//! modelled as `Option` and validated at the boundary so a shape change
//! upstream surfaces as [`GenAiError::MalformedResponse`] instead of a
//! deserialization panic deeper in.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ConfigError, OpenAiConfig};

#[derive(Error, Debug)]
pub enum GenAiError {
    #[error("generation API rejected the request with status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed generation API response: {0}")]
    MalformedResponse(String),
    #[error("network error reaching the generation API: {0}")]
    Network(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One generated raster, named for its position in the request.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

pub trait TextGenerator {
    fn generate_text(&self, system: &str, user: &str) -> Result<String, GenAiError>;
}

pub trait ImageGenerator {
    fn generate_images(&self, prompt: &str, count: usize)
    -> Result<Vec<GeneratedImage>, GenAiError>;
}

// Response shapes. Every field the code relies on is Option and checked
// explicitly.

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Option<Vec<ImageDatum>>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

fn extract_chat_text(body: ChatResponse) -> Result<String, GenAiError> {
    body.choices
        .and_then(|mut choices| {
            if choices.is_empty() {
                None
            } else {
                choices.remove(0).message
            }
        })
        .and_then(|message| message.content)
        .ok_or_else(|| {
            GenAiError::MalformedResponse("chat response lacks choices[0].message.content".into())
        })
}

fn extract_image_bytes(body: ImageResponse) -> Result<Vec<u8>, GenAiError> {
    let b64 = body
        .data
        .and_then(|mut data| {
            if data.is_empty() {
                None
            } else {
                data.remove(0).b64_json
            }
        })
        .ok_or_else(|| {
            GenAiError::MalformedResponse("image response lacks data[0].b64_json".into())
        })?;
    BASE64
        .decode(b64.as_bytes())
        .map_err(|e| GenAiError::MalformedResponse(format!("invalid base64 image payload: {e}")))
}

/// Blocking OpenAI client.
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, timeout: Duration) -> Result<Self, GenAiError> {
        let api_key = config.resolved_api_key()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenAiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    fn post_json(
        &self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<reqwest::blocking::Response, GenAiError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .map_err(|e| GenAiError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenAiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl TextGenerator for OpenAiClient {
    fn generate_text(&self, system: &str, user: &str) -> Result<String, GenAiError> {
        let payload = serde_json::json!({
            "model": self.text_model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });
        let response = self.post_json("/chat/completions", &payload)?;
        let body: ChatResponse = response
            .json()
            .map_err(|e| GenAiError::MalformedResponse(e.to_string()))?;
        extract_chat_text(body)
    }
}

impl ImageGenerator for OpenAiClient {
    /// Request `count` images one at a time. The image endpoint caps `n`
    /// for the newer models, so the loop is a deliberate contract rather
    /// than an optimization target.
    fn generate_images(
        &self,
        prompt: &str,
        count: usize,
    ) -> Result<Vec<GeneratedImage>, GenAiError> {
        let mut images = Vec::with_capacity(count);
        for index in 1..=count {
            log::debug!("requesting image {index}/{count}");
            let payload = serde_json::json!({
                "model": self.image_model,
                "prompt": prompt,
                "n": 1,
                "size": "1024x1024",
                "response_format": "b64_json",
            });
            let response = self.post_json("/images/generations", &payload)?;
            let body: ImageResponse = response
                .json()
                .map_err(|e| GenAiError::MalformedResponse(e.to_string()))?;
            images.push(GeneratedImage {
                name: format!("gen_{index}.png"),
                bytes: extract_image_bytes(body)?,
            });
        }
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_text_is_extracted_from_first_choice() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"1. idea one\n2. idea two"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            extract_chat_text(body).unwrap(),
            "1. idea one\n2. idea two"
        );
    }

    #[test]
    fn chat_response_without_choices_is_malformed() {
        let body: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_chat_text(body),
            Err(GenAiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn chat_response_without_content_is_malformed() {
        let body: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        assert!(extract_chat_text(body).is_err());
    }

    #[test]
    fn image_payload_is_base64_decoded() {
        let encoded = BASE64.encode(b"pixels");
        let body: ImageResponse =
            serde_json::from_str(&format!(r#"{{"data":[{{"b64_json":"{encoded}"}}]}}"#)).unwrap();
        assert_eq!(extract_image_bytes(body).unwrap(), b"pixels");
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let body: ImageResponse =
            serde_json::from_str(r#"{"data":[{"b64_json":"%%%not base64%%%"}]}"#).unwrap();
        assert!(matches!(
            extract_image_bytes(body),
            Err(GenAiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn empty_image_data_is_malformed() {
        let body: ImageResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(extract_image_bytes(body).is_err());
    }
}
