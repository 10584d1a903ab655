//! Backend for the Google Generative Language API.
//!
//! [`GeminiBackend`] translates normalized requests into
//! `models/{model}:streamGenerateContent` (SSE) for the story call and
//! `models/{model}:generateContent` for the image call. The story call
//! constrains output to the three-field turn shape via `responseSchema`;
//! the image call requests image response modalities and decodes
//! `inlineData` attachments.

use async_trait::async_trait;
use base64::Engine;
use futures::StreamExt;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

use super::sse::SseDecoder;
use super::{Attachment, Backend, ImageRequest, TextRequest, TextResponse};
use crate::error::{Result, StoryError};

/// Backend for the Google Generative Language API (`v1beta`).
///
/// # Example
///
/// ```
/// use storyteller::backend::GeminiBackend;
///
/// let backend = GeminiBackend::new().with_api_key("AIza...");
/// ```
#[derive(Clone, Default)]
pub struct GeminiBackend {
    /// Optional API key. If set, sent as `x-goog-api-key: {key}`.
    api_key: Option<String>,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field(
                "api_key",
                &self.api_key.as_ref().map(|k| {
                    if k.len() > 6 {
                        format!("{}***", &k[..6])
                    } else {
                        "***".to_string()
                    }
                }),
            )
            .finish()
    }
}

impl GeminiBackend {
    /// Create a backend without authentication (for proxies that inject it).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Returns `true` if an API key has been configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// OpenAPI-style schema pinning the story output to exactly the
    /// three named turn fields.
    fn turn_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "description": { "type": "STRING" },
                "suggestedActions": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                },
                "imagePrompt": { "type": "STRING" },
            },
            "required": ["description", "suggestedActions", "imagePrompt"],
            "propertyOrdering": ["description", "suggestedActions", "imagePrompt"],
        })
    }

    /// Build the body for the streaming story call.
    fn build_story_body(request: &TextRequest) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_output_tokens,
                "responseMimeType": "application/json",
                "responseSchema": Self::turn_schema(),
            },
        })
    }

    /// Build the body for the image call.
    fn build_image_body(request: &ImageRequest) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"],
            },
        })
    }

    fn endpoint(base_url: &str, model: &str, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            base_url.trim_end_matches('/'),
            model,
            method,
        )
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("x-goog-api-key", key),
            None => builder,
        }
    }

    /// Concatenate the text parts of one streamed chunk.
    fn chunk_text(value: &Value) -> String {
        let mut text = String::new();
        let parts = value
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array);
        if let Some(parts) = parts {
            for part in parts {
                if let Some(t) = part.get("text").and_then(Value::as_str) {
                    text.push_str(t);
                }
            }
        }
        text
    }

    /// Decode every `inlineData` part of an image response.
    fn collect_attachments(value: &Value) -> Vec<Attachment> {
        let mut attachments = Vec::new();
        let parts = value
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array);
        if let Some(parts) = parts {
            for part in parts {
                let Some(inline) = part.get("inlineData") else {
                    continue;
                };
                let media_type = inline
                    .get("mimeType")
                    .and_then(Value::as_str)
                    .unwrap_or("application/octet-stream");
                let Some(encoded) = inline.get("data").and_then(Value::as_str) else {
                    continue;
                };
                if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(encoded) {
                    attachments.push(Attachment {
                        media_type: media_type.to_string(),
                        data,
                    });
                }
            }
        }
        attachments
    }

    async fn error_from_response(resp: reqwest::Response) -> StoryError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        StoryError::HttpError { status, body }
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn stream_story(
        &self,
        client: &Client,
        base_url: &str,
        request: &TextRequest,
        on_chunk: &mut (dyn FnMut(String) + Send),
    ) -> Result<TextResponse> {
        let url = format!(
            "{}?alt=sse",
            Self::endpoint(base_url, &request.model, "streamGenerateContent"),
        );
        debug!("streaming story call to {}", request.model);

        let body = Self::build_story_body(request);
        let resp = self
            .apply_auth(client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoryError::Other(format!("failed to reach story service at {url}: {e}")))?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }

        let mut stream = resp.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut accumulated = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(StoryError::Request)?;
            for event in decoder.decode(&chunk) {
                let text = Self::chunk_text(&event);
                if !text.is_empty() {
                    accumulated.push_str(&text);
                    on_chunk(text);
                }
            }
        }
        for event in decoder.flush() {
            let text = Self::chunk_text(&event);
            if !text.is_empty() {
                accumulated.push_str(&text);
                on_chunk(text);
            }
        }

        Ok(TextResponse {
            text: accumulated,
            status,
        })
    }

    async fn generate_image(
        &self,
        client: &Client,
        base_url: &str,
        request: &ImageRequest,
    ) -> Result<Vec<Attachment>> {
        let url = Self::endpoint(base_url, &request.model, "generateContent");
        debug!("image call to {}", request.model);

        let body = Self::build_image_body(request);
        let resp = self
            .apply_auth(client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoryError::Other(format!("failed to reach image service at {url}: {e}")))?;

        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }

        let payload: Value = resp.json().await?;
        Ok(Self::collect_attachments(&payload))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story_request() -> TextRequest {
        TextRequest {
            model: "gemini-2.5-flash-lite".into(),
            prompt: "Tell a story.".into(),
            temperature: 0.9,
            max_output_tokens: 2048,
        }
    }

    #[test]
    fn test_story_body_constrains_output_shape() {
        let body = GeminiBackend::build_story_body(&story_request());

        assert_eq!(body["contents"][0]["parts"][0]["text"], "Tell a story.");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");

        let schema = &body["generationConfig"]["responseSchema"];
        assert_eq!(schema["type"], "OBJECT");
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
        assert!(schema["properties"].get("description").is_some());
        assert!(schema["properties"].get("suggestedActions").is_some());
        assert!(schema["properties"].get("imagePrompt").is_some());
    }

    #[test]
    fn test_story_body_carries_generation_settings() {
        let body = GeminiBackend::build_story_body(&story_request());
        assert_eq!(body["generationConfig"]["temperature"], 0.9);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_image_body_requests_image_modality() {
        let body = GeminiBackend::build_image_body(&ImageRequest {
            model: "gemini-2.5-flash-image-preview".into(),
            prompt: "pirate ship, pixel art".into(),
        });
        let modalities = body["generationConfig"]["responseModalities"].as_array().unwrap();
        assert!(modalities.iter().any(|m| m == "IMAGE"));
        assert!(body["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_endpoint_formatting() {
        let url = GeminiBackend::endpoint(
            "https://generativelanguage.googleapis.com/",
            "gemini-2.5-flash-lite",
            "streamGenerateContent",
        );
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-lite:streamGenerateContent"
        );
    }

    #[test]
    fn test_chunk_text_concatenates_parts() {
        let event = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"descri" }, { "text": "ption\":" }] },
            }],
        });
        assert_eq!(GeminiBackend::chunk_text(&event), "{\"description\":");
    }

    #[test]
    fn test_chunk_text_empty_for_metadata_events() {
        let event = json!({ "usageMetadata": { "totalTokenCount": 42 } });
        assert_eq!(GeminiBackend::chunk_text(&event), "");
    }

    #[test]
    fn test_collect_attachments_decodes_inline_data() {
        let payload = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your scene." },
                        { "inlineData": { "mimeType": "image/png", "data": "iVBORw==" } },
                    ],
                },
            }],
        });
        let attachments = GeminiBackend::collect_attachments(&payload);
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].media_type, "image/png");
        assert_eq!(attachments[0].data, vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[test]
    fn test_collect_attachments_empty_when_text_only() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "no image today" }] },
            }],
        });
        assert!(GeminiBackend::collect_attachments(&payload).is_empty());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let backend = GeminiBackend::new().with_api_key("AIzaSyExampleExample");
        let rendered = format!("{backend:?}");
        assert!(rendered.contains("AIzaSy***"));
        assert!(!rendered.contains("ExampleExample"));
    }
}
