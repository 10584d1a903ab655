//! Mock backend for testing without live generative services.
//!
//! [`MockBackend`] plays back scripted story streams and image
//! responses in order, records every prompt it receives, and can hold a
//! story call open until a [`MockGate`] is released — which is how the
//! supersession tests interleave two in-flight turns deterministically.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Notify;

use super::{Attachment, Backend, ImageRequest, TextRequest, TextResponse};
use crate::error::{Result, StoryError};

/// Hand-released gate for a scripted story call.
///
/// A gated story call waits on the gate before streaming its chunks;
/// the test releases it when the interleaving is in place. Releasing
/// before the call starts is fine — the permit is stored.
#[derive(Clone, Default)]
pub struct MockGate {
    inner: Arc<Notify>,
}

impl MockGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow the gated call to proceed.
    pub fn release(&self) {
        self.inner.notify_one();
    }

    async fn wait(&self) {
        self.inner.notified().await;
    }
}

enum StoryScript {
    Chunks(Vec<String>),
    Gated {
        chunks: Vec<String>,
        gate: MockGate,
    },
    Failure(String),
}

enum ImageScript {
    Attachments(Vec<Attachment>),
    Failure(String),
}

/// A test backend that plays back scripted responses in order.
///
/// Story scripts are consumed one per call and must be provided for
/// every expected call. Image scripts fall back to a single PNG
/// attachment when none is scripted, so story-focused tests need not
/// script the illustration phase.
#[derive(Default)]
pub struct MockBackend {
    stories: Mutex<VecDeque<StoryScript>>,
    images: Mutex<VecDeque<ImageScript>>,
    story_prompts: Mutex<Vec<String>>,
    image_prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script one story call that streams the given chunks.
    pub fn with_story<I, S>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stories
            .lock()
            .expect("mock lock")
            .push_back(StoryScript::Chunks(
                chunks.into_iter().map(Into::into).collect(),
            ));
        self
    }

    /// Script one story call that waits for `gate` before streaming.
    pub fn with_gated_story<I, S>(self, chunks: I, gate: MockGate) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stories
            .lock()
            .expect("mock lock")
            .push_back(StoryScript::Gated {
                chunks: chunks.into_iter().map(Into::into).collect(),
                gate,
            });
        self
    }

    /// Script one story call that fails at the transport level.
    pub fn with_story_failure(self, reason: impl Into<String>) -> Self {
        self.stories
            .lock()
            .expect("mock lock")
            .push_back(StoryScript::Failure(reason.into()));
        self
    }

    /// Script one image call returning a single attachment.
    pub fn with_image(self, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.images
            .lock()
            .expect("mock lock")
            .push_back(ImageScript::Attachments(vec![Attachment {
                media_type: media_type.into(),
                data,
            }]));
        self
    }

    /// Script one image call returning the given attachments verbatim.
    pub fn with_attachments(self, attachments: Vec<Attachment>) -> Self {
        self.images
            .lock()
            .expect("mock lock")
            .push_back(ImageScript::Attachments(attachments));
        self
    }

    /// Script one image call that succeeds with zero attachments.
    pub fn with_no_attachments(self) -> Self {
        self.images
            .lock()
            .expect("mock lock")
            .push_back(ImageScript::Attachments(Vec::new()));
        self
    }

    /// Script one image call that fails at the transport level.
    pub fn with_image_failure(self, reason: impl Into<String>) -> Self {
        self.images
            .lock()
            .expect("mock lock")
            .push_back(ImageScript::Failure(reason.into()));
        self
    }

    /// Every story prompt received so far, in call order.
    pub fn story_prompts(&self) -> Vec<String> {
        self.story_prompts.lock().expect("mock lock").clone()
    }

    /// Every image prompt received so far, in call order.
    pub fn image_prompts(&self) -> Vec<String> {
        self.image_prompts.lock().expect("mock lock").clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn stream_story(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &TextRequest,
        on_chunk: &mut (dyn FnMut(String) + Send),
    ) -> Result<TextResponse> {
        self.story_prompts
            .lock()
            .expect("mock lock")
            .push(request.prompt.clone());

        let script = self
            .stories
            .lock()
            .expect("mock lock")
            .pop_front()
            .ok_or_else(|| StoryError::Other("mock: no story scripted".into()))?;

        let chunks = match script {
            StoryScript::Chunks(chunks) => chunks,
            StoryScript::Gated { chunks, gate } => {
                gate.wait().await;
                chunks
            }
            StoryScript::Failure(reason) => return Err(StoryError::Other(reason)),
        };

        let mut accumulated = String::new();
        for chunk in chunks {
            accumulated.push_str(&chunk);
            on_chunk(chunk);
        }
        Ok(TextResponse {
            text: accumulated,
            status: 200,
        })
    }

    async fn generate_image(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &ImageRequest,
    ) -> Result<Vec<Attachment>> {
        self.image_prompts
            .lock()
            .expect("mock lock")
            .push(request.prompt.clone());

        let script = self.images.lock().expect("mock lock").pop_front();
        match script {
            Some(ImageScript::Attachments(attachments)) => Ok(attachments),
            Some(ImageScript::Failure(reason)) => Err(StoryError::Other(reason)),
            // Unscripted image calls succeed with a placeholder PNG.
            None => Ok(vec![Attachment {
                media_type: "image/png".to_string(),
                data: vec![0x89, 0x50, 0x4e, 0x47],
            }]),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story_request(prompt: &str) -> TextRequest {
        TextRequest {
            model: "test".into(),
            prompt: prompt.into(),
            temperature: 0.9,
            max_output_tokens: 256,
        }
    }

    #[tokio::test]
    async fn test_mock_streams_scripted_chunks() {
        let mock = MockBackend::new().with_story(vec!["{\"a\":", "1}"]);
        let client = Client::new();
        let mut chunks = Vec::new();
        let resp = mock
            .stream_story(&client, "http://unused", &story_request("hi"), &mut |c| {
                chunks.push(c)
            })
            .await
            .unwrap();
        assert_eq!(chunks, vec!["{\"a\":", "1}"]);
        assert_eq!(resp.text, "{\"a\":1}");
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn test_mock_records_prompts_in_order() {
        let mock = MockBackend::new().with_story(vec!["{}"]).with_story(vec!["{}"]);
        let client = Client::new();
        let mut sink = |_c: String| {};
        mock.stream_story(&client, "http://unused", &story_request("first"), &mut sink)
            .await
            .unwrap();
        mock.stream_story(&client, "http://unused", &story_request("second"), &mut sink)
            .await
            .unwrap();
        assert_eq!(mock.story_prompts(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_mock_story_failure() {
        let mock = MockBackend::new().with_story_failure("connection reset");
        let client = Client::new();
        let mut sink = |_c: String| {};
        let err = mock
            .stream_story(&client, "http://unused", &story_request("hi"), &mut sink)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_mock_errors_when_stories_exhausted() {
        let mock = MockBackend::new();
        let client = Client::new();
        let mut sink = |_c: String| {};
        let err = mock
            .stream_story(&client, "http://unused", &story_request("hi"), &mut sink)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no story scripted"));
    }

    #[tokio::test]
    async fn test_mock_image_defaults_to_png_attachment() {
        let mock = MockBackend::new();
        let client = Client::new();
        let attachments = mock
            .generate_image(
                &client,
                "http://unused",
                &ImageRequest {
                    model: "test".into(),
                    prompt: "scene".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].media_type, "image/png");
        assert_eq!(mock.image_prompts(), vec!["scene"]);
    }

    #[tokio::test]
    async fn test_mock_no_attachments_script() {
        let mock = MockBackend::new().with_no_attachments();
        let client = Client::new();
        let attachments = mock
            .generate_image(
                &client,
                "http://unused",
                &ImageRequest {
                    model: "test".into(),
                    prompt: "scene".into(),
                },
            )
            .await
            .unwrap();
        assert!(attachments.is_empty());
    }

    #[tokio::test]
    async fn test_gate_release_before_wait_is_not_lost() {
        let gate = MockGate::new();
        let mock = MockBackend::new().with_gated_story(vec!["{}"], gate.clone());
        gate.release();
        let client = Client::new();
        let mut sink = |_c: String| {};
        let resp = mock
            .stream_story(&client, "http://unused", &story_request("hi"), &mut sink)
            .await
            .unwrap();
        assert_eq!(resp.text, "{}");
    }
}
