//! Backend trait and normalized request/response types.
//!
//! The [`Backend`] trait abstracts over hosted generative services,
//! translating between normalized request types and the provider's HTTP
//! API. Two operations exist: a streaming structured-story call and a
//! non-streaming image call. Built-in implementations: [`GeminiBackend`]
//! (the hosted service), [`MockBackend`] (tests and offline demos).
//!
//! ```text
//! stream_turn ──► TextRequest ──► Backend::stream_story() ──► chunks + TextResponse
//! request_image ─► ImageRequest ─► Backend::generate_image() ─► Vec<Attachment>
//! ```

pub mod gemini;
pub mod mock;
pub mod sse;

pub use gemini::GeminiBackend;
pub use mock::{MockBackend, MockGate};

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;

/// A normalized story-generation request — provider-agnostic.
#[derive(Debug, Clone)]
pub struct TextRequest {
    /// Model identifier (e.g. `"gemini-2.5-flash-lite"`).
    pub model: String,
    /// The full instruction text from the prompt builder.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens to generate.
    pub max_output_tokens: u32,
}

/// A normalized image-generation request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Model identifier (e.g. `"gemini-2.5-flash-image-preview"`).
    pub model: String,
    /// The styled prompt, preamble included.
    pub prompt: String,
}

/// Terminal result of a streaming story call.
#[derive(Debug)]
pub struct TextResponse {
    /// The full accumulated text of the stream.
    pub text: String,
    /// HTTP status code (for diagnostics/logging).
    pub status: u16,
}

/// One attachment from an image-generation response.
///
/// Providers may return several parts (text commentary, images); the
/// image client scans for the first one whose media type says `image/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Declared media type, e.g. `image/png`.
    pub media_type: String,
    /// Decoded payload bytes.
    pub data: Vec<u8>,
}

/// Abstraction over hosted generative services.
///
/// Implementors make exactly one network call per invocation and never
/// retry — retry policy, if any, belongs to the caller.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a streaming story call.
    ///
    /// `on_chunk` is called with each text fragment as it arrives; the
    /// fragments concatenate to the structured turn object. The final
    /// accumulated text is returned as a [`TextResponse`].
    async fn stream_story(
        &self,
        client: &Client,
        base_url: &str,
        request: &TextRequest,
        on_chunk: &mut (dyn FnMut(String) + Send),
    ) -> Result<TextResponse>;

    /// Execute a non-streaming image call, returning every attachment
    /// the provider produced (possibly none).
    async fn generate_image(
        &self,
        client: &Client,
        base_url: &str,
        request: &ImageRequest,
    ) -> Result<Vec<Attachment>>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}
