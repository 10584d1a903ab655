//! Shared context for session operations.
//!
//! [`StoryCtx`] carries the HTTP client, provider base URL, backend,
//! model configuration, and optional event handler. It is constructed
//! once per host and shared by every session; sessions themselves hold
//! no connection state.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::backend::{Backend, GeminiBackend};
use crate::config::StoryConfig;
use crate::events::EventHandler;

/// Default base URL of the hosted generative service.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Shared context for story and image calls.
///
/// # Example
///
/// ```
/// use storyteller::StoryCtx;
///
/// let ctx = StoryCtx::builder()
///     .api_key("AIza...")
///     .build();
/// ```
pub struct StoryCtx {
    /// HTTP client (cheap to clone -- uses `Arc` internally).
    pub client: Client,
    /// Base URL for the generative service.
    pub base_url: String,
    /// Provider backend. Default: [`GeminiBackend`].
    pub backend: Arc<dyn Backend>,
    /// Models and generation settings.
    pub config: StoryConfig,
    /// Optional handler for session lifecycle events.
    pub event_handler: Option<Arc<dyn EventHandler>>,
}

impl StoryCtx {
    /// Create a new builder.
    pub fn builder() -> StoryCtxBuilder {
        StoryCtxBuilder {
            client: None,
            base_url: None,
            backend: None,
            config: None,
            event_handler: None,
            timeout: None,
        }
    }
}

impl std::fmt::Debug for StoryCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryCtx")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`StoryCtx`].
pub struct StoryCtxBuilder {
    client: Option<Client>,
    base_url: Option<String>,
    backend: Option<Arc<dyn Backend>>,
    config: Option<StoryConfig>,
    event_handler: Option<Arc<dyn EventHandler>>,
    timeout: Option<Duration>,
}

impl StoryCtxBuilder {
    /// Set the HTTP client. If not set, a default client is created.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Override the provider base URL. Default: [`DEFAULT_BASE_URL`].
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the backend. Default: [`GeminiBackend`] without a key.
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Shorthand: use [`GeminiBackend`] with the given API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.backend = Some(Arc::new(GeminiBackend::new().with_api_key(key)));
        self
    }

    /// Set models and generation settings. Default: [`StoryConfig::default`].
    pub fn config(mut self, config: StoryConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Set the request timeout. Default: 120 seconds.
    ///
    /// Ignored when a custom `Client` is provided via
    /// [`client`](Self::client) — that client's own timeout applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the context.
    pub fn build(self) -> StoryCtx {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(120));
        let client = self.client.unwrap_or_else(|| {
            Client::builder()
                .timeout(timeout)
                .build()
                .expect("failed to build HTTP client")
        });
        StoryCtx {
            client,
            base_url: self
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            backend: self.backend.unwrap_or_else(|| Arc::new(GeminiBackend::new())),
            config: self.config.unwrap_or_default(),
            event_handler: self.event_handler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    #[test]
    fn test_defaults() {
        let ctx = StoryCtx::builder().build();
        assert_eq!(ctx.base_url, DEFAULT_BASE_URL);
        assert_eq!(ctx.backend.name(), "gemini");
        assert!(ctx.event_handler.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let ctx = StoryCtx::builder().base_url("http://localhost:8080/").build();
        assert_eq!(ctx.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_custom_backend() {
        let ctx = StoryCtx::builder().backend(Arc::new(MockBackend::new())).build();
        assert_eq!(ctx.backend.name(), "mock");
    }

    #[test]
    fn test_debug_omits_secrets() {
        let ctx = StoryCtx::builder().api_key("AIzaSySecretSecret").build();
        let rendered = format!("{ctx:?}");
        assert!(!rendered.contains("SecretSecret"));
    }
}
