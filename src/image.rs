//! Image request client.
//!
//! [`request_image`] wraps a scene prompt with the fixed pixel-art
//! style preamble, issues one non-streaming call, and picks the first
//! image attachment out of the response. One network call, no retries,
//! no validation of the returned image beyond its declared media type.

use log::debug;

use crate::backend::ImageRequest;
use crate::ctx::StoryCtx;
use crate::error::{Result, StoryError};
use crate::turn::StoryImage;

/// Media-type prefix that marks an attachment as renderable.
const IMAGE_MEDIA_PREFIX: &str = "image/";

/// Wrap a scene prompt with the style-reinforcing preamble.
///
/// Applied to every image request so each scene keeps the same
/// limited-palette retro aesthetic regardless of the model's mood.
pub fn styled_prompt(image_prompt: &str) -> String {
    format!(
        "Create a high-quality 8-bit pixel art style image with vibrant colors and clear \
details. {image_prompt}. The image should have a retro video game aesthetic with distinct \
pixels, limited color palette typical of 8-bit games, and clear, readable visual elements.",
    )
}

/// Request one scene illustration.
///
/// Returns [`StoryError::NoImageProduced`] when the call succeeds but
/// no attachment declares an `image/` media type — callers treat that
/// the same as a transport failure: the scene simply goes unillustrated.
pub async fn request_image(ctx: &StoryCtx, image_prompt: &str) -> Result<StoryImage> {
    if image_prompt.trim().is_empty() {
        return Err(StoryError::InvalidInput("image prompt is empty".into()));
    }

    let request = ImageRequest {
        model: ctx.config.image_model.clone(),
        prompt: styled_prompt(image_prompt),
    };

    let attachments = ctx
        .backend
        .generate_image(&ctx.client, &ctx.base_url, &request)
        .await?;
    debug!("image call returned {} attachment(s)", attachments.len());

    attachments
        .into_iter()
        .find(|a| a.media_type.starts_with(IMAGE_MEDIA_PREFIX))
        .map(|a| StoryImage {
            media_type: a.media_type,
            data: a.data,
        })
        .ok_or(StoryError::NoImageProduced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use std::sync::Arc;

    fn ctx_with(mock: MockBackend) -> (StoryCtx, Arc<MockBackend>) {
        let mock = Arc::new(mock);
        let ctx = StoryCtx::builder().backend(mock.clone()).build();
        (ctx, mock)
    }

    #[tokio::test]
    async fn test_request_image_returns_decoded_payload() {
        let (ctx, _mock) =
            ctx_with(MockBackend::new().with_image("image/png", vec![0x89, 0x50, 0x4e, 0x47]));

        let image = request_image(&ctx, "pirate ship, storm, pixel art").await.unwrap();
        assert_eq!(image.media_type, "image/png");
        assert_eq!(image.data, vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[tokio::test]
    async fn test_prompt_carries_preamble_and_scene() {
        let (ctx, mock) = ctx_with(MockBackend::new());

        request_image(&ctx, "pirate ship, storm, pixel art").await.unwrap();

        let prompts = mock.image_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Create a high-quality 8-bit pixel art style image"));
        assert!(prompts[0].contains("pirate ship, storm, pixel art"));
        assert!(prompts[0].contains("limited color palette"));
    }

    #[tokio::test]
    async fn test_no_image_attachment_is_distinct_failure() {
        let (ctx, _mock) = ctx_with(MockBackend::new().with_no_attachments());

        let err = request_image(&ctx, "scene").await.unwrap_err();
        assert!(matches!(err, StoryError::NoImageProduced));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let (ctx, _mock) = ctx_with(MockBackend::new().with_image_failure("dns failure"));

        let err = request_image(&ctx, "scene").await.unwrap_err();
        assert!(!matches!(err, StoryError::NoImageProduced));
        assert!(err.to_string().contains("dns failure"));
    }

    #[tokio::test]
    async fn test_blank_prompt_rejected_without_network_call() {
        let (ctx, mock) = ctx_with(MockBackend::new());

        let err = request_image(&ctx, "   ").await.unwrap_err();
        assert!(matches!(err, StoryError::InvalidInput(_)));
        assert!(mock.image_prompts().is_empty());
    }

    #[tokio::test]
    async fn test_first_image_attachment_wins_over_non_images() {
        use crate::backend::Attachment;
        let (ctx, _mock) = ctx_with(MockBackend::new().with_attachments(vec![
            Attachment {
                media_type: "text/plain".into(),
                data: b"caption".to_vec(),
            },
            Attachment {
                media_type: "image/jpeg".into(),
                data: vec![0xff, 0xd8],
            },
            Attachment {
                media_type: "image/png".into(),
                data: vec![0x89],
            },
        ]));

        let image = request_image(&ctx, "scene").await.unwrap();
        assert_eq!(image.media_type, "image/jpeg");
        assert_eq!(image.data, vec![0xff, 0xd8]);
    }
}
