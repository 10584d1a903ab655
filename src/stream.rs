//! Structured story stream client.
//!
//! [`stream_turn`] issues one streaming story call, surfaces each
//! parseable prefix as a replacement [`TurnSnapshot`], and returns the
//! terminal [`StoryTurn`] once the stream resolves to the full
//! three-field shape. Exactly one network call per invocation; no
//! retries — a retry is the caller re-issuing the operation.

use log::debug;

use crate::backend::TextRequest;
use crate::ctx::StoryCtx;
use crate::error::{Result, StoryError};
use crate::parser::{complete_truncated_json, SnapshotParser};
use crate::prompt;
use crate::turn::{StoryTurn, TurnRequest, TurnSnapshot};

/// Stream one story turn.
///
/// `on_snapshot` receives every *changed* partial snapshot in stream
/// order; each one fully replaces the previous. If the call fails, any
/// snapshots already delivered are unusable and must be discarded by
/// the caller.
pub async fn stream_turn(
    ctx: &StoryCtx,
    request: &TurnRequest,
    on_snapshot: &mut (dyn FnMut(TurnSnapshot) + Send),
) -> Result<StoryTurn> {
    if request.is_opening() && request.topic.trim().is_empty() {
        return Err(StoryError::InvalidInput(
            "opening turn requires a non-empty topic".into(),
        ));
    }

    let instruction = if request.is_opening() {
        prompt::opening_prompt(&request.topic, request.language)
    } else {
        prompt::continuation_prompt(
            &request.previous_description,
            request.user_action.as_deref().unwrap_or_default(),
            request.language,
        )
    };

    let text_request = TextRequest {
        model: ctx.config.text_model.clone(),
        prompt: instruction,
        temperature: ctx.config.temperature,
        max_output_tokens: ctx.config.max_output_tokens,
    };

    let mut parser = SnapshotParser::new();
    let mut on_chunk = |chunk: String| {
        if let Some(snapshot) = parser.push(&chunk) {
            on_snapshot(snapshot);
        }
    };

    let response = ctx
        .backend
        .stream_story(&ctx.client, &ctx.base_url, &text_request, &mut on_chunk)
        .await?;
    debug!(
        "story stream finished: {} bytes, status {}",
        response.text.len(),
        response.status
    );

    finalize(&response.text)
}

/// Strictly parse the accumulated stream text into a completed turn.
fn finalize(text: &str) -> Result<StoryTurn> {
    if text.trim().is_empty() {
        return Err(StoryError::MalformedOutput("stream produced no text".into()));
    }
    let completed = complete_truncated_json(text)
        .ok_or_else(|| StoryError::MalformedOutput("stream text is not a JSON object".into()))?;
    let turn: StoryTurn = serde_json::from_str(&completed)
        .map_err(|e| StoryError::MalformedOutput(format!("missing or mistyped turn field: {e}")))?;
    if turn.description.trim().is_empty() {
        return Err(StoryError::MalformedOutput("turn description is empty".into()));
    }
    Ok(turn)
}
