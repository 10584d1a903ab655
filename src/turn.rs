//! Turn data model: requests, streamed snapshots, and completed turns.
//!
//! A *turn* is one request/response cycle producing a new story
//! description, action choices, and (optionally) an illustration.
//! While the story call streams, the best-known value of the turn is a
//! [`TurnSnapshot`] whose fields may still be missing or truncated.
//! A snapshot always *replaces* the previous one wholesale — consumers
//! must never merge fields across snapshots.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Language;

/// Transient value describing one story call.
///
/// An empty `previous_description` together with a `None` action marks
/// the opening turn; anything else is a continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    /// The topic chosen when the session started.
    pub topic: String,
    /// Description produced by the previous turn; empty on the opening turn.
    pub previous_description: String,
    /// The action the player chose; `None` on the opening turn.
    pub user_action: Option<String>,
    /// Narrative language for this session.
    pub language: Language,
}

impl TurnRequest {
    /// Build the opening request for a fresh session.
    pub fn opening(topic: impl Into<String>, language: Language) -> Self {
        Self {
            topic: topic.into(),
            previous_description: String::new(),
            user_action: None,
            language,
        }
    }

    /// Build a continuation request from the previous turn's description
    /// and the player's chosen action.
    pub fn continuation(
        topic: impl Into<String>,
        previous_description: impl Into<String>,
        user_action: impl Into<String>,
        language: Language,
    ) -> Self {
        Self {
            topic: topic.into(),
            previous_description: previous_description.into(),
            user_action: Some(user_action.into()),
            language,
        }
    }

    /// Whether this request describes the opening turn.
    pub fn is_opening(&self) -> bool {
        self.previous_description.is_empty() && self.user_action.is_none()
    }
}

/// Partially streamed turn output.
///
/// Any field may be absent or truncated mid-stream. The terminal
/// snapshot of a successful stream has all three fields populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TurnSnapshot {
    /// The story text so far.
    pub description: Option<String>,
    /// Suggested next actions, rendered in order.
    pub suggested_actions: Vec<String>,
    /// English image-generation prompt for the scene.
    pub image_prompt: Option<String>,
}

impl TurnSnapshot {
    /// Leniently extract a snapshot from a JSON value.
    ///
    /// Unknown fields are ignored; non-string array entries are dropped
    /// (the model occasionally emits a trailing partial element).
    pub fn from_value(value: &Value) -> Self {
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let suggested_actions = value
            .get("suggestedActions")
            .and_then(Value::as_array)
            .map(|actions| {
                actions
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let image_prompt = value
            .get("imagePrompt")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            description,
            suggested_actions,
            image_prompt,
        }
    }

    /// Whether all three fields have arrived.
    pub fn is_complete(&self) -> bool {
        self.description.is_some() && !self.suggested_actions.is_empty() && self.image_prompt.is_some()
    }
}

impl From<StoryTurn> for TurnSnapshot {
    fn from(turn: StoryTurn) -> Self {
        Self {
            description: Some(turn.description),
            suggested_actions: turn.suggested_actions,
            image_prompt: Some(turn.image_prompt),
        }
    }
}

/// A completed turn: the terminal shape with all fields required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryTurn {
    /// The story description for this scene.
    pub description: String,
    /// 3–4 suggested actions for the player.
    pub suggested_actions: Vec<String>,
    /// English pixel-art prompt for the scene illustration.
    pub image_prompt: String,
}

impl StoryTurn {
    /// Split the description into display paragraphs.
    ///
    /// The prompt contract asks the model to separate paragraphs with a
    /// blank line; whitespace-only lines count as blank.
    pub fn paragraphs(&self) -> Vec<String> {
        let mut paragraphs = Vec::new();
        let mut current = String::new();
        for line in self.description.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    paragraphs.push(std::mem::take(&mut current));
                }
            } else {
                if !current.is_empty() {
                    current.push('\n');
                }
                current.push_str(line.trim_end());
            }
        }
        if !current.is_empty() {
            paragraphs.push(current);
        }
        paragraphs
    }
}

/// A decoded scene illustration, ready for direct rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryImage {
    /// Declared media type, e.g. `image/png`.
    pub media_type: String,
    /// Raw image bytes.
    pub data: Vec<u8>,
}

impl StoryImage {
    /// Render as a `data:` URI for embedding in HTML/webview hosts.
    pub fn to_data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{}", self.media_type, encoded)
    }
}
