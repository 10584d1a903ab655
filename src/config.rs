//! Session configuration: supported languages, example topics, models.
//!
//! The core consumes this configuration but does not own it — the host
//! application decides which language the player picked and which models
//! to use. Everything here has sensible defaults matching the hosted
//! service the crate was written against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoryError;

/// Example topics a front end can offer on the start screen.
///
/// Presentation-only; the session accepts any non-blank topic string.
pub const EXAMPLE_TOPICS: [&str; 9] = [
    "Cyberpunk hacker",
    "Pirate treasure hunt",
    "Zombie apocalypse",
    "Time travel paradox",
    "Alien first contact",
    "Haunted mansion",
    "Wild west outlaw",
    "Underwater exploration",
    "Medieval fantasy quest",
];

/// The fixed set of languages the narrative can be written in.
///
/// Image prompts are always produced in English regardless of the
/// narrative language — see [`prompt`](crate::prompt).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Spanish,
    English,
    French,
    German,
    Italian,
    Portuguese,
}

impl Language {
    /// All supported languages, in display order.
    pub const ALL: [Language; 6] = [
        Language::Spanish,
        Language::English,
        Language::French,
        Language::German,
        Language::Italian,
        Language::Portuguese,
    ];

    /// Lowercase identifier used in prompts and wire formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Spanish => "spanish",
            Language::English => "english",
            Language::French => "french",
            Language::German => "german",
            Language::Italian => "italian",
            Language::Portuguese => "portuguese",
        }
    }

    /// Native-script label for selection UIs.
    pub fn label(&self) -> &'static str {
        match self {
            Language::Spanish => "Español",
            Language::English => "English",
            Language::French => "Français",
            Language::German => "Deutsch",
            Language::Italian => "Italiano",
            Language::Portuguese => "Português",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.as_str() == needle)
            .ok_or_else(|| StoryError::InvalidInput(format!("unsupported language: {s:?}")))
    }
}

/// Models and generation settings for one session.
#[derive(Debug, Clone)]
pub struct StoryConfig {
    /// Model used for the streaming story call.
    pub text_model: String,

    /// Model used for the scene illustration call.
    pub image_model: String,

    /// Sampling temperature for story generation.
    pub temperature: f64,

    /// Maximum tokens the story call may produce.
    pub max_output_tokens: u32,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            text_model: "gemini-2.5-flash-lite".to_string(),
            image_model: "gemini-2.5-flash-image-preview".to_string(),
            temperature: 0.9,
            max_output_tokens: 2048,
        }
    }
}

impl StoryConfig {
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_language_is_spanish() {
        assert_eq!(Language::default(), Language::Spanish);
    }

    #[test]
    fn test_language_round_trips_through_str() {
        for lang in Language::ALL {
            assert_eq!(lang.as_str().parse::<Language>().unwrap(), lang);
        }
    }

    #[test]
    fn test_language_parse_is_case_insensitive() {
        assert_eq!("English".parse::<Language>().unwrap(), Language::English);
        assert_eq!(" FRENCH ".parse::<Language>().unwrap(), Language::French);
    }

    #[test]
    fn test_language_parse_rejects_unknown() {
        assert!("klingon".parse::<Language>().is_err());
        assert!("".parse::<Language>().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = StoryConfig::default();
        assert_eq!(config.text_model, "gemini-2.5-flash-lite");
        assert_eq!(config.image_model, "gemini-2.5-flash-image-preview");
        assert_eq!(config.max_output_tokens, 2048);
    }

    #[test]
    fn test_config_builder() {
        let config = StoryConfig::default()
            .with_text_model("gemini-2.0-flash")
            .with_temperature(0.5)
            .with_max_output_tokens(4096);
        assert_eq!(config.text_model, "gemini-2.0-flash");
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.max_output_tokens, 4096);
    }
}
