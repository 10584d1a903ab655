//! Prompt construction for the story model.
//!
//! Pure text formatting: no parsing, no networking, no session logic.
//! The instruction text is load-bearing — downstream parsing splits
//! paragraphs on [`PARAGRAPH_BREAK`], and the image client assumes the
//! image prompt is English and free of UI chrome. Changing the wording
//! here changes the contract with the consuming layers.

use crate::config::Language;

/// Delimiter the model is instructed to place between paragraphs.
/// Display layers split the description on this sequence.
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// Image prompts are always written in this language, regardless of the
/// narrative language, so the image model receives consistent input.
pub const IMAGE_PROMPT_LANGUAGE: &str = "English";

/// Build the instruction for the opening turn of a session.
pub fn opening_prompt(topic: &str, language: Language) -> String {
    format!(
        "You are a masterful interactive storyteller creating immersive narrative experiences. \
Create a captivating opening scenario based on the topic: \"{topic}\".\n\n\
{}\n\n\
Generate:\n\
1. A rich, immersive description of the initial scenario (2 paragraphs). This is the opening \
scene, so create a detailed world with good atmosphere, sensory details, and engaging context. \
Each paragraph should be 3-4 sentences with descriptive language that draws the reader in. \
{}\n\
2. 3-4 specific, engaging action options for the user to choose from. Each action should be \
meaningful, distinct, and lead to different narrative paths.\n\
3. {}\n\n\
Create a rich, immersive world that begs for exploration and makes every choice feel consequential.",
        requirements(language),
        paragraph_rule(),
        image_prompt_rule("style image"),
    )
}

/// Build the instruction for a continuation turn.
pub fn continuation_prompt(previous_description: &str, user_action: &str, language: Language) -> String {
    format!(
        "Continue this masterful interactive story based on the user's chosen action. Maintain \
narrative consistency while advancing the plot meaningfully.\n\n\
Previous story: {previous_description}\n\n\
User's chosen action: \"{user_action}\"\n\n\
{}\n\n\
Generate:\n\
1. An engaging continuation of the story based on the user's action (1-2 paragraphs). Show the \
consequences of their choice and introduce new developments or discoveries. Each paragraph should \
be 3-4 sentences with good descriptions and narrative flow. {}\n\
2. 3-4 new specific action options that naturally emerge from the current situation. Each should \
offer meaningful choices that could lead to different story branches.\n\
3. {}\n\n\
Ensure narrative coherence while keeping the story dynamic and engaging. Build upon established \
elements while introducing fresh challenges or revelations.",
        requirements(language),
        paragraph_rule(),
        image_prompt_rule("style image representing this new scene"),
    )
}

fn requirements(language: Language) -> String {
    format!(
        "IMPORTANT REQUIREMENTS:\n\
- Write the story description and suggested actions in {}\n\
- Make the imagePrompt in {IMAGE_PROMPT_LANGUAGE} and highly detailed for 8-bit/pixel art generation",
        language.as_str(),
    )
}

fn paragraph_rule() -> String {
    format!(
        "IMPORTANT: You MUST separate each paragraph with exactly two newline characters \
({:?}) - this is critical for proper formatting.",
        PARAGRAPH_BREAK,
    )
}

fn image_prompt_rule(scene_phrase: &str) -> String {
    format!(
        "A comprehensive, detailed {IMAGE_PROMPT_LANGUAGE} prompt for generating an 8-bit/pixel art \
{scene_phrase}. Focus ONLY on the scene itself - NO user interface elements, NO health bars, \
NO menu items, NO buttons, NO text overlays. Include specific visual elements: character details, \
environment, lighting, mood, colors, composition, and pure artistic style reminiscent of classic \
video game artwork (not screenshots). Create a clean, cinematic scene that looks like concept art \
or a painting.",
    )
}
