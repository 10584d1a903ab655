//! Example: driving a full session offline with MockBackend.
//!
//! Run with: `cargo run --example offline_session`

use std::sync::Arc;

use storyteller::{FnEventHandler, Language, MockBackend, SessionEvent, StoryCtx, StorySession};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Script the opening turn in three chunks, the way a live stream
    // would deliver it, plus a continuation turn and an illustration.
    let mock = MockBackend::new()
        .with_story(vec![
            r#"{"description": "Salt spray stings your eyes as the Crimson Gull heels"#,
            r#" into the wind. Somewhere past the reef, the wreck waits.", "suggestedActions": ["Climb the rigging""#,
            r#", "Consult the torn map", "Ask the bosun about the reef"], "imagePrompt": "pirate ship at sea, stormy sky, pixel art"}"#,
        ])
        .with_image("image/png", vec![0x89, 0x50, 0x4e, 0x47])
        .with_story(vec![
            r#"{"description": "The map fragment shows a cove marked with an X.", "suggestedActions": ["Sail for the cove", "Wait for nightfall"], "imagePrompt": "treasure map on wooden table, pixel art"}"#,
        ]);

    // Print the story as it streams in.
    let handler = Arc::new(FnEventHandler(|event: SessionEvent| match event {
        SessionEvent::SnapshotUpdated { snapshot, .. } => {
            if let Some(text) = snapshot.description {
                println!("[streaming] {text}");
            }
        }
        SessionEvent::TurnCompleted { .. } => println!("[turn complete]"),
        SessionEvent::ImageReady { media_type, .. } => println!("[illustration: {media_type}]"),
        SessionEvent::ImageSkipped { reason, .. } => println!("[no illustration: {reason}]"),
        _ => {}
    }));

    let ctx = StoryCtx::builder()
        .backend(Arc::new(mock))
        .event_handler(handler)
        .build();
    let session = StorySession::new(ctx);

    session.start("pirate treasure hunt", Language::English).await?;

    let view = session.snapshot();
    let turn = view.turn.expect("completed turn");
    println!("\n=== Opening scene ===");
    println!("{}", turn.description.unwrap_or_default());
    println!("\nWhat do you do next?");
    for action in &turn.suggested_actions {
        println!("> {action}");
    }

    // Take the second suggestion.
    let action = turn.suggested_actions[1].clone();
    println!("\n(choosing: {action})\n");
    session.continue_story(&action).await?;

    let view = session.snapshot();
    println!("=== Next scene ===");
    println!("{}", view.turn.unwrap().description.unwrap_or_default());

    Ok(())
}
