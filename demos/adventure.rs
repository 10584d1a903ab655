//! Example: interactive adventure against the live service.
//!
//! Requires `GEMINI_API_KEY`. Run with: `cargo run --example adventure`

use std::io::{self, BufRead, Write};

use storyteller::{Language, Phase, StoryCtx, StorySession, EXAMPLE_TOPICS};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| "set GEMINI_API_KEY to run this example")?;

    let ctx = StoryCtx::builder().api_key(api_key).build();
    let session = StorySession::new(ctx);

    println!("Pick a topic (or type your own):");
    for topic in EXAMPLE_TOPICS {
        println!("  - {topic}");
    }
    print!("topic> ");
    io::stdout().flush()?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let topic = lines.next().unwrap_or(Ok(String::new()))?;

    session.start(&topic, Language::English).await?;

    loop {
        let view = session.snapshot();
        if view.phase == Phase::Failed {
            println!(
                "(the storyteller stumbled: {})",
                view.failure.clone().unwrap_or_default(),
            );
            if view.turn.is_none() {
                // Nothing to continue from; only a fresh start would help.
                break;
            }
        }

        let turn = view.turn.expect("completed turn");
        if let Some(description) = turn.description.as_deref() {
            println!();
            for paragraph in description.split("\n\n") {
                println!("{}\n", paragraph.trim());
            }
        }
        if view.image.is_some() {
            println!("(a scene illustration arrived)");
        }

        println!("What do you do next?");
        for (i, action) in turn.suggested_actions.iter().enumerate() {
            println!("  {}. {action}", i + 1);
        }
        print!("action (number, text, or 'quit')> ");
        io::stdout().flush()?;

        let input = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") {
            break;
        }

        let action = match input.parse::<usize>() {
            Ok(n) if n >= 1 && n <= turn.suggested_actions.len() => {
                turn.suggested_actions[n - 1].clone()
            }
            _ => input.to_string(),
        };

        println!("\n...");
        if let Err(err) = session.continue_story(&action).await {
            println!("turn failed ({err}); try again or 'quit'");
        }
    }

    Ok(())
}
