//! # Storyteller
//!
//! Streaming session controller for LLM-driven interactive fiction.
//!
//! This crate is the core of a choose-your-own-adventure front end: it
//! turns a sequence of player actions into an ordered conversation with
//! a hosted text-generation service, surfaces the structured story
//! output *while it streams*, and sequences a dependent image-generation
//! call after each turn completes. Presentation (layout, theming,
//! routing) is a consumer of this crate, not part of it.
//!
//! ## Core Concepts
//!
//! - **[`StorySession`]** — the turn-by-turn state machine. Owns all
//!   mutable state for one story; `start` / `continue_story` / `reset`.
//! - **[`TurnSnapshot`]** — the partially streamed turn. Every update
//!   replaces the whole snapshot; fields are never merged across
//!   snapshots.
//! - **[`Backend`](backend::Backend)** — object-safe boundary to the
//!   hosted services. [`GeminiBackend`](backend::GeminiBackend) talks to
//!   the real API; [`MockBackend`](backend::MockBackend) plays back
//!   scripts for tests and offline demos.
//! - **[`StoryCtx`]** — shared context: HTTP client, base URL, backend,
//!   models, optional event handler.
//! - **[`SessionEvent`](events::SessionEvent)** — lifecycle events a UI
//!   can subscribe to instead of polling.
//!
//! ## Quick Start
//!
//! ```no_run
//! use storyteller::{Language, StoryCtx, StorySession};
//!
//! #[tokio::main]
//! async fn main() -> storyteller::Result<()> {
//!     let ctx = StoryCtx::builder()
//!         .api_key(std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY"))
//!         .build();
//!     let session = StorySession::new(ctx);
//!
//!     session.start("pirate treasure hunt", Language::English).await?;
//!
//!     let view = session.snapshot();
//!     if let Some(turn) = view.turn {
//!         println!("{}", turn.description.unwrap_or_default());
//!         for action in turn.suggested_actions {
//!             println!("> {action}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Turn lifecycle
//!
//! ```text
//! Idle ──start──► StreamingText ──stream ok──► AwaitingImage ──► Ready
//!                      │                            │              │
//!                  stream err                  image err        continue
//!                      ▼                       (soft: Ready)       │
//!                   Failed ◄────────────────────────────────── StreamingText
//! ```
//!
//! Text failures are terminal for the turn and visible to the caller;
//! image failures are soft — the narrative is never blocked by a
//! missing illustration.

pub mod backend;
pub mod config;
pub mod ctx;
pub mod error;
pub mod events;
pub mod image;
pub mod parser;
pub mod prompt;
pub mod session;
pub mod stream;
pub mod turn;

pub use backend::{Backend, GeminiBackend, MockBackend};
pub use config::{Language, StoryConfig, EXAMPLE_TOPICS};
pub use ctx::{StoryCtx, StoryCtxBuilder};
pub use error::{Result, StoryError};
pub use events::{EventHandler, FnEventHandler, SessionEvent};
pub use image::request_image;
pub use session::{Phase, SessionView, StorySession};
pub use stream::stream_turn;
pub use turn::{StoryImage, StoryTurn, TurnRequest, TurnSnapshot};
