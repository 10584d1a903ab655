//! Session lifecycle events for live UIs.
//!
//! The session controller emits an event every time observable state
//! changes: a turn starts, a streamed snapshot lands, the illustration
//! arrives or is skipped. A front end can implement [`EventHandler`] to
//! repaint instead of polling [`snapshot`](crate::session::StorySession::snapshot).
//! Entirely optional — the session works without a handler.

use std::sync::Arc;

use crate::turn::{StoryTurn, TurnSnapshot};

/// Events emitted during a session's life.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A turn's story stream has been issued.
    TurnStarted {
        /// Generation token identifying the turn.
        generation: u64,
    },
    /// A partial snapshot replaced the current turn state.
    SnapshotUpdated {
        generation: u64,
        snapshot: TurnSnapshot,
    },
    /// The story stream completed; the illustration call is next.
    TurnCompleted {
        generation: u64,
        turn: StoryTurn,
    },
    /// The scene illustration arrived.
    ImageReady {
        generation: u64,
        media_type: String,
    },
    /// The illustration failed softly; the turn is readable without it.
    ImageSkipped {
        generation: u64,
        reason: String,
    },
    /// The story stream failed; the turn is over.
    TurnFailed {
        generation: u64,
        reason: String,
    },
    /// The session returned to its initial state.
    SessionReset,
}

/// Handler for session lifecycle events.
///
/// # Example
///
/// ```
/// use storyteller::events::{EventHandler, SessionEvent};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: SessionEvent) {
///         if let SessionEvent::SnapshotUpdated { snapshot, .. } = event {
///             if let Some(text) = snapshot.description {
///                 println!("{text}");
///             }
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called on every observable state change.
    fn on_event(&self, event: SessionEvent);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: SessionEvent) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use storyteller::events::{FnEventHandler, SessionEvent};
///
/// let handler = Arc::new(FnEventHandler(|event: SessionEvent| {
///     if let SessionEvent::TurnFailed { reason, .. } = event {
///         eprintln!("turn failed: {reason}");
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(SessionEvent) + Send + Sync>(pub F);

impl<F: Fn(SessionEvent) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: SessionEvent) {
        (self.0)(event);
    }
}
