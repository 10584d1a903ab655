//! Session controller: the turn-by-turn state machine.
//!
//! [`StorySession`] owns all mutable state for one story. Each turn
//! walks `StreamingText → AwaitingImage → Ready`, with `Failed`
//! reachable from the first two. The driver methods are plain `async
//! fn`s — a host that wants a responsive UI spawns them and watches
//! state through [`snapshot`](StorySession::snapshot) or the event
//! handler on the context.
//!
//! Supersession: every turn captures a generation token at start; any
//! state application checks the token first, so results from a turn
//! that was superseded (a newer `start` or a `reset`) are dropped
//! rather than applied. Upstream calls are never cancelled at the
//! transport level — cancellation is logical.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

use crate::config::Language;
use crate::ctx::StoryCtx;
use crate::error::{Result, StoryError};
use crate::events::{emit, SessionEvent};
use crate::image;
use crate::stream;
use crate::turn::{StoryImage, StoryTurn, TurnRequest, TurnSnapshot};

/// Where the session stands in the turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No topic chosen yet.
    Idle,
    /// The story stream for the current turn is in flight.
    StreamingText,
    /// The story arrived; the illustration call is in flight.
    AwaitingImage,
    /// The turn is complete and the next action can be taken.
    Ready,
    /// The story stream failed; the turn is over.
    Failed,
}

/// Read model of a session, cloned out for the presentation layer.
#[derive(Debug, Clone)]
pub struct SessionView {
    /// The topic chosen at session start; `None` while idle.
    pub topic: Option<String>,
    /// Narrative language for this session.
    pub language: Language,
    /// Best-known value of the current turn, partial while streaming.
    pub turn: Option<TurnSnapshot>,
    /// The current turn's illustration, once it has arrived.
    pub image: Option<StoryImage>,
    /// Current phase.
    pub phase: Phase,
    /// Human-readable cause when `phase` is [`Phase::Failed`].
    pub failure: Option<String>,
}

#[derive(Debug)]
struct SessionState {
    topic: Option<String>,
    language: Language,
    turn: Option<TurnSnapshot>,
    /// The last turn whose stream ran to completion. Continuations
    /// build on this, never on partials of a failed stream.
    last_completed: Option<StoryTurn>,
    image: Option<StoryImage>,
    phase: Phase,
    failure: Option<String>,
    generation: u64,
}

impl SessionState {
    fn new() -> Self {
        Self {
            topic: None,
            language: Language::default(),
            turn: None,
            last_completed: None,
            image: None,
            phase: Phase::Idle,
            failure: None,
            generation: 0,
        }
    }

    fn view(&self) -> SessionView {
        SessionView {
            topic: self.topic.clone(),
            language: self.language,
            turn: self.turn.clone(),
            image: self.image.clone(),
            phase: self.phase,
            failure: self.failure.clone(),
        }
    }
}

/// The streaming narrative session controller.
///
/// Cheap to clone; clones share the same session. Independent sessions
/// (separate `StorySession` values) share nothing but the immutable
/// context.
///
/// # Example
///
/// ```no_run
/// use storyteller::{Language, StoryCtx, StorySession};
///
/// # async fn run() -> storyteller::Result<()> {
/// let ctx = StoryCtx::builder().api_key("AIza...").build();
/// let session = StorySession::new(ctx);
///
/// session.start("pirate treasure hunt", Language::English).await?;
/// let view = session.snapshot();
/// for action in &view.turn.unwrap().suggested_actions {
///     println!("> {action}");
/// }
/// session.continue_story("Board the ship").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StorySession {
    ctx: Arc<StoryCtx>,
    state: Arc<Mutex<SessionState>>,
}

impl StorySession {
    /// Create a session owning its context.
    pub fn new(ctx: StoryCtx) -> Self {
        Self::with_shared_ctx(Arc::new(ctx))
    }

    /// Create a session sharing a context with other sessions.
    pub fn with_shared_ctx(ctx: Arc<StoryCtx>) -> Self {
        Self {
            ctx,
            state: Arc::new(Mutex::new(SessionState::new())),
        }
    }

    /// Clone out the current observable state.
    pub fn snapshot(&self) -> SessionView {
        self.lock().view()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// Start a new story and drive its opening turn to completion.
    ///
    /// Valid from any phase: starting a new story supersedes whatever
    /// turn is in flight — the old turn's late results are discarded.
    /// A blank topic is rejected before any state change.
    pub async fn start(&self, topic: &str, language: Language) -> Result<()> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(StoryError::InvalidInput("topic must not be blank".into()));
        }

        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.topic = Some(topic.to_string());
            state.language = language;
            state.turn = None;
            state.last_completed = None;
            state.image = None;
            state.failure = None;
            state.phase = Phase::StreamingText;
            state.generation
        };
        debug!("session start: topic={topic:?} language={language} generation={generation}");
        emit(&self.ctx.event_handler, SessionEvent::TurnStarted { generation });

        self.run_turn(generation, TurnRequest::opening(topic, language)).await
    }

    /// Advance the story with the player's chosen action.
    ///
    /// Valid from [`Phase::Ready`], and from [`Phase::Failed`] when a
    /// completed turn exists to continue from (this is the retry path
    /// for a failed continuation). Any other phase is rejected with
    /// [`StoryError::InvalidTransition`] — no state change, no network
    /// call. A blank action is rejected the same way.
    pub async fn continue_story(&self, action: &str) -> Result<()> {
        let (generation, request) = {
            let mut state = self.lock();
            let previous = match (state.phase, &state.last_completed) {
                (Phase::Ready, Some(turn)) | (Phase::Failed, Some(turn)) => {
                    turn.description.clone()
                }
                _ => {
                    return Err(StoryError::InvalidTransition {
                        operation: "continue",
                        phase: state.phase,
                    })
                }
            };
            let action = action.trim();
            if action.is_empty() {
                return Err(StoryError::InvalidInput("action must not be blank".into()));
            }
            let topic = state.topic.clone().unwrap_or_default();
            let language = state.language;

            state.generation += 1;
            state.image = None;
            state.failure = None;
            state.phase = Phase::StreamingText;
            (
                state.generation,
                TurnRequest::continuation(topic, previous, action, language),
            )
        };
        debug!("session continue: generation={generation}");
        emit(&self.ctx.event_handler, SessionEvent::TurnStarted { generation });

        self.run_turn(generation, request).await
    }

    /// Discard topic, turn, and image and return to [`Phase::Idle`].
    ///
    /// Valid from any state; supersedes any in-flight turn.
    pub fn reset(&self) {
        {
            let mut state = self.lock();
            let generation = state.generation + 1;
            *state = SessionState::new();
            state.generation = generation;
        }
        emit(&self.ctx.event_handler, SessionEvent::SessionReset);
    }

    /// Drive one turn: stream the story, then fetch the illustration.
    async fn run_turn(&self, generation: u64, request: TurnRequest) -> Result<()> {
        let state = Arc::clone(&self.state);
        let handler = self.ctx.event_handler.clone();
        let mut on_snapshot = |snapshot: TurnSnapshot| {
            let mut guard = state.lock().expect("session state lock poisoned");
            if guard.generation != generation {
                return;
            }
            guard.turn = Some(snapshot.clone());
            drop(guard);
            emit(&handler, SessionEvent::SnapshotUpdated { generation, snapshot });
        };

        let turn = match stream::stream_turn(&self.ctx, &request, &mut on_snapshot).await {
            Ok(turn) => turn,
            Err(err) => {
                let reason = err.to_string();
                {
                    let mut guard = self.lock();
                    if guard.generation != generation {
                        return Err(StoryError::Superseded);
                    }
                    guard.phase = Phase::Failed;
                    guard.failure = Some(reason.clone());
                    // Partials of the failed stream are unusable; fall
                    // back to the last completed turn for display.
                    guard.turn = guard.last_completed.clone().map(TurnSnapshot::from);
                }
                emit(&self.ctx.event_handler, SessionEvent::TurnFailed { generation, reason });
                return Err(err);
            }
        };

        {
            let mut guard = self.lock();
            if guard.generation != generation {
                return Err(StoryError::Superseded);
            }
            guard.turn = Some(turn.clone().into());
            guard.last_completed = Some(turn.clone());
            guard.phase = Phase::AwaitingImage;
        }
        emit(
            &self.ctx.event_handler,
            SessionEvent::TurnCompleted { generation, turn: turn.clone() },
        );

        match image::request_image(&self.ctx, &turn.image_prompt).await {
            Ok(image) => {
                let media_type = image.media_type.clone();
                {
                    let mut guard = self.lock();
                    if guard.generation != generation {
                        return Err(StoryError::Superseded);
                    }
                    guard.image = Some(image);
                    guard.phase = Phase::Ready;
                }
                emit(&self.ctx.event_handler, SessionEvent::ImageReady { generation, media_type });
            }
            Err(err) => {
                // Illustration is decorative: the turn stays readable.
                warn!("scene illustration skipped: {err}");
                let reason = err.to_string();
                {
                    let mut guard = self.lock();
                    if guard.generation != generation {
                        return Err(StoryError::Superseded);
                    }
                    guard.phase = Phase::Ready;
                }
                emit(&self.ctx.event_handler, SessionEvent::ImageSkipped { generation, reason });
            }
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state lock poisoned")
    }
}
