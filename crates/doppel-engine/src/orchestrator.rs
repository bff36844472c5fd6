//! Turn orchestrator: one live session.
//!
//! ```text
//! Idle ──submit──▶ Buffering ──quiet period──▶ Dispatched ──reply──▶ StreamingReply ──▶ Idle
//!                   ▲    │ submit restarts the timer
//!                   └────┘
//! ```
//!
//! Input that arrives while a reply is being paced is not merged into it;
//! it starts the next buffering cycle. Dispatches run one at a time.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use doppel_context::{ContextHandle, ImportError, ImportOutcome, ImportSource, Importer, LoadedContext};
use doppel_core::{
    ChatEvent, ChatMessage, CompletionOptions, CompletionProvider, CompletionRequest, DispatchId,
    NoticeLevel, ServiceError, SessionId,
};

use crate::debounce::Debouncer;
use crate::error::{DispatchOutcome, EngineError};
use crate::history::{ShortTermHistory, DEFAULT_HISTORY_CAP};
use crate::prompt::PromptBuilder;
use crate::reply::{PacingPolicy, ReplyPlan};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Uniformly random pause before the service call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThinkingDelay {
    pub min: Duration,
    pub max: Duration,
}

impl Default for ThinkingDelay {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(1000),
            max: Duration::from_millis(2500),
        }
    }
}

impl ThinkingDelay {
    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let min = u64::try_from(self.min.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Quiet period after the last input before dispatch.
    pub debounce: Duration,
    pub thinking: ThinkingDelay,
    pub history_cap: usize,
    pub pacing: PacingPolicy,
    pub chat_options: CompletionOptions,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1500),
            thinking: ThinkingDelay::default(),
            history_cap: DEFAULT_HISTORY_CAP,
            pacing: PacingPolicy::default(),
            chat_options: CompletionOptions::chat(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    /// Input pending, debounce timer running.
    Buffering,
    /// Waiting on the thinking delay or the service.
    Dispatched,
    /// Delivering reply segments.
    StreamingReply,
}

struct Shared {
    session_id: SessionId,
    provider: Arc<dyn CompletionProvider>,
    context: ContextHandle,
    prompt: PromptBuilder,
    config: OrchestratorConfig,
    pending: Mutex<Vec<String>>,
    history: Mutex<ShortTermHistory>,
    state: Mutex<TurnState>,
    /// Held from taking the buffer until the reply is delivered, so replies
    /// never interleave.
    lane: tokio::sync::Mutex<()>,
    debouncer: Debouncer<SessionId>,
    events: broadcast::Sender<ChatEvent>,
    shutdown: CancellationToken,
}

/// Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct TurnOrchestrator {
    shared: Arc<Shared>,
}

impl TurnOrchestrator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        context: ContextHandle,
        prompt: PromptBuilder,
        config: OrchestratorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let history = ShortTermHistory::new(config.history_cap);
        Self {
            shared: Arc::new(Shared {
                session_id: SessionId::new(),
                provider,
                context,
                prompt,
                config,
                pending: Mutex::new(Vec::new()),
                history: Mutex::new(history),
                state: Mutex::new(TurnState::Idle),
                lane: tokio::sync::Mutex::new(()),
                debouncer: Debouncer::new(),
                events,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.shared.session_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.shared.events.subscribe()
    }

    pub fn state(&self) -> TurnState {
        *self.shared.state.lock()
    }

    pub fn history_snapshot(&self) -> Vec<ChatMessage> {
        self.shared.history.lock().snapshot()
    }

    pub fn context(&self) -> Arc<LoadedContext> {
        self.shared.context.snapshot()
    }

    /// Buffer one user message and restart the quiet-period timer.
    pub fn submit(&self, text: impl Into<String>) {
        let shared = &self.shared;
        if shared.shutdown.is_cancelled() {
            return;
        }
        let text = text.into();
        if text.trim().is_empty() {
            return;
        }

        shared.pending.lock().push(text.clone());
        {
            let mut state = shared.state.lock();
            if *state == TurnState::Idle {
                *state = TurnState::Buffering;
            }
        }
        shared.emit(ChatEvent::UserMessage {
            session_id: shared.session_id.clone(),
            text,
        });

        let fire = Arc::clone(shared);
        shared
            .debouncer
            .schedule(shared.session_id.clone(), shared.config.debounce, move || async move {
                let _ = fire.flush().await;
            });
    }

    /// Skip the rest of the quiet period and dispatch whatever is buffered.
    ///
    /// A dispatch already in flight finishes first, so when this resolves
    /// every accepted message has been answered or failed. `None` when
    /// nothing was left to send.
    pub async fn flush_now(&self) -> Option<Result<DispatchOutcome, EngineError>> {
        let _ = self.shared.debouncer.cancel(&self.shared.session_id);
        self.shared.flush().await
    }

    /// Swap in a new context; prompts assembled afterwards use it.
    pub fn replace_context(&self, context: LoadedContext) -> Arc<LoadedContext> {
        let chars = context.char_count();
        let previous = self.shared.context.replace(context);
        info!(session_id = %self.shared.session_id, chars, "context replaced");
        previous
    }

    /// Tell the user how much memory the session is running with.
    pub fn announce_context(&self) {
        let chars = self.shared.context.snapshot().char_count();
        self.shared
            .notice(NoticeLevel::Info, format!("Memory loaded: {chars} chars."));
    }

    /// Run an import and hot-swap the result in. On failure the current
    /// context stays active and the error is surfaced as a notice.
    pub async fn apply_import(
        &self,
        importer: &Importer,
        source: &ImportSource,
    ) -> Result<ImportOutcome, ImportError> {
        self.shared.notice(
            NoticeLevel::Info,
            format!(
                "Importing {}... this can take a few minutes.",
                source.path.display()
            ),
        );
        match importer.run(source).await {
            Ok(outcome) => {
                let chars = outcome.context.char_count();
                let _ = self.replace_context(outcome.context.clone());
                self.shared.notice(
                    NoticeLevel::Info,
                    format!("Context updated. New memory size: {chars} chars."),
                );
                Ok(outcome)
            }
            Err(e) => {
                self.shared
                    .notice(NoticeLevel::Error, format!("Import failed: {e}"));
                Err(e)
            }
        }
    }

    /// Cancel pending timers and interrupt any in-flight dispatch. The
    /// interrupted exchange is not recorded.
    pub fn shutdown(&self) {
        self.shared.debouncer.cancel_all();
        self.shared.shutdown.cancel();
    }
}

impl Shared {
    fn emit(&self, event: ChatEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn notice(&self, level: NoticeLevel, text: String) {
        self.emit(ChatEvent::SystemNotice {
            session_id: self.session_id.clone(),
            level,
            text,
        });
    }

    fn set_state(&self, state: TurnState) {
        *self.state.lock() = state;
    }

    /// The buffer is only taken while holding the lane, so a caller that
    /// finds it empty knows any earlier dispatch has already completed.
    async fn flush(&self) -> Option<Result<DispatchOutcome, EngineError>> {
        let _lane = self.lane.lock().await;
        let combined = {
            let mut pending = self.pending.lock();
            if pending.is_empty() {
                return None;
            }
            let combined = pending.join(" ");
            pending.clear();
            combined
        };
        Some(self.dispatch(combined).await)
    }

    #[instrument(skip_all, fields(session_id = %self.session_id, chars = combined.len()))]
    async fn dispatch(&self, combined: String) -> Result<DispatchOutcome, EngineError> {
        let dispatch_id = DispatchId::new();
        debug!(dispatch_id = %dispatch_id, "dispatching");

        self.set_state(TurnState::Dispatched);
        self.emit(ChatEvent::Dispatched {
            session_id: self.session_id.clone(),
            dispatch_id: dispatch_id.clone(),
            combined: combined.clone(),
        });

        let result = self.exchange(&dispatch_id, combined).await;

        let next = if self.pending.lock().is_empty() {
            TurnState::Idle
        } else {
            TurnState::Buffering
        };
        self.set_state(next);
        result
    }

    async fn exchange(
        &self,
        dispatch_id: &DispatchId,
        combined: String,
    ) -> Result<DispatchOutcome, EngineError> {
        let thinking = self.config.thinking.sample();
        if !thinking.is_zero() {
            self.pause(thinking).await?;
        }

        let context = self.context.snapshot();
        let history = self.history.lock().snapshot();
        let messages = self
            .prompt
            .build(&context.text, &history, &combined, Local::now());
        let request = CompletionRequest::new(messages, self.config.chat_options.clone());

        let reply = tokio::select! {
            () = self.shutdown.cancelled() => return Err(EngineError::Shutdown),
            reply = self.provider.complete(&request) => reply,
        };

        let (raw, plan) = match reply.and_then(into_plan) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(category = ?e.category(), error_kind = e.error_kind(), error = %e, "dispatch failed");
                self.notice(NoticeLevel::Error, format!("Error: {e}"));
                return Err(e.into());
            }
        };

        self.set_state(TurnState::StreamingReply);
        let total = plan.len();
        for segment in plan.paced(&self.config.pacing) {
            self.emit(ChatEvent::ReplySegment {
                session_id: self.session_id.clone(),
                dispatch_id: dispatch_id.clone(),
                index: segment.index,
                total,
                text: segment.text.to_string(),
            });
            if let Some(delay) = segment.delay_after {
                self.pause(delay).await?;
            }
        }

        // only a fully delivered reply is remembered
        self.history.lock().append_pair(combined.clone(), raw);
        self.emit(ChatEvent::ReplyComplete {
            session_id: self.session_id.clone(),
            dispatch_id: dispatch_id.clone(),
            segments: total,
        });
        debug!(segments = total, "reply delivered");

        Ok(DispatchOutcome {
            dispatch_id: dispatch_id.clone(),
            combined,
            segments: total,
        })
    }

    async fn pause(&self, delay: Duration) -> Result<(), EngineError> {
        tokio::select! {
            () = self.shutdown.cancelled() => Err(EngineError::Shutdown),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

fn into_plan(raw: String) -> Result<(String, ReplyPlan), ServiceError> {
    let plan = ReplyPlan::parse(&raw);
    if plan.is_empty() {
        return Err(ServiceError::MalformedResponse("reply contained no text".into()));
    }
    Ok((raw, plan))
}
