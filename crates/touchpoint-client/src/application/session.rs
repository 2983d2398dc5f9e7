//! The input session: one task that turns local input into control messages.
//!
//! # State machine
//!
//! ```text
//!            touch down (start trigger possible)
//!   Idle ───────────────────────────────────────► Armed
//!    ▲  ◄─────────── released without trigger ─────┘│
//!    │                                              │ long press / swipe /
//!    │                                              │ start shortcut: open channel
//!    │        channel failed / lost                 ▼
//!    ├──────────────────────────────────────── Armed (connecting)
//!    │                                              │ channel open
//!    │   triple tap / quit key / stop() / lost      ▼
//!    └──────────────────────────────────────────  Active
//! ```
//!
//! # Concurrency model
//!
//! Everything happens on the task running [`InputSession::run`].  It waits on
//! three queues at once: input events, timer firings, and channel events.
//! Handlers run one at a time and never await, so messages go out in exactly
//! the order the handlers decide to send them.
//!
//! Deferred work (tap classification, the final motion flush, press release,
//! the start long-press, the quit delay) is a [`TimerSet`] slot.  Every timer
//! is stamped with the session generation, which is bumped on each start and
//! teardown, so a firing left over from an earlier session is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use touchpoint_core::{
    ClassifyTimer, ControlMessage, Displacement, GestureClassifier, InputEvent, InputOptions,
    Intent, KeyAction, KeyboardController, MotionBatcher, MotionDecision, Point, ServerMessage,
    StartTrigger, TriggerEvent,
};

use crate::application::timer::{TimerFired, TimerKind, TimerSet};
use crate::infrastructure::channel::{ChannelEvent, ChannelState, Connector, ControlChannel};
use crate::infrastructure::display::MessageDisplay;
use crate::infrastructure::input_source::{InputSource, InputSourceError};

/// Shown when a session is started from the touchscreen.
pub const TOUCHSCREEN_HELP: &str = "Touch input active. \
Drag to move the pointer. Tap once to click, tap twice for a long press, \
tap three times to exit.";

/// Shown when a session is started from the keyboard.
pub const KEYBOARD_HELP: &str = "Keyboard input active. \
Arrows or W/A/S/D move (hold Ctrl or Shift to move further). \
Space presses, C pauses the pointer, R reinitialises the receiver, \
Q exits, Esc closes this message.";

/// How often `run` checks the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing in progress.
    Idle,
    /// A start trigger is pending, or the channel is connecting.
    Armed,
    /// The channel is open and input is being translated.
    Active,
}

/// How a session was started.  Decides which help text is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Touch,
    Keyboard,
}

/// Whether the input source should let an event through to the local UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Pass,
    Suppress,
}

/// Errors returned by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `start` was called while a session is already starting or active.
    #[error("session already started (state: {0:?})")]
    AlreadyStarted(SessionState),

    /// The input source could not be started.
    #[error("input source failed: {0}")]
    Input(#[from] InputSourceError),
}

/// Owns all session state.  See the module documentation.
pub struct InputSession {
    opts: InputOptions,
    state: SessionState,
    generation: u64,
    session_id: Option<Uuid>,
    activation: Activation,
    connector: Box<dyn Connector>,
    display: Box<dyn MessageDisplay>,
    channel: Option<Box<dyn ControlChannel>>,
    channel_events: Option<mpsc::UnboundedReceiver<ChannelEvent>>,
    classifier: GestureClassifier,
    trigger: StartTrigger,
    batcher: MotionBatcher,
    keyboard: KeyboardController,
    timers: TimerSet,
    timer_rx: mpsc::UnboundedReceiver<TimerFired>,
    pending_swipe: Option<Displacement>,
}

/// Current time on Tokio's clock, which tests can pause and advance.
fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

/// Receives the next channel event, or waits forever when there is no channel.
async fn next_channel_event(
    rx: &mut Option<mpsc::UnboundedReceiver<ChannelEvent>>,
) -> Option<ChannelEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl InputSession {
    pub fn new(
        opts: InputOptions,
        connector: Box<dyn Connector>,
        display: Box<dyn MessageDisplay>,
    ) -> Self {
        let (timers, timer_rx) = TimerSet::new();
        Self {
            classifier: GestureClassifier::new(&opts),
            trigger: StartTrigger::new(&opts),
            batcher: MotionBatcher::new(&opts),
            keyboard: KeyboardController::new(&opts),
            opts,
            state: SessionState::Idle,
            generation: 0,
            session_id: None,
            activation: Activation::Touch,
            connector,
            display,
            channel: None,
            channel_events: None,
            timers,
            timer_rx,
            pending_swipe: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` while pointer motion is paused.
    pub fn is_paused(&self) -> bool {
        self.batcher.is_paused()
    }

    /// Processes input, timers and channel events until the input source ends
    /// or `running` is cleared.  Any active session is stopped on return.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Input`] if the input source cannot be started.
    pub async fn run(
        &mut self,
        source: &dyn InputSource,
        running: Arc<AtomicBool>,
    ) -> Result<(), SessionError> {
        let mut events = source.start()?;
        let mut shutdown_check = interval(SHUTDOWN_POLL);
        info!(
            "waiting for a start gesture or the {} key",
            self.opts.start_shortcut
        );

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if self.handle_event(event) == Disposition::Suppress {
                            source.suppress_current_event();
                        }
                    }
                    None => {
                        info!("input source ended");
                        break;
                    }
                },
                Some(fired) = self.timer_rx.recv() => self.handle_timer(fired),
                event = next_channel_event(&mut self.channel_events) => match event {
                    Some(event) => self.handle_channel_event(event),
                    None => self.channel_events = None,
                },
                _ = shutdown_check.tick() => {
                    if !running.load(Ordering::Relaxed) {
                        info!("shutdown flag cleared; leaving input loop");
                        break;
                    }
                }
            }
        }

        self.stop();
        source.stop();
        Ok(())
    }

    // ── Input events ──────────────────────────────────────────────────────────

    /// Handles one local input event.
    pub fn handle_event(&mut self, event: InputEvent) -> Disposition {
        let now = now();
        let active = self.state == SessionState::Active;

        match event {
            InputEvent::KeyDown {
                code, modifiers, ..
            } => {
                if let Some(action) = self.keyboard.key_down(code, modifiers, active) {
                    self.apply_key_action(action);
                }
                Disposition::Pass
            }
            InputEvent::KeyUp { code } => {
                if let Some(action) = self.keyboard.key_up(code) {
                    self.apply_key_action(action);
                }
                Disposition::Pass
            }
            _ if event.is_touch() && !active => self.arming_touch(event),
            InputEvent::TouchStart { x, y } => {
                let at = Point::new(x, y);
                self.timers.cancel(TimerKind::MotionFlush);
                if let Some(d) = self.batcher.begin_burst(at, now) {
                    self.send_motion(d);
                }
                let timer = self.classifier.touch_start(at, now);
                self.apply_classify_timer(timer);
                Disposition::Suppress
            }
            InputEvent::TouchMove { x, y } => {
                let at = Point::new(x, y);
                self.classifier.touch_move(at);
                let decision = self.batcher.on_sample(at, now);
                self.apply_motion(decision);
                Disposition::Suppress
            }
            InputEvent::TouchEnd => {
                let timer = self.classifier.touch_end(now);
                self.apply_classify_timer(timer);
                Disposition::Suppress
            }
            _ if !active => Disposition::Pass,
            InputEvent::MouseDown { .. } => {
                self.send(ControlMessage::Start);
                Disposition::Suppress
            }
            InputEvent::MouseMove { x, y } => {
                let decision = self.batcher.on_sample(Point::new(x, y), now);
                self.apply_motion(decision);
                Disposition::Suppress
            }
            InputEvent::MouseUp => {
                self.send(ControlMessage::Stop);
                Disposition::Suppress
            }
        }
    }

    /// Touches seen while no session is active feed the start trigger.
    fn arming_touch(&mut self, event: InputEvent) -> Disposition {
        if self.channel.is_some() {
            // Connecting; the gesture that started us is already complete.
            return Disposition::Pass;
        }

        match event {
            InputEvent::TouchStart { x, y } => {
                let long_press = self.trigger.press(Point::new(x, y));
                if let Some(delay) = long_press {
                    self.timers
                        .schedule(TimerKind::StartLongPress, delay, self.generation);
                }
                if long_press.is_some() || self.opts.start_on_swipe {
                    self.state = SessionState::Armed;
                }
            }
            InputEvent::TouchMove { x, y } => self.trigger.motion(Point::new(x, y)),
            InputEvent::TouchEnd => {
                self.timers.cancel(TimerKind::StartLongPress);
                match self.trigger.release() {
                    Some(TriggerEvent::Swipe(d)) => {
                        self.pending_swipe = Some(d);
                        self.start_or_log(Activation::Touch);
                    }
                    _ => self.state = SessionState::Idle,
                }
            }
            _ => {}
        }

        if self.trigger.consumes_touch() {
            Disposition::Suppress
        } else {
            Disposition::Pass
        }
    }

    fn apply_key_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Activate => self.start_or_log(Activation::Keyboard),
            KeyAction::Send(msg) => self.send(msg),
            KeyAction::Quit(delay) => self.timers.schedule(TimerKind::Quit, delay, self.generation),
            KeyAction::TogglePause => {
                let paused = !self.batcher.is_paused();
                self.batcher.set_paused(paused);
                info!(paused, "pointer motion pause toggled");
            }
            KeyAction::DismissMessage => self.display.close(),
        }
    }

    fn apply_classify_timer(&mut self, timer: ClassifyTimer) {
        match timer {
            ClassifyTimer::Cancel => self.timers.cancel(TimerKind::Classify),
            ClassifyTimer::Schedule(delay) => {
                self.timers
                    .schedule(TimerKind::Classify, delay, self.generation)
            }
        }
    }

    fn apply_motion(&mut self, decision: MotionDecision) {
        match decision {
            MotionDecision::SendNow(d) => {
                self.timers.cancel(TimerKind::MotionFlush);
                self.send_motion(d);
            }
            MotionDecision::Defer(delay) => {
                self.timers
                    .schedule(TimerKind::MotionFlush, delay, self.generation)
            }
            MotionDecision::Rebased => self.timers.cancel(TimerKind::MotionFlush),
            MotionDecision::Ignored => {}
        }
    }

    // ── Timers ────────────────────────────────────────────────────────────────

    /// Handles a timer firing.  Firings from an earlier session generation, or
    /// of a timer that was since cancelled or replaced, are ignored.
    pub fn handle_timer(&mut self, fired: TimerFired) {
        if fired.generation != self.generation || !self.timers.take_if_current(&fired) {
            debug!(?fired, generation = self.generation, "ignoring stale timer");
            return;
        }

        match fired.kind {
            TimerKind::Classify => {
                let intent = self.classifier.classify();
                self.batcher.end_burst();
                if let Some(intent) = intent {
                    self.dispatch(intent);
                }
            }
            TimerKind::MotionFlush => {
                if let Some(d) = self.batcher.flush(now()) {
                    self.send_motion(d);
                }
            }
            TimerKind::PressRelease => self.send(ControlMessage::Stop),
            TimerKind::StartLongPress => {
                if let Some(TriggerEvent::LongPress) = self.trigger.long_press_elapsed() {
                    self.start_or_log(Activation::Touch);
                }
            }
            TimerKind::Quit => {
                info!("quit key: stopping session");
                self.stop();
            }
        }
    }

    fn dispatch(&mut self, intent: Intent) {
        match intent.hold_duration(&self.opts) {
            Some(hold) => {
                // Never leave a press open when a new one starts.
                if self.timers.is_pending(TimerKind::PressRelease) {
                    self.timers.cancel(TimerKind::PressRelease);
                    self.send(ControlMessage::Stop);
                }
                info!(?intent, hold_ms = hold.as_millis() as u64, "sending press");
                self.send(ControlMessage::Start);
                self.timers
                    .schedule(TimerKind::PressRelease, hold, self.generation);
            }
            None => {
                info!("triple tap: stopping session");
                self.stop();
            }
        }
    }

    // ── Channel ───────────────────────────────────────────────────────────────

    fn handle_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened => self.on_channel_open(),
            ChannelEvent::Message(msg) => self.handle_server_message(msg),
            ChannelEvent::Failed(e) => {
                warn!("could not open control channel: {e}");
                self.teardown();
                self.display
                    .display(&format!("Could not connect to the receiver: {e}"), None);
            }
            ChannelEvent::Closed => {
                if self.state != SessionState::Idle {
                    warn!("control channel closed by the receiver");
                    self.teardown();
                    self.display.display("Connection to the receiver was lost", None);
                }
            }
        }
    }

    fn on_channel_open(&mut self) {
        if self.state != SessionState::Armed {
            return;
        }
        self.state = SessionState::Active;
        info!(session = ?self.session_id, activation = ?self.activation, "input session active");

        let help = match self.activation {
            Activation::Touch => TOUCHSCREEN_HELP,
            Activation::Keyboard => KEYBOARD_HELP,
        };
        self.display.display(help, None);

        // The swipe that started the session finished before the channel
        // existed; deliver its displacement now, outside the batcher.
        if let Some(d) = self.pending_swipe.take() {
            self.send(ControlMessage::MoveRelative(d));
        }
    }

    /// Handles a decoded message from the receiver.
    pub fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Error(text) => {
                warn!("receiver reported an error: {text}");
                self.display.display(&format!("Error: {text}"), None);
            }
            ServerMessage::Unknown { kind } => debug!("ignoring receiver message of type {kind}"),
        }
    }

    fn send_motion(&self, d: Displacement) {
        if d.is_zero() {
            debug!("skipping zero displacement");
            return;
        }
        self.send(ControlMessage::MoveRelative(d));
    }

    /// Sends on the session's channel.  Only the Active paths may call this;
    /// a failure after that point means the receiver went away and the
    /// `Closed` event is still queued.
    fn send(&self, msg: ControlMessage) {
        debug_assert_eq!(
            self.state,
            SessionState::Active,
            "{} sent outside an active session",
            msg.kind()
        );
        match &self.channel {
            Some(channel) => {
                if let Err(e) = channel.send(&msg) {
                    error!("dropping {} message: {e}", msg.kind());
                }
            }
            None => error!("dropping {} message: no control channel", msg.kind()),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Starts a session: opens the channel and arms until it reports open.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyStarted`] if a session is connecting or active.
    pub fn start(&mut self, activation: Activation) -> Result<(), SessionError> {
        if self.state == SessionState::Active || self.channel.is_some() {
            return Err(SessionError::AlreadyStarted(self.state));
        }

        self.timers.cancel(TimerKind::StartLongPress);
        self.trigger.reset();
        self.generation += 1;

        let id = Uuid::new_v4();
        info!(session = %id, ?activation, "starting input session");

        let (tx, rx) = mpsc::unbounded_channel();
        self.channel = Some(self.connector.open(tx));
        self.channel_events = Some(rx);
        self.session_id = Some(id);
        self.activation = activation;
        self.state = SessionState::Armed;
        Ok(())
    }

    fn start_or_log(&mut self, activation: Activation) {
        if let Err(e) = self.start(activation) {
            debug!("start ignored: {e}");
        }
    }

    /// Stops the session: releases any held press, cancels every timer, closes
    /// the channel and the message display.  Does nothing when idle.
    pub fn stop(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }

        let pressed = self.timers.is_pending(TimerKind::PressRelease) || self.keyboard.is_holding();
        let open = self
            .channel
            .as_ref()
            .is_some_and(|c| c.state() == ChannelState::Open);
        if pressed && open {
            self.send(ControlMessage::Stop);
        }

        self.teardown();
        self.display.close();
    }

    fn teardown(&mut self) {
        self.timers.cancel_all();
        self.generation += 1;
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
        self.channel_events = None;
        self.classifier.reset();
        self.trigger.reset();
        self.keyboard.reset();
        self.batcher = MotionBatcher::new(&self.opts);
        self.pending_swipe = None;
        self.state = SessionState::Idle;
        if let Some(id) = self.session_id.take() {
            info!(session = %id, "input session stopped");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
