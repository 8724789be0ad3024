use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::input::{self, InputEvent};

/// Roughly sixty frames a second
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Unified event type consumed by the frame loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Input(InputEvent),
    Resize,
    Tick,
    /// Ctrl+C; leaves the game from any phase
    Interrupt,
}

/// Source of terminal events (keyboard, mouse, resize)
pub trait GameEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Press
        && key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

/// Map a raw crossterm event; anything the game does not react to is dropped
pub fn translate(ev: &CtEvent) -> Option<GameEvent> {
    match ev {
        CtEvent::Key(key) if is_interrupt(key) => Some(GameEvent::Interrupt),
        CtEvent::Key(key) => input::from_key_event(key).map(GameEvent::Input),
        CtEvent::Mouse(mouse) => input::from_mouse_event(mouse).map(GameEvent::Input),
        CtEvent::Resize(_, _) => Some(GameEvent::Resize),
        _ => None,
    }
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(ev) => {
                    if let Some(game_ev) = translate(&ev) {
                        if tx.send(game_ev).is_err() {
                            break;
                        }
                    }
                }
                Err(err) => {
                    tracing::error!("terminal event reader stopped: {err}");
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed event source for tests and scripted drivers
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Hands the frame loop at most one event per frame
pub struct Runner<E: GameEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: GameEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to one frame and returns the next event, or Tick on timeout
    pub fn step(&self) -> GameEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => GameEvent::Tick,
        }
    }
}
