use crossterm::tty::IsTty;
use std::io::{Stdout, Write};
use thiserror::Error;

use crate::store::Settings;

/// Named sound cues the game fires on transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Cue {
    Perfect,
    Good,
    Miss,
    Wrong,
    Combo,
    Nav,
    CountdownTick,
    GameStart,
    GameOver,
    KeyTap,
    KeyBackspace,
    KeyEnter,
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
    #[error("audio write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio collaborator. Owns its own volume and mute state.
pub trait AudioSink {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError>;

    fn apply_settings(&mut self, _settings: &Settings) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Rings the terminal bell for the cues that matter during play
#[derive(Debug)]
pub struct TerminalBell<W: Write> {
    out: W,
    muted: bool,
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out, muted: false }
    }

    fn rings_for(cue: Cue) -> bool {
        matches!(
            cue,
            Cue::Perfect | Cue::Wrong | Cue::Miss | Cue::CountdownTick | Cue::GameStart | Cue::GameOver
        )
    }
}

impl TerminalBell<Stdout> {
    /// Only a real terminal can ring
    pub fn probe() -> Result<Self, AudioError> {
        let out = std::io::stdout();
        if !out.is_tty() {
            return Err(AudioError::Unavailable("stdout is not a terminal".into()));
        }
        Ok(Self::new(out))
    }
}

impl<W: Write> AudioSink for TerminalBell<W> {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError> {
        if self.muted || !Self::rings_for(cue) {
            return Ok(());
        }
        self.out.write_all(b"\x07")?;
        self.out.flush()?;
        Ok(())
    }

    fn apply_settings(&mut self, settings: &Settings) -> Result<(), AudioError> {
        self.muted = settings.sfx_volume <= 0.0;
        Ok(())
    }
}

/// Remembers every cue it was asked to play
#[derive(Debug, Default, Clone)]
pub struct CueLog {
    pub played: Vec<Cue>,
    pub settings: Option<Settings>,
}

impl AudioSink for CueLog {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError> {
        self.played.push(cue);
        Ok(())
    }

    fn apply_settings(&mut self, settings: &Settings) -> Result<(), AudioError> {
        self.settings = Some(*settings);
        Ok(())
    }
}

/// Shared handle so a caller can inspect cues after handing the sink to a game
#[derive(Debug, Default, Clone)]
pub struct SharedCueLog(pub std::rc::Rc<std::cell::RefCell<CueLog>>);

impl SharedCueLog {
    pub fn played(&self) -> Vec<Cue> {
        self.0.borrow().played.clone()
    }

    pub fn settings(&self) -> Option<Settings> {
        self.0.borrow().settings
    }
}

impl AudioSink for SharedCueLog {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError> {
        self.0.borrow_mut().play(cue)
    }

    fn apply_settings(&mut self, settings: &Settings) -> Result<(), AudioError> {
        self.0.borrow_mut().apply_settings(settings)
    }
}
